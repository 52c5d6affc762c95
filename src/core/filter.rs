//! Namespace filters
//!
//! A [`Filter`] is an immutable predicate over a namespace string. Filters are
//! compiled once from a [`FilterSpec`] (exact string, glob, regular expression or
//! an existing filter) and composed with [`Filter::and`], [`Filter::or`] and
//! [`Filter::not`]. Composites hold their parts by reference, so building one
//! never recompiles a pattern.
//!
//! # Examples
//!
//! ```
//! use fanlog::Filter;
//!
//! let exchange = Filter::glob("exchange.*");
//! let noisy = Filter::exact("exchange.heartbeat");
//! let filter = exchange.and(noisy.not());
//!
//! assert!(filter.matches("exchange.orders"));
//! assert!(!filter.matches("exchange.heartbeat"));
//! assert!(!filter.matches("strategy"));
//! ```

use super::error::{LoggerError, Result};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&str) -> bool + Send + Sync;

const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// Source a [`Filter`] can be compiled from.
#[derive(Clone)]
pub enum FilterSpec {
    /// Matches only the identical namespace
    Exact(String),
    /// `*` matches any run of characters, everything else is literal; full match
    Glob(String),
    /// Used as supplied (unanchored search)
    Regex(Regex),
    /// Regular expression source, compiled when the filter is built
    Pattern(String),
    /// Raw text classified by [`Filter::parse`]
    Auto(String),
    /// Already compiled
    Predicate(Filter),
}

impl From<&str> for FilterSpec {
    fn from(value: &str) -> Self {
        FilterSpec::Auto(value.to_string())
    }
}

impl From<String> for FilterSpec {
    fn from(value: String) -> Self {
        FilterSpec::Auto(value)
    }
}

impl From<Regex> for FilterSpec {
    fn from(value: Regex) -> Self {
        FilterSpec::Regex(value)
    }
}

impl From<Filter> for FilterSpec {
    fn from(value: Filter) -> Self {
        FilterSpec::Predicate(value)
    }
}

impl From<&Filter> for FilterSpec {
    fn from(value: &Filter) -> Self {
        FilterSpec::Predicate(value.clone())
    }
}

/// Boolean predicate over namespaces.
#[derive(Clone)]
pub struct Filter {
    predicate: Arc<Predicate>,
    description: Arc<str>,
}

impl Filter {
    /// Wrap an arbitrary predicate.
    pub fn from_fn<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: Arc::from(description.into()),
        }
    }

    /// Build a filter from any supported source.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidFilter`] when a regular expression does not compile.
    pub fn compile(spec: impl Into<FilterSpec>) -> Result<Self> {
        match spec.into() {
            FilterSpec::Exact(literal) => Ok(Self::exact(literal)),
            FilterSpec::Glob(pattern) => Ok(Self::glob(&pattern)),
            FilterSpec::Regex(regex) => Ok(Self::from_regex(regex)),
            FilterSpec::Pattern(source) => Self::regex(&source),
            FilterSpec::Auto(raw) => Self::parse(&raw),
            FilterSpec::Predicate(filter) => Ok(filter),
        }
    }

    /// Classify raw text: no regex metacharacters means an exact match, `*` as the
    /// only metacharacter means a glob, anything else is a regular expression.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut metas = raw.chars().filter(|c| REGEX_META.contains(c)).peekable();
        if metas.peek().is_none() {
            return Ok(Self::exact(raw));
        }
        if metas.all(|c| c == '*') {
            return Ok(Self::glob(raw));
        }
        Self::regex(raw)
    }

    pub fn exact(literal: impl Into<String>) -> Self {
        let literal: String = literal.into();
        let description = format!("exact({})", literal);
        Self::from_fn(description, move |ns| ns == literal)
    }

    /// Glob where each `*` matches any run of characters.
    ///
    /// A pattern without `*` behaves exactly like [`Filter::exact`].
    pub fn glob(pattern: &str) -> Self {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let anchored = format!("^(?s:{})$", body);
        match Regex::new(&anchored) {
            Ok(regex) => Self {
                description: Arc::from(format!("glob({})", pattern)),
                ..Self::from_regex(regex)
            },
            // Every literal segment is escaped, so this only triggers on size limits.
            Err(_) => {
                let pattern = pattern.to_string();
                let description = format!("glob({})", pattern);
                Self::from_fn(description, move |ns| glob_match(&pattern, ns))
            }
        }
    }

    /// Compile a regular expression, used unanchored.
    pub fn regex(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Self::from_regex)
            .map_err(|e| LoggerError::invalid_filter(source, e.to_string()))
    }

    pub fn from_regex(regex: Regex) -> Self {
        let description = format!("regex({})", regex.as_str());
        Self::from_fn(description, move |ns| regex.is_match(ns))
    }

    pub fn match_all() -> Self {
        Self::from_fn("all", |_| true)
    }

    pub fn match_none() -> Self {
        Self::from_fn("none", |_| false)
    }

    /// Everything except namespaces that start with `_`.
    pub fn underscore() -> Self {
        Self::from_fn("not-underscore", |ns| !ns.starts_with('_'))
    }

    #[inline]
    pub fn matches(&self, namespace: &str) -> bool {
        (self.predicate)(namespace)
    }

    #[must_use]
    pub fn not(self) -> Self {
        let description = format!("not({})", self.description);
        Self::from_fn(description, move |ns| !self.matches(ns))
    }

    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        let description = format!("and({}, {})", self.description, other.description);
        Self::from_fn(description, move |ns| self.matches(ns) && other.matches(ns))
    }

    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        let description = format!("or({}, {})", self.description, other.description);
        Self::from_fn(description, move |ns| self.matches(ns) || other.matches(ns))
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::match_all()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter").field(&self.description).finish()
    }
}

/// Negate any filter source.
pub fn not(spec: impl Into<FilterSpec>) -> Result<Filter> {
    Ok(Filter::compile(spec)?.not())
}

/// Both sources must match.
pub fn and(a: impl Into<FilterSpec>, b: impl Into<FilterSpec>) -> Result<Filter> {
    Ok(Filter::compile(a)?.and(Filter::compile(b)?))
}

/// Either source may match.
pub fn or(a: impl Into<FilterSpec>, b: impl Into<FilterSpec>) -> Result<Filter> {
    Ok(Filter::compile(a)?.or(Filter::compile(b)?))
}

/// Compile `raw` when it is present and non-empty, otherwise use `default`.
pub fn filter_or_default(raw: Option<&str>, default: Filter) -> Result<Filter> {
    match raw {
        Some(raw) if !raw.is_empty() => Filter::parse(raw),
        _ => Ok(default),
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }
    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return true,
    };
    for part in middle {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last)
}
