//! Property-based tests for fanlog using proptest

use chrono::DateTime;
use fanlog::core::ansi;
use fanlog::prelude::*;
use proptest::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level names parse back to the same level, whatever their case
    #[test]
    fn test_log_level_str_roundtrip(level in any_level(), lower in any::<bool>()) {
        let name = if lower {
            level.to_str().to_lowercase()
        } else {
            level.to_str().to_string()
        };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(level, parsed);
        prop_assert_eq!(format!("{}", level), level.to_str());
    }

    /// Ordering follows the numeric encoding
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
        prop_assert_eq!(a.cmp(&b), (a as u8).cmp(&(b as u8)));
    }

    /// Only 0..=4 are valid numeric levels
    #[test]
    fn test_numeric_level_range(raw in any::<u8>()) {
        let converted = LogLevel::try_from(raw);
        prop_assert_eq!(converted.is_ok(), raw <= 4);
    }

    /// Unknown names fall back to the given default
    #[test]
    fn test_parse_or_falls_back(raw in "[a-z]{6,12}", default in any_level()) {
        let expected = raw.parse::<LogLevel>().unwrap_or(default);
        prop_assert_eq!(LogLevel::parse_or(&raw, default), expected);
    }
}

// ============================================================================
// Filter Tests
// ============================================================================

proptest! {
    /// A glob without `*` matches exactly its own text, even with regex metacharacters
    #[test]
    fn test_glob_without_star_is_exact(literal in "[a-z.+?()\\[\\]|^$\\\\]{1,16}", extra in "[a-z]{1,4}") {
        let filter = Filter::glob(&literal);
        prop_assert!(filter.matches(&literal));
        let longer = format!("{}{}", literal, extra);
        prop_assert!(!filter.matches(&longer));
        let prefixed = format!("{}{}", extra, literal);
        prop_assert!(!filter.matches(&prefixed));
    }

    /// `prefix*` matches every namespace starting with the prefix
    #[test]
    fn test_glob_prefix(prefix in "[a-z.]{1,8}", suffix in ".{0,12}") {
        let filter = Filter::glob(&format!("{}*", prefix));
        let namespace = format!("{}{}", prefix, suffix);
        prop_assert!(filter.matches(&namespace));
        prop_assert_eq!(filter.matches(&suffix), suffix.starts_with(&prefix));
    }

    /// Composition follows boolean logic
    #[test]
    fn test_combinators_truth_table(a in "[a-c]{1,3}", b in "[a-c]{1,3}", ns in "[a-c]{1,3}") {
        let fa = Filter::exact(a.clone());
        let fb = Filter::glob(&format!("{}*", b));
        let ma = fa.matches(&ns);
        let mb = fb.matches(&ns);

        prop_assert_eq!(fa.clone().not().matches(&ns), !ma);
        prop_assert_eq!(fa.clone().and(fb.clone()).matches(&ns), ma && mb);
        prop_assert_eq!(fa.or(fb).matches(&ns), ma || mb);
    }

    /// Text without metacharacters is classified as an exact match
    #[test]
    fn test_parse_plain_text_is_exact(text in "[a-zA-Z0-9_-]{1,16}", other in "[a-zA-Z0-9_-]{1,16}") {
        let filter = Filter::parse(&text).unwrap();
        prop_assert!(filter.matches(&text));
        prop_assert_eq!(filter.matches(&other), other == text);
    }

    /// The underscore filter hides exactly the namespaces starting with `_`
    #[test]
    fn test_underscore_filter(ns in ".{0,12}") {
        prop_assert_eq!(Filter::underscore().matches(&ns), !ns.starts_with('_'));
    }
}

// ============================================================================
// Colour Token Tests
// ============================================================================

proptest! {
    /// Text without braces is never rewritten
    #[test]
    fn test_text_without_braces_unchanged(text in "[^{]*") {
        let (expanded, modified) = ansi::expand(&text);
        prop_assert!(!modified);
        prop_assert_eq!(expanded.as_ref(), text.as_str());

        let (stripped, modified) = ansi::strip(&text);
        prop_assert!(!modified);
        prop_assert_eq!(stripped.as_ref(), text.as_str());
    }

    /// Stripping removes known tokens and never adds escape codes
    #[test]
    fn test_strip_removes_known_tokens(
        color in prop_oneof![Just("red"), Just("green"), Just("blue+b"), Just("white:black"), Just("yellow+h")],
        body in "[a-zA-Z0-9 ]{0,20}",
    ) {
        let text = format!("{{{}}}{}{{reset}}", color, body);
        let (stripped, modified) = ansi::strip(&text);
        prop_assert!(modified);
        prop_assert_eq!(stripped.as_ref(), body.as_str());

        let (expanded, _) = ansi::expand(&text);
        prop_assert!(expanded.contains('\x1b'));
        prop_assert!(expanded.ends_with(ansi::RESET));
    }

    /// Stripping never lengthens the text
    #[test]
    fn test_strip_never_grows(text in ".{0,40}") {
        let (stripped, _) = ansi::strip(&text);
        prop_assert!(stripped.len() <= text.len());
    }
}

// ============================================================================
// Formatter Tests
// ============================================================================

proptest! {
    /// Line output embeds namespace, level and message verbatim
    #[test]
    fn test_line_format_layout(
        ns in "[a-z.]{1,12}",
        message in "[^{\n]{0,40}",
        level in any_level(),
        nanos in 0i64..4_000_000_000_000_000_000,
    ) {
        let record = LogRecord::new(level, ns.clone(), message.clone(), DateTime::from_timestamp_nanos(nanos));
        let line = LineFormatter::new(false, true).format(&record);
        let expected_suffix = format!(" ({}) [{}]: {}\n", ns, level, message);
        prop_assert!(line.ends_with(&expected_suffix));
        prop_assert_eq!(line.len(), "2021-02-03 09:47:58.901".len() + expected_suffix.len());
    }

    /// Structured output is one JSON document carrying the record unchanged
    #[test]
    fn test_structured_format_roundtrip(
        ns in ".{0,12}",
        message in ".{0,40}",
        level in any_level(),
        nanos in 0i64..4_000_000_000_000_000_000,
    ) {
        let record = LogRecord::new(level, ns.clone(), message.clone(), DateTime::from_timestamp_nanos(nanos));
        let json = StructuredFormatter::new().format(&record);
        prop_assert!(!json.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(value["severity"].as_str(), Some(level.to_str()));
        prop_assert_eq!(value["context"].as_str(), Some(ns.as_str()));
        prop_assert_eq!(value["message"].as_str(), Some(message.as_str()));
        prop_assert_eq!(value["time"].as_i64(), Some(nanos));
    }
}
