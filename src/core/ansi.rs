//! `{color}` tokens embedded in log messages.
//!
//! A token names a foreground colour with optional attributes and background,
//! e.g. `{red}`, `{green+b}`, `{white:blue}`, `{yellow+bh:black}`, or `{reset}`.
//! Colour names are resolved through [`colored::Color`]. Attributes: `b` bold,
//! `B` blink, `u` underline, `i` inverse, `s` strikethrough, `h` bright.

use colored::Color;
use std::borrow::Cow;

/// ANSI sequence that clears every attribute.
pub const RESET: &str = "\x1b[0m";

/// Longest token body treated as a colour.
const MAX_TOKEN_LEN: usize = 14;

/// Replace recognized tokens with their ANSI codes.
///
/// Returns the rewritten text and whether any token was substituted.
pub fn expand(text: &str) -> (Cow<'_, str>, bool) {
    rewrite(text, true)
}

/// Remove recognized tokens, leaving unrecognized ones verbatim.
pub fn strip(text: &str) -> (Cow<'_, str>, bool) {
    rewrite(text, false)
}

fn rewrite(text: &str, expand: bool) -> (Cow<'_, str>, bool) {
    if !text.contains('{') {
        return (Cow::Borrowed(text), false);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut modified = false;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let code = after
            .find('}')
            .filter(|&close| close <= MAX_TOKEN_LEN)
            .and_then(|close| color_code(&after[..close]).map(|code| (close, code)));

        match code {
            Some((close, code)) => {
                if expand {
                    out.push_str(&code);
                }
                modified = true;
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    if modified {
        (Cow::Owned(out), true)
    } else {
        (Cow::Borrowed(text), false)
    }
}

/// ANSI escape sequence for a token body, `None` when the name is not a colour.
pub fn color_code(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    if token.eq_ignore_ascii_case("reset") || token.eq_ignore_ascii_case("off") {
        return Some(RESET.to_string());
    }

    let (fg, bg) = match token.split_once(':') {
        Some((fg, bg)) => (fg, Some(bg)),
        None => (token, None),
    };

    let mut params: Vec<Cow<'static, str>> = Vec::new();
    if !fg.is_empty() {
        let (color, attrs) = parse_part(fg)?;
        params.extend(attrs);
        params.push(color.to_fg_str());
    }
    if let Some(bg) = bg {
        let (color, _) = parse_part(bg)?;
        params.push(color.to_bg_str());
    }
    if params.is_empty() {
        return None;
    }

    Some(format!("\x1b[{}m", params.join(";")))
}

fn parse_part(part: &str) -> Option<(Color, Vec<Cow<'static, str>>)> {
    let (name, flags) = match part.split_once('+') {
        Some((name, flags)) => (name, flags),
        None => (part, ""),
    };
    if name.is_empty() || name.contains(' ') {
        return None;
    }

    let mut bright = false;
    let mut attrs = Vec::new();
    for flag in flags.chars() {
        let attr = match flag {
            'b' => "1",
            'B' => "5",
            'u' => "4",
            'i' => "7",
            's' => "9",
            'h' => {
                bright = true;
                continue;
            }
            _ => return None,
        };
        attrs.push(Cow::Borrowed(attr));
    }

    let lookup = if bright {
        format!("bright {}", name)
    } else {
        name.to_string()
    };
    let color: Color = lookup.parse().ok()?;
    Some((color, attrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_known_tokens() {
        let (text, modified) = expand("{red}alert{reset} done");
        assert!(modified);
        assert_eq!(text, "\x1b[31malert\x1b[0m done");
    }

    #[test]
    fn test_strip_known_tokens() {
        let (text, modified) = strip("{green}ok{reset}");
        assert!(modified);
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_unknown_tokens_left_verbatim() {
        let (text, modified) = expand(r#"{"current_config":{}} {nocolor}"#);
        assert!(!modified);
        assert_eq!(text, r#"{"current_config":{}} {nocolor}"#);

        let (text, modified) = strip("{unknown} then {blue}x");
        assert!(modified);
        assert_eq!(text, "{unknown} then x");
    }

    #[test]
    fn test_long_token_is_not_a_color() {
        let (text, modified) = expand("{red:white+b-extra}");
        assert!(!modified);
        assert_eq!(text, "{red:white+b-extra}");
    }

    #[test]
    fn test_attributes_and_background() {
        assert_eq!(color_code("red+b").unwrap(), "\x1b[1;31m");
        assert_eq!(color_code("white:blue").unwrap(), "\x1b[37;44m");
        assert_eq!(color_code("red+h").unwrap(), "\x1b[91m");
        assert!(color_code("red+z").is_none());
        assert!(color_code("").is_none());
        assert!(color_code(":").is_none());
    }

    #[test]
    fn test_unbalanced_braces() {
        let (text, modified) = expand("{red no close");
        assert!(!modified);
        assert_eq!(text, "{red no close");
    }
}
