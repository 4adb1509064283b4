//! Field-level helpers shared by the page extractors
//!
//! Missing elements yield empty strings and unparsable numbers yield zero.
//! Neither is an error: a malformed field is logged and the record is still
//! emitted.

use scraper::{ElementRef, Selector};
use url::Url;

/// Collects the text of an element, trimmed
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the first match of `selector` under `scope`, or `""`
pub fn select_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Attribute of the first match of `selector` under `scope`, trimmed
pub fn select_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
}

/// First whitespace-delimited token with thousands separators removed
fn leading_token(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or("")
        .replace(',', "")
}

/// Parses the leading integer of `text`, defaulting to 0
///
/// `field` and `context` only feed the log line.
pub fn parse_leading_int(text: &str, field: &str, context: &str) -> i64 {
    let token = leading_token(text);
    match token.parse::<i64>() {
        Ok(value) => value,
        Err(e) => {
            log_parse_failure(text, field, context, &e.to_string());
            0
        }
    }
}

/// Parses the leading decimal number of `text`, defaulting to 0.0
pub fn parse_leading_float(text: &str, field: &str, context: &str) -> f64 {
    let token = leading_token(text);
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        Ok(_) => {
            log_parse_failure(text, field, context, "not a finite number");
            0.0
        }
        Err(e) => {
            log_parse_failure(text, field, context, &e.to_string());
            0.0
        }
    }
}

fn log_parse_failure(text: &str, field: &str, context: &str, reason: &str) {
    if text.trim().is_empty() {
        tracing::debug!("No {} value for {}", field, context);
    } else {
        tracing::warn!(
            "Unable to parse {} '{}' for {}: {}",
            field,
            text.trim(),
            context,
            reason
        );
    }
}

/// Resolves an `href` against the site root
///
/// Absolute links are returned unchanged; empty or unresolvable links yield
/// `None`.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
