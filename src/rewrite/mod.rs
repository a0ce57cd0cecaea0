//! Text rewriting of SQL dump files.
//!
//! A dump is treated as an opaque text blob containing configuration
//! assignments of the form `'key','value'`. The rewriter locates a key's
//! current value, enforces that exactly one distinct value exists, and swaps
//! it for a new one. Generic mass substitution is available for broader
//! rewrites (absolute paths baked into serialized data and the like).

use regex::Regex;

use crate::errors::{AppError, Result};

pub const SECURE_BASE_URL_KEY: &str = "web/secure/base_url";
pub const UNSECURE_BASE_URL_KEY: &str = "web/unsecure/base_url";

/// Replaces the value of a configuration key inside the dump content.
///
/// The key must resolve to exactly one distinct captured value; duplicate
/// identical assignments collapse to one and still succeed, while zero or
/// two-plus distinct values abort with `AppError::MalformedDump`. Returns the
/// updated content and the previous value.
pub fn replace_config_value(
    content: &str,
    key: &str,
    new_value: &str,
) -> Result<(String, String)> {
    let pattern = Regex::new(&format!("'{}','([^']*)'", regex::escape(key)))?;

    let mut values: Vec<&str> = Vec::new();
    for caps in pattern.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            if !values.contains(&m.as_str()) {
                values.push(m.as_str());
            }
        }
    }

    if values.len() != 1 {
        return Err(AppError::MalformedDump {
            key: key.to_string(),
            count: values.len(),
        });
    }

    let current = values[0].to_string();
    let needle = format!("'{}','{}'", key, current);
    let replacement = format!("'{}','{}'", key, new_value);
    Ok((content.replace(&needle, &replacement), current))
}

/// Replaces every literal occurrence of `pattern` with `replacement`.
///
/// The occurrence count is computed by compiling `pattern` as a regex, but
/// the substitution itself is a plain substring swap of the literal pattern
/// text. Zero occurrences is a valid no-op. Returns the updated content and
/// the number of regex matches found beforehand.
pub fn mass_replace(content: &str, pattern: &str, replacement: &str) -> Result<(String, usize)> {
    let regex = Regex::new(pattern)?;
    let occurrences = regex.find_iter(content).count();
    Ok((content.replace(pattern, replacement), occurrences))
}

/// Rewrites both well-known base URL assignments in one go.
///
/// Applies the unsecure URL first, then the secure one. Fails atomically: if
/// either key is missing or ambiguous, no content is returned. The previous
/// `(unsecure, secure)` values come back alongside the updated content.
pub fn rewrite_base_urls(
    content: &str,
    secure_url: &str,
    unsecure_url: &str,
) -> Result<(String, (String, String))> {
    let (content, old_unsecure) =
        replace_config_value(content, UNSECURE_BASE_URL_KEY, unsecure_url)?;
    let (content, old_secure) = replace_config_value(&content, SECURE_BASE_URL_KEY, secure_url)?;
    Ok((content, (old_unsecure, old_secure)))
}
