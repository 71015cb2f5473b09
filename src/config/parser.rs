//! Parser for the INI-style repository config file.

use super::Config;
use crate::error::{Error, Result};

/// Parses config file content into a `Config`.
///
/// Lines are either blank, comments (`#` or `;`), section headers
/// (`[section]`), or `key = value` pairs inside a section.
pub fn parse(content: &str) -> Result<Config> {
    let mut config = Config::new();
    let mut current_section: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        let line_no = index + 1;

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            let section = parse_section_header(line).ok_or_else(|| {
                Error::InvalidConfig(format!("line {}: malformed section header", line_no))
            })?;
            current_section = Some(section);
            continue;
        }

        let section = current_section.as_deref().ok_or_else(|| {
            Error::InvalidConfig(format!("line {}: key outside of a section", line_no))
        })?;

        let (key, value) = parse_key_value(line).ok_or_else(|| {
            Error::InvalidConfig(format!("line {}: expected `key = value`", line_no))
        })?;
        config.set(section, &key, &value);
    }

    Ok(config)
}

/// Parses a section header like `[core]`.
fn parse_section_header(line: &str) -> Option<String> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();

    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.') {
        return None;
    }

    Some(inner.to_string())
}

/// Parses a key-value line like `key = value` or `key=value`.
fn parse_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();

    if key.is_empty() {
        return None;
    }

    Some((key.to_string(), parse_value(value)))
}

/// Parses a value, handling quotes, inline comments and escapes.
fn parse_value(s: &str) -> String {
    let s = remove_inline_comment(s.trim());

    if let Some(quoted) = s.strip_prefix('"') {
        if let Some(end) = quoted.find('"') {
            return unescape_value(&quoted[..end]);
        }
    }

    unescape_value(s)
}

/// Strips a `#` or `;` comment that is not inside quotes.
fn remove_inline_comment(s: &str) -> &str {
    let mut in_quotes = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' => escape_next = true,
            '"' => in_quotes = !in_quotes,
            '#' | ';' if !in_quotes => return s[..i].trim_end(),
            _ => {}
        }
    }

    s
}

fn unescape_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            _ => {
                result.push(c);
                continue;
            }
        }
        chars.next();
    }

    result
}
