use std::borrow::Cow;

use regex::Regex;

/// Removes every occurrence of the listed characters.
pub fn strip_chars<'a>(value: &'a str, chars: &[char]) -> Cow<'a, str> {
    if value.contains(chars) {
        Cow::Owned(value.chars().filter(|c| !chars.contains(c)).collect())
    } else {
        Cow::Borrowed(value)
    }
}

/// Replaces each run of whitespace or `extra` characters with a single `with`.
pub fn collapse_runs<'a>(value: &'a str, extra: &[char], with: char) -> Cow<'a, str> {
    let is_separator = |c: char| c.is_whitespace() || extra.contains(&c);
    if !value.contains(is_separator) {
        return Cow::Borrowed(value);
    }
    let mut output = String::with_capacity(value.len());
    let mut in_run = false;
    for ch in value.chars() {
        if is_separator(ch) {
            if !in_run {
                output.push(with);
            }
            in_run = true;
        } else {
            output.push(ch);
            in_run = false;
        }
    }
    Cow::Owned(output)
}

/// Trims whitespace around every `delimiter`-separated token.
pub fn trim_tokens(value: &str, delimiter: char) -> Cow<'_, str> {
    let needs_trim = value
        .split(delimiter)
        .any(|token| token.len() != token.trim().len());
    if !needs_trim {
        return Cow::Borrowed(value);
    }
    let mut output = String::with_capacity(value.len());
    for (idx, token) in value.split(delimiter).enumerate() {
        if idx > 0 {
            output.push(delimiter);
        }
        output.push_str(token.trim());
    }
    Cow::Owned(output)
}

/// Prefixes each occurrence of `number` that is not glued to another ASCII
/// letter or digit, so `24-hour` becomes `x24-hour` while `x24` and `240` stay.
pub fn prefix_standalone<'a>(value: &'a str, number: &str, prefix: &str) -> Cow<'a, str> {
    if number.is_empty() || !value.contains(number) {
        return Cow::Borrowed(value);
    }
    let bytes = value.as_bytes();
    let mut output = String::with_capacity(value.len() + prefix.len());
    let mut cursor = 0usize;
    let mut changed = false;
    while let Some(found) = value[cursor..].find(number) {
        let start = cursor + found;
        let end = start + number.len();
        let glued_before = start > 0 && bytes[start - 1].is_ascii_alphanumeric();
        let glued_after = end < bytes.len() && bytes[end].is_ascii_alphanumeric();
        output.push_str(&value[cursor..start]);
        if !glued_before && !glued_after {
            output.push_str(prefix);
            changed = true;
        }
        output.push_str(number);
        cursor = end;
    }
    if !changed {
        return Cow::Borrowed(value);
    }
    output.push_str(&value[cursor..]);
    Cow::Owned(output)
}

/// Applies a regex replacement while avoiding allocation when there are no matches.
pub fn regex_replace<'a>(value: &'a str, regex: &Regex, replacement: &str) -> Cow<'a, str> {
    if regex.is_match(value) {
        Cow::Owned(regex.replace_all(value, replacement).into_owned())
    } else {
        Cow::Borrowed(value)
    }
}
