//! `.properties` catalog parser.
//!
//! Supports `key=value`, `key: value` and `key value` pairs, `#`/`!`
//! comments, trailing-backslash continuation lines, and the `\t \n \r \f
//! \\ \= \: \uXXXX` escapes (UTF-16 surrogate pairs included). Later
//! duplicates overwrite earlier ones.

use std::collections::HashMap;

/// Parses a catalog. The error string names the offending line.
pub fn parse(text: &str) -> Result<HashMap<String, String>, String> {
    let mut entries = HashMap::new();
    let mut lines = text.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let line = raw.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = String::from(line);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_pair(&logical);
        let key = unescape(key).map_err(|e| format!("line {}: {e}", idx + 1))?;
        let value = unescape(value).map_err(|e| format!("line {}: {e}", idx + 1))?;
        entries.insert(key, value);
    }

    Ok(entries)
}

/// An odd run of trailing backslashes escapes the newline.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits at the first unescaped `=`, `:` or whitespace.
fn split_pair(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map_or(rest, str::trim_start);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => out.push(unicode_escape(&mut chars)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Decodes the digits after `\u`. A high surrogate must be followed by a
/// `\u` low surrogate; the pair forms one non-BMP char.
fn unicode_escape(chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    let high = hex4(chars)?;
    if !(0xD800..=0xDBFF).contains(&high) {
        return char::from_u32(high).ok_or_else(|| format!("lone surrogate \\u{high:04X}"));
    }

    let mut lookahead = chars.clone();
    if lookahead.next() != Some('\\') || lookahead.next() != Some('u') {
        return Err(format!("unpaired surrogate \\u{high:04X}"));
    }
    let low = hex4(&mut lookahead)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err(format!("unpaired surrogate \\u{high:04X}"));
    }
    *chars = lookahead;

    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or_else(|| format!("bad surrogate pair \\u{high:04X}\\u{low:04X}"))
}

fn hex4(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
    let hex: String = chars.by_ref().take(4).collect();
    u32::from_str_radix(&hex, 16)
        .ok()
        .filter(|_| hex.len() == 4)
        .ok_or_else(|| format!("malformed \\u escape {hex:?}"))
}
