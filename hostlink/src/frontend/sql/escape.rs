//! ODBC escape clause rewrite.
//!
//! Rewrites `{fn ...}`, `{d '...'}`, `{t '...'}`, `{ts '...'}`,
//! `{call ...}`, `{?= call ...}`, `{oj ...}` and `{escape '...'}` into
//! the host's native syntax before classification. Quoted content is
//! left alone. Text without braces passes through unchanged.

use super::Error;

pub(crate) fn convert(sql: &str, decimal_separator: char) -> Result<String, Error> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' | b'"' => {
                let end = skip_quoted(bytes, pos);
                out.push_str(&sql[pos..end]);
                pos = end;
            }
            b'{' => {
                let close = matching_brace(bytes, pos)?;
                convert_clause(&sql[pos + 1..close], decimal_separator, &mut out)?;
                pos = close + 1;
            }
            b'}' => return Err(Error::UnbalancedEscape),
            _ => {
                let start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b'\'' | b'"' | b'{' | b'}') {
                    pos += 1;
                }
                out.push_str(&sql[start..pos]);
            }
        }
    }

    Ok(out)
}

fn skip_quoted(bytes: &[u8], pos: usize) -> usize {
    let quote = bytes[pos];
    let mut pos = pos + 1;

    while pos < bytes.len() {
        if bytes[pos] == quote {
            if bytes.get(pos + 1) == Some(&quote) {
                pos += 2;
                continue;
            }
            return pos + 1;
        }
        pos += 1;
    }

    bytes.len()
}

/// Index of the `}` closing the brace at `open`.
fn matching_brace(bytes: &[u8], open: usize) -> Result<usize, Error> {
    let mut pos = open + 1;
    let mut depth = 1u32;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' | b'"' => pos = skip_quoted(bytes, pos),
            b'{' => {
                depth += 1;
                pos += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos);
                }
                pos += 1;
            }
            _ => pos += 1,
        }
    }

    Err(Error::UnbalancedEscape)
}

fn convert_clause(inner: &str, decimal_separator: char, out: &mut String) -> Result<(), Error> {
    let trimmed = inner.trim();

    // {?= call procedure(...)}
    if let Some(rest) = trimmed.strip_prefix('?') {
        let rest = rest
            .trim_start()
            .strip_prefix('=')
            .ok_or_else(|| Error::UnsupportedEscape(trimmed.to_string()))?
            .trim_start();

        if rest.len() >= 4 && rest[..4].eq_ignore_ascii_case("call") {
            out.push_str("?=CALL ");
            out.push_str(convert(&rest[4..], decimal_separator)?.trim());
            return Ok(());
        }

        return Err(Error::UnsupportedEscape(trimmed.to_string()));
    }

    let (keyword, rest) = match trimmed.find(|c: char| c.is_ascii_whitespace()) {
        Some(space) => (&trimmed[..space], trimmed[space..].trim_start()),
        None => (trimmed, ""),
    };

    match keyword.to_ascii_lowercase().as_str() {
        // Date, time and timestamp literals: the quoted literal stands
        // on its own in native syntax.
        "d" | "t" | "ts" => {
            out.push_str(rest);
            Ok(())
        }
        "oj" => {
            out.push_str(&convert(rest, decimal_separator)?);
            Ok(())
        }
        "escape" => {
            out.push_str("ESCAPE ");
            out.push_str(rest);
            Ok(())
        }
        "call" => {
            out.push_str("CALL ");
            out.push_str(convert(rest, decimal_separator)?.trim());
            Ok(())
        }
        "fn" => convert_function(rest, decimal_separator, out),
        _ => Err(Error::UnsupportedEscape(trimmed.to_string())),
    }
}

fn convert_function(body: &str, decimal_separator: char, out: &mut String) -> Result<(), Error> {
    let (name, args) = match body.find('(') {
        Some(open) => {
            let close = body.rfind(')').ok_or(Error::UnbalancedEscape)?;
            if close < open {
                return Err(Error::UnbalancedEscape);
            }
            (body[..open].trim(), Some(&body[open + 1..close]))
        }
        None => (body.trim(), None),
    };

    // Registers spelled as functions in the portable syntax.
    let register = match name.to_ascii_lowercase().as_str() {
        "curdate" => Some("CURRENT DATE"),
        "curtime" => Some("CURRENT TIME"),
        "now" => Some("CURRENT TIMESTAMP"),
        "user" => Some("USER"),
        _ => None,
    };

    if let Some(register) = register {
        out.push_str(register);
        return Ok(());
    }

    // Portable function names the host spells differently.
    let native = match name.to_ascii_lowercase().as_str() {
        "ucase" => "UPPER",
        "lcase" => "LOWER",
        "char" => "CHR",
        "truncate" => "TRUNC",
        _ => name,
    };

    out.push_str(native);

    if let Some(args) = args {
        let converted = convert(args, decimal_separator)?;
        out.push('(');
        out.push_str(&apply_decimal_separator(&converted, decimal_separator));
        out.push(')');
    }

    Ok(())
}

/// Substitute the configured decimal separator into numeric literals,
/// outside quoted content.
fn apply_decimal_separator(text: &str, separator: char) -> String {
    if separator == '.' {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' | b'"' => {
                let end = skip_quoted(bytes, pos);
                out.push_str(&text[pos..end]);
                pos = end;
            }
            b'.' => {
                let prev_digit = pos > 0 && bytes[pos - 1].is_ascii_digit();
                let next_digit = bytes
                    .get(pos + 1)
                    .map(|c| c.is_ascii_digit())
                    .unwrap_or(false);

                if prev_digit || next_digit {
                    out.push(separator);
                } else {
                    out.push('.');
                }
                pos += 1;
            }
            _ => {
                let start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b'\'' | b'"' | b'.') {
                    pos += 1;
                }
                out.push_str(&text[start..pos]);
            }
        }
    }

    out
}
