//! Signed/unsigned numeric parsers (spec.md §4.6): `parse-int`,
//! `parse-int-array`, `parse-float`, `parse-hex`, and the `+CME`/`+CMS`
//! error-code extractors that share the same decimal scanner.

use super::{locate_body, skip_sp_ht, find_subslice, ParseError, ParseResult};

/// Scan a leading `[+-]?[0-9]+` run. Returns the value and the number of
/// bytes consumed, or `None` if no digit was found (spec.md: "require
/// sign/digit, else stop").
fn scan_signed_decimal(bytes: &[u8]) -> Option<(i64, usize)> {
    let mut i = 0;
    let negative = match bytes.first() {
        Some(b'+') => {
            i += 1;
            false
        }
        Some(b'-') => {
            i += 1;
            true
        }
        _ => false,
    };
    let digits_start = i;
    let mut value: i64 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value.saturating_mul(10).saturating_add(i64::from(bytes[i] - b'0'));
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    Some((if negative { -value } else { value }, i))
}

/// `parse-int(r, p, delim, *v)`. `delim` is accepted but ignored — a
/// legacy parameter spec.md §4.6 keeps for call-site compatibility with
/// `parse-int-array`. Overflow of the parsed value against `i32`'s range
/// is reported as `ParseError::Overflow` rather than silently wrapping
/// (spec.md §9 Open Question, resolved in favor of an explicit error).
pub fn parse_int(response: Option<&[u8]>, prefix: Option<&[u8]>, _delim: u8) -> ParseResult<i32> {
    let rest = locate_body(response, prefix)?;
    let (value, _consumed) = scan_signed_decimal(rest).ok_or(ParseError::InvalidFormat)?;
    i32::try_from(value).map_err(|_| ParseError::Overflow)
}

/// `parse-int-array(r, p, delim, out[], cap, *n)`. `out.len()` is the
/// array's capacity; the return value is the count written (`*n`).
/// Stops at the first element that doesn't parse or the first missing
/// delimiter, succeeding as long as at least one value was read.
/// Per-element overflow against `i32` saturates rather than aborting the
/// whole array, since spec.md's Open Question addresses the single-value
/// `parse-int` case only.
pub fn parse_int_array(response: Option<&[u8]>, prefix: Option<&[u8]>, delim: u8, out: &mut [i32]) -> ParseResult<usize> {
    let mut rest = locate_body(response, prefix)?;
    let mut n = 0;

    while n < out.len() {
        rest = skip_sp_ht(rest);
        let (value, consumed) = match scan_signed_decimal(rest) {
            Some(pair) => pair,
            None => break,
        };
        out[n] = i32::try_from(value).unwrap_or(if value.is_negative() { i32::MIN } else { i32::MAX });
        n += 1;
        rest = skip_sp_ht(&rest[consumed..]);

        match rest.first() {
            Some(&b) if b == delim => rest = &rest[1..],
            _ => break,
        }
    }

    if n == 0 {
        Err(ParseError::InvalidFormat)
    } else {
        Ok(n)
    }
}

/// `parse-float(r, p, delim, *v)`. Accepts an optional sign, digits, and
/// an optional `.` followed by more digits — anything not matching that
/// shape at the very first character is `InvalidFormat`.
pub fn parse_float(response: Option<&[u8]>, prefix: Option<&[u8]>, _delim: u8) -> ParseResult<f32> {
    let rest = locate_body(response, prefix)?;

    match rest.first() {
        Some(b'+') | Some(b'-') | Some(b'.') => {}
        Some(b) if b.is_ascii_digit() => {}
        _ => return Err(ParseError::InvalidFormat),
    }

    let mut i = 0;
    if matches!(rest.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let mut seen_digit = false;
    while i < rest.len() && rest[i].is_ascii_digit() {
        i += 1;
        seen_digit = true;
    }
    if rest.get(i) == Some(&b'.') {
        i += 1;
        while i < rest.len() && rest[i].is_ascii_digit() {
            i += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return Err(ParseError::InvalidFormat);
    }

    let text = core::str::from_utf8(&rest[..i]).map_err(|_| ParseError::InvalidFormat)?;
    text.parse::<f32>().map_err(|_| ParseError::InvalidFormat)
}

/// `parse-hex(r, p, delim, *v)`. Skips one optional `0x`/`0X`, requires
/// at least one hex digit, parses as unsigned 32-bit.
pub fn parse_hex(response: Option<&[u8]>, prefix: Option<&[u8]>, _delim: u8) -> ParseResult<u32> {
    let mut rest = locate_body(response, prefix)?;
    if rest.len() >= 2 && rest[0] == b'0' && (rest[1] == b'x' || rest[1] == b'X') {
        rest = &rest[2..];
    }

    let mut i = 0;
    let mut value: u64 = 0;
    while i < rest.len() && rest[i].is_ascii_hexdigit() {
        let digit = (rest[i] as char).to_digit(16).expect("checked by is_ascii_hexdigit");
        value = value.saturating_mul(16).saturating_add(u64::from(digit));
        i += 1;
    }
    if i == 0 {
        return Err(ParseError::InvalidFormat);
    }
    u32::try_from(value).map_err(|_| ParseError::Overflow)
}

/// `is-cme-error(r, *code)`: does `"+CME ERROR: "` occur anywhere in
/// `r`, immediately followed by a signed decimal integer? `false` if the
/// marker is absent or no digits follow it; `code` is only written on a
/// `true` result.
pub fn is_cme_error(response: Option<&[u8]>, code: &mut i32) -> bool {
    numbered_error(response, b"+CME ERROR: ", code)
}

/// `is-cms-error(r, *code)`: same contract as [`is_cme_error`] for
/// `"+CMS ERROR: "`.
pub fn is_cms_error(response: Option<&[u8]>, code: &mut i32) -> bool {
    numbered_error(response, b"+CMS ERROR: ", code)
}

fn numbered_error(response: Option<&[u8]>, marker: &[u8], code: &mut i32) -> bool {
    let r = match response {
        Some(r) => r,
        None => return false,
    };
    let pos = match find_subslice(r, marker) {
        Some(pos) => pos,
        None => return false,
    };
    match scan_signed_decimal(&r[pos + marker.len()..]) {
        Some((value, _consumed)) => {
            *code = i32::try_from(value).unwrap_or(if value.is_negative() { i32::MIN } else { i32::MAX });
            true
        }
        None => false,
    }
}
