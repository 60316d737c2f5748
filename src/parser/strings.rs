//! String and binary-payload parsers (spec.md §4.6): `parse-string`,
//! `parse-quoted-string`, `parse-escaped-string`, `parse-ip-address`, and
//! `parse-binary-data`.

use super::{clear, copy_truncating, locate_body, ParseError, ParseResult};

/// `parse-string(r, p, buf, cap)`: copy bytes up to (not including) the
/// first CR, LF, or NUL. An immediate terminator (empty result) is
/// `InvalidFormat`.
pub fn parse_string(response: Option<&[u8]>, prefix: Option<&[u8]>, out: &mut [u8]) -> ParseResult<usize> {
    let rest = locate_body(response, prefix)?;
    let end = rest.iter().position(|&b| b == b'\r' || b == b'\n' || b == 0).unwrap_or(rest.len());
    if end == 0 {
        clear(out);
        return Err(ParseError::InvalidFormat);
    }
    copy_truncating(&rest[..end], out)
}

/// `parse-quoted-string(r, p, buf, cap)`: require an opening `"`, copy up
/// to the closing `"`. Missing open or close quote is `InvalidFormat`.
pub fn parse_quoted_string(response: Option<&[u8]>, prefix: Option<&[u8]>, out: &mut [u8]) -> ParseResult<usize> {
    let rest = locate_body(response, prefix)?;
    if rest.first() != Some(&b'"') {
        clear(out);
        return Err(ParseError::InvalidFormat);
    }
    let body = &rest[1..];
    match body.iter().position(|&b| b == b'"') {
        Some(end) => copy_truncating(&body[..end], out),
        None => {
            clear(out);
            Err(ParseError::InvalidFormat)
        }
    }
}

/// `parse-escaped-string(r, p, buf, cap)`: like [`parse_quoted_string`],
/// but `\n \r \t \\ \"` decode to their obvious byte and any other escape
/// copies the following byte raw. Running out of output room mid-string
/// is `BufferTooSmall`; running out of input without a closing quote
/// (while room remained) is `InvalidFormat`.
pub fn parse_escaped_string(response: Option<&[u8]>, prefix: Option<&[u8]>, out: &mut [u8]) -> ParseResult<usize> {
    let rest = locate_body(response, prefix)?;
    if rest.first() != Some(&b'"') {
        clear(out);
        return Err(ParseError::InvalidFormat);
    }

    let mut src = &rest[1..];
    let cap = out.len().saturating_sub(1);
    let mut n = 0;

    loop {
        match src.first() {
            None => {
                terminate_at(out, n);
                return Err(if n >= cap { ParseError::BufferTooSmall } else { ParseError::InvalidFormat });
            }
            Some(b'"') => {
                terminate_at(out, n);
                return Ok(n);
            }
            Some(b'\\') => {
                let decoded = match src.get(1) {
                    Some(b'n') => b'\n',
                    Some(b'r') => b'\r',
                    Some(b't') => b'\t',
                    Some(b'\\') => b'\\',
                    Some(b'"') => b'"',
                    Some(&other) => other,
                    None => {
                        terminate_at(out, n);
                        return Err(ParseError::InvalidFormat);
                    }
                };
                if n >= cap {
                    terminate_at(out, n);
                    return Err(ParseError::BufferTooSmall);
                }
                out[n] = decoded;
                n += 1;
                src = &src[2..];
            }
            Some(&b) => {
                if n >= cap {
                    terminate_at(out, n);
                    return Err(ParseError::BufferTooSmall);
                }
                out[n] = b;
                n += 1;
                src = &src[1..];
            }
        }
    }
}

fn terminate_at(out: &mut [u8], n: usize) {
    if let Some(cap) = out.len().checked_sub(1) {
        out[n.min(cap)] = 0;
    }
}

/// `parse-ip-address(r, p, buf, cap)`: a dotted-quad up to CR/LF/SPACE/
/// NUL, rejecting anything but exactly three dots, 1-3 digits per octet,
/// and octet values of 255 or less.
pub fn parse_ip_address(response: Option<&[u8]>, prefix: Option<&[u8]>, out: &mut [u8]) -> ParseResult<usize> {
    let rest = locate_body(response, prefix)?;
    let end = rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n' || b == b' ' || b == 0)
        .unwrap_or(rest.len());
    let token = &rest[..end];

    let mut dots = 0u32;
    let mut digits_in_octet = 0u32;
    let mut octet_value: u32 = 0;

    for &b in token {
        if b == b'.' {
            if digits_in_octet == 0 {
                clear(out);
                return Err(ParseError::InvalidFormat);
            }
            dots += 1;
            digits_in_octet = 0;
            octet_value = 0;
        } else if b.is_ascii_digit() {
            digits_in_octet += 1;
            if digits_in_octet > 3 {
                clear(out);
                return Err(ParseError::InvalidFormat);
            }
            octet_value = octet_value * 10 + u32::from(b - b'0');
            if octet_value > 255 {
                clear(out);
                return Err(ParseError::InvalidFormat);
            }
        } else {
            clear(out);
            return Err(ParseError::InvalidFormat);
        }
    }
    if dots != 3 || digits_in_octet == 0 {
        clear(out);
        return Err(ParseError::InvalidFormat);
    }

    copy_truncating(token, out)
}

/// `parse-binary-data(r, p, buf, cap, *len)`: if the body starts with a
/// digit, that digit run is a decimal byte count (one optional `,` or
/// `:` separator follows); otherwise every remaining byte is payload.
/// Copies `min(count, remaining, cap)` bytes — raw binary, so unlike the
/// other string parsers this does not null-terminate its output.
pub fn parse_binary_data(response: Option<&[u8]>, prefix: Option<&[u8]>, out: &mut [u8]) -> ParseResult<usize> {
    let rest = locate_body(response, prefix)?;

    let payload = if rest.first().is_some_and(u8::is_ascii_digit) {
        let mut i = 0;
        let mut count: usize = 0;
        while i < rest.len() && rest[i].is_ascii_digit() {
            count = count.saturating_mul(10).saturating_add(usize::from(rest[i] - b'0'));
            i += 1;
        }
        if matches!(rest.get(i), Some(b',') | Some(b':')) {
            i += 1;
        }
        let remaining = &rest[i..];
        &remaining[..count.min(remaining.len())]
    } else {
        rest
    };

    let n = payload.len().min(out.len());
    out[..n].copy_from_slice(&payload[..n]);
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_string_stops_before_cr_and_rejects_empty_result() {
        let mut buf = [0u8; 32];
        let n = parse_string(Some(b"Model: X1\r\n"), Some(b"Model: "), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"X1");
        assert_eq!(
            parse_string(Some(b"Model: \r\n"), Some(b"Model: "), &mut buf).unwrap_err(),
            ParseError::InvalidFormat
        );
    }

    #[test]
    fn parse_quoted_string_matches_spec_scenario() {
        let mut buf = [0u8; 100];
        let n = parse_quoted_string(Some(b"Operator: \"Test Device\""), Some(b"Operator: "), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"Test Device");
    }

    #[test]
    fn parse_quoted_string_rejects_unterminated_quote() {
        let mut buf = [0u8; 16];
        let err = parse_quoted_string(Some(b"X: \"abc"), Some(b"X: "), &mut buf).unwrap_err();
        assert_eq!(err, ParseError::InvalidFormat);
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn parse_escaped_string_decodes_doubled_backslash_but_leaves_plain_text_alone() {
        let mut buf = [0u8; 100];
        let n = parse_escaped_string(Some(b"Path: \"C:\\\\temp\""), Some(b"Path: "), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"C:\\temp");
    }

    #[test]
    fn parse_escaped_string_reports_buffer_too_small_when_it_fills_before_the_close_quote() {
        let mut buf = [0u8; 3];
        let err = parse_escaped_string(Some(b"X: \"abcdef\""), Some(b"X: "), &mut buf).unwrap_err();
        assert_eq!(err, ParseError::BufferTooSmall);
        assert_eq!(&buf, b"ab\0");
    }

    #[test]
    fn parse_ip_address_matches_spec_scenarios() {
        let mut buf = [0u8; 20];
        let n = parse_ip_address(Some(b"IP: 192.168.1.1\r\n"), Some(b"IP: "), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"192.168.1.1");

        let err = parse_ip_address(Some(b"IP: 1.2.3.999"), Some(b"IP: "), &mut buf).unwrap_err();
        assert_eq!(err, ParseError::InvalidFormat);
    }

    #[test]
    fn parse_ip_address_rejects_wrong_dot_count() {
        let mut buf = [0u8; 20];
        let err = parse_ip_address(Some(b"IP: 1.2.3"), Some(b"IP: "), &mut buf).unwrap_err();
        assert_eq!(err, ParseError::InvalidFormat);
    }

    #[test]
    fn parse_binary_data_reads_a_length_prefixed_payload() {
        let mut buf = [0u8; 8];
        let n = parse_binary_data(Some(b"+DATA: 4,\x01\x02\x03\x04rest"), Some(b"+DATA: "), &mut buf).unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3, 4]);
    }

    #[test]
    fn parse_binary_data_without_a_count_takes_everything_remaining() {
        let mut buf = [0u8; 8];
        let n = parse_binary_data(Some(b"+DATA: \x01\x02"), Some(b"+DATA: "), &mut buf).unwrap();
        assert_eq!(&buf[..n], &[1, 2]);
    }
}
