//! Decoding of escaped Wine registry data
//!
//! Wine stores non-ASCII and control characters in its `.reg` files as C-style
//! escapes (`\n`, `\x3042`, `\101`, ...). This module turns such a line back
//! into UTF-8. Decoding never fails: unknown escapes pass the escaped character
//! through and a dangling backslash at the end is dropped.

/// Unescape registry data into a `String`
///
/// Byte sequences that are not valid UTF-8 (lone surrogates, or the legacy
/// 5 and 6 byte forms) are replaced by U+FFFD.
pub fn unescape(src: &str) -> String {
    let bytes = unescape_bytes(src);
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Unescape registry data into raw (extended) UTF-8 bytes
pub fn unescape_bytes(src: &str) -> Vec<u8> {
    let bytes = src.as_bytes();
    let mut dest = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 1;
            let Some(&c) = bytes.get(i) else {
                break;
            };

            if let Some(control) = control_char(c) {
                dest.push(control);
                i += 1;
                continue;
            }

            match c {
                b'x' => {
                    i += 1;
                    let (code_point, len) = read_digits(&bytes[i..], 16, 4);
                    if len == 0 {
                        dest.push(b'x');
                    } else {
                        encode_code_point(code_point, &mut dest);
                        i += len;
                    }
                    continue;
                }
                b'0'..=b'7' => {
                    let (code_point, len) = read_digits(&bytes[i..], 8, 3);
                    encode_code_point(code_point, &mut dest);
                    i += len;
                    continue;
                }
                // Unrecognized escape: the next character is copied as-is
                _ => {}
            }
        }

        dest.push(bytes[i]);
        i += 1;
    }

    dest
}

fn control_char(c: u8) -> Option<u8> {
    match c {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'e' => Some(0x1b),
        b'f' => Some(0x0c),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0b),
        _ => None,
    }
}

/// Greedily read up to `max` digits in `radix`, returning the value and the
/// number of bytes consumed
fn read_digits(bytes: &[u8], radix: u32, max: usize) -> (u32, usize) {
    let mut value = 0u32;
    let mut len = 0;
    for &b in bytes.iter().take(max) {
        match (b as char).to_digit(radix) {
            Some(digit) => {
                value = value * radix + digit;
                len += 1;
            }
            None => break,
        }
    }
    (value, len)
}

/// Encode a code point using the original (RFC 2279) UTF-8 ranges
///
/// Values above U+10FFFF still get their 4, 5 or 6 byte form so that data
/// decoded from a registry file is never silently dropped. Anything above
/// 0x7FFFFFFF produces no output.
pub fn encode_code_point(cp: u32, out: &mut Vec<u8>) {
    let continuation = |shift: u32| 0x80 | ((cp >> shift) & 0x3f) as u8;

    match cp {
        0..=0x7f => out.push(cp as u8),
        0x80..=0x7ff => {
            out.push(0xc0 | (cp >> 6) as u8);
            out.push(continuation(0));
        }
        0x800..=0xffff => {
            out.push(0xe0 | (cp >> 12) as u8);
            out.push(continuation(6));
            out.push(continuation(0));
        }
        0x1_0000..=0x1f_ffff => {
            out.push(0xf0 | (cp >> 18) as u8);
            out.push(continuation(12));
            out.push(continuation(6));
            out.push(continuation(0));
        }
        0x20_0000..=0x3ff_ffff => {
            out.push(0xf8 | (cp >> 24) as u8);
            out.push(continuation(18));
            out.push(continuation(12));
            out.push(continuation(6));
            out.push(continuation(0));
        }
        0x400_0000..=0x7fff_ffff => {
            out.push(0xfc | (cp >> 30) as u8);
            out.push(continuation(24));
            out.push(continuation(18));
            out.push(continuation(12));
            out.push(continuation(6));
            out.push(continuation(0));
        }
        _ => {}
    }
}
