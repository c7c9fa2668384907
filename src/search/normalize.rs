//! Search key normalization.
//!
//! Generated search data stores every symbol under a lowercase key in which any
//! character outside `[a-z0-9]` (and outside the non-ASCII range) is written as
//! `_` followed by its two-digit hex code. `mouse_position` is stored as
//! `mouse_5fposition`, `MetalBuffer< 2 >` as `metalbuffer_3c_202_20_3e`.
//! Queries go through the same encoding so they can be compared byte-wise.

use std::fmt::Write as _;

/// Returns true for characters stored verbatim in a search key.
const fn is_key_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || (c as u32) >= 0x80
}

/// Normalizes user input into search key form: trimmed, lowercased, escaped.
pub fn normalize(query: &str) -> String {
    let folded = query.trim().to_lowercase();
    let mut key = String::with_capacity(folded.len());
    for c in folded.chars() {
        if is_key_char(c) {
            key.push(c);
        } else {
            // Non-key characters are ASCII, so two hex digits always suffice
            let _ = write!(key, "_{:02x}", c as u32);
        }
    }
    key
}

/// Checks whether a key is already in normalized form.
///
/// A key is normalized when some query normalizes to it: every character is
/// a key character that lowercasing leaves unchanged, or starts a `_hh`
/// escape (two lowercase hex digits) of an ASCII character outside `[a-z0-9]`
/// that is not an uppercase letter either.
pub fn is_normalized(key: &str) -> bool {
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        if c == '_' {
            let escape = (
                chars.next().and_then(lower_hex_value),
                chars.next().and_then(lower_hex_value),
            );
            let (Some(hi), Some(lo)) = escape else {
                return false;
            };
            let escaped = char::from(hi * 16 + lo);
            if !escaped.is_ascii() || escaped.is_ascii_alphanumeric() {
                return false;
            }
        } else if !is_key_char(c) || !is_lowercase_fixed_point(c) {
            return false;
        }
    }
    true
}

/// True if lowercasing `c` yields `c` itself.
fn is_lowercase_fixed_point(c: char) -> bool {
    let mut lower = c.to_lowercase();
    lower.next() == Some(c) && lower.next().is_none()
}

fn lower_hex_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'a'..='f' => Some(c as u8 - b'a' + 10),
        _ => None,
    }
}

/// Reverses the `_hh` escapes of a key for display.
///
/// Malformed escapes are kept as-is.
pub fn decode_key(key: &str) -> String {
    let mut decoded = String::with_capacity(key.len());
    let mut rest = key;
    while let Some(idx) = rest.find('_') {
        decoded.push_str(&rest[..idx]);
        let escape = rest.get(idx + 1..idx + 3);
        match escape.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
            Some(byte) if byte.is_ascii() => {
                decoded.push(char::from(byte));
                rest = &rest[idx + 3..];
            }
            _ => {
                decoded.push('_');
                rest = &rest[idx + 1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}
