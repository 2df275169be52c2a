// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP string literal decoding (ISO 10303-21 control directives).
//!
//! Handles `''`, `\\`, `\S\c`, `\X\hh`, `\X2\…\X0\`, `\X4\…\X0\` and drops
//! `\Px\` code-page switches. Malformed directives are kept verbatim.

use std::borrow::Cow;

/// Decode a raw STEP string body (without the surrounding quotes).
pub fn decode_step_string(raw: &str) -> Cow<'_, str> {
    if memchr::memchr(b'\\', raw.as_bytes()).is_none() && !raw.contains("''") {
        return Cow::Borrowed(raw);
    }

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => {
                out.push('\'');
                i += 2;
            }
            b'\\' => match decode_directive(raw, i) {
                Some((decoded, consumed)) => {
                    out.push_str(&decoded);
                    i += consumed;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            _ => {
                // Copy the run up to the next special byte in one go.
                let next = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\\' || b == b'\'')
                    .map(|p| i + p.max(1))
                    .unwrap_or(bytes.len());
                out.push_str(&raw[i..next]);
                i = next;
            }
        }
    }

    Cow::Owned(out)
}

/// Decode one directive starting at the backslash at `start`.
/// Returns the decoded text and the number of bytes consumed.
fn decode_directive(raw: &str, start: usize) -> Option<(String, usize)> {
    let rest = &raw[start..];

    if rest.starts_with("\\\\") {
        return Some(("\\".to_string(), 2));
    }
    if let Some(tail) = rest.strip_prefix("\\S\\") {
        let c = tail.chars().next()?;
        let code = u32::from(c).checked_add(128)?;
        return Some((char::from_u32(code)?.to_string(), 3 + c.len_utf8()));
    }
    if rest.len() >= 4 && rest.starts_with("\\P") && rest.as_bytes()[3] == b'\\' {
        return Some((String::new(), 4));
    }
    if let Some(tail) = rest.strip_prefix("\\X2\\") {
        let end = tail.find("\\X0\\")?;
        let units = hex_units(&tail[..end], 4)?;
        let units: Vec<u16> = units.into_iter().map(|u| u as u16).collect();
        return Some((String::from_utf16(&units).ok()?, 4 + end + 4));
    }
    if let Some(tail) = rest.strip_prefix("\\X4\\") {
        let end = tail.find("\\X0\\")?;
        let decoded = hex_units(&tail[..end], 8)?
            .into_iter()
            .map(char::from_u32)
            .collect::<Option<String>>()?;
        return Some((decoded, 4 + end + 4));
    }
    if let Some(tail) = rest.strip_prefix("\\X\\") {
        let code = u8::from_str_radix(tail.get(..2)?, 16).ok()?;
        return Some((char::from(code).to_string(), 5));
    }

    None
}

/// Split a hex run into fixed-width code units.
fn hex_units(hex: &str, width: usize) -> Option<Vec<u32>> {
    if hex.len() % width != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(width)
        .map(|i| u32::from_str_radix(hex.get(i..i + width)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_is_borrowed() {
        assert!(matches!(decode_step_string("Basic Wall"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_doubled_quote() {
        assert_eq!(decode_step_string("it''s"), "it's");
    }

    #[test]
    fn test_unicode_directives() {
        assert_eq!(decode_step_string("Tabique \\X2\\00E1\\X0\\rido"), "Tabique árido");
        assert_eq!(decode_step_string("\\X2\\00FC00DF\\X0\\"), "üß");
        assert_eq!(decode_step_string("\\X4\\0001F600\\X0\\"), "\u{1F600}");
        assert_eq!(decode_step_string("Espa\\X\\F1ol"), "Español");
        assert_eq!(decode_step_string("\\S\\d"), "ä");
    }

    #[test]
    fn test_backslash_and_malformed() {
        assert_eq!(decode_step_string("a\\\\b"), "a\\b");
        assert_eq!(decode_step_string("\\PA\\x"), "x");
        assert_eq!(decode_step_string("C:\\temp"), "C:\\temp");
    }
}
