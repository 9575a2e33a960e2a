//! Field codecs
//!
//! Pure transforms between a field's stored byte buffer and its display
//! text, selected by [`Encoding`]. Encode paths validate the value against
//! the field length before producing bytes; a value that does not fit is a
//! caller-visible error, never a silent truncation. Decode paths expect the
//! buffer to be exactly `field.length` bytes (the transaction engine's
//! length reconciliation guarantees this upstream) and reject anything else.

use tracing::debug;
use uuid::Uuid;

use crate::error::CodecError;
use crate::fields::{Encoding, FieldDef};

/// Byte length of a UUID field
const UUID_LEN: usize = 16;

/// The three leading UUID segments stored byte-swapped by the device
const UUID_SEGMENTS: [(usize, usize); 3] = [(0, 4), (4, 6), (6, 8)];

/// Swap the little/mixed-endian UUID segments
///
/// The device stores the first three UUID segments byte-reversed (4, 2 and
/// 2 bytes); the trailing 8 bytes are kept as-is. Applying the swap twice
/// returns the original bytes.
pub fn swap_uuid_segments(data: &[u8; UUID_LEN]) -> [u8; UUID_LEN] {
    let mut swapped = *data;
    for (start, end) in UUID_SEGMENTS {
        swapped[start..end].reverse();
    }
    swapped
}

/// Encode a display value into the field's stored byte buffer
pub fn encode_field(field: &FieldDef, value: &str) -> Result<Vec<u8>, CodecError> {
    match field.encoding {
        Encoding::Ascii => {
            if !value.is_ascii() {
                return Err(CodecError::NotAscii);
            }
            let raw = value.as_bytes();
            if raw.len() > field.length {
                return Err(CodecError::ValueTooLong {
                    len: raw.len(),
                    max: field.length,
                });
            }
            let mut padded = raw.to_vec();
            padded.resize(field.length, 0);
            Ok(padded)
        }
        Encoding::Uuid => {
            if field.length != UUID_LEN {
                return Err(CodecError::UuidLength(field.length));
            }
            let parsed = Uuid::parse_str(value.trim())
                .map_err(|e| CodecError::InvalidUuid(e.to_string()))?;
            Ok(swap_uuid_segments(parsed.as_bytes()).to_vec())
        }
        Encoding::Mac | Encoding::Hex => parse_byte_string(value, field.length),
        Encoding::BcdDate => {
            let digits: Vec<u8> = value
                .chars()
                .filter_map(|c| c.to_digit(10))
                .map(|d| d as u8)
                .collect();
            if digits.len() != field.length * 2 {
                return Err(CodecError::DigitCount {
                    expected: field.length * 2,
                    got: digits.len(),
                });
            }
            Ok(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
        }
    }
}

/// Decode a field's stored byte buffer into its display value
pub fn decode_field(field: &FieldDef, data: &[u8]) -> Result<String, CodecError> {
    if field.encoding == Encoding::Uuid {
        if data.len() != UUID_LEN {
            return Err(CodecError::UuidLength(data.len()));
        }
    } else if data.len() != field.length {
        return Err(CodecError::BufferLength {
            expected: field.length,
            got: data.len(),
        });
    }

    match field.encoding {
        Encoding::Ascii => {
            let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            Ok(String::from_utf8_lossy(&data[..end]).into_owned())
        }
        Encoding::Uuid => {
            let mut raw = [0u8; UUID_LEN];
            raw.copy_from_slice(data);
            let stored = Uuid::from_bytes(raw);
            let swapped = Uuid::from_bytes(swap_uuid_segments(&raw));
            debug!(stored = %stored, display = %swapped, "uuid segment swap");
            Ok(swapped.to_string())
        }
        Encoding::Mac => Ok(data
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")),
        Encoding::BcdDate => {
            let mut digits = String::with_capacity(data.len() * 2);
            for &b in data {
                let hi = (b >> 4) & 0xF;
                let lo = b & 0xF;
                if hi > 9 || lo > 9 {
                    return Err(CodecError::InvalidBcd(b));
                }
                digits.push(char::from(b'0' + hi));
                digits.push(char::from(b'0' + lo));
            }
            Ok(digits)
        }
        Encoding::Hex => Ok(data
            .iter()
            .map(|b| format!("0x{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")),
    }
}

/// Split a byte-valued input into tokens
///
/// Accepts either separated tokens (space, `:`, `-` or `,`) or a single
/// contiguous run of hex digits (with optional `0x` prefix), which is cut
/// into two-digit tokens.
fn normalize_byte_tokens(value: &str) -> Vec<String> {
    let cleaned = value.replace(['-', ':', ','], " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() == 1 {
        let token = tokens[0];
        let bare = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        // Runs of two hex digits stay a single token so decimal-first
        // parsing still applies to plain numbers like "16"
        if bare.len() > 2 && bare.len() % 2 == 0 && bare.chars().all(|c| c.is_ascii_hexdigit()) {
            return bare
                .as_bytes()
                .chunks(2)
                .map(|pair| format!("0x{}", std::str::from_utf8(pair).unwrap_or_default()))
                .collect();
        }
    }
    tokens.into_iter().map(str::to_string).collect()
}

/// Parse one byte token, accepting decimal first and hex as fallback
fn parse_byte_token(token: &str) -> Result<u8, CodecError> {
    if let Ok(v) = token.parse::<u8>() {
        return Ok(v);
    }
    let bare = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u8::from_str_radix(bare, 16).map_err(|_| CodecError::InvalidByteToken(token.to_string()))
}

/// Parse a byte-valued input into exactly `length` bytes
fn parse_byte_string(value: &str, length: usize) -> Result<Vec<u8>, CodecError> {
    let tokens = normalize_byte_tokens(value);
    if tokens.is_empty() {
        return Err(CodecError::Empty);
    }
    if tokens.len() != length {
        return Err(CodecError::ByteCount {
            expected: length,
            got: tokens.len(),
        });
    }
    tokens.iter().map(|t| parse_byte_token(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::by_name;

    #[test]
    fn ascii_pads_and_trims_at_nul() {
        let f = by_name("project_define").unwrap();
        let bytes = encode_field(f, "P01").unwrap();
        assert_eq!(bytes, b"P01");
        let f = by_name("manufacture_name").unwrap();
        let bytes = encode_field(f, "ExampleMFG").unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..10], b"ExampleMFG");
        assert!(bytes[10..].iter().all(|&b| b == 0));
        assert_eq!(decode_field(f, &bytes).unwrap(), "ExampleMFG");
    }

    #[test]
    fn ascii_rejects_overflow_and_non_ascii() {
        let f = by_name("project_define").unwrap();
        assert_eq!(
            encode_field(f, "TOOLONG"),
            Err(CodecError::ValueTooLong { len: 7, max: 3 })
        );
        assert_eq!(encode_field(f, "é"), Err(CodecError::NotAscii));
    }

    #[test]
    fn ascii_decode_substitutes_invalid_bytes() {
        let f = by_name("project_define").unwrap();
        let text = decode_field(f, &[b'A', 0xFF, b'B']).unwrap();
        assert_eq!(text, "A\u{FFFD}B");
    }

    #[test]
    fn uuid_swap_is_an_involution() {
        let raw: [u8; 16] = [
            0x12, 0x34, 0x56, 0x78, 0x90, 0xAB, 0xCD, 0xEF, 0x12, 0x34, 0x56, 0x78, 0x90, 0xAB,
            0xCD, 0xEF,
        ];
        assert_eq!(swap_uuid_segments(&swap_uuid_segments(&raw)), raw);
    }

    #[test]
    fn uuid_roundtrip_is_canonical() {
        let f = by_name("uuid").unwrap();
        let bytes = encode_field(f, "12345678-90AB-CDEF-1234-567890ABCDEF").unwrap();
        // Leading segments are stored byte-reversed
        assert_eq!(&bytes[..4], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(&bytes[4..6], &[0xAB, 0x90]);
        assert_eq!(&bytes[6..8], &[0xEF, 0xCD]);
        assert_eq!(
            decode_field(f, &bytes).unwrap(),
            "12345678-90ab-cdef-1234-567890abcdef"
        );
    }

    #[test]
    fn uuid_rejects_bad_lengths() {
        let f = by_name("uuid").unwrap();
        let short = f.with_length(4);
        assert_eq!(
            encode_field(&short, "12345678-90ab-cdef-1234-567890abcdef"),
            Err(CodecError::UuidLength(4))
        );
        assert_eq!(decode_field(f, &[0; 4]), Err(CodecError::UuidLength(4)));
    }

    #[test]
    fn mac_accepts_colons_and_contiguous_hex() {
        let f = by_name("mac_address").unwrap();
        let a = encode_field(f, "AA:BB:CC:DD:EE:FF").unwrap();
        let b = encode_field(f, "aabbccddeeff").unwrap();
        assert_eq!(a, b);
        assert_eq!(decode_field(f, &a).unwrap(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn mac_rejects_wrong_octet_count() {
        let f = by_name("mac_address").unwrap();
        assert_eq!(
            encode_field(f, "AA:BB:CC"),
            Err(CodecError::ByteCount {
                expected: 6,
                got: 3
            })
        );
    }

    #[test]
    fn bcd_packs_two_digits_per_byte() {
        let f = by_name("battery_first_use_date").unwrap();
        let bytes = encode_field(f, "20240315").unwrap();
        assert_eq!(bytes, [0x20, 0x24, 0x03, 0x15]);
        assert_eq!(decode_field(f, &bytes).unwrap(), "20240315");
    }

    #[test]
    fn bcd_rejects_digit_count_and_bad_nibbles() {
        let f = by_name("battery_first_use_date").unwrap();
        assert_eq!(
            encode_field(f, "2024"),
            Err(CodecError::DigitCount {
                expected: 8,
                got: 4
            })
        );
        // Non-digit characters are filtered, so a date with separators works
        assert_eq!(
            encode_field(f, "2024-03-15").unwrap(),
            [0x20, 0x24, 0x03, 0x15]
        );
        assert_eq!(
            decode_field(f, &[0x20, 0x24, 0x0A, 0x15]),
            Err(CodecError::InvalidBcd(0x0A))
        );
    }

    #[test]
    fn hex_accepts_decimal_tokens() {
        let f = by_name("country_type").unwrap();
        assert_eq!(encode_field(f, "0x01").unwrap(), [0x01]);
        assert_eq!(encode_field(f, "16").unwrap(), [16]);
        assert_eq!(decode_field(f, &[0x21]).unwrap(), "0x21");
    }

    #[test]
    fn hex_rejects_out_of_range_tokens() {
        let f = by_name("country_type").unwrap();
        assert!(matches!(
            encode_field(f, "0x1FF"),
            Err(CodecError::InvalidByteToken(_))
        ));
        assert_eq!(encode_field(f, "  "), Err(CodecError::Empty));
    }

    #[test]
    fn decode_checks_buffer_length() {
        let f = by_name("mac_address").unwrap();
        assert_eq!(
            decode_field(f, &[0xAA, 0xBB]),
            Err(CodecError::BufferLength {
                expected: 6,
                got: 2
            })
        );
    }
}
