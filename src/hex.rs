//! Hexadecimal encoding of byte buffers.
//!
//! The output always uses uppercase digits, two per byte, high nibble
//! first. The decoder accepts both cases.

use std::fmt;

/// Digits indexed by nibble value.
const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Errors from [`decode`].
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum HexError {
    #[error("Hex string has an odd length ({0}).")]
    OddLength(usize),

    #[error("Invalid hex digit {digit:?} at position {position}.")]
    InvalidDigit { position: usize, digit: char },
}

/// Encode `data` as hex string.
///
/// # Examples
///
/// ```
/// assert_eq!(serdump::hex::encode([0xAB, 0xCD]), "ABCD");
/// assert_eq!(serdump::hex::encode(b""), "");
/// ```
pub fn encode(data: impl AsRef<[u8]>) -> String {
    let data = data.as_ref();
    let mut output = String::with_capacity(data.len() * 2);

    for &byte in data {
        output.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
        output.push(HEX_DIGITS[usize::from(byte & 0x0F)] as char);
    }

    output
}

/// Decode a hex string. Digits can be uppercase or lowercase.
///
/// # Examples
///
/// ```
/// assert_eq!(serdump::hex::decode("aced0005").unwrap(), [0xAC, 0xED, 0, 5]);
/// ```
pub fn decode(text: impl AsRef<[u8]>) -> Result<Vec<u8>, HexError> {
    let text = text.as_ref();

    if text.len() % 2 != 0 {
        return Err(HexError::OddLength(text.len()));
    }

    let nibble = |position: usize| {
        let digit = text[position];
        match digit {
            b'0'..=b'9' => Ok(digit - b'0'),
            b'a'..=b'f' => Ok(digit - b'a' + 10),
            b'A'..=b'F' => Ok(digit - b'A' + 10),
            _ => Err(HexError::InvalidDigit {
                position,
                digit: char::from(digit),
            }),
        }
    };

    (0..text.len())
        .step_by(2)
        .map(|i| -> Result<u8, HexError> {
            Ok((nibble(i)? << 4) | nibble(i + 1)?)
        })
        .collect()
}

/// Encode a byte buffer as hex string when it is formatted.
pub struct HexString<T>(pub T);

impl<T: AsRef<[u8]>> fmt::Display for HexString<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .as_ref()
            .iter()
            .try_for_each(|byte| write!(f, "{:02X}", byte))
    }
}

impl<T: AsRef<[u8]>> fmt::Debug for HexString<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexString({self})")
    }
}

/// Serde `serialize_with` function to serialize bytes as a hex string.
pub fn serialize<T, S>(data: T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: serde::Serializer,
{
    serializer.collect_str(&HexString(data))
}

#[test]
fn encode_bytes() {
    assert_eq!(encode(b"\x01\x20\xf0"), "0120F0");
    assert_eq!(encode([0u8; 0]), "");
    assert_eq!(encode([0x00]), "00");
    assert_eq!(encode([0xFF]), "FF");
    assert_eq!(encode([0x01, 0x02, 0x03, 0x04]), "01020304");
    assert_eq!(encode([0xAB, 0xCD]), "ABCD");
}

#[test]
fn encode_every_byte() {
    for byte in 0..=u8::MAX {
        let hex = encode([byte]);

        assert_eq!(hex.len(), 2);
        assert_eq!(hex, format!("{byte:02X}"));
        assert!(hex.chars().all(|c| matches!(c, '0'..='9' | 'A'..='F')));
        assert_eq!(decode(&hex).unwrap(), [byte]);
    }
}

#[test]
fn encoded_length_is_twice_the_input() {
    let data: Vec<u8> = (0..=u8::MAX).rev().cycle().take(1000).collect();

    for len in [0, 1, 2, 3, 17, 256, 999, 1000] {
        let hex = encode(&data[..len]);
        assert_eq!(hex.len(), 2 * len);
        assert_eq!(hex, HexString(&data[..len]).to_string());
        assert_eq!(decode(hex).unwrap(), &data[..len]);
    }
}

#[test]
fn decode_mixed_case() {
    assert_eq!(decode("aBcD").unwrap(), [0xAB, 0xCD]);
    assert!(decode("").unwrap().is_empty());
}

#[test]
fn reject_invalid_hex() {
    assert_eq!(decode("ABC"), Err(HexError::OddLength(3)));

    assert_eq!(
        decode("0G"),
        Err(HexError::InvalidDigit {
            position: 1,
            digit: 'G'
        })
    );

    assert_eq!(
        decode(" 0"),
        Err(HexError::InvalidDigit {
            position: 0,
            digit: ' '
        })
    );
}

#[test]
fn serialize_as_hex_string() {
    #[derive(serde::Serialize)]
    struct Block {
        #[serde(serialize_with = "serialize")]
        data: Vec<u8>,
    }

    let json = serde_json::to_string(&Block {
        data: vec![0x0D, 0xF0],
    })
    .unwrap();

    assert_eq!(json, r#"{"data":"0DF0"}"#);
}
