use super::ParseError;

type Result<T> = std::result::Result<T, ParseError>;

/// Cursor over the bytes of a stream. All numbers are big-endian.
pub(super) struct Input<'a> {
    data: &'a [u8],
    position: usize,
}

macro_rules! read_numbers {
    ($($name:ident -> $ty:ty,)*) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                Ok(<$ty>::from_be_bytes(self.read_array()?))
            }
        )*
    };
}

impl<'a> Input<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Input { data, position: 0 }
    }

    /// Offset of the next byte to read.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek(&self) -> Result<u8> {
        self.peek_opt().ok_or(ParseError::UnexpectedEof {
            offset: self.position,
        })
    }

    pub fn peek_opt(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let eof = ParseError::UnexpectedEof {
            offset: self.data.len(),
        };

        if len > self.remaining() {
            return Err(eof);
        }

        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    read_numbers!(
        read_u8 -> u8,
        read_i8 -> i8,
        read_u16 -> u16,
        read_i16 -> i16,
        read_u32 -> u32,
        read_i32 -> i32,
        read_u64 -> u64,
        read_i64 -> i64,
    );

    /// Read a string prefixed by its length as a `u16`.
    pub fn read_utf(&mut self) -> Result<String> {
        let len = self.read_u16()?;
        self.read_modified_utf8(usize::from(len))
    }

    /// Read `len` bytes and decode them as modified UTF-8.
    pub fn read_modified_utf8(&mut self, len: usize) -> Result<String> {
        let offset = self.position;
        let bytes = self.read_bytes(len)?;
        decode_modified_utf8(bytes).ok_or(ParseError::InvalidUtf { offset })
    }
}

/// Decode a modified UTF-8 string.
///
/// Each sequence of 1, 2 or 3 bytes is a UTF-16 code unit, so characters
/// outside the BMP are surrogate pairs. Unpaired surrogates are replaced
/// with `U+FFFD`.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    fn continuation(byte: Option<&u8>) -> Option<u16> {
        let byte = *byte?;
        (byte & 0xC0 == 0x80).then_some(u16::from(byte & 0x3F))
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut bytes = bytes.iter();

    while let Some(&byte) = bytes.next() {
        let unit = match byte {
            0x00..=0x7F => u16::from(byte),

            0xC0..=0xDF => {
                let b = continuation(bytes.next())?;
                (u16::from(byte & 0x1F) << 6) | b
            }

            0xE0..=0xEF => {
                let b = continuation(bytes.next())?;
                let c = continuation(bytes.next())?;
                (u16::from(byte & 0x0F) << 12) | (b << 6) | c
            }

            _ => return None,
        };

        units.push(unit);
    }

    Some(String::from_utf16_lossy(&units))
}

#[test]
fn read_numbers() {
    let mut input = Input::new(b"\x01\xFF\xFF\x00\x00\x00\x2A\x80\x00\x00\x00\x00\x00\x00\x00");

    assert_eq!(input.read_u8().unwrap(), 1);
    assert_eq!(input.read_i16().unwrap(), -1);
    assert_eq!(input.read_u32().unwrap(), 42);
    assert_eq!(input.read_i64().unwrap(), i64::MIN);
    assert!(input.is_empty());

    assert_eq!(input.read_u8(), Err(ParseError::UnexpectedEof { offset: 15 }));
}

#[test]
fn truncated_numbers() {
    let mut input = Input::new(b"\x00\x01\x02");
    assert_eq!(input.read_u32(), Err(ParseError::UnexpectedEof { offset: 3 }));

    // A failed read does not consume anything.
    assert_eq!(input.position(), 0);
    assert_eq!(input.read_u16().unwrap(), 1);
}

#[test]
fn decode_strings() {
    assert_eq!(decode_modified_utf8(b"abc").as_deref(), Some("abc"));
    assert_eq!(decode_modified_utf8(b"").as_deref(), Some(""));

    // NUL is encoded with two bytes.
    assert_eq!(decode_modified_utf8(b"a\xC0\x80b").as_deref(), Some("a\0b"));

    assert_eq!(decode_modified_utf8(b"\xC3\xB1").as_deref(), Some("ñ"));
    assert_eq!(decode_modified_utf8(b"\xE2\x82\xAC").as_deref(), Some("€"));

    // U+1F600 as a surrogate pair.
    assert_eq!(
        decode_modified_utf8(b"\xED\xA0\xBD\xED\xB8\x80").as_deref(),
        Some("\u{1F600}")
    );

    // Unpaired surrogate.
    assert_eq!(
        decode_modified_utf8(b"\xED\xA0\xBD!").as_deref(),
        Some("\u{FFFD}!")
    );
}

#[test]
fn reject_invalid_strings() {
    assert_eq!(decode_modified_utf8(b"\xC3"), None);
    assert_eq!(decode_modified_utf8(b"\xE2\x82"), None);
    assert_eq!(decode_modified_utf8(b"\xE2\x28\xA1"), None);
    assert_eq!(decode_modified_utf8(b"\xF0\x9F\x98\x80"), None);

    let mut input = Input::new(b"\x00\x02\xFFa");
    assert_eq!(input.read_utf(), Err(ParseError::InvalidUtf { offset: 2 }));
}
