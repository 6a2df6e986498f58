//! Parser for Java object serialization streams.
//!
//! A stream is what `java.io.ObjectOutputStream` writes: the magic
//! number `0xACED`, a version number, and a sequence of content
//! elements (objects, arrays, strings, class descriptors, and blocks of
//! opaque data). The parser builds a [`Value`] tree for each element,
//! without running any code from the classes in the stream.
//!
//! # Examples
//!
//! ```
//! use serdump::stream::{self, Value};
//!
//! // A stream with the string "hi".
//! let data = b"\xAC\xED\x00\x05\x74\x00\x02hi";
//!
//! let stream = stream::parse(data).unwrap();
//! assert_eq!(stream.version, 5);
//! assert_eq!(stream.contents, [Value::String("hi".into())]);
//! ```

mod codes;
mod deserializer;
mod event_handler;
mod input;
#[cfg(test)]
mod tests;

use std::{fmt, rc::Rc};

use serde::Serialize;

pub use codes::{FieldType, RmiMessage, TypeCode};
pub use deserializer::Deserializer;
pub use event_handler::{EventHandler, NoEventHandler};

/// First handle assigned in a stream.
pub const BASE_WIRE_HANDLE: u32 = 0x7E0000;

pub const STREAM_MAGIC: u16 = 0xACED;

pub const STREAM_VERSION: u16 = 5;

/// Errors from [`Deserializer::parse`].
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Unexpected end of stream at offset {offset}.")]
    UnexpectedEof { offset: usize },

    #[error("Invalid stream magic 0x{0:04X}.")]
    InvalidMagic(u16),

    #[error("Unsupported stream version {0}.")]
    UnsupportedVersion(u16),

    #[error("Unexpected type code 0x{code:02X} at offset {offset}, expected {expected}.")]
    UnexpectedTypeCode {
        offset: usize,
        code: u8,
        expected: &'static str,
    },

    #[error("Invalid field type code 0x{code:02X} at offset {offset}.")]
    InvalidFieldType { offset: usize, code: u8 },

    #[error("Invalid flags 0x{flags:02X} for class {class}: {reason}")]
    InvalidClassFlags {
        class: String,
        flags: u8,
        reason: &'static str,
    },

    #[error("Invalid handle 0x{handle:08X} at offset {offset}.")]
    InvalidHandle { offset: usize, handle: u32 },

    #[error("Missing class descriptor at offset {offset}.")]
    MissingClassDesc { offset: usize },

    #[error("Class {0:?} is not an array class.")]
    NotAnArrayClass(String),

    #[error("Negative length {length} at offset {offset}.")]
    NegativeLength { offset: usize, length: i64 },

    #[error("Invalid modified UTF-8 string at offset {offset}.")]
    InvalidUtf { offset: usize },

    #[error("Externalizable class {0} was written without block data.")]
    UnsupportedExternalContents(String),

    #[error("Nesting depth exceeds {0}.")]
    DepthExceeded(usize),
}

/// Parse `data` with the default options.
///
/// See [`Deserializer`] to change them.
pub fn parse(data: &[u8]) -> Result<Stream, ParseError> {
    Deserializer::new(data).parse()
}

/// A parsed stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stream {
    /// RMI message type found before the stream magic.
    pub rmi: Option<u8>,

    pub version: u16,

    /// Top-level content elements, in stream order.
    pub contents: Vec<Value>,
}

impl Stream {
    /// Return the RMI message type, if the stream starts with a known one.
    pub fn rmi_message(&self) -> Option<RmiMessage> {
        self.rmi.and_then(RmiMessage::from_byte)
    }

    /// Return the first top-level object in the stream.
    pub fn first_object(&self) -> Option<&Object> {
        self.contents.iter().find_map(Value::as_object)
    }
}

/// Value of a content element, a field, or an array item.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Byte(i8),
    /// UTF-16 code unit.
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(String),
    Object(Box<Object>),
    Array(Array),
    Enum(Enum),
    /// A `java.lang.Class` instance.
    Class(Rc<ClassDesc>),
    ClassDesc(Rc<ClassDesc>),
    BlockData(#[serde(serialize_with = "crate::hex::serialize")] Vec<u8>),
    /// Handle of a previous element.
    Reference(u32),
    /// Object thrown while the stream was written.
    Exception(Box<Value>),
}

impl Value {
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Flags of a class descriptor (the `SC_*` constants).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassFlags(u8);

impl ClassFlags {
    pub const WRITE_METHOD: ClassFlags = ClassFlags(0x01);
    pub const SERIALIZABLE: ClassFlags = ClassFlags(0x02);
    pub const EXTERNALIZABLE: ClassFlags = ClassFlags(0x04);
    pub const BLOCK_DATA: ClassFlags = ClassFlags(0x08);
    pub const ENUM: ClassFlags = ClassFlags(0x10);

    const NAMES: [(ClassFlags, &'static str); 5] = [
        (ClassFlags::WRITE_METHOD, "SC_WRITE_METHOD"),
        (ClassFlags::SERIALIZABLE, "SC_SERIALIZABLE"),
        (ClassFlags::EXTERNALIZABLE, "SC_EXTERNALIZABLE"),
        (ClassFlags::BLOCK_DATA, "SC_BLOCK_DATA"),
        (ClassFlags::ENUM, "SC_ENUM"),
    ];

    pub fn from_bits(bits: u8) -> Self {
        ClassFlags(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: ClassFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check that the combination of flags is one that
    /// `ObjectOutputStream` can write.
    pub(crate) fn validate(self) -> Result<(), &'static str> {
        if self.contains(Self::SERIALIZABLE) {
            if self.contains(Self::EXTERNALIZABLE) {
                return Err("SC_SERIALIZABLE is not compatible with SC_EXTERNALIZABLE.");
            }

            if self.contains(Self::BLOCK_DATA) {
                return Err("SC_SERIALIZABLE is not compatible with SC_BLOCK_DATA.");
            }
        } else if self.contains(Self::EXTERNALIZABLE) {
            if self.contains(Self::WRITE_METHOD) {
                return Err("SC_EXTERNALIZABLE is not compatible with SC_WRITE_METHOD.");
            }
        } else if self.0 != 0 {
            return Err("must include either SC_SERIALIZABLE or SC_EXTERNALIZABLE.");
        }

        Ok(())
    }
}

impl fmt::Display for ClassFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name);

        if let Some(first) = names.next() {
            f.write_str(first)?;
            names.try_for_each(|name| write!(f, " | {name}"))?;
        }

        Ok(())
    }
}

impl Serialize for ClassFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Description of a class, as written by `ObjectStreamClass`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassDesc {
    pub handle: u32,

    /// Class name. Empty for proxy classes.
    pub name: String,

    pub serial_version_uid: i64,

    pub flags: ClassFlags,

    pub fields: Vec<FieldDesc>,

    /// Interfaces implemented by a proxy class.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    /// `true` if it was read from a `TC_PROXYCLASSDESC` element.
    pub proxy: bool,

    /// Contents written by `annotateClass` or `annotateProxyClass`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Value>,

    pub super_class: Option<Rc<ClassDesc>>,
}

impl ClassDesc {
    /// Iterate over this class and its super classes, starting with
    /// this one.
    pub fn hierarchy(&self) -> impl Iterator<Item = &ClassDesc> {
        std::iter::successors(Some(self), |desc| desc.super_class.as_deref())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Field in a class descriptor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDesc {
    pub field_type: FieldType,

    pub name: String,

    /// Type signature of array and object fields, like
    /// `Ljava/lang/String;`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

/// Instance of a serializable or externalizable class.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Object {
    pub handle: u32,

    #[serde(rename = "class_name", serialize_with = "serialize_class_name")]
    pub class: Rc<ClassDesc>,

    /// Data for each class in the hierarchy that wrote some data,
    /// from the top-most super class down to the class of the object.
    pub class_data: Vec<ClassData>,
}

impl Object {
    /// Return the value of the field `name`.
    ///
    /// If more than one class in the hierarchy has a field with that
    /// name, the one from the most derived class is returned.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.class_data
            .iter()
            .rev()
            .flat_map(|data| data.values.iter())
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// Iterate over the fields of all classes, in stream order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldValue> {
        self.class_data.iter().flat_map(|data| data.values.iter())
    }
}

/// Data written by one class of an object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassData {
    pub class_name: String,

    pub values: Vec<FieldValue>,

    /// Contents written by a custom `writeObject` or `writeExternal`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Array {
    pub handle: u32,

    #[serde(rename = "class_name", serialize_with = "serialize_class_name")]
    pub class: Rc<ClassDesc>,

    pub values: Vec<Value>,
}

impl Array {
    /// Return the items of a `byte[]` array.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        if self.class.name != "[B" {
            return None;
        }

        self.values
            .iter()
            .map(|value| match value {
                Value::Byte(b) => Some(*b as u8),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enum {
    pub handle: u32,

    #[serde(rename = "class_name", serialize_with = "serialize_class_name")]
    pub class: Rc<ClassDesc>,

    pub constant: String,
}

fn serialize_class_name<S: serde::Serializer>(
    class: &Rc<ClassDesc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&class.name)
}

#[test]
fn validate_class_flags() {
    let check = |bits| ClassFlags::from_bits(bits).validate();

    assert!(check(0x00).is_ok());
    assert!(check(0x02).is_ok());
    assert!(check(0x03).is_ok());
    assert!(check(0x12).is_ok());
    assert!(check(0x04).is_ok());
    assert!(check(0x0C).is_ok());

    assert!(check(0x06).is_err());
    assert!(check(0x0A).is_err());
    assert!(check(0x05).is_err());
    assert!(check(0x01).is_err());
    assert!(check(0x08).is_err());
}

#[test]
fn format_class_flags() {
    assert_eq!(
        ClassFlags::from_bits(0x03).to_string(),
        "SC_WRITE_METHOD | SC_SERIALIZABLE"
    );

    assert_eq!(
        ClassFlags::from_bits(0x0C).to_string(),
        "SC_EXTERNALIZABLE | SC_BLOCK_DATA"
    );

    assert_eq!(ClassFlags::from_bits(0x00).to_string(), "");
}
