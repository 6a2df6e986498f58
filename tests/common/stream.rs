use serdump::stream::{TypeCode, STREAM_MAGIC, STREAM_VERSION};

/// Builder to write streams in the format of `ObjectOutputStream`.
///
/// Each method appends the bytes of one element of the grammar. The
/// caller is responsible for the structure of the stream.
pub struct StreamBuilder {
    data: Vec<u8>,
}

/// Field of a class descriptor.
pub struct Field<'a> {
    type_code: u8,
    name: &'a str,
    class_name: Option<ClassName<'a>>,
}

enum ClassName<'a> {
    New(&'a str),
    Ref(u32),
}

impl<'a> Field<'a> {
    pub fn primitive(type_code: u8, name: &'a str) -> Self {
        Field {
            type_code,
            name,
            class_name: None,
        }
    }

    /// Object or array field with a new string for its class name.
    pub fn object(type_code: u8, name: &'a str, class_name: &'a str) -> Self {
        Field {
            type_code,
            name,
            class_name: Some(ClassName::New(class_name)),
        }
    }

    /// Object or array field, with a reference to a previous string
    /// for its class name.
    pub fn object_ref(type_code: u8, name: &'a str, handle: u32) -> Self {
        Field {
            type_code,
            name,
            class_name: Some(ClassName::Ref(handle)),
        }
    }
}

impl StreamBuilder {
    /// Start a stream with the magic number and the current version.
    pub fn new() -> Self {
        StreamBuilder::with_version(STREAM_VERSION)
    }

    pub fn with_version(version: u16) -> Self {
        StreamBuilder { data: Vec::new() }
            .short(STREAM_MAGIC)
            .short(version)
    }

    /// Start a stream with no header.
    pub fn empty() -> Self {
        StreamBuilder { data: Vec::new() }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    pub fn bytes(mut self, data: impl AsRef<[u8]>) -> Self {
        self.data.extend_from_slice(data.as_ref());
        self
    }

    pub fn byte(self, byte: u8) -> Self {
        self.bytes([byte])
    }

    pub fn code(self, type_code: TypeCode) -> Self {
        self.byte(type_code.as_byte())
    }

    pub fn short(self, value: u16) -> Self {
        self.bytes(value.to_be_bytes())
    }

    pub fn int(self, value: i32) -> Self {
        self.bytes(value.to_be_bytes())
    }

    pub fn long(self, value: i64) -> Self {
        self.bytes(value.to_be_bytes())
    }

    /// String with a `u16` length. Only ASCII is expected.
    pub fn utf(self, s: &str) -> Self {
        self.short(s.len() as u16).bytes(s)
    }

    pub fn string(self, s: &str) -> Self {
        self.code(TypeCode::String).utf(s)
    }

    pub fn long_string(self, s: &str) -> Self {
        self.code(TypeCode::LongString)
            .long(s.len() as i64)
            .bytes(s)
    }

    pub fn null(self) -> Self {
        self.code(TypeCode::Null)
    }

    pub fn reference(self, handle: u32) -> Self {
        self.code(TypeCode::Reference).bytes(handle.to_be_bytes())
    }

    pub fn end(self) -> Self {
        self.code(TypeCode::EndBlockData)
    }

    pub fn reset(self) -> Self {
        self.code(TypeCode::Reset)
    }

    pub fn block_data(self, data: &[u8]) -> Self {
        if data.len() <= usize::from(u8::MAX) {
            self.code(TypeCode::BlockData)
                .byte(data.len() as u8)
                .bytes(data)
        } else {
            self.code(TypeCode::BlockDataLong)
                .int(data.len() as i32)
                .bytes(data)
        }
    }

    /// Write a `TC_CLASSDESC` element, up to its fields.
    ///
    /// The class annotation and the super class descriptor must follow.
    pub fn class_desc(mut self, name: &str, uid: i64, flags: u8, fields: &[Field]) -> Self {
        self = self
            .code(TypeCode::ClassDesc)
            .utf(name)
            .long(uid)
            .byte(flags)
            .short(fields.len() as u16);

        for field in fields {
            self = self.byte(field.type_code).utf(field.name);

            self = match field.class_name {
                Some(ClassName::New(class_name)) => self.string(class_name),
                Some(ClassName::Ref(handle)) => self.reference(handle),
                None => self,
            };
        }

        self
    }

    /// Write a class descriptor with no annotations and no super class.
    pub fn simple_class_desc(self, name: &str, uid: i64, flags: u8, fields: &[Field]) -> Self {
        self.class_desc(name, uid, flags, fields).end().null()
    }

    /// Write a `TC_PROXYCLASSDESC` element, up to its interfaces.
    pub fn proxy_class_desc(mut self, interfaces: &[&str]) -> Self {
        self = self
            .code(TypeCode::ProxyClassDesc)
            .int(interfaces.len() as i32);

        for interface in interfaces {
            self = self.utf(interface);
        }

        self
    }
}
