use std::rc::Rc;

use super::{
    input::Input, Array, ClassData, ClassDesc, ClassFlags, Enum, EventHandler, FieldDesc,
    FieldType, FieldValue, NoEventHandler, Object, ParseError, Stream, TypeCode, Value,
    BASE_WIRE_HANDLE, STREAM_MAGIC, STREAM_VERSION,
};

type Result<T> = std::result::Result<T, ParseError>;

/// Default value for [`Deserializer::max_depth`].
const DEFAULT_MAX_DEPTH: usize = 128;

/// Entry in the handle table.
enum Handle {
    /// Class descriptor that is still being read.
    Pending,

    ClassDesc(Rc<ClassDesc>),

    String(String),

    /// Any other element. Its value is not needed to parse the
    /// rest of the stream.
    Other,
}

/// Parser for a Java object serialization stream.
///
/// # Examples
///
/// ```
/// # use serdump::stream::*;
/// let data = b"\xAC\xED\x00\x04\x70";
///
/// // Version 4 is accepted by default.
/// let stream = Deserializer::new(data).parse().unwrap();
/// assert_eq!(stream.contents, [Value::Null]);
///
/// let err = Deserializer::new(data).strict_version(true).parse().unwrap_err();
/// assert_eq!(err, ParseError::UnsupportedVersion(4));
/// ```
pub struct Deserializer<'a, E = NoEventHandler> {
    input: Input<'a>,
    event_handler: E,
    strict_version: bool,
    max_depth: usize,
    depth: usize,
    handles: Vec<Handle>,

    /// Number of times the handle table was cleared.
    resets: usize,
}

impl<'a> Deserializer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Deserializer {
            input: Input::new(data),
            event_handler: NoEventHandler,
            strict_version: false,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            handles: Vec::new(),
            resets: 0,
        }
    }
}

impl<'a, E: EventHandler> Deserializer<'a, E> {
    /// Send notifications to `event_handler` while the stream is parsed.
    pub fn event_handler<H: EventHandler>(self, event_handler: H) -> Deserializer<'a, H> {
        Deserializer {
            input: self.input,
            event_handler,
            strict_version: self.strict_version,
            max_depth: self.max_depth,
            depth: self.depth,
            handles: self.handles,
            resets: self.resets,
        }
    }

    /// If `true`, reject streams with a version other than
    /// [`STREAM_VERSION`].
    pub fn strict_version(mut self, strict_version: bool) -> Self {
        self.strict_version = strict_version;
        self
    }

    /// Maximum nesting level of content elements.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the stream header and all content elements until the end
    /// of the input.
    pub fn parse(mut self) -> Result<Stream> {
        let (rmi, version) = self.read_header()?;

        let mut contents = Vec::new();
        loop {
            self.skip_resets()?;

            if self.input.is_empty() {
                break;
            }

            contents.push(self.read_content(true)?);
        }

        Ok(Stream {
            rmi,
            version,
            contents,
        })
    }

    fn read_header(&mut self) -> Result<(Option<u8>, u16)> {
        // The stream may start with the type of an RMI message.
        let rmi = match self.input.peek()? {
            byte if byte != (STREAM_MAGIC >> 8) as u8 => Some(self.input.read_u8()?),
            _ => None,
        };

        let magic = self.input.read_u16()?;
        if magic != STREAM_MAGIC {
            return Err(ParseError::InvalidMagic(magic));
        }

        let version = self.input.read_u16()?;
        if version != STREAM_VERSION && self.strict_version {
            return Err(ParseError::UnsupportedVersion(version));
        }

        self.event_handler.stream_header(rmi, version);

        Ok((rmi, version))
    }

    /// Read a content element.
    ///
    /// Block data is accepted only if `block_data` is `true`.
    fn read_content(&mut self, block_data: bool) -> Result<Value> {
        self.nested(|this| this.read_content_element(block_data))
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_depth {
            return Err(ParseError::DepthExceeded(self.max_depth));
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        result
    }

    fn read_content_element(&mut self, block_data: bool) -> Result<Value> {
        self.skip_resets()?;

        let offset = self.input.position();
        let code = self.input.peek()?;

        let unexpected = ParseError::UnexpectedTypeCode {
            offset,
            code,
            expected: "content element",
        };

        let type_code = TypeCode::from_byte(code).filter(|tc| match tc {
            TypeCode::EndBlockData | TypeCode::Reset => false,
            TypeCode::BlockData | TypeCode::BlockDataLong => block_data,
            _ => true,
        });

        let Some(type_code) = type_code else {
            return Err(unexpected);
        };

        self.event_handler.content(offset, type_code);

        let value = match type_code {
            TypeCode::Null => {
                self.input.read_u8()?;
                Value::Null
            }

            TypeCode::Reference => {
                let handle = self.read_reference()?;
                self.lookup(offset, handle)?;
                Value::Reference(handle)
            }

            TypeCode::ClassDesc | TypeCode::ProxyClassDesc => {
                Value::ClassDesc(self.nested(Self::read_new_class_desc)?)
            }

            TypeCode::Object => Value::Object(Box::new(self.read_new_object()?)),

            TypeCode::String | TypeCode::LongString => Value::String(self.read_new_string()?),

            TypeCode::Array => Value::Array(self.read_new_array()?),

            TypeCode::Class => {
                self.input.read_u8()?;
                let class = self.read_required_class_desc(offset)?;
                self.new_handle(Handle::Other);
                Value::Class(class)
            }

            TypeCode::Enum => Value::Enum(self.read_new_enum()?),

            TypeCode::Exception => {
                self.input.read_u8()?;
                self.reset(offset);
                let throwable = self.read_content(false)?;
                self.reset(offset);
                Value::Exception(Box::new(throwable))
            }

            TypeCode::BlockData | TypeCode::BlockDataLong => {
                Value::BlockData(self.read_block_data()?.to_vec())
            }

            TypeCode::EndBlockData | TypeCode::Reset => return Err(unexpected),
        };

        Ok(value)
    }

    /// Consume all `TC_RESET` elements before the next content element.
    fn skip_resets(&mut self) -> Result<()> {
        while self.input.peek_opt() == Some(TypeCode::Reset.as_byte()) {
            let offset = self.input.position();
            self.input.read_u8()?;
            self.reset(offset);
        }

        Ok(())
    }

    fn reset(&mut self, offset: usize) {
        self.handles.clear();
        self.resets = self.resets.wrapping_add(1);
        self.event_handler.reset(offset);
    }

    fn new_handle(&mut self, entry: Handle) -> u32 {
        let handle = BASE_WIRE_HANDLE + self.handles.len() as u32;
        self.handles.push(entry);
        handle
    }

    fn set_handle(&mut self, handle: u32, entry: Handle) {
        let index = handle.wrapping_sub(BASE_WIRE_HANDLE) as usize;
        if let Some(slot) = self.handles.get_mut(index) {
            *slot = entry;
        }
    }

    fn lookup(&self, offset: usize, handle: u32) -> Result<&Handle> {
        handle
            .checked_sub(BASE_WIRE_HANDLE)
            .and_then(|index| self.handles.get(index as usize))
            .ok_or(ParseError::InvalidHandle { offset, handle })
    }

    /// Read a `TC_REFERENCE` element, and return its handle.
    fn read_reference(&mut self) -> Result<u32> {
        self.input.read_u8()?;
        self.input.read_u32()
    }

    fn read_block_data(&mut self) -> Result<&'a [u8]> {
        let offset = self.input.position();
        let len = match TypeCode::from_byte(self.input.read_u8()?) {
            Some(TypeCode::BlockData) => usize::from(self.input.read_u8()?),
            _ => {
                let len = self.input.read_i32()?;
                usize::try_from(len).map_err(|_| ParseError::NegativeLength {
                    offset,
                    length: len.into(),
                })?
            }
        };

        let data = self.input.read_bytes(len)?;
        self.event_handler.block_data(offset, data);
        Ok(data)
    }

    /// Read contents until a `TC_ENDBLOCKDATA` element.
    fn read_annotation(&mut self) -> Result<Vec<Value>> {
        let mut contents = Vec::new();
        loop {
            self.skip_resets()?;

            if self.input.peek()? == TypeCode::EndBlockData.as_byte() {
                self.input.read_u8()?;
                return Ok(contents);
            }

            contents.push(self.read_content(true)?);
        }
    }

    /// Read a class descriptor. `TC_NULL` is returned as `None`.
    fn read_class_desc(&mut self) -> Result<Option<Rc<ClassDesc>>> {
        let offset = self.input.position();
        let code = self.input.peek()?;

        match TypeCode::from_byte(code) {
            Some(TypeCode::ClassDesc | TypeCode::ProxyClassDesc) => {
                self.nested(Self::read_new_class_desc).map(Some)
            }

            Some(TypeCode::Null) => {
                self.input.read_u8()?;
                Ok(None)
            }

            Some(TypeCode::Reference) => {
                let handle = self.read_reference()?;
                match self.lookup(offset, handle)? {
                    Handle::ClassDesc(desc) => Ok(Some(Rc::clone(desc))),
                    _ => Err(ParseError::InvalidHandle { offset, handle }),
                }
            }

            _ => Err(ParseError::UnexpectedTypeCode {
                offset,
                code,
                expected: "class descriptor",
            }),
        }
    }

    /// Read a class descriptor for an element that requires one.
    fn read_required_class_desc(&mut self, offset: usize) -> Result<Rc<ClassDesc>> {
        self.read_class_desc()?
            .ok_or(ParseError::MissingClassDesc { offset })
    }

    fn read_new_class_desc(&mut self) -> Result<Rc<ClassDesc>> {
        let offset = self.input.position();
        let resets = self.resets;
        let code = self.input.read_u8()?;

        let desc = match TypeCode::from_byte(code) {
            Some(TypeCode::ClassDesc) => {
                let name = self.input.read_utf()?;
                let serial_version_uid = self.input.read_i64()?;
                let handle = self.new_handle(Handle::Pending);

                let flags = ClassFlags::from_bits(self.input.read_u8()?);
                if let Err(reason) = flags.validate() {
                    return Err(ParseError::InvalidClassFlags {
                        class: name,
                        flags: flags.bits(),
                        reason,
                    });
                }

                let count = self.input.read_u16()?;
                let fields = (0..count)
                    .map(|_| self.read_field_desc())
                    .collect::<Result<Vec<_>>>()?;

                ClassDesc {
                    handle,
                    name,
                    serial_version_uid,
                    flags,
                    fields,
                    interfaces: Vec::new(),
                    proxy: false,
                    annotations: self.read_annotation()?,
                    super_class: self.read_class_desc()?,
                }
            }

            Some(TypeCode::ProxyClassDesc) => {
                let handle = self.new_handle(Handle::Pending);

                let count_offset = self.input.position();
                let count = self.input.read_i32()?;
                if count < 0 {
                    return Err(ParseError::NegativeLength {
                        offset: count_offset,
                        length: count.into(),
                    });
                }

                let interfaces = (0..count)
                    .map(|_| self.input.read_utf())
                    .collect::<Result<Vec<_>>>()?;

                ClassDesc {
                    handle,
                    name: String::new(),
                    serial_version_uid: 0,
                    flags: ClassFlags::SERIALIZABLE,
                    fields: Vec::new(),
                    interfaces,
                    proxy: true,
                    annotations: self.read_annotation()?,
                    super_class: self.read_class_desc()?,
                }
            }

            _ => {
                return Err(ParseError::UnexpectedTypeCode {
                    offset,
                    code,
                    expected: "class descriptor",
                })
            }
        };

        let desc = Rc::new(desc);

        // After a reset in the annotations, the slot of the descriptor
        // may belong to a newer element.
        if self.resets == resets {
            self.set_handle(desc.handle, Handle::ClassDesc(Rc::clone(&desc)));
        }

        self.event_handler.class_desc(&desc);

        Ok(desc)
    }

    fn read_field_desc(&mut self) -> Result<FieldDesc> {
        let offset = self.input.position();
        let code = self.input.read_u8()?;
        let field_type =
            FieldType::from_byte(code).ok_or(ParseError::InvalidFieldType { offset, code })?;

        let name = self.input.read_utf()?;

        let class_name = if field_type.is_reference() {
            Some(self.read_string()?)
        } else {
            None
        };

        Ok(FieldDesc {
            field_type,
            name,
            class_name,
        })
    }

    /// Read a new string, or a reference to a previous one.
    fn read_string(&mut self) -> Result<String> {
        let offset = self.input.position();
        let code = self.input.peek()?;

        match TypeCode::from_byte(code) {
            Some(TypeCode::String | TypeCode::LongString) => self.read_new_string(),

            Some(TypeCode::Reference) => {
                let handle = self.read_reference()?;
                match self.lookup(offset, handle)? {
                    Handle::String(s) => Ok(s.clone()),
                    _ => Err(ParseError::InvalidHandle { offset, handle }),
                }
            }

            _ => Err(ParseError::UnexpectedTypeCode {
                offset,
                code,
                expected: "string",
            }),
        }
    }

    fn read_new_string(&mut self) -> Result<String> {
        let offset = self.input.position();
        let code = self.input.read_u8()?;

        let len = match TypeCode::from_byte(code) {
            Some(TypeCode::String) => usize::from(self.input.read_u16()?),

            Some(TypeCode::LongString) => {
                let len = self.input.read_i64()?;
                usize::try_from(len).map_err(|_| ParseError::NegativeLength {
                    offset: offset + 1,
                    length: len,
                })?
            }

            _ => {
                return Err(ParseError::UnexpectedTypeCode {
                    offset,
                    code,
                    expected: "string",
                })
            }
        };

        let value = self.input.read_modified_utf8(len)?;
        self.new_handle(Handle::String(value.clone()));
        Ok(value)
    }

    fn read_new_object(&mut self) -> Result<Object> {
        let offset = self.input.position();
        self.input.read_u8()?;

        let class = self.read_required_class_desc(offset)?;
        let handle = self.new_handle(Handle::Other);
        let class_data = self.read_class_data(&class)?;

        Ok(Object {
            handle,
            class,
            class_data,
        })
    }

    /// Read the data of each class in the hierarchy, starting with the
    /// top-most super class.
    fn read_class_data(&mut self, class: &ClassDesc) -> Result<Vec<ClassData>> {
        let hierarchy: Vec<&ClassDesc> = class.hierarchy().collect();
        let mut class_data = Vec::with_capacity(hierarchy.len());

        for desc in hierarchy.into_iter().rev() {
            let flags = desc.flags;

            let mut data = ClassData {
                class_name: desc.name.clone(),
                values: Vec::with_capacity(desc.fields.len()),
                annotations: Vec::new(),
            };

            if flags.contains(ClassFlags::SERIALIZABLE) {
                for field in &desc.fields {
                    let value = self.read_value(field.field_type)?;
                    self.event_handler.field_value(&desc.name, field, &value);

                    data.values.push(FieldValue {
                        name: field.name.clone(),
                        value,
                    });
                }

                if flags.contains(ClassFlags::WRITE_METHOD) {
                    data.annotations = self.read_annotation()?;
                }
            } else if flags.contains(ClassFlags::EXTERNALIZABLE) {
                // Without block data, the length of the external contents
                // is only known to the class.
                if !flags.contains(ClassFlags::BLOCK_DATA) {
                    return Err(ParseError::UnsupportedExternalContents(
                        desc.name.clone(),
                    ));
                }

                data.annotations = self.read_annotation()?;
            } else {
                continue;
            }

            class_data.push(data);
        }

        Ok(class_data)
    }

    /// Read a field value or an array item.
    fn read_value(&mut self, field_type: FieldType) -> Result<Value> {
        let value = match field_type {
            FieldType::Byte => Value::Byte(self.input.read_i8()?),
            FieldType::Char => Value::Char(self.input.read_u16()?),
            FieldType::Double => Value::Double(f64::from_bits(self.input.read_u64()?)),
            FieldType::Float => Value::Float(f32::from_bits(self.input.read_u32()?)),
            FieldType::Int => Value::Int(self.input.read_i32()?),
            FieldType::Long => Value::Long(self.input.read_i64()?),
            FieldType::Short => Value::Short(self.input.read_i16()?),
            FieldType::Boolean => Value::Boolean(self.input.read_u8()? != 0),
            FieldType::Array | FieldType::Object => self.read_content(false)?,
        };

        Ok(value)
    }

    fn read_new_array(&mut self) -> Result<Array> {
        let offset = self.input.position();
        self.input.read_u8()?;

        let class = self.read_required_class_desc(offset)?;

        let element_type = match class.name.as_bytes() {
            [b'[', code, ..] => FieldType::from_byte(*code)
                .ok_or(ParseError::InvalidFieldType { offset, code: *code })?,
            _ => return Err(ParseError::NotAnArrayClass(class.name.clone())),
        };

        let handle = self.new_handle(Handle::Other);

        let size_offset = self.input.position();
        let size = self.input.read_i32()?;
        let size = usize::try_from(size).map_err(|_| ParseError::NegativeLength {
            offset: size_offset,
            length: size.into(),
        })?;

        // Every item needs at least one byte.
        if size > self.input.remaining() {
            return Err(ParseError::UnexpectedEof {
                offset: self.input.position() + self.input.remaining(),
            });
        }

        let values = (0..size)
            .map(|_| self.read_value(element_type))
            .collect::<Result<Vec<_>>>()?;

        Ok(Array {
            handle,
            class,
            values,
        })
    }

    fn read_new_enum(&mut self) -> Result<Enum> {
        let offset = self.input.position();
        self.input.read_u8()?;

        let class = self.read_required_class_desc(offset)?;
        let handle = self.new_handle(Handle::Other);
        let constant = self.read_string()?;

        Ok(Enum {
            handle,
            class,
            constant,
        })
    }
}
