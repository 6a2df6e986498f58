use super::{ClassDesc, FieldDesc, TypeCode, Value};

/// Handler to receive notifications for events while a stream is parsed.
///
/// All methods are optional.
#[expect(unused_variables)]
pub trait EventHandler {
    /// The stream header was read.
    ///
    /// `rmi` is the RMI message type before the magic number, if any.
    fn stream_header(&self, rmi: Option<u8>, version: u16) {}

    /// A content element, identified by `type_code`, starts at `offset`.
    fn content(&self, offset: usize, type_code: TypeCode) {}

    /// A new class descriptor was read, including its super classes.
    fn class_desc(&self, desc: &ClassDesc) {}

    /// The value of a field in the class data of an object.
    fn field_value(&self, class_name: &str, field: &FieldDesc, value: &Value) {}

    /// A block of opaque data, written by a custom `writeObject` or
    /// `writeExternal` method.
    fn block_data(&self, offset: usize, data: &[u8]) {}

    /// The handle table was cleared by a `TC_RESET` or `TC_EXCEPTION`
    /// element.
    fn reset(&self, offset: usize) {}
}

/// [`EventHandler`] instance to ignore all events.
pub struct NoEventHandler;

impl EventHandler for NoEventHandler {}

impl<E: EventHandler> EventHandler for &E {
    fn stream_header(&self, rmi: Option<u8>, version: u16) {
        (**self).stream_header(rmi, version)
    }

    fn content(&self, offset: usize, type_code: TypeCode) {
        (**self).content(offset, type_code)
    }

    fn class_desc(&self, desc: &ClassDesc) {
        (**self).class_desc(desc)
    }

    fn field_value(&self, class_name: &str, field: &FieldDesc, value: &Value) {
        (**self).field_value(class_name, field, value)
    }

    fn block_data(&self, offset: usize, data: &[u8]) {
        (**self).block_data(offset, data)
    }

    fn reset(&self, offset: usize) {
        (**self).reset(offset)
    }
}
