//! Hex dumps of persisted records, and a parser for Java object
//! serialization streams.

pub mod hex;
pub mod record;
pub mod stream;

pub use record::{first_line_hex, read_first_line, Record, RecordError};
pub use stream::{Deserializer, EventHandler, NoEventHandler, ParseError, Stream, Value};
