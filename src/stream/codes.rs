use std::fmt;

/// Generate an enum for a set of single-byte codes, with its
/// `from_byte`, `as_byte`, and `label` functions, and the `Display`
/// and `Serialize` implementations.
macro_rules! byte_codes {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $byte:literal => $label:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Debug)]
        pub enum $name {
            $(
                #[doc = concat!("`", $label, "` (`", stringify!($byte), "`).")]
                $variant,
            )*
        }

        impl $name {
            pub fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some($name::$variant),)*
                    _ => None,
                }
            }

            pub fn as_byte(self) -> u8 {
                match self {
                    $($name::$variant => $byte,)*
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    };
}

byte_codes!(
    /// Type codes for the elements of a stream.
    TypeCode {
        Null = 0x70 => "TC_NULL",
        Reference = 0x71 => "TC_REFERENCE",
        ClassDesc = 0x72 => "TC_CLASSDESC",
        Object = 0x73 => "TC_OBJECT",
        String = 0x74 => "TC_STRING",
        Array = 0x75 => "TC_ARRAY",
        Class = 0x76 => "TC_CLASS",
        BlockData = 0x77 => "TC_BLOCKDATA",
        EndBlockData = 0x78 => "TC_ENDBLOCKDATA",
        Reset = 0x79 => "TC_RESET",
        BlockDataLong = 0x7A => "TC_BLOCKDATALONG",
        Exception = 0x7B => "TC_EXCEPTION",
        LongString = 0x7C => "TC_LONGSTRING",
        ProxyClassDesc = 0x7D => "TC_PROXYCLASSDESC",
        Enum = 0x7E => "TC_ENUM",
    }
);

byte_codes!(
    /// Type of a field in a class descriptor.
    ///
    /// It is also the element type of an array, taken from the second
    /// character of the array class name (like `[B` or `[Ljava.lang.String;`).
    FieldType {
        Byte = b'B' => "byte",
        Char = b'C' => "char",
        Double = b'D' => "double",
        Float = b'F' => "float",
        Int = b'I' => "int",
        Long = b'J' => "long",
        Short = b'S' => "short",
        Boolean = b'Z' => "boolean",
        Array = b'[' => "array",
        Object = b'L' => "object",
    }
);

byte_codes!(
    /// RMI message type that can precede the stream magic.
    RmiMessage {
        Call = 0x50 => "Call",
        ReturnData = 0x51 => "ReturnData",
        Ping = 0x52 => "Ping",
        PingAck = 0x53 => "PingAck",
        DgcAck = 0x54 => "DgcAck",
    }
);

impl FieldType {
    /// `true` if values of this type are read as content elements
    /// instead of fixed-size primitives.
    pub fn is_reference(self) -> bool {
        matches!(self, FieldType::Array | FieldType::Object)
    }
}

#[test]
fn map_bytes_to_codes() {
    assert_eq!(TypeCode::from_byte(0x73), Some(TypeCode::Object));
    assert_eq!(TypeCode::from_byte(0x6F), None);
    assert_eq!(TypeCode::ProxyClassDesc.as_byte(), 0x7D);
    assert_eq!(TypeCode::BlockDataLong.to_string(), "TC_BLOCKDATALONG");

    assert_eq!(FieldType::from_byte(b'J'), Some(FieldType::Long));
    assert_eq!(FieldType::from_byte(b'X'), None);
    assert!(FieldType::Object.is_reference());
    assert!(!FieldType::Int.is_reference());

    assert_eq!(RmiMessage::from_byte(0x52), Some(RmiMessage::Ping));
    assert_eq!(RmiMessage::from_byte(0x55), None);
}
