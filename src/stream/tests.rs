use super::{parse, ParseError, Value, BASE_WIRE_HANDLE};

/// Build a stream from the hex digits of its contents.
fn stream(contents: &str) -> Vec<u8> {
    let contents: String = contents.split_whitespace().collect();
    crate::hex::decode(format!("ACED0005{contents}")).unwrap()
}

#[test]
fn class_name_from_string_handle() {
    let data = stream(
        "74 0005 4C466F6F3B
         72 0001 41 0000000000000000 02 0001
            4C 0001 66 71 007E0000
            78 70",
    );

    let parsed = parse(&data).unwrap();
    assert_eq!(parsed.contents[0], Value::String("LFoo;".into()));

    let Value::ClassDesc(desc) = &parsed.contents[1] else {
        panic!("unexpected value {:?}", parsed.contents[1]);
    };

    assert_eq!(desc.handle, BASE_WIRE_HANDLE + 1);
    assert_eq!(
        desc.field("f").and_then(|f| f.class_name.as_deref()),
        Some("LFoo;")
    );
}

#[test]
fn exception_discards_handles() {
    let data = stream("74 0001 61 7B 74 0001 62");
    let parsed = parse(&data).unwrap();
    assert_eq!(
        parsed.contents,
        [
            Value::String("a".into()),
            Value::Exception(Box::new(Value::String("b".into()))),
        ]
    );

    // The string "b" is written after the first reset, but the table is
    // cleared again when the exception ends.
    let data = stream("74 0001 61 7B 74 0001 62 71 007E0000");
    assert_eq!(
        parse(&data),
        Err(ParseError::InvalidHandle {
            offset: 13,
            handle: BASE_WIRE_HANDLE
        })
    );
}

#[test]
fn reference_to_pending_class() {
    // The super class of "A" is a reference to "A" itself.
    let data = stream("72 0001 41 0000000000000000 02 0000 78 71 007E0000");

    assert_eq!(
        parse(&data),
        Err(ParseError::InvalidHandle {
            offset: 20,
            handle: BASE_WIRE_HANDLE
        })
    );
}

#[test]
fn reset_in_class_annotation() {
    let data = stream("72 0001 41 0000000000000000 02 0000 79 78 70");

    let parsed = parse(&data).unwrap();
    let Value::ClassDesc(desc) = &parsed.contents[0] else {
        panic!("unexpected value {:?}", parsed.contents[0]);
    };

    assert_eq!(desc.name, "A");
    assert_eq!(desc.handle, BASE_WIRE_HANDLE);
    assert!(desc.annotations.is_empty());

    // The descriptor was not added to the table after the reset.
    let data = stream("72 0001 41 0000000000000000 02 0000 79 78 70 71 007E0000");
    assert_eq!(
        parse(&data),
        Err(ParseError::InvalidHandle {
            offset: 22,
            handle: BASE_WIRE_HANDLE
        })
    );
}

#[test]
fn reset_keeps_newer_handles() {
    // After the reset, the string "b" takes the slot of the pending
    // descriptor "A".
    let data = stream("72 0001 41 0000000000000000 02 0000 79 74 0001 62 78 70");

    let parsed = parse(&data).unwrap();
    let Value::ClassDesc(desc) = &parsed.contents[0] else {
        panic!("unexpected value {:?}", parsed.contents[0]);
    };

    assert_eq!(desc.handle, BASE_WIRE_HANDLE);
    assert_eq!(desc.annotations, [Value::String("b".into())]);

    // The handle still refers to the string, so it is not a valid
    // class descriptor.
    let data = stream("72 0001 41 0000000000000000 02 0000 79 74 0001 62 78 70 73 71 007E0000");
    assert_eq!(
        parse(&data),
        Err(ParseError::InvalidHandle {
            offset: 27,
            handle: BASE_WIRE_HANDLE
        })
    );

    // And it can be used where a string is expected.
    let data = stream(
        "72 0001 41 0000000000000000 02 0000 79 74 0001 62 78 70
         72 0001 42 0000000000000000 02 0001
            4C 0001 66 71 007E0000
            78 70",
    );

    let parsed = parse(&data).unwrap();
    let Value::ClassDesc(desc) = &parsed.contents[1] else {
        panic!("unexpected value {:?}", parsed.contents[1]);
    };

    assert_eq!(
        desc.field("f").and_then(|f| f.class_name.as_deref()),
        Some("b")
    );
}
