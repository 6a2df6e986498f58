use std::{fs, io};

use serdump::{first_line_hex, read_first_line, stream, Record, RecordError};

pub mod common;

/// Hex of `{"a":"aa","b":1,"c":[1,2,3,4]}`.
const SAMPLE_HEX: &str = "7B2261223A226161222C2262223A312C2263223A5B312C322C332C345D7D";

#[test]
fn write_and_read_sample() {
    let target = tempfile::tempdir().unwrap();
    let path = target.path().join("test.data");

    let record = Record::sample();
    record.write_to(&path).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"a\":\"aa\",\"b\":1,\"c\":[1,2,3,4]}\n"
    );

    assert_eq!(Record::read_from(&path).unwrap(), record);
    assert_eq!(first_line_hex(&path).unwrap(), SAMPLE_HEX);
}

#[test]
fn replace_previous_contents() {
    let target = tempfile::tempdir().unwrap();
    let path = target.path().join("test.data");

    fs::write(&path, "x".repeat(1000)).unwrap();

    let record = Record::new("b", -7, Vec::<u8>::new());
    record.write_to(&path).unwrap();

    assert_eq!(Record::read_from(&path).unwrap(), record);
    assert_eq!(read_first_line(&path).unwrap(), br#"{"a":"b","b":-7,"c":[]}"#);
}

#[test]
fn first_line_of_files() {
    let target = tempfile::tempdir().unwrap();
    let path = target.path().join("lines");

    for (contents, line) in [
        (&b""[..], ""),
        (&b"abc"[..], "616263"),
        (&b"ab\ncd\n"[..], "6162"),
        (&b"ab\r\ncd"[..], "6162"),
        (&b"\r\n"[..], ""),
        (&b"\x00\xff\n"[..], "00FF"),
    ] {
        fs::write(&path, contents).unwrap();
        assert_eq!(first_line_hex(&path).unwrap(), line, "{contents:?}");
    }
}

#[test]
fn first_line_of_binary_stream() {
    let target = tempfile::tempdir().unwrap();
    let path = target.path().join("snapshot.ser");

    let data = common::snapshot();
    fs::write(&path, &data).unwrap();

    // The line ends at the first 0x0D byte, which is the length of the
    // class name "java.time.Ser".
    let line = read_first_line(&path).unwrap();
    assert_eq!(line.len(), 168);
    assert_eq!(line[..], data[..168]);
    assert_eq!(data[168], b'\r');

    assert!(first_line_hex(&path)
        .unwrap()
        .starts_with("ACED00057372002F696D2E6163746F72"));

    assert!(matches!(
        stream::parse(&line),
        Err(stream::ParseError::UnexpectedEof { .. })
    ));
}

#[test]
fn missing_file() {
    let target = tempfile::tempdir().unwrap();
    let path = target.path().join("missing");

    match first_line_hex(&path) {
        Err(RecordError::Io(e, p)) => {
            assert_eq!(e.kind(), io::ErrorKind::NotFound);
            assert_eq!(p, path);
        }

        r => panic!("unexpected result: {r:?}"),
    }

    assert!(matches!(
        Record::read_from(&path),
        Err(RecordError::Io(_, _))
    ));
}

#[test]
fn invalid_json() {
    let target = tempfile::tempdir().unwrap();
    let path = target.path().join("test.data");

    fs::write(&path, "{\"a\":\"aa\",\"b\":\"1\"}\n").unwrap();

    match Record::read_from(&path) {
        Err(RecordError::Json(_, p)) => assert_eq!(p, path),
        r => panic!("unexpected result: {r:?}"),
    }
}
