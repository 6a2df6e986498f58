use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("I/O error in {1}: {0}")]
    Io(io::Error, PathBuf),

    #[error("Invalid JSON in {1}: {0}")]
    Json(serde_json::Error, PathBuf),
}

macro_rules! try_io {
    ($path:expr, $e:expr $(,)?) => {
        $e.map_err(|e| RecordError::Io(io::Error::from(e), $path.into()))?
    };
}

/// Sample record persisted by the `dump` example.
///
/// It is stored as a single line of JSON.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct Record {
    pub a: String,
    pub b: i32,
    pub c: Vec<u8>,
}

impl Record {
    pub fn new(a: impl Into<String>, b: i32, c: impl Into<Vec<u8>>) -> Self {
        Record {
            a: a.into(),
            b,
            c: c.into(),
        }
    }

    /// Record with `a = "aa"`, `b = 1` and `c = [1, 2, 3, 4]`.
    pub fn sample() -> Self {
        Record::new("aa", 1, [1u8, 2, 3, 4])
    }

    /// Write the record to `path`, replacing its previous contents.
    pub fn write_to(&self, path: &Path) -> Result<(), RecordError> {
        let mut output = BufWriter::new(try_io!(path, File::create(path)));

        serde_json::to_writer(&mut output, self)
            .map_err(|e| RecordError::Json(e, path.to_owned()))?;

        try_io!(path, output.write_all(b"\n"));
        try_io!(path, output.flush());

        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, RecordError> {
        let input = BufReader::new(try_io!(path, File::open(path)));
        serde_json::from_reader(input).map_err(|e| RecordError::Json(e, path.to_owned()))
    }
}

/// Read the raw bytes of the first line in the file at `path`.
///
/// The line ends at the first `\n`, `\r` or `\r\n`, and the terminator
/// is not included. The bytes are returned as they are in the file,
/// with no text decoding.
pub fn read_first_line(path: &Path) -> Result<Vec<u8>, RecordError> {
    let file = try_io!(path, File::open(path));
    Ok(try_io!(path, first_line(BufReader::new(file))))
}

/// Read the first line of `path` and encode it as a hex string.
pub fn first_line_hex(path: &Path) -> Result<String, RecordError> {
    read_first_line(path).map(crate::hex::encode)
}

fn first_line<R: BufRead>(reader: R) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();

    for byte in reader.bytes() {
        match byte? {
            b'\n' | b'\r' => break,
            b => line.push(b),
        }
    }

    Ok(line)
}

#[test]
fn split_first_line() {
    macro_rules! check {
        ($input:expr, $line:expr) => {
            assert_eq!(first_line(&$input[..]).unwrap(), $line)
        };
    }

    check!(b"", b"");
    check!(b"abc", b"abc");
    check!(b"abc\ndef", b"abc");
    check!(b"abc\r\ndef", b"abc");
    check!(b"abc\rdef", b"abc");
    check!(b"\nabc", b"");
    check!(b"\xac\xed\x00\x05\ns", b"\xac\xed\x00\x05");
}
