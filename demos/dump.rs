use std::path::PathBuf;

use clap::Parser;
use serdump::{
    first_line_hex,
    hex::HexString,
    stream::{ClassDesc, FieldDesc, TypeCode},
    Deserializer, EventHandler, Record, Value,
};

#[derive(Parser, Debug)]
struct Args {
    /// Write the sample record to the file before reading it.
    #[arg(short, long)]
    write_sample: bool,

    /// Parse the file as a Java object serialization stream.
    #[arg(short, long)]
    parse: bool,

    /// Print the events of the parser.
    #[arg(short, long)]
    verbose: bool,

    /// File to read.
    path: PathBuf,
}

struct Logger;

impl EventHandler for Logger {
    fn stream_header(&self, rmi: Option<u8>, version: u16) {
        match rmi {
            Some(rmi) => eprintln!("HEADER version={version} rmi=0x{rmi:02X}"),
            None => eprintln!("HEADER version={version}"),
        }
    }

    fn content(&self, offset: usize, type_code: TypeCode) {
        eprintln!("{offset:08X} {type_code}");
    }

    fn class_desc(&self, desc: &ClassDesc) {
        eprintln!("CLASS {} [{}]", desc.name, desc.flags);
    }

    fn field_value(&self, class_name: &str, field: &FieldDesc, value: &Value) {
        eprintln!("FIELD {class_name}.{} = {value:?}", field.name);
    }

    fn block_data(&self, offset: usize, data: &[u8]) {
        eprintln!("{offset:08X} BLOCK {}", HexString(data));
    }

    fn reset(&self, offset: usize) {
        eprintln!("{offset:08X} RESET");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.write_sample {
        Record::sample().write_to(&args.path)?;
    }

    println!("{}", first_line_hex(&args.path)?);

    if args.parse {
        let data = std::fs::read(&args.path)?;

        let deserializer = Deserializer::new(&data);
        let stream = if args.verbose {
            deserializer.event_handler(Logger).parse()?
        } else {
            deserializer.parse()?
        };

        println!("{}", serde_json::to_string_pretty(&stream)?);
    }

    Ok(())
}
