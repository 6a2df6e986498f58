pub mod stream;

/// Stream written by `ObjectOutputStream` for a `GroupDialogStateSnapshot`
/// with three `java.time.Instant` fields.
pub fn snapshot() -> Vec<u8> {
    serdump::hex::decode(include_str!("../fixtures/snapshot.hex").trim()).unwrap()
}
