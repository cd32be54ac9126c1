//! Device id 25 — Bluetooth identity, distinct from the radio-level
//! commands in [`crate::commands::core`].

use crate::packet::{Processor, RawCommand};

pub const DID: u8 = 25;

pub fn set_bluetooth_name(name: &str, target: Option<Processor>) -> RawCommand {
    let mut data = name.as_bytes().to_vec();
    data.push(0);
    RawCommand::new(DID, 3, target, data)
}

pub fn get_bluetooth_name(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 4, target, vec![])
}

pub fn decode_bluetooth_name(data: &[u8]) -> String {
    let trimmed = data.split(|&b| b == 0).next().unwrap_or(data);
    String::from_utf8_lossy(trimmed).into_owned()
}
