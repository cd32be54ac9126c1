//! Device id 17 — firmware identification and diagnostics.

use crate::error::Error;
use crate::packet::{Processor, RawCommand};

pub const DID: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub revision: u16,
}

fn decode_version(data: &[u8]) -> Result<Version, Error> {
    if data.len() < 6 {
        return Err(Error::Decode("system_info: version response too short".into()));
    }
    Ok(Version {
        major: u16::from_be_bytes([data[0], data[1]]),
        minor: u16::from_be_bytes([data[2], data[3]]),
        revision: u16::from_be_bytes([data[4], data[5]]),
    })
}

pub fn get_main_app_version(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 0, target, vec![])
}

pub fn decode_main_app_version(data: &[u8]) -> Result<Version, Error> {
    decode_version(data)
}

pub fn get_bootloader_version(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 1, target, vec![])
}

pub fn decode_bootloader_version(data: &[u8]) -> Result<Version, Error> {
    decode_version(data)
}

pub fn get_mac_address(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 6, target, vec![])
}

pub fn decode_mac_address(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(":")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastErrorInfo {
    pub file_name: Vec<u8>,
    pub line_number: u16,
    pub data: Vec<u8>,
}

pub fn get_last_error_info(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 33, target, vec![])
}

pub fn decode_last_error_info(data: &[u8]) -> Result<LastErrorInfo, Error> {
    if data.len() < 46 {
        return Err(Error::Decode("system_info: last error info response too short".into()));
    }
    let file_name = data[0..32].to_vec();
    let line_number = u16::from_be_bytes([data[32], data[33]]);
    let info_data = data[34..46].to_vec();
    Ok(LastErrorInfo { file_name, line_number, data: info_data })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturingDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

pub fn get_manufacturing_date(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 51, target, vec![])
}

pub fn decode_manufacturing_date(data: &[u8]) -> Result<ManufacturingDate, Error> {
    if data.len() < 4 {
        return Err(Error::Decode("system_info: manufacturing date response too short".into()));
    }
    Ok(ManufacturingDate { year: u16::from_be_bytes([data[0], data[1]]), month: data[2], day: data[3] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_version() {
        let v = decode_version(&[0x00, 0x01, 0x00, 0x02, 0x00, 0x03]).unwrap();
        assert_eq!(v, Version { major: 1, minor: 2, revision: 3 });
    }

    #[test]
    fn decodes_manufacturing_date() {
        let d = decode_manufacturing_date(&[0x07, 0xE6, 3, 14]).unwrap();
        assert_eq!(d, ManufacturingDate { year: 2022, month: 3, day: 14 });
    }
}
