//! Device id 16 — protocol introspection and a debug console.

use crate::error::Error;
use crate::packet::{ListenerKey, Processor, RawCommand};

pub const DID: u8 = 16;

pub fn ping(data: Vec<u8>, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 0, target, data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiProtocolVersion {
    pub major_version: u8,
    pub minor_version: u8,
}

pub fn get_api_protocol_version(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 1, target, vec![])
}

pub fn decode_api_protocol_version(data: &[u8]) -> Result<ApiProtocolVersion, Error> {
    if data.len() < 2 {
        return Err(Error::Decode("api_and_shell: get_api_protocol_version response too short".into()));
    }
    Ok(ApiProtocolVersion { major_version: data[0], minor_version: data[1] })
}

pub fn get_supported_dids(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 5, target, vec![])
}

pub fn decode_supported_dids(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

pub fn get_supported_cids(did: u8, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 6, target, vec![did])
}

pub fn decode_supported_cids(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

/// Key for `send_string_to_console`: fires whenever the toy writes to its
/// debug console, carrying the null-stripped message as `data`.
pub const SEND_STRING_TO_CONSOLE: ListenerKey = ListenerKey::V2(DID, 3);

pub fn decode_console_string(data: &[u8]) -> String {
    let trimmed = data.split(|&b| b == 0).next().unwrap_or(data);
    String::from_utf8_lossy(trimmed).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_console_string_stripping_trailing_nulls() {
        let mut data = b"boot ok".to_vec();
        data.extend_from_slice(&[0, 0, 0]);
        assert_eq!(decode_console_string(&data), "boot ok");
    }
}
