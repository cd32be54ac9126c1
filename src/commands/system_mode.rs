//! Device id 18 — factory/demo modes.

use crate::error::Error;
use crate::packet::{Processor, RawCommand};

pub const DID: u8 = 18;

pub fn enable_desktoy_mode(enable: bool, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 41, target, vec![enable as u8])
}

pub fn get_out_of_box_state(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 43, target, vec![])
}

pub fn decode_out_of_box_state(data: &[u8]) -> Result<bool, Error> {
    data.first().map(|&b| b != 0).ok_or_else(|| Error::Decode("system_mode: empty out-of-box response".into()))
}

pub fn enable_out_of_box_state(enable: bool, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 44, target, vec![enable as u8])
}
