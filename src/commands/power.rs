//! Device id 19 — power management.

use crate::error::Error;
use crate::packet::{ListenerKey, Processor, RawCommand};

pub const DID: u8 = 19;

pub fn sleep(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 1, target, vec![])
}

pub fn wake(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 13, target, vec![])
}

pub fn get_battery_percentage(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 16, target, vec![])
}

pub fn decode_battery_percentage(data: &[u8]) -> Result<u8, Error> {
    data.first().copied().ok_or_else(|| Error::Decode("power: empty battery percentage response".into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatteryVoltageState {
    Ok = 0,
    Low = 1,
    Critical = 2,
}

pub fn get_battery_voltage_state(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 23, target, vec![])
}

pub fn decode_battery_voltage_state(data: &[u8]) -> Result<BatteryVoltageState, Error> {
    match data.first() {
        Some(0) => Ok(BatteryVoltageState::Ok),
        Some(1) => Ok(BatteryVoltageState::Low),
        Some(2) => Ok(BatteryVoltageState::Critical),
        _ => Err(Error::Decode("power: unrecognised battery voltage state".into())),
    }
}

pub const WILL_SLEEP_NOTIFY: ListenerKey = ListenerKey::V2(DID, 25);
pub const DID_SLEEP_NOTIFY: ListenerKey = ListenerKey::V2(DID, 26);
