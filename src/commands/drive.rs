//! Device id 22 — v2-wire motor control. v1 toys use
//! [`crate::commands::sphero_legacy`] instead.

use bitflags::bitflags;

use crate::packet::{Processor, RawCommand};

pub const DID: u8 = 22;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DriveFlags: u8 {
        const FORWARD = 0b00;
        const BACKWARD = 0b01;
        const TURBO = 0b10;
    }
}

pub fn set_raw_motors(
    left_mode: u8,
    left_speed: u8,
    right_mode: u8,
    right_speed: u8,
    target: Option<Processor>,
) -> RawCommand {
    RawCommand::new(DID, 1, target, vec![left_mode, left_speed, right_mode, right_speed])
}

pub fn reset_yaw(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 6, target, vec![])
}

/// `enable` maps onto the firmware's `StabilizationIndexes`: `true` selects
/// the full control system (`1`), `false` disables it (`0`).
pub fn set_stabilization(enable: bool, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 12, target, vec![enable as u8])
}

pub fn drive_with_heading(speed: u8, heading: u16, flags: DriveFlags, target: Option<Processor>) -> RawCommand {
    let mut data = vec![speed];
    data.extend_from_slice(&heading.to_be_bytes());
    data.push(flags.bits());
    RawCommand::new(DID, 7, target, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_speed_heading_and_flags() {
        let cmd = drive_with_heading(0x80, 0x00F0, DriveFlags::BACKWARD | DriveFlags::TURBO, None);
        assert_eq!(cmd.data, vec![0x80, 0x00, 0xF0, 0b11]);
    }
}
