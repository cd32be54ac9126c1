//! Device id 2 — the original Sphero-classic command set. v1 wire only;
//! later toy generations replace this with [`crate::commands::drive`] and
//! [`crate::commands::sensor`] on the v2 wire.

use crate::packet::{Processor, RawCommand};

pub const DID: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RollMode {
    Stop = 0,
    Go = 1,
    Calibrate = 2,
}

pub fn set_heading(heading: u16, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 1, target, heading.to_be_bytes().to_vec())
}

pub fn set_stabilization(enable: bool, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 2, target, vec![enable as u8])
}

pub fn set_data_streaming(
    interval: u16,
    num_samples_per_packet: u16,
    mask: u32,
    count: u8,
    extended_mask: u32,
    target: Option<Processor>,
) -> RawCommand {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&interval.to_be_bytes());
    data.extend_from_slice(&num_samples_per_packet.to_be_bytes());
    data.extend_from_slice(&mask.to_be_bytes());
    data.push(count);
    data.extend_from_slice(&extended_mask.to_be_bytes());
    RawCommand::new(DID, 17, target, data)
}

pub fn configure_collision_detection(
    method: u8,
    x_threshold: u8,
    x_speed: u8,
    y_threshold: u8,
    y_speed: u8,
    dead_time: u8,
    target: Option<Processor>,
) -> RawCommand {
    RawCommand::new(DID, 18, target, vec![method, x_threshold, x_speed, y_threshold, y_speed, dead_time])
}

pub fn set_main_led(r: u8, g: u8, b: u8, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 32, target, vec![r, g, b])
}

pub fn set_back_led_brightness(brightness: u8, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 33, target, vec![brightness])
}

pub fn roll(speed: u8, heading: u16, roll_mode: RollMode, reverse: bool, target: Option<Processor>) -> RawCommand {
    let mut data = vec![speed];
    data.extend_from_slice(&heading.to_be_bytes());
    data.push(roll_mode as u8);
    data.push(reverse as u8);
    RawCommand::new(DID, 48, target, data)
}

pub fn set_raw_motors(
    left_mode: u8,
    left_speed: u8,
    right_mode: u8,
    right_speed: u8,
    target: Option<Processor>,
) -> RawCommand {
    RawCommand::new(DID, 51, target, vec![left_mode, left_speed, right_mode, right_speed])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_data_streaming_packs_big_endian_fields() {
        let cmd = set_data_streaming(0x00C8, 1, 0x0000_7F00, 1, 0, None);
        assert_eq!(cmd.data, vec![0x00, 0xC8, 0x00, 0x01, 0x00, 0x00, 0x7F, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn roll_packs_speed_heading_mode_reverse() {
        let cmd = roll(0x40, 0x0168, RollMode::Go, false, None);
        assert_eq!(cmd.data, vec![0x40, 0x01, 0x68, 0x01, 0x00]);
    }
}
