//! Device id 26 — LED and audio peripherals.

use crate::packet::{Processor, RawCommand};

pub const DID: u8 = 26;

/// Not in the original catalogue directly — added so the capability table's
/// mask-width-preference algorithm (`spec.md` §4.7) has an 8-bit rung to
/// prefer on toys with few enough LEDs, mirroring how `set_all_leds_with_16_bit_mask`
/// and `set_all_leds_with_32_bit_mask` are already structured.
pub fn set_all_leds_with_8_bit_mask(mask: u8, values: &[u8], target: Option<Processor>) -> RawCommand {
    let mut data = vec![mask];
    data.extend_from_slice(values);
    RawCommand::new(DID, 13, target, data)
}

pub fn set_all_leds_with_16_bit_mask(mask: u16, values: &[u8], target: Option<Processor>) -> RawCommand {
    let mut data = mask.to_be_bytes().to_vec();
    data.extend_from_slice(values);
    RawCommand::new(DID, 14, target, data)
}

pub fn set_all_leds_with_32_bit_mask(mask: u32, values: &[u8], target: Option<Processor>) -> RawCommand {
    let mut data = mask.to_be_bytes().to_vec();
    data.extend_from_slice(values);
    RawCommand::new(DID, 26, target, data)
}

pub fn play_audio_file(sound: u16, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 7, target, sound.to_be_bytes().to_vec())
}

pub fn set_audio_volume(volume: u8, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 8, target, vec![volume])
}

pub fn stop_all_audio(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 10, target, vec![])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_16_bit_mask_with_values() {
        let cmd = set_all_leds_with_16_bit_mask(0b11, &[0xFF, 0x10], None);
        assert_eq!(cmd.data, vec![0x00, 0x03, 0xFF, 0x10]);
    }
}
