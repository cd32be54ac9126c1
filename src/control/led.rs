//! LED control, generalized from `spherov2/controls/v2.py`'s
//! `LedControl.set_leds`: build a mask of which LED ordinals are being set
//! plus their values, then prefer the widest mask command the model
//! implements — 32-bit, then 16-bit, then 8-bit — falling back to the
//! direct three-channel command on toys with no mask command at all.

use std::sync::Arc;

use crate::commands::{io, sphero_legacy};
use crate::error::Error;
use crate::packet::Processor;
use crate::toy::types::{LedMaskWidth, ToyCapabilities};
use crate::transactor::Transactor;

pub struct LedController {
    transactor: Transactor,
    capabilities: &'static ToyCapabilities,
    target: Option<Processor>,
}

impl LedController {
    pub fn new(transactor: Transactor, capabilities: &'static ToyCapabilities, target: Option<Processor>) -> Arc<Self> {
        Arc::new(LedController { transactor, capabilities, target })
    }

    /// `mapping` is `(led ordinal, value)` pairs; ordinals need not be
    /// sorted, the mask is built in ascending order regardless.
    pub async fn set_leds(&self, mapping: &[(u8, u8)]) -> Result<(), Error> {
        let mut sorted = mapping.to_vec();
        sorted.sort_by_key(|&(ordinal, _)| ordinal);
        if sorted.is_empty() {
            return Ok(());
        }

        match self.capabilities.led_mask_width {
            LedMaskWidth::Bits32 => {
                let mask = sorted.iter().fold(0u32, |acc, &(ordinal, _)| acc | (1u32 << ordinal));
                let values: Vec<u8> = sorted.iter().map(|&(_, v)| v).collect();
                let cmd = io::set_all_leds_with_32_bit_mask(mask, &values, self.target);
                self.transactor.execute(cmd).await?;
            }
            LedMaskWidth::Bits16 => {
                let mask = sorted.iter().fold(0u16, |acc, &(ordinal, _)| acc | (1u16 << ordinal));
                let values: Vec<u8> = sorted.iter().map(|&(_, v)| v).collect();
                let cmd = io::set_all_leds_with_16_bit_mask(mask, &values, self.target);
                self.transactor.execute(cmd).await?;
            }
            LedMaskWidth::Bits8 => {
                let mask = sorted.iter().fold(0u8, |acc, &(ordinal, _)| acc | (1u8 << ordinal));
                let values: Vec<u8> = sorted.iter().map(|&(_, v)| v).collect();
                let cmd = io::set_all_leds_with_8_bit_mask(mask, &values, self.target);
                self.transactor.execute(cmd).await?;
            }
            LedMaskWidth::None => {
                let find = |ordinal: u8| sorted.iter().find(|&&(o, _)| o == ordinal).map(|&(_, v)| v).unwrap_or(0);
                let cmd = sphero_legacy::set_main_led(find(0), find(1), find(2), self.target);
                self.transactor.execute(cmd).await?;
            }
        }
        Ok(())
    }

    /// Turns every addressable LED off, skipping any hardwired channel the
    /// model documents as excluded (e.g. RVR's undercarriage white).
    pub async fn all_off(&self, exclude: &[u8]) -> Result<(), Error> {
        let mapping: Vec<(u8, u8)> =
            (0..self.capabilities.led_count).filter(|ordinal| !exclude.contains(ordinal)).map(|o| (o, 0)).collect();
        if mapping.is_empty() {
            return self.set_leds(&[(0, 0), (1, 0), (2, 0)]).await;
        }
        self.set_leds(&mapping).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::toy::types::{SensorGroup, StreamingProtocol, ToyTypeInfo};
    use crate::transactor::WireVariant;

    const NO_SENSORS: &[SensorGroup] = &[];

    static MINI_LIKE: ToyCapabilities = ToyCapabilities {
        toy_type: ToyTypeInfo { display_name: "Test", prefix: None, filter_prefix: "T" },
        wire: WireVariant::V2,
        cmd_safe_interval: Duration::from_millis(120),
        processor_count: 1,
        streaming_protocol: StreamingProtocol::Bitmask,
        led_mask_width: LedMaskWidth::Bits16,
        led_count: 7,
        sensors: NO_SENSORS,
        extended_sensors: NO_SENSORS,
        streaming_services: &[],
        supported: &[(26, 14)],
    };

    #[test]
    fn mask_building_is_order_independent() {
        let mut mapping = vec![(3u8, 0x10u8), (1, 0x20)];
        mapping.sort_by_key(|&(o, _)| o);
        let mask = mapping.iter().fold(0u16, |acc, &(o, _)| acc | (1u16 << o));
        assert_eq!(mask, 0b1010);
        assert_eq!(MINI_LIKE.led_mask_width, LedMaskWidth::Bits16);
    }

    #[test]
    fn rvr_headlight_mask_matches_scenario() {
        use crate::toy::rvr::Led;
        let mut mapping =
            vec![(Led::LeftHeadlightRed as u8, 0x10u8), (Led::LeftHeadlightGreen as u8, 0x20), (Led::LeftHeadlightBlue as u8, 0x30)];
        mapping.sort_by_key(|&(o, _)| o);
        let mask = mapping.iter().fold(0u32, |acc, &(o, _)| acc | (1u32 << o));
        let values: Vec<u8> = mapping.iter().map(|&(_, v)| v).collect();
        assert_eq!(mask, 0x38);
        assert_eq!(values, vec![0x10, 0x20, 0x30]);
    }
}
