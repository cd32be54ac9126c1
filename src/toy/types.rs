//! The toy capability table: per-model data describing what a given toy
//! supports, replacing the source library's per-subclass inheritance with a
//! single record type (`spec.md` §9 Design Notes — data over inheritance).

use std::time::Duration;

use crate::transactor::WireVariant;

/// Display/identification metadata for a toy model, transcribed from the
/// source library's `ToyType` named tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToyTypeInfo {
    pub display_name: &'static str,
    pub prefix: Option<&'static str>,
    pub filter_prefix: &'static str,
}

/// One sensor component's bit position in the streaming mask and its
/// value range, used to rescale a raw streamed word into engineering
/// units. `modifier` mirrors the source schema's occasional scalar
/// multiplier (e.g. locator coordinates scaled by 100).
#[derive(Debug, Clone, Copy)]
pub struct ToySensor {
    pub bit: u32,
    pub min_value: f64,
    pub max_value: f64,
    pub modifier: Option<fn(f64) -> f64>,
}

impl ToySensor {
    pub const fn new(bit: u32, min_value: f64, max_value: f64) -> Self {
        ToySensor { bit, min_value, max_value, modifier: None }
    }

    pub const fn with_modifier(bit: u32, min_value: f64, max_value: f64, modifier: fn(f64) -> f64) -> Self {
        ToySensor { bit, min_value, max_value, modifier: Some(modifier) }
    }

    pub fn apply_modifier(&self, raw: f64) -> f64 {
        match self.modifier {
            Some(f) => f(raw),
            None => raw,
        }
    }
}

/// A named sensor component nested under a group, e.g. `("x", ToySensor)`
/// inside the `"accelerometer"` group.
pub type SensorComponent = (&'static str, ToySensor);

/// A sensor group, e.g. `("accelerometer", [x, y, z])`. Declared as a flat
/// list of groups, each an ordered list of components, so schema order is
/// preserved exactly as authored — the mask bit order the source library
/// gets from `OrderedDict` iteration.
pub type SensorGroup = (&'static str, &'static [SensorComponent]);

/// Which sensor streaming protocol a model speaks. Both exist on the v2
/// wire; which one a given toy uses is a property of the toy, not the wire
/// version (`spec.md` §4.5 — Mini uses bitmask, Rvr uses slotted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingProtocol {
    Bitmask,
    Slotted,
}

/// Which LED mask width, if any, a model's IO controller accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMaskWidth {
    /// No mask command at all — LEDs are set directly (Sphero-classic).
    None,
    Bits8,
    Bits16,
    Bits32,
}

/// One named attribute of a v2 slotted streaming service (component C9),
/// e.g. `accelerometer`'s `x`/`y`/`z`. Distinct from [`ToySensor`]: a
/// streaming attribute has no mask bit — its position comes from
/// declaration order within the service — and decodes through a linear
/// rescale of a fixed-width integer rather than a 2-byte scaled word.
#[derive(Debug, Clone, Copy)]
pub struct StreamingAttribute {
    pub name: &'static str,
    pub min_value: f64,
    pub max_value: f64,
    pub modifier: Option<fn(f64) -> f64>,
}

impl StreamingAttribute {
    pub const fn new(name: &'static str, min_value: f64, max_value: f64) -> Self {
        StreamingAttribute { name, min_value, max_value, modifier: None }
    }

    pub const fn with_modifier(
        name: &'static str,
        min_value: f64,
        max_value: f64,
        modifier: fn(f64) -> f64,
    ) -> Self {
        StreamingAttribute { name, min_value, max_value, modifier: Some(modifier) }
    }

    pub fn apply_modifier(&self, raw: f64) -> f64 {
        match self.modifier {
            Some(f) => f(raw),
            None => raw,
        }
    }
}

/// The wire width of one streaming-service sample word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingDataSize {
    Bits8,
    Bits16,
    Bits32,
}

impl StreamingDataSize {
    pub fn byte_len(self) -> usize {
        match self {
            StreamingDataSize::Bits8 => 1,
            StreamingDataSize::Bits16 => 2,
            StreamingDataSize::Bits32 => 4,
        }
    }

    /// The configuration-command size code (§4.9): `0` for 8-bit, `1` for
    /// 16-bit, `2` for 32-bit.
    pub fn code(self) -> u8 {
        match self {
            StreamingDataSize::Bits8 => 0,
            StreamingDataSize::Bits16 => 1,
            StreamingDataSize::Bits32 => 2,
        }
    }

    fn max_raw(self) -> f64 {
        match self {
            StreamingDataSize::Bits8 => u8::MAX as f64,
            StreamingDataSize::Bits16 => u16::MAX as f64,
            StreamingDataSize::Bits32 => u32::MAX as f64,
        }
    }
}

/// A named v2 slotted streaming service (e.g. `accelerometer`, `locator`,
/// `color_detection`): an ordered set of attributes sampled together,
/// addressed by a firmware `index`, delivered on a given `slot` of a given
/// `processor`.
#[derive(Debug, Clone, Copy)]
pub struct StreamingService {
    pub name: &'static str,
    pub index: u16,
    pub slot: u8,
    pub processor: u8,
    pub data_size: StreamingDataSize,
    pub attributes: &'static [StreamingAttribute],
}

impl StreamingService {
    /// Decodes one sample: every attribute's raw fixed-width unsigned word,
    /// linearly rescaled from `[0, 2^bits - 1]` into `[min_value,
    /// max_value]`, then passed through its modifier.
    pub fn decode(&self, data: &[u8]) -> Vec<(&'static str, f64)> {
        let width = self.data_size.byte_len();
        let max_raw = self.data_size.max_raw();
        data.chunks_exact(width)
            .zip(self.attributes.iter())
            .map(|(chunk, attr)| {
                let raw = chunk.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64) as f64;
                let scaled = attr.min_value + (raw / max_raw) * (attr.max_value - attr.min_value);
                (attr.name, attr.apply_modifier(scaled))
            })
            .collect()
    }
}

/// The full per-model capability record.
pub struct ToyCapabilities {
    pub toy_type: ToyTypeInfo,
    pub wire: WireVariant,
    pub cmd_safe_interval: Duration,
    pub processor_count: u8,
    pub streaming_protocol: StreamingProtocol,
    pub led_mask_width: LedMaskWidth,
    pub led_count: u8,
    pub sensors: &'static [SensorGroup],
    pub extended_sensors: &'static [SensorGroup],
    /// The v2 slotted streaming services this model exposes. Empty on
    /// models using the bitmask protocol instead (`streaming_protocol ==
    /// StreamingProtocol::Bitmask`).
    pub streaming_services: &'static [StreamingService],
    /// The `(did, cid)` pairs this model actually supports — a capability
    /// check before dispatch, the data-driven replacement for per-subclass
    /// method availability.
    pub supported: &'static [(u8, u8)],
}

impl ToyCapabilities {
    pub fn implements(&self, did: u8, cid: u8) -> bool {
        self.supported.iter().any(|&(d, c)| d == did && c == cid)
    }

    pub fn find_sensor(&self, group: &str, component: &str) -> Option<ToySensor> {
        self.sensors
            .iter()
            .chain(self.extended_sensors.iter())
            .find(|(name, _)| *name == group)
            .and_then(|(_, components)| components.iter().find(|(name, _)| *name == component))
            .map(|(_, sensor)| *sensor)
    }

    pub fn find_streaming_service(&self, name: &str) -> Option<&'static StreamingService> {
        self.streaming_services.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSORS: &[SensorGroup] =
        &[("accelerometer", &[("x", ToySensor::new(0x8000, -8.19, 8.19)), ("y", ToySensor::new(0x4000, -8.19, 8.19))])];

    const CAPS: ToyCapabilities = ToyCapabilities {
        toy_type: ToyTypeInfo { display_name: "Test", prefix: None, filter_prefix: "TT" },
        wire: WireVariant::V2,
        cmd_safe_interval: Duration::from_millis(120),
        processor_count: 1,
        streaming_protocol: StreamingProtocol::Bitmask,
        led_mask_width: LedMaskWidth::Bits16,
        led_count: 7,
        sensors: SENSORS,
        extended_sensors: &[],
        streaming_services: &[],
        supported: &[(24, 0), (24, 2)],
    };

    #[test]
    fn implements_reports_only_supported_pairs() {
        assert!(CAPS.implements(24, 0));
        assert!(!CAPS.implements(24, 1));
    }

    #[test]
    fn find_sensor_looks_up_nested_component() {
        let sensor = CAPS.find_sensor("accelerometer", "x").unwrap();
        assert_eq!(sensor.bit, 0x8000);
    }
}
