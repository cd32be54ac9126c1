//! Bitmask sensor streaming (component C8): the protocol used directly by
//! v1 toys (`spherov2/controls/v1.py`'s `SensorControl`) and, on the v2
//! wire, by single-processor toys like the Mini (`spherov2/controls/v2.py`'s
//! `SensorControl` — a different protocol from the v2 slotted streaming
//! service the Rvr uses).
//!
//! The two wire variants commit a mask update differently: v1 issues one
//! combined `set_data_streaming` call; v2 issues a mask-reset, extended-mask,
//! then mask-with-interval sequence. Groups, not individual components, are
//! the unit of enable/disable (`self.__enabled[sensor] = ...` in
//! `spherov2/controls/v1.py`, keyed by the whole sensor name).

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

use crate::commands::sensor;
use crate::commands::sphero_legacy;
use crate::error::Error;
use crate::packet::{Inbound, Processor};
use crate::toy::types::ToyCapabilities;
use crate::transactor::{Transactor, WireVariant};

/// A decoded sample: `(group, [(component, value), ...])` pairs, in
/// declaration order, for every currently-enabled group.
pub type Sample = Vec<(&'static str, Vec<(&'static str, f64)>)>;

pub struct SensorBitmaskController {
    transactor: Transactor,
    wire: WireVariant,
    capabilities: &'static ToyCapabilities,
    target: Option<Processor>,
    enabled: Arc<StdMutex<BTreeSet<&'static str>>>,
    enabled_extended: Arc<StdMutex<BTreeSet<&'static str>>>,
    interval_ms: Mutex<u16>,
}

impl SensorBitmaskController {
    pub fn new(
        transactor: Transactor,
        wire: WireVariant,
        capabilities: &'static ToyCapabilities,
        target: Option<Processor>,
    ) -> Arc<Self> {
        Arc::new(SensorBitmaskController {
            transactor,
            wire,
            capabilities,
            target,
            enabled: Arc::new(StdMutex::new(BTreeSet::new())),
            enabled_extended: Arc::new(StdMutex::new(BTreeSet::new())),
            interval_ms: Mutex::new(100),
        })
    }

    pub async fn set_interval(&self, interval_ms: u16) {
        *self.interval_ms.lock().await = interval_ms;
    }

    /// Enables or disables a whole sensor group (e.g. `"accelerometer"`) —
    /// every component it declares streams or none do.
    pub async fn enable(&self, group: &'static str, enable: bool) {
        let is_extended = self.capabilities.extended_sensors.iter().any(|(g, _)| *g == group);
        let set = if is_extended { &self.enabled_extended } else { &self.enabled };
        let mut set = set.lock().unwrap();
        if enable {
            set.insert(group);
        } else {
            set.remove(group);
        }
    }

    pub async fn disable_all(&self) {
        self.enabled.lock().unwrap().clear();
        self.enabled_extended.lock().unwrap().clear();
    }

    fn build_masks(&self, enabled: &BTreeSet<&'static str>, enabled_extended: &BTreeSet<&'static str>) -> (u32, u32) {
        let mask = self
            .capabilities
            .sensors
            .iter()
            .filter(|(name, _)| enabled.contains(name))
            .flat_map(|(_, components)| components.iter())
            .fold(0u32, |acc, (_, sensor)| acc | sensor.bit);
        let extended_mask = self
            .capabilities
            .extended_sensors
            .iter()
            .filter(|(name, _)| enabled_extended.contains(name))
            .flat_map(|(_, components)| components.iter())
            .fold(0u32, |acc, (_, sensor)| acc | sensor.bit);
        (mask, extended_mask)
    }

    /// Pushes the current enabled-group set to the toy. `count` (the
    /// number of samples to batch per packet, not the number of enabled
    /// components) is always `0`, matching the single-sample-per-packet
    /// default every known deployment uses.
    pub async fn commit(&self) -> Result<(), Error> {
        let enabled = self.enabled.lock().unwrap().clone();
        let enabled_extended = self.enabled_extended.lock().unwrap().clone();
        let (mask, extended_mask) = self.build_masks(&enabled, &enabled_extended);
        let count = 0u8;
        let interval_ms = *self.interval_ms.lock().await;

        match self.wire {
            WireVariant::V1 => {
                // Tenths-of-millisecond units, converted from the
                // millisecond interval callers pass in.
                let interval = (interval_ms as u32 * 4 / 10) as u16;
                let cmd = sphero_legacy::set_data_streaming(interval, 1, mask, count, extended_mask, self.target);
                self.transactor.execute(cmd).await?;
            }
            WireVariant::V2 => {
                let reset = sensor::set_sensor_streaming_mask(0, count, mask, self.target);
                self.transactor.execute(reset).await?;
                let ext = sensor::set_extended_sensor_streaming_mask(extended_mask, self.target);
                self.transactor.execute(ext).await?;
                let apply = sensor::set_sensor_streaming_mask(interval_ms, count, mask, self.target);
                self.transactor.execute(apply).await?;
            }
        }
        Ok(())
    }

    /// Registers `f` to fire on every sensor streaming notification, with
    /// the sample buffer unpacked into a `{group: {component: value}}`
    /// nested map. Words are popped one per declared component, walking
    /// enabled base groups in declaration order, then enabled extended
    /// groups — mirroring the wire order `spherov2/controls/v1.py`'s
    /// `__sensor_streaming_data` walks.
    ///
    /// Malformed frames (a word count that doesn't match the currently
    /// enabled set) are logged and dropped rather than desyncing later
    /// samples.
    pub async fn on_data<F>(&self, f: F)
    where
        F: Fn(Sample) + Send + Sync + 'static,
    {
        let capabilities = self.capabilities;
        let enabled = self.enabled.clone();
        let enabled_extended = self.enabled_extended.clone();
        match self.wire {
            WireVariant::V1 => {
                self.transactor
                    .listen(sensor::SENSOR_STREAMING_DATA_NOTIFY_V1, move |inbound: Inbound| {
                        let Ok(words) = sensor::decode_sensor_streaming_data_v1(inbound.data()) else { return };
                        let raw: Vec<f64> = words.iter().map(|&w| w as f64).collect();
                        dispatch_sample(capabilities, &enabled, &enabled_extended, &raw, &f);
                    })
                    .await;
            }
            WireVariant::V2 => {
                self.transactor
                    .listen(sensor::SENSOR_STREAMING_DATA_NOTIFY, move |inbound: Inbound| {
                        let Ok(words) = sensor::decode_sensor_streaming_data_v2(inbound.data()) else { return };
                        let raw: Vec<f64> = words.iter().map(|w| *w as f64).collect();
                        dispatch_sample(capabilities, &enabled, &enabled_extended, &raw, &f);
                    })
                    .await;
            }
        }
    }
}

fn dispatch_sample<F: Fn(Sample)>(
    capabilities: &'static ToyCapabilities,
    enabled: &StdMutex<BTreeSet<&'static str>>,
    enabled_extended: &StdMutex<BTreeSet<&'static str>>,
    raw: &[f64],
    f: &F,
) {
    let enabled = enabled.lock().unwrap();
    let enabled_extended = enabled_extended.lock().unwrap();

    let expected: usize = capabilities
        .sensors
        .iter()
        .filter(|(name, _)| enabled.contains(name))
        .chain(capabilities.extended_sensors.iter().filter(|(name, _)| enabled_extended.contains(name)))
        .map(|(_, components)| components.len())
        .sum();
    if expected != raw.len() {
        log::warn!("sensor_v1: streaming sample has {} words, expected {expected}", raw.len());
        return;
    }

    let mut cursor = raw.iter();
    let mut sample: Sample = Vec::new();
    for groups in [capabilities.sensors, capabilities.extended_sensors] {
        let active = if std::ptr::eq(groups, capabilities.sensors) { &enabled } else { &enabled_extended };
        for &(group, components) in groups {
            if !active.contains(group) {
                continue;
            }
            let mut values = Vec::with_capacity(components.len());
            for &(name, sensor) in components {
                let raw_value = *cursor.next().expect("length checked above");
                values.push((name, sensor.apply_modifier(raw_value)));
            }
            sample.push((group, values));
        }
    }
    f(sample);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toy::{mini, sphero_classic};

    #[test]
    fn accelerometer_enable_matches_scenario_mask() {
        let caps = &sphero_classic::CAPABILITIES;
        let x = caps.find_sensor("accelerometer", "x").unwrap();
        let y = caps.find_sensor("accelerometer", "y").unwrap();
        let z = caps.find_sensor("accelerometer", "z").unwrap();
        assert_eq!(x.bit | y.bit | z.bit, 0x8000 | 0x4000 | 0x2000);
    }

    #[test]
    fn dispatch_sample_applies_modifier_and_scenario_range() {
        let caps = &sphero_classic::CAPABILITIES;
        let enabled: StdMutex<BTreeSet<&'static str>> = StdMutex::new(["accelerometer"].into_iter().collect());
        let enabled_extended: StdMutex<BTreeSet<&'static str>> = StdMutex::new(BTreeSet::new());
        let samples = Arc::new(StdMutex::new(Vec::new()));
        let samples_clone = samples.clone();
        // raw accelerometer x/y/z words at the extremes of the scenario's range.
        dispatch_sample(caps, &enabled, &enabled_extended, &[32767.0, -32768.0, 0.0], &move |sample: Sample| {
            samples_clone.lock().unwrap().push(sample);
        });
        let samples = samples.lock().unwrap();
        assert_eq!(samples.len(), 1);
        let (group, values) = &samples[0][0];
        assert_eq!(*group, "accelerometer");
        assert_eq!(values[0], ("x", 32767.0 / 4096.0));
        assert_eq!(values[1], ("y", -32768.0 / 4096.0));
    }

    #[test]
    fn mini_quaternion_bits_are_distinct() {
        let caps = &mini::CAPABILITIES;
        let x = caps.find_sensor("quaternion", "x").unwrap();
        let y = caps.find_sensor("quaternion", "y").unwrap();
        assert_ne!(x.bit, y.bit);
    }
}
