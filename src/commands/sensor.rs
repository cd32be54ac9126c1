//! Device id 24 — sensor streaming and collision detection, plus the v2
//! slotted streaming service used by dual-processor toys.
//!
//! Two unrelated streaming mechanisms live here: the bitmask protocol
//! (`set_sensor_streaming_mask`/`sensor_streaming_data_notify`, used by
//! single-processor v2 toys) and the slot/service protocol
//! (`configure_streaming_service`.../`streaming_service_data_notify`, used
//! by dual-processor toys). v1 toys reach the bitmask protocol through
//! [`crate::commands::sphero_legacy::set_data_streaming`] instead, and
//! decode the resulting async frames with the *unsigned* helpers below —
//! the v2 bitmask protocol decodes as IEEE-754 floats, a real difference
//! between the two wire generations, not an oversight.

use crate::error::Error;
use crate::packet::{ListenerKey, Processor, RawCommand};

/// v1 async notifications key on a reserved `id_code`, not `(did, cid)`
/// (`Async.sensor_streaming_data_notify` / `Async.collision_detected_notify`
/// in `spherov2/commands/async_.py`).
pub const SENSOR_STREAMING_DATA_NOTIFY_V1: ListenerKey = ListenerKey::V1(3);
pub const COLLISION_DETECTED_NOTIFY_V1: ListenerKey = ListenerKey::V1(7);

pub const DID: u8 = 24;

pub fn set_sensor_streaming_mask(interval: u16, count: u8, mask: u32, target: Option<Processor>) -> RawCommand {
    let mut data = Vec::with_capacity(7);
    data.extend_from_slice(&interval.to_be_bytes());
    data.push(count);
    data.extend_from_slice(&mask.to_be_bytes());
    RawCommand::new(DID, 0, target, data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorStreamingMask {
    pub interval: u16,
    pub count: u8,
    pub mask: u32,
}

pub fn get_sensor_streaming_mask(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 1, target, vec![])
}

pub fn decode_sensor_streaming_mask(data: &[u8]) -> Result<SensorStreamingMask, Error> {
    if data.len() < 7 {
        return Err(Error::Decode("sensor: streaming mask response too short".into()));
    }
    Ok(SensorStreamingMask {
        interval: u16::from_be_bytes([data[0], data[1]]),
        count: data[2],
        mask: u32::from_be_bytes([data[3], data[4], data[5], data[6]]),
    })
}

pub const SENSOR_STREAMING_DATA_NOTIFY: ListenerKey = ListenerKey::V2(DID, 2);

/// Decodes a v2 bitmask streaming notification: every four bytes is one
/// big-endian IEEE-754 float component, in the order the enabled mask
/// bits were set (descending bit order).
pub fn decode_sensor_streaming_data_v2(data: &[u8]) -> Result<Vec<f32>, Error> {
    if data.len() % 4 != 0 {
        return Err(Error::Decode("sensor: v2 streaming payload not a multiple of 4 bytes".into()));
    }
    Ok(data.chunks_exact(4).map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]])).collect())
}

/// Decodes a v1 bitmask streaming notification: every two bytes is one
/// signed big-endian word (`struct.unpack('>%dh', ...)` in
/// `spherov2/commands/async_.py`), raw (the caller applies each
/// component's modifier from the sensor schema).
pub fn decode_sensor_streaming_data_v1(data: &[u8]) -> Result<Vec<i16>, Error> {
    if data.len() % 2 != 0 {
        return Err(Error::Decode("sensor: v1 streaming payload not a multiple of 2 bytes".into()));
    }
    Ok(data.chunks_exact(2).map(|c| i16::from_be_bytes([c[0], c[1]])).collect())
}

pub fn set_extended_sensor_streaming_mask(mask: u32, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 12, target, mask.to_be_bytes().to_vec())
}

pub fn configure_collision_detection(
    method: u8,
    x_threshold: u8,
    y_threshold: u8,
    x_speed: u8,
    y_speed: u8,
    dead_time: u8,
    target: Option<Processor>,
) -> RawCommand {
    RawCommand::new(DID, 17, target, vec![method, x_threshold, y_threshold, x_speed, y_speed, dead_time])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    /// x/y/z acceleration, in units of 4096 counts per g.
    pub acceleration: (i32, i32, i32),
    pub x_axis: bool,
    pub y_axis: bool,
    pub z_axis: bool,
    /// Raw x/y/z power components, unscaled.
    pub power: (i16, i16, i16),
    pub speed: u8,
    /// Seconds since boot, in units of 1/1000s.
    pub timestamp_ms: u32,
}

pub const COLLISION_DETECTED_NOTIFY: ListenerKey = ListenerKey::V2(DID, 18);

/// v2 decoder: `>3hB3hBL`, signed acceleration and power words.
pub fn decode_collision_v2(data: &[u8]) -> Result<CollisionEvent, Error> {
    decode_collision(data, true)
}

/// v1 decoder: `>3HB3HBL`, unsigned acceleration and power words — the
/// Sphero-classic collision lifter never adopted the signed encoding v2
/// toys use.
pub fn decode_collision_v1(data: &[u8]) -> Result<CollisionEvent, Error> {
    decode_collision(data, false)
}

fn decode_collision(data: &[u8], signed: bool) -> Result<CollisionEvent, Error> {
    if data.len() < 18 {
        return Err(Error::Decode("sensor: collision event too short".into()));
    }
    let word = |hi: u8, lo: u8| -> i32 {
        let raw = u16::from_be_bytes([hi, lo]);
        if signed {
            raw as i16 as i32
        } else {
            raw as i32
        }
    };
    // Power words carry the same signedness as acceleration in both wire
    // variants; only the acceleration/power words differ from v1 to v2.
    let half = |hi: u8, lo: u8| -> i16 { word(hi, lo) as i16 };
    let ax = word(data[0], data[1]);
    let ay = word(data[2], data[3]);
    let az = word(data[4], data[5]);
    let axis = data[6];
    let px = half(data[7], data[8]);
    let py = half(data[9], data[10]);
    let pz = half(data[11], data[12]);
    let speed = data[13];
    let timestamp_ms = u32::from_be_bytes([data[14], data[15], data[16], data[17]]);
    Ok(CollisionEvent {
        acceleration: (ax, ay, az),
        x_axis: axis & 0b001 != 0,
        y_axis: axis & 0b010 != 0,
        z_axis: axis & 0b100 != 0,
        power: (px, py, pz),
        speed,
        timestamp_ms,
    })
}

pub fn configure_streaming_service(token: u8, configuration: &[u8], target: Option<Processor>) -> RawCommand {
    let mut data = vec![token];
    data.extend_from_slice(configuration);
    RawCommand::new(DID, 57, target, data)
}

pub fn start_streaming_service(period_ms: u16, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 58, target, period_ms.to_be_bytes().to_vec())
}

pub fn stop_streaming_service(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 59, target, vec![])
}

pub fn clear_streaming_service(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 60, target, vec![])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingServiceData {
    pub slot: u8,
    pub data: Vec<u8>,
}

pub const STREAMING_SERVICE_DATA_NOTIFY: ListenerKey = ListenerKey::V2(DID, 61);

pub fn decode_streaming_service_data(data: &[u8]) -> Result<StreamingServiceData, Error> {
    if data.is_empty() {
        return Err(Error::Decode("sensor: streaming service data missing slot byte".into()));
    }
    Ok(StreamingServiceData { slot: data[0], data: data[1..].to_vec() })
}
