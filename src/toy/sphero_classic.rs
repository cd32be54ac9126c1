//! The original SPRK/2.0 Sphero: v1 wire, single processor, bitmask
//! sensor streaming, no LED mask command (direct RGB only).

use std::time::Duration;

use crate::toy::types::{LedMaskWidth, SensorGroup, StreamingProtocol, ToyCapabilities, ToySensor, ToyTypeInfo};
use crate::transactor::WireVariant;

const SENSORS: &[SensorGroup] = &[
    (
        "attitude",
        &[
            ("pitch", ToySensor::new(0x0080_0000, -179.0, 180.0)),
            ("roll", ToySensor::new(0x0040_0000, -179.0, 180.0)),
            ("yaw", ToySensor::new(0x0020_0000, -179.0, 180.0)),
        ],
    ),
    (
        "accelerometer",
        &[
            ("x", ToySensor::with_modifier(0x8000, -32768.0, 32767.0, |v| v / 4096.0)),
            ("y", ToySensor::with_modifier(0x4000, -32768.0, 32767.0, |v| v / 4096.0)),
            ("z", ToySensor::with_modifier(0x2000, -32768.0, 32767.0, |v| v / 4096.0)),
        ],
    ),
    (
        "gyroscope",
        &[
            ("x", ToySensor::new(0x0000_8000, -20000.0, 20000.0)),
            ("y", ToySensor::new(0x0000_4000, -20000.0, 20000.0)),
            ("z", ToySensor::new(0x0000_2000, -20000.0, 20000.0)),
        ],
    ),
];

const EXTENDED_SENSORS: &[SensorGroup] = &[
    (
        "quaternion",
        &[
            ("q0", ToySensor::new(0x8000_0000, -1.0, 1.0)),
            ("q1", ToySensor::new(0x4000_0000, -1.0, 1.0)),
            ("q2", ToySensor::new(0x2000_0000, -1.0, 1.0)),
            ("q3", ToySensor::new(0x1000_0000, -1.0, 1.0)),
        ],
    ),
    (
        "locator",
        &[
            ("x", ToySensor::new(0x0080_0000, -32768.0, 32767.0)),
            ("y", ToySensor::new(0x0040_0000, -32768.0, 32767.0)),
        ],
    ),
    (
        "speed",
        &[("value", ToySensor::new(0x0000_8000, 0.0, 32767.0))],
    ),
];

pub const SUPPORTED: &[(u8, u8)] = &[
    (0, 1),
    (0, 2),
    (0, 16),
    (0, 17),
    (0, 32),
    (0, 33),
    (2, 1),
    (2, 2),
    (2, 17),
    (2, 18),
    (2, 32),
    (2, 33),
    (2, 48),
    (2, 51),
];

pub const CAPABILITIES: ToyCapabilities = ToyCapabilities {
    toy_type: ToyTypeInfo { display_name: "SPRK/2.0", prefix: None, filter_prefix: "Sphero" },
    wire: WireVariant::V1,
    cmd_safe_interval: Duration::from_millis(60),
    processor_count: 1,
    streaming_protocol: StreamingProtocol::Bitmask,
    led_mask_width: LedMaskWidth::None,
    led_count: 0,
    sensors: SENSORS,
    extended_sensors: EXTENDED_SENSORS,
    streaming_services: &[],
    supported: SUPPORTED,
};
