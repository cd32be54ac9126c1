//! Sphero Mini: v2 wire, single processor, bitmask sensor streaming,
//! 16-bit LED mask.

use std::time::Duration;

use crate::toy::types::{LedMaskWidth, SensorGroup, StreamingProtocol, ToyCapabilities, ToySensor, ToyTypeInfo};
use crate::transactor::WireVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Led {
    Aiming = 0,
    BodyRed = 1,
    BodyGreen = 2,
    BodyBlue = 3,
    UserBodyRed = 4,
    UserBodyGreen = 5,
    UserBodyBlue = 6,
}

const SENSORS: &[SensorGroup] = &[
    (
        "quaternion",
        &[
            ("x", ToySensor::new(0x00_2000_0000, -1.0, 1.0)),
            ("y", ToySensor::new(0x00_1000_0000, -1.0, 1.0)),
            ("z", ToySensor::new(0x00_0800_0000, -1.0, 1.0)),
            ("w", ToySensor::new(0x00_0400_0000, -1.0, 1.0)),
        ],
    ),
    (
        "attitude",
        &[
            ("pitch", ToySensor::new(0x00_0002_0000, -179.0, 180.0)),
            ("roll", ToySensor::new(0x00_0001_0000, -179.0, 180.0)),
            ("yaw", ToySensor::new(0x00_0000_8000, -179.0, 180.0)),
        ],
    ),
    (
        "accelerometer",
        &[
            ("x", ToySensor::new(0x8000, -8.19, 8.19)),
            ("y", ToySensor::new(0x4000, -8.19, 8.19)),
            ("z", ToySensor::new(0x2000, -8.19, 8.19)),
        ],
    ),
    ("accel_one", &[("value", ToySensor::new(0x1000, 0.0, 8000.0))]),
    (
        "locator",
        &[
            ("x", ToySensor::with_modifier(0x40, -32768.0, 32767.0, |v| v * 100.0)),
            ("y", ToySensor::with_modifier(0x20, -32768.0, 32767.0, |v| v * 100.0)),
        ],
    ),
    (
        "velocity",
        &[("x", ToySensor::new(0x08, -32768.0, 32767.0)), ("y", ToySensor::new(0x04, -32768.0, 32767.0))],
    ),
    ("speed", &[("value", ToySensor::new(0x02, 0.0, 32767.0))]),
    ("core_time", &[("value", ToySensor::new(0x01, 0.0, 4294967295.0))]),
];

const EXTENDED_SENSORS: &[SensorGroup] = &[(
    "gyroscope",
    &[
        ("x", ToySensor::new(0x8000_0000, -20000.0, 20000.0)),
        ("y", ToySensor::new(0x4000_0000, -20000.0, 20000.0)),
        ("z", ToySensor::new(0x2000_0000, -20000.0, 20000.0)),
    ],
)];

pub const SUPPORTED: &[(u8, u8)] = &[
    (0, 1),
    (0, 2),
    (0, 16),
    (0, 17),
    (0, 32),
    (0, 33),
    (16, 0),
    (16, 1),
    (16, 5),
    (16, 6),
    (17, 0),
    (17, 1),
    (17, 6),
    (17, 33),
    (17, 51),
    (18, 41),
    (18, 43),
    (18, 44),
    (19, 1),
    (19, 13),
    (19, 16),
    (19, 23),
    (22, 1),
    (22, 6),
    (22, 7),
    (22, 12),
    (24, 0),
    (24, 1),
    (24, 2),
    (24, 12),
    (24, 17),
    (24, 18),
    (25, 3),
    (25, 4),
    (26, 14),
];

pub const CAPABILITIES: ToyCapabilities = ToyCapabilities {
    toy_type: ToyTypeInfo { display_name: "Sphero Mini", prefix: Some("SM-"), filter_prefix: "SM" },
    wire: WireVariant::V2,
    cmd_safe_interval: Duration::from_millis(120),
    processor_count: 1,
    streaming_protocol: StreamingProtocol::Bitmask,
    led_mask_width: LedMaskWidth::Bits16,
    led_count: 7,
    sensors: SENSORS,
    extended_sensors: EXTENDED_SENSORS,
    streaming_services: &[],
    supported: SUPPORTED,
};
