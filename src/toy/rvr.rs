//! Sphero RVR: v2 wire, dual processor (primary/secondary), slotted
//! streaming-service sensor data, 32-bit LED mask across 31 addressable
//! LEDs.

use std::time::Duration;

use crate::toy::types::{
    LedMaskWidth, StreamingAttribute, StreamingDataSize, StreamingProtocol, StreamingService, ToyCapabilities,
    ToyTypeInfo,
};
use crate::transactor::WireVariant;

/// Processor ordinals, as packed into the target byte via
/// `crate::packet::target_byte`.
pub const PRIMARY_PROCESSOR: u8 = 1;
pub const SECONDARY_PROCESSOR: u8 = 2;

/// Firmware service indices are invented here (`original_source` carries no
/// Python `StreamingControl` counterpart to transcribe them from — see
/// `DESIGN.md`), chosen only to be distinct and stable across this table.
const STREAMING_SERVICES: &[StreamingService] = &[
    StreamingService {
        name: "accelerometer",
        index: 0x0200,
        slot: 0,
        processor: PRIMARY_PROCESSOR,
        data_size: StreamingDataSize::Bits32,
        attributes: &[
            StreamingAttribute::new("x", -16.0, 16.0),
            StreamingAttribute::new("y", -16.0, 16.0),
            StreamingAttribute::new("z", -16.0, 16.0),
        ],
    },
    StreamingService {
        name: "gyroscope",
        index: 0x0201,
        slot: 1,
        processor: PRIMARY_PROCESSOR,
        data_size: StreamingDataSize::Bits32,
        attributes: &[
            StreamingAttribute::new("x", -2000.0, 2000.0),
            StreamingAttribute::new("y", -2000.0, 2000.0),
            StreamingAttribute::new("z", -2000.0, 2000.0),
        ],
    },
    StreamingService {
        name: "locator",
        index: 0x0206,
        slot: 2,
        processor: PRIMARY_PROCESSOR,
        data_size: StreamingDataSize::Bits32,
        attributes: &[
            StreamingAttribute::new("x", -16000.0, 16000.0),
            StreamingAttribute::new("y", -16000.0, 16000.0),
        ],
    },
    // Slot 0 on the secondary processor only — the invariant the decoder's
    // slot-zero guard (`spec.md` §4.9) exists to enforce.
    StreamingService {
        name: "color_detection",
        index: 0x0400,
        slot: 0,
        processor: SECONDARY_PROCESSOR,
        data_size: StreamingDataSize::Bits8,
        attributes: &[
            StreamingAttribute::new("r", 0.0, 255.0),
            StreamingAttribute::new("g", 0.0, 255.0),
            StreamingAttribute::new("b", 0.0, 255.0),
            StreamingAttribute::new("confidence", 0.0, 255.0),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Led {
    RightHeadlightRed = 0,
    RightHeadlightGreen = 1,
    RightHeadlightBlue = 2,
    LeftHeadlightRed = 3,
    LeftHeadlightGreen = 4,
    LeftHeadlightBlue = 5,
    LeftStatusIndicationRed = 6,
    LeftStatusIndicationGreen = 7,
    LeftStatusIndicationBlue = 8,
    RightStatusIndicationRed = 9,
    RightStatusIndicationGreen = 10,
    RightStatusIndicationBlue = 11,
    BatteryDoorRearRed = 12,
    BatteryDoorRearGreen = 13,
    BatteryDoorRearBlue = 14,
    BatteryDoorFrontRed = 15,
    BatteryDoorFrontGreen = 16,
    BatteryDoorFrontBlue = 17,
    PowerButtonFrontRed = 18,
    PowerButtonFrontGreen = 19,
    PowerButtonFrontBlue = 20,
    PowerButtonRearRed = 21,
    PowerButtonRearGreen = 22,
    PowerButtonRearBlue = 23,
    LeftBrakelightRed = 24,
    LeftBrakelightGreen = 25,
    LeftBrakelightBlue = 26,
    RightBrakelightRed = 27,
    RightBrakelightGreen = 28,
    RightBrakelightBlue = 29,
    /// Hardwired white channel — excluded from "turn everything off" sweeps.
    UndercarriageWhite = 30,
}

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
    (24, 57),
    (24, 58),
    (24, 59),
    (24, 60),
    (24, 61),
    (25, 3),
    (25, 4),
    (26, 26),
];

pub const CAPABILITIES: ToyCapabilities = ToyCapabilities {
    toy_type: ToyTypeInfo { display_name: "Sphero RVR", prefix: Some("RV-"), filter_prefix: "RV" },
    wire: WireVariant::V2,
    cmd_safe_interval: Duration::from_millis(75),
    processor_count: 2,
    streaming_protocol: StreamingProtocol::Slotted,
    led_mask_width: LedMaskWidth::Bits32,
    led_count: 31,
    sensors: &[],
    extended_sensors: &[],
    streaming_services: STREAMING_SERVICES,
    supported: SUPPORTED,
};
