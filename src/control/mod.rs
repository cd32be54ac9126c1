//! High-level controllers built on top of the command catalogue and the
//! transactor: drive, LED, and the two sensor streaming protocols.

pub mod drive;
pub mod led;
pub mod sensor_v1;
pub mod streaming_v2;
