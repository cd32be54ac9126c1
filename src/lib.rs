//! Protocol and dispatch core for BLE-connected consumer robot toys.
//!
//! This crate owns the wire codecs (v1/v2), the sequence-multiplexed
//! transactor, the per-device command catalogue, the toy capability table,
//! and the drive/LED/sensor controllers built on top of them. It does not
//! ship a BLE transport adapter, a scanner, or a high-level façade — those
//! are external collaborators that consume [`transport::TransportAdapter`].

pub mod codec;
pub mod commands;
pub mod control;
pub mod error;
pub mod packet;
pub mod toy;
pub mod transactor;
pub mod transport;

pub use error::Error;
pub use transactor::{Transactor, WireVariant};
pub use transport::TransportAdapter;
