//! Device id 1 — firmware reflash primitives.
//!
//! Catalogued for completeness only: this crate builds no update
//! orchestration state machine on top of these encoders (out of scope).

use crate::packet::{Processor, RawCommand};

pub const DID: u8 = 1;

pub fn begin_reflash(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 2, target, vec![])
}

pub fn here_is_page(page: &[u8], target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 3, target, page.to_vec())
}

pub fn jump_to_main(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 4, target, vec![])
}
