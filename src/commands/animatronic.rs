//! Device id 23 — animation playback (R2-D2/R2-Q5 style toys).

use crate::packet::{ListenerKey, Processor, RawCommand};

pub const DID: u8 = 23;

pub fn play_animation(animation: u16, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 5, target, animation.to_be_bytes().to_vec())
}

pub const PLAY_ANIMATION_COMPLETE_NOTIFY: ListenerKey = ListenerKey::V2(DID, 17);

pub fn stop_animation(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 43, target, vec![])
}
