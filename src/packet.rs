//! Wire-variant-agnostic envelope over [`codec::v1`] and [`codec::v2`]
//! frames, plus the correlation keys the transactor uses to route them.

use crate::codec::{v1, v2};

/// A processor-addressed target, encoded on the wire as `(1 << 4) | ordinal`.
pub type Processor = u8;

pub fn target_byte(processor: Processor) -> u8 {
    (1 << 4) | processor
}

/// Either device-id/command-id pair, dispatch-agnostic of the wire variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    pub did: u8,
    pub cid: u8,
}

/// A pending outbound command, already encoded but not yet wrapped in a
/// transport write. Carries enough to build either wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub opcode: Opcode,
    pub target: Option<Processor>,
    pub data: Vec<u8>,
}

impl RawCommand {
    pub fn new(did: u8, cid: u8, target: Option<Processor>, data: Vec<u8>) -> Self {
        RawCommand { opcode: Opcode { did, cid }, target, data }
    }
}

/// A decoded inbound frame, tagged by which wire variant produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    V1(v1::Frame),
    V2(v2::Packet),
}

/// Correlation key for the one-shot waiter table.
///
/// v1 keys on `(sop_kind, seq_or_id_code)` since responses and async
/// notifications share no namespace; v2 keys on `(did, cid, seq)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaiterKey {
    V1(u8, u8),
    V2(u8, u8, u8),
}

/// Correlation key for the fan-out listener table. v1 listeners key on the
/// async `id_code`; v2 listeners key on `(did, cid, 0xff)`, the wildcard
/// sequence number notifications always carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKey {
    V1(u8),
    V2(u8, u8),
}

pub const WILDCARD_SEQ: u8 = 0xFF;

impl Inbound {
    pub fn waiter_key(&self) -> WaiterKey {
        match self {
            Inbound::V1(frame) => {
                let (sop, id) = frame.id();
                WaiterKey::V1(sop, id)
            }
            Inbound::V2(pkt) => {
                let (did, cid, seq) = pkt.id();
                WaiterKey::V2(did, cid, seq)
            }
        }
    }

    pub fn listener_key(&self) -> Option<ListenerKey> {
        match self {
            Inbound::V1(v1::Frame::Async(a)) => Some(ListenerKey::V1(a.id_code)),
            Inbound::V1(v1::Frame::Response(_)) => None,
            Inbound::V2(pkt) => Some(ListenerKey::V2(pkt.device_id, pkt.command_id)),
        }
    }

    pub fn is_response(&self) -> bool {
        match self {
            Inbound::V1(v1::Frame::Response(_)) => true,
            Inbound::V1(v1::Frame::Async(_)) => false,
            Inbound::V2(pkt) => pkt.is_response(),
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Inbound::V1(v1::Frame::Response(r)) => &r.data,
            Inbound::V1(v1::Frame::Async(a)) => &a.data,
            Inbound::V2(pkt) => &pkt.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_byte_matches_nibble_to_byte_convention() {
        assert_eq!(target_byte(1), 0x11);
        assert_eq!(target_byte(2), 0x12);
    }

    #[test]
    fn v2_listener_key_ignores_sequence() {
        let pkt = v2::Packet::request(24, 2, WILDCARD_SEQ, None, vec![]);
        let inbound = Inbound::V2(pkt);
        assert_eq!(inbound.listener_key(), Some(ListenerKey::V2(24, 2)));
    }
}
