//! Wire format v2 (the delimited/escaped API): `[START, FLAGS, <ids>, SEQ,
//! data.., [ERR], CHK, END]` with reserved bytes byte-stuffed inside the
//! frame body.

use bitflags::bitflags;

use crate::error::Error;

pub const START: u8 = 0x8D;
pub const END: u8 = 0xD8;
pub const ESCAPE: u8 = 0xAB;
pub const ESCAPED_ESCAPE: u8 = 0x23;
pub const ESCAPED_START: u8 = 0x05;
pub const ESCAPED_END: u8 = 0x50;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        const IS_RESPONSE = 0b0000_0001;
        const REQUESTS_RESPONSE = 0b0000_0010;
        const REQUESTS_ONLY_ERROR_RESPONSE = 0b0000_0100;
        const IS_ACTIVITY = 0b0000_1000;
        const HAS_TARGET_ID = 0b0001_0000;
        const HAS_SOURCE_ID = 0b0010_0000;
        const UNUSED = 0b0100_0000;
        const EXTENDED_FLAGS = 0b1000_0000;
    }
}

/// Device-reported error codes carried in a response's `err` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    BadDeviceId,
    BadCommandId,
    NotYetImplemented,
    CommandIsRestricted,
    BadDataLength,
    CommandFailed,
    BadParameterValue,
    Busy,
    BadTargetId,
    TargetUnavailable,
    Unknown(u8),
}

impl ErrorCode {
    pub fn is_success(self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    fn from_u8(b: u8) -> Self {
        match b {
            0x00 => ErrorCode::Success,
            0x01 => ErrorCode::BadDeviceId,
            0x02 => ErrorCode::BadCommandId,
            0x03 => ErrorCode::NotYetImplemented,
            0x04 => ErrorCode::CommandIsRestricted,
            0x05 => ErrorCode::BadDataLength,
            0x06 => ErrorCode::CommandFailed,
            0x07 => ErrorCode::BadParameterValue,
            0x08 => ErrorCode::Busy,
            0x09 => ErrorCode::BadTargetId,
            0x0a => ErrorCode::TargetUnavailable,
            other => ErrorCode::Unknown(other),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            ErrorCode::Success => 0x00,
            ErrorCode::BadDeviceId => 0x01,
            ErrorCode::BadCommandId => 0x02,
            ErrorCode::NotYetImplemented => 0x03,
            ErrorCode::CommandIsRestricted => 0x04,
            ErrorCode::BadDataLength => 0x05,
            ErrorCode::CommandFailed => 0x06,
            ErrorCode::BadParameterValue => 0x07,
            ErrorCode::Busy => 0x08,
            ErrorCode::BadTargetId => 0x09,
            ErrorCode::TargetUnavailable => 0x0a,
            ErrorCode::Unknown(b) => b,
        }
    }
}

/// A fully decoded v2 frame. `target_id`/`source_id` are present only when
/// the corresponding `Flags` bit is set; `err` only when `is_response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub flags: Flags,
    pub target_id: Option<u8>,
    pub source_id: Option<u8>,
    pub device_id: u8,
    pub command_id: u8,
    pub seq: u8,
    pub err: Option<ErrorCode>,
    pub data: Vec<u8>,
}

impl Packet {
    /// Builds a request packet, auto-setting `requests_response | is_activity`
    /// and, when a target is given, `has_target_id | has_source_id` with
    /// `source_id = 0x01` — matching the source constructor's default.
    pub fn request(device_id: u8, command_id: u8, seq: u8, target_id: Option<u8>, data: Vec<u8>) -> Self {
        let mut flags = Flags::REQUESTS_RESPONSE | Flags::IS_ACTIVITY;
        let (target_id, source_id) = match target_id {
            Some(t) => {
                flags |= Flags::HAS_TARGET_ID | Flags::HAS_SOURCE_ID;
                (Some(t), Some(0x01))
            }
            None => (None, None),
        };
        Packet { flags, target_id, source_id, device_id, command_id, seq, err: None, data }
    }

    pub fn response(request: &Packet, err: ErrorCode, data: Vec<u8>) -> Self {
        Packet {
            flags: Flags::IS_RESPONSE,
            target_id: request.source_id,
            source_id: request.target_id,
            device_id: request.device_id,
            command_id: request.command_id,
            seq: request.seq,
            err: Some(err),
            data,
        }
    }

    pub fn is_response(&self) -> bool {
        self.flags.contains(Flags::IS_RESPONSE)
    }

    /// Correlation key for the waiter/listener tables: `(did, cid, seq)`.
    pub fn id(&self) -> (u8, u8, u8) {
        (self.device_id, self.command_id, self.seq)
    }

    fn packet_payload(&self) -> Vec<u8> {
        let mut out = vec![self.flags.bits()];
        if let Some(t) = self.target_id {
            out.push(t);
        }
        if let Some(s) = self.source_id {
            out.push(s);
        }
        out.push(self.device_id);
        out.push(self.command_id);
        out.push(self.seq);
        if let Some(e) = self.err {
            out.push(e.to_u8());
        }
        out.extend_from_slice(&self.data);
        out
    }

    fn checksum(payload: &[u8]) -> u8 {
        0xFF - (payload.iter().fold(0u32, |acc, &b| acc + b as u32) & 0xFF) as u8
    }

    fn escape(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len());
        for &b in bytes {
            match b {
                ESCAPE => {
                    out.push(ESCAPE);
                    out.push(ESCAPED_ESCAPE);
                }
                START => {
                    out.push(ESCAPE);
                    out.push(ESCAPED_START);
                }
                END => {
                    out.push(ESCAPE);
                    out.push(ESCAPED_END);
                }
                other => out.push(other),
            }
        }
        out
    }

    fn unescape(bytes: &[u8]) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(bytes.len());
        let mut iter = bytes.iter().copied();
        while let Some(b) = iter.next() {
            if b == ESCAPE {
                match iter.next() {
                    Some(ESCAPED_ESCAPE) => out.push(ESCAPE),
                    Some(ESCAPED_START) => out.push(START),
                    Some(ESCAPED_END) => out.push(END),
                    _ => return Err(Error::Decode("v2: bad escape sequence".into())),
                }
            } else {
                out.push(b);
            }
        }
        Ok(out)
    }

    /// Builds the escaped, delimited wire frame.
    pub fn build(&self) -> Vec<u8> {
        let payload = self.packet_payload();
        let chk = Self::checksum(&payload);
        let mut body = payload;
        body.push(chk);
        let mut out = vec![START];
        out.extend(Self::escape(&body));
        out.push(END);
        out
    }

    /// Parses a single delimited frame, `frame[0] == START` and
    /// `frame[frame.len()-1] == END` already confirmed by the caller
    /// (the `Collector`).
    pub fn parse(frame: &[u8]) -> Result<Self, Error> {
        if frame.len() < 2 || frame[0] != START || frame[frame.len() - 1] != END {
            return Err(Error::Decode("v2: malformed frame delimiters".into()));
        }
        let body = Self::unescape(&frame[1..frame.len() - 1])?;
        if body.len() < 5 {
            return Err(Error::Decode("v2: frame too short".into()));
        }
        let (payload, chk) = body.split_at(body.len() - 1);
        if Self::checksum(payload) != chk[0] {
            return Err(Error::Decode("v2: bad checksum".into()));
        }
        let flags = Flags::from_bits_truncate(payload[0]);
        let mut idx = 1;
        let target_id = if flags.contains(Flags::HAS_TARGET_ID) {
            let v = payload[idx];
            idx += 1;
            Some(v)
        } else {
            None
        };
        let source_id = if flags.contains(Flags::HAS_SOURCE_ID) {
            let v = payload[idx];
            idx += 1;
            Some(v)
        } else {
            None
        };
        if payload.len() < idx + 3 {
            return Err(Error::Decode("v2: missing header fields".into()));
        }
        let device_id = payload[idx];
        let command_id = payload[idx + 1];
        let seq = payload[idx + 2];
        idx += 3;
        let is_response = flags.contains(Flags::IS_RESPONSE);
        let err = if is_response {
            if payload.len() < idx + 1 {
                return Err(Error::Decode("v2: missing err byte".into()));
            }
            let e = ErrorCode::from_u8(payload[idx]);
            idx += 1;
            Some(e)
        } else {
            None
        };
        let data = payload[idx..].to_vec();
        Ok(Packet { flags, target_id, source_id, device_id, command_id, seq, err, data })
    }
}

/// Accumulates arbitrary byte fragments, resynchronising on the next
/// `START` byte whenever a frame turns out malformed.
#[derive(Debug, Default)]
pub struct Collector {
    buf: Vec<u8>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) -> Vec<Result<Packet, Error>> {
        self.buf.extend_from_slice(data);
        let mut out = Vec::new();
        loop {
            let Some(start) = self.buf.iter().position(|&b| b == START) else {
                self.buf.clear();
                break;
            };
            if start > 0 {
                self.buf.drain(..start);
            }
            let Some(end_rel) = self.buf[1..].iter().position(|&b| b == END) else {
                break;
            };
            let end = end_rel + 1;
            let frame: Vec<u8> = self.buf[..=end].to_vec();
            self.buf.drain(..=end);
            out.push(Packet::parse(&frame));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_unescaped_request() {
        let pkt = Packet::request(24, 0, 1, None, vec![0x00, 0x01]);
        let built = pkt.build();
        let parsed = Packet::parse(&built).unwrap();
        assert_eq!(parsed, pkt);
    }

    #[test]
    fn round_trips_with_target_and_source() {
        let pkt = Packet::request(22, 7, 42, Some((1 << 4) | 2), vec![0x32, 0x00, 0x10, 0x01]);
        let built = pkt.build();
        let parsed = Packet::parse(&built).unwrap();
        assert_eq!(parsed.target_id, Some((1 << 4) | 2));
        assert_eq!(parsed.source_id, Some(0x01));
        assert_eq!(parsed, pkt);
    }

    #[test]
    fn escapes_reserved_bytes_in_body() {
        let pkt = Packet::request(24, 0, 1, None, vec![START, END, ESCAPE]);
        let built = pkt.build();
        // Only the true frame delimiters should be unescaped START/END.
        assert_eq!(built[0], START);
        assert_eq!(*built.last().unwrap(), END);
        assert_eq!(Packet::parse(&built).unwrap().data, vec![START, END, ESCAPE]);
    }

    #[test]
    fn response_carries_error_byte() {
        let req = Packet::request(24, 0, 5, None, vec![]);
        let resp = Packet::response(&req, ErrorCode::Busy, vec![0xAA]);
        let built = resp.build();
        let parsed = Packet::parse(&built).unwrap();
        assert_eq!(parsed.err, Some(ErrorCode::Busy));
        assert_eq!(parsed.data, vec![0xAA]);
    }

    #[test]
    fn collector_resynchronises_after_garbage() {
        let mut collector = Collector::new();
        let pkt = Packet::request(24, 0, 1, None, vec![1, 2, 3]);
        let mut bytes = vec![0x00, 0x01];
        bytes.extend(pkt.build());
        let frames = collector.push(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &pkt);
    }

    #[test]
    fn collector_handles_split_fragments() {
        let pkt = Packet::request(24, 0, 9, None, vec![0xAA, 0xBB]);
        let bytes = pkt.build();
        let mut collector = Collector::new();
        assert!(collector.push(&bytes[..2]).is_empty());
        let frames = collector.push(&bytes[2..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &pkt);
    }
}
