//! Wire format v1 (Sphero API 1.20): `[SOP1, SOP2, <header>, DLEN, <data>, CHK]`.
//!
//! SOP2 discriminates synchronous responses (`SOP`) from asynchronous
//! notifications (`ASYNC`); requests always use `SOP, SOP`.

use crate::error::Error;

pub const SOP: u8 = 0xFF;
pub const ASYNC: u8 = 0xFE;

/// Response status codes, from the Sphero v1 API spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrspError {
    CommandSucceeded,
    NonSpecificError,
    ChecksumFailure,
    CommandFragment,
    UnknownCommandId,
    UnsupportedCommand,
    BadMessageFormat,
    ParameterValueInvalid,
    FailedToExecute,
    UnknownDeviceId,
    VoltageTooLow,
    IllegalPageNumber,
    FlashFail,
    MainApplicationCorrupt,
    MessageTimeout,
    Unknown(u8),
}

impl MrspError {
    pub fn is_success(self) -> bool {
        matches!(self, MrspError::CommandSucceeded)
    }

    fn from_u8(b: u8) -> Self {
        match b {
            0x00 => MrspError::CommandSucceeded,
            0x01 => MrspError::NonSpecificError,
            0x02 => MrspError::ChecksumFailure,
            0x03 => MrspError::CommandFragment,
            0x04 => MrspError::UnknownCommandId,
            0x05 => MrspError::UnsupportedCommand,
            0x06 => MrspError::BadMessageFormat,
            0x07 => MrspError::ParameterValueInvalid,
            0x08 => MrspError::FailedToExecute,
            0x09 => MrspError::UnknownDeviceId,
            0x31 => MrspError::VoltageTooLow,
            0x32 => MrspError::IllegalPageNumber,
            0x33 => MrspError::FlashFail,
            0x34 => MrspError::MainApplicationCorrupt,
            0x35 => MrspError::MessageTimeout,
            other => MrspError::Unknown(other),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            MrspError::CommandSucceeded => 0x00,
            MrspError::NonSpecificError => 0x01,
            MrspError::ChecksumFailure => 0x02,
            MrspError::CommandFragment => 0x03,
            MrspError::UnknownCommandId => 0x04,
            MrspError::UnsupportedCommand => 0x05,
            MrspError::BadMessageFormat => 0x06,
            MrspError::ParameterValueInvalid => 0x07,
            MrspError::FailedToExecute => 0x08,
            MrspError::UnknownDeviceId => 0x09,
            MrspError::VoltageTooLow => 0x31,
            MrspError::IllegalPageNumber => 0x32,
            MrspError::FlashFail => 0x33,
            MrspError::MainApplicationCorrupt => 0x34,
            MrspError::MessageTimeout => 0x35,
            MrspError::Unknown(b) => b,
        }
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    0xFF - (bytes.iter().fold(0u32, |acc, &b| acc + b as u32) & 0xFF) as u8
}

/// `[SOP, SOP, DID, CID, SEQ, DLEN, data.., CHK]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub did: u8,
    pub cid: u8,
    pub seq: u8,
    pub data: Vec<u8>,
}

impl Request {
    pub fn id(&self) -> (u8, u8) {
        (SOP, self.seq)
    }

    pub fn build(&self) -> Vec<u8> {
        let dlen = (self.data.len() + 1) as u8;
        let mut payload = vec![self.did, self.cid, self.seq, dlen];
        payload.extend_from_slice(&self.data);
        let chk = checksum(&payload);
        let mut out = vec![SOP, SOP];
        out.extend_from_slice(&payload);
        out.push(chk);
        out
    }
}

/// `[SOP, SOP, MRSP, SEQ, DLEN, data.., CHK]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub mrsp: MrspError,
    pub seq: u8,
    pub data: Vec<u8>,
}

impl Response {
    pub fn id(&self) -> (u8, u8) {
        (SOP, self.seq)
    }

    pub fn build(&self) -> Vec<u8> {
        let dlen = (self.data.len() + 1) as u8;
        let mut payload = vec![self.mrsp.to_u8(), self.seq, dlen];
        payload.extend_from_slice(&self.data);
        let chk = checksum(&payload);
        let mut out = vec![SOP, SOP];
        out.extend_from_slice(&payload);
        out.push(chk);
        out
    }
}

/// `[SOP, ASYNC, ID CODE, DLEN-MSB, DLEN-LSB, data.., CHK]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Async {
    pub id_code: u8,
    pub data: Vec<u8>,
}

impl Async {
    pub fn id(&self) -> (u8, u8) {
        (ASYNC, self.id_code)
    }

    pub fn build(&self) -> Vec<u8> {
        let dlen = (self.data.len() + 1) as u16;
        let mut payload = vec![self.id_code, (dlen >> 8) as u8, (dlen & 0xFF) as u8];
        payload.extend_from_slice(&self.data);
        let chk = checksum(&payload);
        let mut out = vec![SOP, ASYNC];
        out.extend_from_slice(&payload);
        out.push(chk);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Response(Response),
    Async(Async),
}

impl Frame {
    pub fn id(&self) -> (u8, u8) {
        match self {
            Frame::Response(r) => r.id(),
            Frame::Async(a) => a.id(),
        }
    }
}

fn parse_response(payload: &[u8]) -> Result<Response, Error> {
    let (body, chk) = payload.split_at(payload.len() - 1);
    let chk = chk[0];
    if checksum(body) != chk {
        return Err(Error::Decode("v1: bad response checksum".into()));
    }
    let mrsp = MrspError::from_u8(body[0]);
    let seq = body[1];
    // body[2] is DLEN, already consumed by the collector's framing.
    let data = body[3..].to_vec();
    Ok(Response { mrsp, seq, data })
}

fn parse_async(payload: &[u8]) -> Result<Async, Error> {
    let (body, chk) = payload.split_at(payload.len() - 1);
    let chk = chk[0];
    if checksum(body) != chk {
        return Err(Error::Decode("v1: bad async checksum".into()));
    }
    let id_code = body[0];
    // body[1..3] is the 16-bit DLEN, already consumed by the collector.
    let data = body[3..].to_vec();
    Ok(Async { id_code, data })
}

/// Generates the sequence-free half of a request; the transactor assigns `seq`.
pub fn build_request(did: u8, cid: u8, seq: u8, data: Vec<u8>) -> Request {
    Request { did, cid, seq, data }
}

/// Accumulates arbitrary byte fragments into well-formed v1 frames.
///
/// Resynchronises on any structural violation by dropping the buffer and
/// scanning for the next `SOP` byte, matching the source collector's
/// leading-byte-skip behaviour.
#[derive(Debug, Default)]
pub struct Collector {
    buf: Vec<u8>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) -> Vec<Result<Frame, Error>> {
        if self.buf.is_empty() {
            let skip = data.iter().position(|&b| b == SOP).unwrap_or(data.len());
            self.buf.extend_from_slice(&data[skip..]);
        } else {
            self.buf.extend_from_slice(data);
        }

        let mut out = Vec::new();
        loop {
            // Need at least [SOP, SOP|ASYNC, .., .., DLEN] to read the length byte.
            if self.buf.len() < 5 {
                break;
            }
            if self.buf[0] != SOP {
                self.buf.clear();
                out.push(Err(Error::Decode("v1: unexpected start of packet".into())));
                break;
            }
            match self.buf[1] {
                SOP => {
                    // [SOP, SOP, MRSP, SEQ, DLEN, data.., CHK]; DLEN counts data+CHK.
                    let dlen = self.buf[4] as usize;
                    let total = 5 + dlen;
                    if self.buf.len() < total {
                        break;
                    }
                    let body = self.buf[2..total].to_vec();
                    let frame = parse_response(&body).map(Frame::Response);
                    out.push(frame);
                    self.buf.drain(..total);
                }
                ASYNC => {
                    // [SOP, ASYNC, ID CODE, DLEN-MSB, DLEN-LSB, data.., CHK].
                    let dlen = ((self.buf[3] as usize) << 8) | self.buf[4] as usize;
                    let total = 5 + dlen;
                    if self.buf.len() < total {
                        break;
                    }
                    let body = self.buf[2..total].to_vec();
                    let frame = parse_async(&body).map(Frame::Async);
                    out.push(frame);
                    self.buf.drain(..total);
                }
                _ => {
                    self.buf.clear();
                    out.push(Err(Error::Decode("v1: unexpected second start byte".into())));
                    break;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_request() {
        let req = build_request(24, 0, 7, vec![0x00, 0x64, 0x00, 0x80, 0x00, 0x00]);
        let built = req.build();
        assert_eq!(built[0], SOP);
        assert_eq!(built[1], SOP);
        let sum: u32 = built[2..built.len() - 1].iter().map(|&b| b as u32).sum();
        assert_eq!((sum + built[built.len() - 1] as u32) & 0xFF, 0xFF);
    }

    #[test]
    fn round_trip_response_via_collector() {
        let resp = Response { mrsp: MrspError::CommandSucceeded, seq: 3, data: vec![1, 2, 3] };
        let bytes = resp.build();
        let mut collector = Collector::new();
        let frames = collector.push(&bytes);
        assert_eq!(frames.len(), 1);
        match frames.into_iter().next().unwrap().unwrap() {
            Frame::Response(r) => assert_eq!(r, resp),
            _ => panic!("expected response"),
        }
    }

    #[test]
    fn collector_resynchronises_after_garbage() {
        let mut collector = Collector::new();
        let frames = collector.push(&[0x00, 0x01, 0x02]);
        assert!(frames.is_empty());
        let resp = Response { mrsp: MrspError::CommandSucceeded, seq: 1, data: vec![] };
        let frames = collector.push(&resp.build());
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_ok());
    }

    #[test]
    fn collector_handles_split_fragments() {
        let resp = Response { mrsp: MrspError::CommandSucceeded, seq: 9, data: vec![0xAA, 0xBB] };
        let bytes = resp.build();
        let mut collector = Collector::new();
        assert!(collector.push(&bytes[..3]).is_empty());
        let frames = collector.push(&bytes[3..]);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_ok());
    }
}
