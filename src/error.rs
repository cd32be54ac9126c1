use thiserror::Error;

use crate::codec::{v1, v2};

/// Error surfaced to callers of the protocol core.
///
/// Variants match the kinds in the error handling design: decode failures
/// resynchronise the codec rather than tearing down the transport, while
/// the others unwind a pending `execute`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("command failed: {0}")]
    CommandExecute(#[from] CommandErrorKind),

    #[error("operation timed out")]
    Timeout,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("device does not implement ({did:#04x}, {cid:#04x})")]
    UnsupportedOperation { did: u8, cid: u8 },

    #[error("transport error: {0}")]
    Transport(String),
}

/// The protocol-specific error code carried by a failed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandErrorKind {
    #[error("v1 mrsp {0:?}")]
    V1(v1::MrspError),
    #[error("v2 err {0:?}")]
    V2(v2::ErrorCode),
}
