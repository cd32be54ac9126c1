//! Framed wire codecs. `v1` is the legacy Sphero-classic format; `v2` is the
//! delimited/escaped format used by every later toy generation.

pub mod v1;
pub mod v2;
