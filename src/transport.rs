//! The external collaborator surface. A `TransportAdapter` moves bytes over
//! whatever link a concrete toy is reached through (BLE GATT, a TCP bridge,
//! ...); this crate depends only on the trait, never a concrete stack.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;

/// Anti-DoS characteristic, v1 API. Writing the handshake string here
/// unlocks the command characteristics for ~10 seconds.
pub const V1_ANTI_DOS_UUID: Uuid = Uuid::from_u128(0x22bb746f_2bbd_75ba_e613_483955f85678);
/// Command write characteristic, v1 API.
pub const V1_COMMAND_UUID: Uuid = Uuid::from_u128(0x22bb746f_2ba1_7554_2d6f_726568705327);
/// Response/notification characteristic, v1 API.
pub const V1_RESPONSE_UUID: Uuid = Uuid::from_u128(0x22bb746f_2ba6_7554_2d6f_726568705327);
/// TX power / radio characteristic, v1 API.
pub const V1_TX_POWER_UUID: Uuid = Uuid::from_u128(0x22bb746f_2bb2_75ba_e613_483955f85678);
/// Wake characteristic, v1 API. Write `{1}` to resume a sleeping toy.
pub const V1_WAKE_UUID: Uuid = Uuid::from_u128(0x22bb746f_2bbf_75ba_e613_483955f85678);

/// Anti-DoS characteristic, v2 API.
pub const V2_ANTI_DOS_UUID: Uuid = Uuid::from_u128(0x00020005_574f_4f20_5370_6865726f2121);
/// Combined command/response characteristic, v2 API.
pub const V2_API_UUID: Uuid = Uuid::from_u128(0x00010002_574f_4f20_5370_6865726f2121);
/// DFU control characteristic, v2 API (catalogued only, never written by
/// this crate — bootloader orchestration is out of scope).
pub const V2_DFU_CONTROL_UUID: Uuid = Uuid::from_u128(0x00020002_574f_4f20_5370_6865726f2121);

/// Op codes for the optional TCP bridge framing (`spec.md` §6): a thin
/// length-prefixed envelope some deployments use to proxy a BLE link over a
/// socket instead of talking GATT directly.
pub mod tcp_bridge {
    pub const SCAN: u8 = 0x00;
    pub const INIT: u8 = 0x01;
    pub const SET_CALLBACK: u8 = 0x02;
    pub const WRITE: u8 = 0x03;
    pub const END: u8 = 0xFF;
    pub const OK: u8 = 0x00;
    pub const ON_DATA: u8 = 0x01;
    pub const ERROR: u8 = 0xFF;
}

/// A callback invoked with raw bytes as they arrive off the link, in
/// whatever fragment boundaries the transport delivers them.
pub type NotifyCallback = Box<dyn Fn(Vec<u8>) + Send + Sync>;

/// The link a transactor writes frames to and reads notifications from.
///
/// Implementations are expected to be cheap to clone/share (an `Arc` around
/// a connected peripheral handle, typically) since the transactor holds one
/// for the lifetime of a connection.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Establishes the link (BLE connect + GATT discovery, or a TCP dial).
    async fn connect(&self) -> Result<(), Error>;

    /// Tears the link down. Idempotent.
    async fn disconnect(&self) -> Result<(), Error>;

    /// Writes a single already-framed chunk to `characteristic`. The
    /// transactor is responsible for any size-based fragmentation before
    /// calling this, and for picking the characteristic that matches the
    /// byte's purpose (anti-DoS handshake, command, ...).
    async fn write(&self, characteristic: Uuid, bytes: &[u8]) -> Result<(), Error>;

    /// Registers a callback for inbound notification bytes delivered on
    /// `characteristic`. Adapters that support only one subscriber at a time
    /// should replace any previous callback registered for that
    /// characteristic; the transactor subscribes exactly once per
    /// characteristic per connection.
    async fn subscribe(&self, characteristic: Uuid, callback: NotifyCallback) -> Result<(), Error>;
}
