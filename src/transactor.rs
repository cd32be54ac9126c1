//! Sequence-multiplexed request/response transactor.
//!
//! A single writer task serializes outbound frames (respecting each model's
//! `cmd_safe_interval`); a single reader path feeds inbound bytes through
//! the codec's `Collector` and dispatches decoded frames to whichever
//! one-shot waiters or fan-out listeners match.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;
use uuid::Uuid;

use crate::codec::{v1, v2};
use crate::error::{CommandErrorKind, Error};
use crate::packet::{Inbound, ListenerKey, RawCommand, WaiterKey, WILDCARD_SEQ};
use crate::transport::{
    TransportAdapter, V1_ANTI_DOS_UUID, V1_COMMAND_UUID, V1_RESPONSE_UUID, V1_TX_POWER_UUID, V2_ANTI_DOS_UUID,
    V2_API_UUID,
};

pub const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(10);
const WRITER_QUEUE_DEPTH: usize = 32;
const V1_CHUNK_SIZE: usize = 20;

/// Which wire codec a connection speaks. Fixed for the lifetime of a
/// `Transactor` since a toy never switches protocol mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireVariant {
    V1,
    V2,
}

type Listener = Arc<dyn Fn(Inbound) + Send + Sync>;

struct Outbound {
    bytes: Vec<u8>,
    chunk_size: usize,
    characteristic: Uuid,
}

/// Holds the variant-specific collector across the lifetime of a connection
/// so frames fragmented across multiple notification deliveries are
/// reassembled rather than lost.
enum CollectorState {
    V1(v1::Collector),
    V2(v2::Collector),
}

impl CollectorState {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<Inbound, Error>> {
        match self {
            CollectorState::V1(c) => c.push(bytes).into_iter().map(|r| r.map(Inbound::V1)).collect(),
            CollectorState::V2(c) => c.push(bytes).into_iter().map(|r| r.map(Inbound::V2)).collect(),
        }
    }
}

/// Message on the writer queue: either a frame to send, or a sentinel that
/// lets `close` wait for the queue to drain before disconnecting.
enum WriterMsg {
    Send(Outbound),
    Drain(oneshot::Sender<()>),
}

struct Inner {
    variant: WireVariant,
    transport: Arc<dyn TransportAdapter>,
    seq: AtomicU8,
    cmd_safe_interval: Duration,
    waiters: Mutex<HashMap<WaiterKey, Vec<oneshot::Sender<Inbound>>>>,
    listeners: Mutex<HashMap<ListenerKey, Vec<Listener>>>,
    writer_tx: mpsc::Sender<WriterMsg>,
    collector: StdMutex<CollectorState>,
}

/// Owns the waiter/listener tables and the writer queue for one connected
/// toy. Cheap to clone; clones share the same tables and queue.
#[derive(Clone)]
pub struct Transactor {
    inner: Arc<Inner>,
}

impl Transactor {
    /// Spawns the writer task and wires up the transport's notification
    /// callback to the reader-dispatch path. Does not perform the
    /// handshake write; call [`Transactor::open`] for that.
    pub fn new(variant: WireVariant, transport: Arc<dyn TransportAdapter>, cmd_safe_interval: Duration) -> Self {
        let (writer_tx, mut writer_rx) = mpsc::channel::<WriterMsg>(WRITER_QUEUE_DEPTH);

        let collector = match variant {
            WireVariant::V1 => CollectorState::V1(v1::Collector::new()),
            WireVariant::V2 => CollectorState::V2(v2::Collector::new()),
        };

        let inner = Arc::new(Inner {
            variant,
            transport: transport.clone(),
            seq: AtomicU8::new(0),
            cmd_safe_interval,
            waiters: Mutex::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            writer_tx,
            collector: StdMutex::new(collector),
        });

        let writer_transport = transport.clone();
        let writer_interval = cmd_safe_interval;
        tokio::spawn(async move {
            while let Some(msg) = writer_rx.recv().await {
                match msg {
                    WriterMsg::Send(msg) => {
                        for chunk in msg.bytes.chunks(msg.chunk_size) {
                            if let Err(err) = writer_transport.write(msg.characteristic, chunk).await {
                                log::warn!("transactor: write failed: {err}");
                                break;
                            }
                        }
                        // One sleep per dequeued command, not per chunk, matching
                        // the source toy's writer loop.
                        tokio::time::sleep(writer_interval).await;
                    }
                    WriterMsg::Drain(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        Transactor { inner }
    }

    /// Connects the transport, subscribes to notifications, and writes the
    /// protocol-specific anti-DoS handshake.
    pub async fn open(&self) -> Result<(), Error> {
        self.inner.transport.connect().await?;

        let dispatch_inner = self.inner.clone();
        let callback: crate::transport::NotifyCallback = Box::new(move |bytes| {
            let inner = dispatch_inner.clone();
            // Pushed into the persistent collector synchronously, in
            // delivery order, before handing the decoded frames off to a
            // spawned task — a frame split across two notifications must
            // be reassembled by the same collector instance regardless of
            // how the waiter/listener resolution below is scheduled.
            let frames = inner.collector.lock().unwrap().push(&bytes);
            tokio::spawn(async move {
                dispatch(inner, frames).await;
            });
        });
        let response_characteristic = match self.inner.variant {
            WireVariant::V1 => V1_RESPONSE_UUID,
            WireVariant::V2 => V2_API_UUID,
        };
        self.inner.transport.subscribe(response_characteristic, callback).await?;

        match self.inner.variant {
            WireVariant::V1 => {
                self.inner.transport.write(V1_ANTI_DOS_UUID, b"011i3").await?;
                self.inner.transport.write(V1_TX_POWER_UUID, &[0x07]).await?;
            }
            WireVariant::V2 => {
                self.inner.transport.write(V2_ANTI_DOS_UUID, b"usetheforce...band").await?;
            }
        }
        log::info!("transactor: connection opened ({:?})", self.inner.variant);
        Ok(())
    }

    /// Drains the writer queue (a sentinel value behind every write already
    /// enqueued), fails any still-pending waiters with [`Error::ConnectionClosed`]
    /// since the waiter channel is simply dropped, then disconnects the
    /// transport.
    pub async fn close(&self) -> Result<(), Error> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.inner.writer_tx.send(WriterMsg::Drain(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
        self.inner.waiters.lock().await.clear();
        self.inner.transport.disconnect().await?;
        log::info!("transactor: connection closed");
        Ok(())
    }

    /// Allocates the next sequence number, wrapping modulo 256.
    fn next_seq(&self) -> u8 {
        self.inner.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Encodes and enqueues `cmd`, returning a future that resolves once a
    /// matching response arrives (or the default timeout elapses).
    pub async fn execute(&self, cmd: RawCommand) -> Result<Inbound, Error> {
        self.execute_with_timeout(cmd, DEFAULT_EXECUTE_TIMEOUT).await
    }

    pub async fn execute_with_timeout(&self, cmd: RawCommand, deadline: Duration) -> Result<Inbound, Error> {
        let seq = self.next_seq();
        let (key, bytes) = self.encode(&cmd, seq);
        let chunk_size = match self.inner.variant {
            WireVariant::V1 => V1_CHUNK_SIZE,
            WireVariant::V2 => bytes.len().max(1),
        };

        let characteristic = match self.inner.variant {
            WireVariant::V1 => V1_COMMAND_UUID,
            WireVariant::V2 => V2_API_UUID,
        };

        let (tx, rx) = oneshot::channel();
        self.inner.waiters.lock().await.entry(key).or_default().push(tx);

        self.inner
            .writer_tx
            .send(WriterMsg::Send(Outbound { bytes, chunk_size, characteristic }))
            .await
            .map_err(|_| Error::ConnectionClosed)?;

        let inbound = match timeout(deadline, rx).await {
            Ok(Ok(inbound)) => inbound,
            Ok(Err(_)) => return Err(Error::ConnectionClosed),
            Err(_) => return Err(Error::Timeout),
        };

        check_response_error(&inbound)?;
        Ok(inbound)
    }

    /// Registers `f` to run for every inbound notification matching `key`.
    /// Listeners are never unregistered individually; they live as long as
    /// the `Transactor` does.
    pub async fn listen<F>(&self, key: ListenerKey, f: F)
    where
        F: Fn(Inbound) + Send + Sync + 'static,
    {
        self.inner.listeners.lock().await.entry(key).or_default().push(Arc::new(f));
    }

    fn encode(&self, cmd: &RawCommand, seq: u8) -> (WaiterKey, Vec<u8>) {
        match self.inner.variant {
            WireVariant::V1 => {
                let req = v1::build_request(cmd.opcode.did, cmd.opcode.cid, seq, cmd.data.clone());
                let key = WaiterKey::V1(v1::SOP, seq);
                (key, req.build())
            }
            WireVariant::V2 => {
                let pkt = v2::Packet::request(cmd.opcode.did, cmd.opcode.cid, seq, cmd.target, cmd.data.clone());
                let key = WaiterKey::V2(cmd.opcode.did, cmd.opcode.cid, seq);
                (key, pkt.build())
            }
        }
    }
}

fn check_response_error(inbound: &Inbound) -> Result<(), Error> {
    match inbound {
        Inbound::V1(v1::Frame::Response(r)) if !r.mrsp.is_success() => {
            Err(Error::CommandExecute(CommandErrorKind::V1(r.mrsp)))
        }
        Inbound::V2(pkt) => {
            if let Some(err) = pkt.err {
                if !err.is_success() {
                    return Err(Error::CommandExecute(CommandErrorKind::V2(err)));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn dispatch(inner: Arc<Inner>, frames: Vec<Result<Inbound, Error>>) {
    for frame in frames {
        let inbound = match frame {
            Ok(inbound) => inbound,
            Err(err) => {
                log::warn!("transactor: decode error: {err}");
                continue;
            }
        };

        if inbound.is_response() {
            let key = inbound.waiter_key();
            let mut waiters = inner.waiters.lock().await;
            if let Some(senders) = waiters.remove(&key) {
                // All matching one-shot waiters resolve, not just one.
                for tx in senders {
                    let _ = tx.send(inbound.clone());
                }
            } else {
                log::debug!("transactor: unmatched response {key:?}");
            }
        }

        if let Some(listener_key) = inbound.listener_key() {
            let listeners = inner.listeners.lock().await;
            if let Some(fns) = listeners.get(&listener_key) {
                for f in fns {
                    let f = f.clone();
                    let inbound = inbound.clone();
                    tokio::spawn(async move { f(inbound) });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Mutex as TokioMutex;

    struct MockTransport {
        sent: TokioMutex<Vec<Vec<u8>>>,
        callback: TokioMutex<Option<crate::transport::NotifyCallback>>,
        connected: AtomicBool,
    }

    impl MockTransport {
        fn new() -> Arc<Self> {
            Arc::new(MockTransport {
                sent: TokioMutex::new(Vec::new()),
                callback: TokioMutex::new(None),
                connected: AtomicBool::new(false),
            })
        }

        async fn feed(&self, bytes: Vec<u8>) {
            if let Some(cb) = self.callback.lock().await.as_ref() {
                cb(bytes);
            }
        }
    }

    #[async_trait::async_trait]
    impl TransportAdapter for MockTransport {
        async fn connect(&self) -> Result<(), Error> {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), Error> {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn write(&self, _characteristic: Uuid, bytes: &[u8]) -> Result<(), Error> {
            self.sent.lock().await.push(bytes.to_vec());
            Ok(())
        }

        async fn subscribe(&self, _characteristic: Uuid, callback: crate::transport::NotifyCallback) -> Result<(), Error> {
            *self.callback.lock().await = Some(callback);
            Ok(())
        }
    }

    #[tokio::test]
    async fn execute_resolves_on_matching_response() {
        let transport = MockTransport::new();
        let tx = Transactor::new(WireVariant::V2, transport.clone(), Duration::from_millis(1));
        tx.open().await.unwrap();

        let transport_for_echo = transport.clone();
        let tx_for_echo = tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let sent = transport_for_echo.sent.lock().await.clone();
                if let Some(last) = sent.last() {
                    if let Ok(req) = v2::Packet::parse(last) {
                        if req.device_id == 24 && req.command_id == 0 {
                            let resp = v2::Packet::response(&req, v2::ErrorCode::Success, vec![0xAB]);
                            transport_for_echo.feed(resp.build()).await;
                            break;
                        }
                    }
                }
            }
            let _ = tx_for_echo;
        });

        let cmd = RawCommand::new(24, 0, None, vec![0x01]);
        let result = tx.execute_with_timeout(cmd, Duration::from_secs(2)).await.unwrap();
        assert_eq!(result.data(), &[0xAB]);
    }

    #[tokio::test]
    async fn execute_times_out_without_response() {
        let transport = MockTransport::new();
        let tx = Transactor::new(WireVariant::V2, transport, Duration::from_millis(1));
        tx.open().await.unwrap();
        let cmd = RawCommand::new(24, 0, None, vec![]);
        let result = tx.execute_with_timeout(cmd, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn listener_fires_on_every_matching_notification() {
        let transport = MockTransport::new();
        let tx = Transactor::new(WireVariant::V2, transport.clone(), Duration::from_millis(1));
        tx.open().await.unwrap();

        let count = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let count_clone = count.clone();
        tx.listen(ListenerKey::V2(24, 2), move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        let notify = v2::Packet {
            flags: v2::Flags::IS_ACTIVITY,
            target_id: None,
            source_id: None,
            device_id: 24,
            command_id: 2,
            seq: WILDCARD_SEQ,
            err: None,
            data: vec![0x00],
        };
        transport.feed(notify.build()).await;
        transport.feed(notify.build()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
