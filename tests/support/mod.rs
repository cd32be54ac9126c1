//! In-memory transport used only by this crate's integration tests. Not a
//! shipped simulation backend — it exists to drive the transactor without a
//! real BLE stack.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rollcore::transport::{NotifyCallback, TransportAdapter};
use rollcore::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct MockTransport {
    pub sent: Mutex<Vec<Vec<u8>>>,
    callback: Mutex<Option<NotifyCallback>>,
    connected: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTransport { sent: Mutex::new(Vec::new()), callback: Mutex::new(None), connected: AtomicBool::new(false) })
    }

    pub async fn feed(&self, bytes: Vec<u8>) {
        if let Some(cb) = self.callback.lock().await.as_ref() {
            cb(bytes);
        }
    }

    pub async fn last_sent(&self) -> Option<Vec<u8>> {
        self.sent.lock().await.last().cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
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

    async fn subscribe(&self, _characteristic: Uuid, callback: NotifyCallback) -> Result<(), Error> {
        *self.callback.lock().await = Some(callback);
        Ok(())
    }
}
