//! Slotted streaming service (component C9): the protocol dual-processor
//! toys like the Rvr use instead of the bitmask protocol in
//! [`crate::control::sensor_v1`]. Every enable/disable reconfigures from
//! scratch per processor — stop, clear, re-append every still-enabled
//! service to its declared slot, configure each non-empty slot, start —
//! while `set_interval` alone just restarts with the new period, since the
//! slot layout hasn't changed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

use crate::commands::sensor;
use crate::error::Error;
use crate::packet::{Inbound, Processor};
use crate::toy::types::{StreamingService, ToyCapabilities};
use crate::transactor::Transactor;

/// One decoded streaming sample: `(attribute, value)` pairs across every
/// service configured on the slot the notification arrived on.
pub type Sample = Vec<(&'static str, f64)>;

type SlotTable = BTreeMap<(Processor, u8), Vec<&'static StreamingService>>;

pub struct StreamingController {
    transactor: Transactor,
    capabilities: &'static ToyCapabilities,
    enabled: Mutex<BTreeSet<&'static str>>,
    interval_ms: Mutex<u16>,
    /// What's actually been configured on the wire, per `(processor,
    /// slot)` — read synchronously from the notification-dispatch closure,
    /// so it's a std mutex rather than the tokio one the async methods use.
    configured: Arc<StdMutex<SlotTable>>,
}

impl StreamingController {
    pub fn new(transactor: Transactor, capabilities: &'static ToyCapabilities) -> Arc<Self> {
        Arc::new(StreamingController {
            transactor,
            capabilities,
            enabled: Mutex::new(BTreeSet::new()),
            interval_ms: Mutex::new(250),
            configured: Arc::new(StdMutex::new(BTreeMap::new())),
        })
    }

    fn processors(&self) -> BTreeSet<Processor> {
        self.capabilities.streaming_services.iter().map(|s| s.processor).collect()
    }

    pub async fn enable(&self, names: &[&'static str]) -> Result<(), Error> {
        {
            let mut enabled = self.enabled.lock().await;
            enabled.extend(names.iter().copied());
        }
        self.reconfigure().await
    }

    pub async fn disable(&self, names: &[&'static str]) -> Result<(), Error> {
        {
            let mut enabled = self.enabled.lock().await;
            for name in names {
                enabled.remove(name);
            }
        }
        self.reconfigure().await
    }

    pub async fn disable_all(&self) -> Result<(), Error> {
        self.enabled.lock().await.clear();
        self.reconfigure().await
    }

    /// Restarts every currently-streaming processor with the new interval,
    /// without touching slot configuration (`Restart`, not `Start`).
    pub async fn set_interval(&self, interval_ms: u16) -> Result<(), Error> {
        *self.interval_ms.lock().await = interval_ms;
        let streaming_processors: BTreeSet<Processor> = {
            let configured = self.configured.lock().unwrap();
            configured.keys().map(|&(processor, _)| processor).collect()
        };
        for processor in streaming_processors {
            self.transactor.execute(sensor::start_streaming_service(interval_ms, Some(processor))).await?;
        }
        Ok(())
    }

    /// Drives every processor through the `Stop`/`Start` transition the
    /// current enabled set calls for.
    async fn reconfigure(&self) -> Result<(), Error> {
        let enabled = self.enabled.lock().await.clone();
        let interval_ms = *self.interval_ms.lock().await;

        for processor in self.processors() {
            let services: Vec<&'static StreamingService> = self
                .capabilities
                .streaming_services
                .iter()
                .filter(|s| s.processor == processor && enabled.contains(s.name))
                .collect();

            self.transactor.execute(sensor::stop_streaming_service(Some(processor))).await?;
            self.transactor.execute(sensor::clear_streaming_service(Some(processor))).await?;

            if services.is_empty() {
                self.configured.lock().unwrap().retain(|&(p, _), _| p != processor);
                continue;
            }

            let mut by_slot: BTreeMap<u8, Vec<&'static StreamingService>> = BTreeMap::new();
            for svc in services {
                by_slot.entry(svc.slot).or_default().push(svc);
            }

            for (&slot, svcs) in &by_slot {
                let mut configuration = Vec::new();
                for svc in svcs {
                    configuration.extend_from_slice(&svc.index.to_be_bytes());
                    configuration.push(svc.data_size.code());
                }
                self.transactor.execute(sensor::configure_streaming_service(slot, &configuration, Some(processor))).await?;
            }

            {
                let mut configured = self.configured.lock().unwrap();
                configured.retain(|&(p, _), _| p != processor);
                configured.extend(by_slot.into_iter().map(|(slot, svcs)| ((processor, slot), svcs)));
            }

            self.transactor.execute(sensor::start_streaming_service(interval_ms, Some(processor))).await?;
        }
        Ok(())
    }

    /// Registers `f` to fire on every `streaming_service_data_notify`,
    /// decoded against whatever is currently configured for the
    /// notification's `(processor, slot)`. A slot whose service set
    /// disagrees with its own declared slot — the general form of "a
    /// `color_detection` payload must arrive on slot zero" — is logged and
    /// dropped rather than published.
    pub async fn on_data<F>(&self, f: F)
    where
        F: Fn(Processor, Sample) + Send + Sync + 'static,
    {
        let configured = self.configured.clone();
        self.transactor
            .listen(sensor::STREAMING_SERVICE_DATA_NOTIFY, move |inbound: Inbound| {
                let Ok(frame) = sensor::decode_streaming_service_data(inbound.data()) else { return };
                let processor = match &inbound {
                    Inbound::V2(pkt) => pkt.source_id.unwrap_or(1) & 0x0F,
                    _ => return,
                };
                let slot = frame.slot & 0x0F;

                let services = {
                    let configured = configured.lock().unwrap();
                    match configured.get(&(processor, slot)) {
                        Some(services) => services.clone(),
                        None => {
                            log::warn!("streaming_v2: notification on unconfigured slot {slot} (processor {processor})");
                            return;
                        }
                    }
                };
                if services.iter().any(|s| s.slot != slot) {
                    log::warn!("streaming_v2: discarding notification — service slot disagrees with token slot {slot}");
                    return;
                }

                let mut cursor = frame.data.as_slice();
                let mut sample = Sample::new();
                for svc in services {
                    let width = svc.data_size.byte_len() * svc.attributes.len();
                    if cursor.len() < width {
                        log::warn!("streaming_v2: slot {slot} payload shorter than its configured services");
                        return;
                    }
                    let (chunk, rest) = cursor.split_at(width);
                    sample.extend(svc.decode(chunk));
                    cursor = rest;
                }
                f(processor, sample);
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toy::rvr;

    #[test]
    fn configuration_bytes_pack_index_and_size_code() {
        let svc = rvr::CAPABILITIES.streaming_services.iter().find(|s| s.name == "accelerometer").unwrap();
        let mut configuration = Vec::new();
        configuration.extend_from_slice(&svc.index.to_be_bytes());
        configuration.push(svc.data_size.code());
        assert_eq!(configuration, vec![0x02, 0x00, 2]);
    }

    #[test]
    fn color_detection_is_pinned_to_slot_zero() {
        let svc = rvr::CAPABILITIES.streaming_services.iter().find(|s| s.name == "color_detection").unwrap();
        assert_eq!(svc.slot, 0);
        assert_eq!(svc.processor, rvr::SECONDARY_PROCESSOR);
    }

    #[test]
    fn decode_rescales_into_declared_range() {
        let svc = rvr::CAPABILITIES.streaming_services.iter().find(|s| s.name == "locator").unwrap();
        // Midpoint raw value for a 32-bit field decodes to ~0 given a
        // symmetric [-16000, 16000] range.
        let mid = (u32::MAX / 2).to_be_bytes();
        let mut data = Vec::new();
        data.extend_from_slice(&mid);
        data.extend_from_slice(&mid);
        let decoded = svc.decode(&data);
        assert_eq!(decoded.len(), 2);
        assert!(decoded[0].1.abs() < 1.0);
    }
}
