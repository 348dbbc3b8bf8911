//! The four-slot table of mounted pad sources.
//!
//! Mounting subscribes to the source's report and error streams and pumps
//! them into the server actor's channels, tagged with the slot index so
//! per-slot FIFO ordering survives the trip. Unmounting aborts the pumps and
//! asks the source to stop.

use std::sync::Arc;

use padbridge_dsu_protocol::MAX_PADS;
use padbridge_pad_types::{DualShockMeta, NormalizedReport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::source::PadSource;

/// One report, tagged with the slot that produced it.
pub(crate) struct SlotReport {
    pub slot: usize,
    pub report: NormalizedReport,
}

struct MountedSource {
    source: Arc<dyn PadSource>,
    report_pump: JoinHandle<()>,
    error_pump: JoinHandle<()>,
}

pub(crate) struct SlotTable {
    slots: [Option<MountedSource>; MAX_PADS],
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }

    /// Mount `source` in the lowest free slot.
    ///
    /// Returns `Ok(None)` when all four slots are occupied or the handle is
    /// already mounted; `Err` when the source refuses to start streaming.
    pub async fn add(
        &mut self,
        source: Arc<dyn PadSource>,
        report_tx: mpsc::Sender<SlotReport>,
        error_tx: mpsc::Sender<ServerError>,
    ) -> Result<Option<usize>, ServerError> {
        if self
            .slots
            .iter()
            .flatten()
            .any(|mounted| Arc::ptr_eq(&mounted.source, &source))
        {
            warn!(source = source.name(), "source is already mounted");
            return Ok(None);
        }

        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            debug!(source = source.name(), "all pad slots are occupied");
            return Ok(None);
        };

        let streams = source
            .start_streaming()
            .await
            .map_err(|e| ServerError::SourceStart(e.to_string()))?;

        let mut reports = streams.reports;
        let report_pump = tokio::spawn(async move {
            while let Some(report) = reports.recv().await {
                if report_tx.send(SlotReport { slot, report }).await.is_err() {
                    break;
                }
            }
        });

        let mut errors = streams.errors;
        let error_pump = tokio::spawn(async move {
            while let Some(error) = errors.recv().await {
                let forwarded = ServerError::Source {
                    slot,
                    message: error.to_string(),
                };
                if error_tx.send(forwarded).await.is_err() {
                    break;
                }
            }
        });

        debug!(source = source.name(), slot, "mounted pad source");
        self.slots[slot] = Some(MountedSource {
            source,
            report_pump,
            error_pump,
        });
        Ok(Some(slot))
    }

    /// Unmount the source in `slot`. Index 0 is as removable as any other;
    /// only indices past the table are rejected.
    pub async fn remove(&mut self, slot: usize) -> bool {
        let Some(mounted) = self.slots.get_mut(slot).and_then(Option::take) else {
            return false;
        };

        mounted.report_pump.abort();
        mounted.error_pump.abort();
        if let Err(error) = mounted.source.stop_streaming().await {
            warn!(source = mounted.source.name(), slot, %error, "source failed to stop cleanly");
        }
        debug!(slot, "unmounted pad source");
        true
    }

    /// Unmount everything.
    pub async fn clear(&mut self) {
        for slot in 0..MAX_PADS {
            self.remove(slot).await;
        }
    }

    /// Metadata for the source in `slot`, with `pad_id` forced to the slot
    /// index. `None` when the slot is empty or the source has no meta yet.
    pub fn meta_for(&self, slot: usize) -> Option<DualShockMeta> {
        let mounted = self.slots.get(slot)?.as_ref()?;
        Some(mounted.source.meta()?.with_pad_id(slot as u8))
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
