//! A synthetic pad source.
//!
//! Stands in for the out-of-scope HID producer: emits a deterministic
//! sine-motion report stream at a fixed rate. The CLI demo mode mounts a few
//! of these so a consumer can be pointed at the bridge without hardware.

use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use padbridge_pad_types::{
    ConnectionType, DualShockMeta, MacAddress, MotionVector, NormalizedReport,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::source::{PadSource, PadStreams};

const DEFAULT_RATE: Duration = Duration::from_millis(16);
const REPORT_BUFFER: usize = 64;

/// Period of the slowest motion component, in seconds.
const SWEEP_PERIOD_S: f32 = 4.0;

struct Shared {
    last_report: Mutex<Option<NormalizedReport>>,
    generator: Mutex<Option<JoinHandle<()>>>,
}

/// Emits gyro/accel sine sweeps as if a pad were being tilted in circles.
pub struct SyntheticSource {
    name: String,
    meta: DualShockMeta,
    rate: Duration,
    shared: Arc<Shared>,
}

impl SyntheticSource {
    /// A source with a locally administered MAC derived from `index`, so
    /// multiple synthetic pads stay distinguishable to clients.
    pub fn new(index: u8) -> Self {
        let mac = MacAddress([0x02, 0x0D, 0x5C, 0x00, 0x00, index.wrapping_add(1)]);
        Self {
            name: format!("synthetic-{index}"),
            meta: DualShockMeta::connected(mac, ConnectionType::Usb),
            rate: DEFAULT_RATE,
            shared: Arc::new(Shared {
                last_report: Mutex::new(None),
                generator: Mutex::new(None),
            }),
        }
    }

    pub fn with_rate(mut self, rate: Duration) -> Self {
        self.rate = rate;
        self
    }

    fn store_generator(&self, handle: JoinHandle<()>) {
        if let Ok(mut guard) = self.shared.generator.lock() {
            if let Some(previous) = guard.replace(handle) {
                previous.abort();
            }
        }
    }
}

fn report_at(elapsed: Duration, counter: u32) -> NormalizedReport {
    let t = elapsed.as_secs_f32();
    let phase = t * TAU / SWEEP_PERIOD_S;
    NormalizedReport {
        packet_counter: counter,
        motion_timestamp_us: elapsed.as_micros() as u64,
        // Gravity on Y plus a gentle rocking motion.
        accelerometer: MotionVector::new(0.08 * phase.sin(), -1.0, 0.08 * phase.cos()),
        gyroscope: MotionVector::new(30.0 * phase.sin(), 30.0 * phase.cos(), 0.0),
        ..NormalizedReport::default()
    }
}

#[async_trait]
impl PadSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> Option<DualShockMeta> {
        Some(self.meta)
    }

    fn last_report(&self) -> Option<NormalizedReport> {
        self.shared
            .last_report
            .lock()
            .ok()
            .and_then(|guard| *guard)
    }

    async fn start_streaming(&self) -> anyhow::Result<PadStreams> {
        let (report_tx, reports) = mpsc::channel(REPORT_BUFFER);
        // Synthetic pads have no failure modes; the error stream stays open
        // and silent for the lifetime of the generator.
        let (error_tx, errors) = mpsc::channel(1);

        let shared = Arc::clone(&self.shared);
        let rate = self.rate;
        let generator = tokio::spawn(async move {
            let _error_tx = error_tx;
            let started = Instant::now();
            let mut ticker = tokio::time::interval(rate);
            let mut counter = 0u32;
            loop {
                ticker.tick().await;
                let report = report_at(started.elapsed(), counter);
                if let Ok(mut guard) = shared.last_report.lock() {
                    *guard = Some(report);
                }
                if report_tx.send(report).await.is_err() {
                    break;
                }
                counter = counter.wrapping_add(1);
            }
        });
        self.store_generator(generator);

        Ok(PadStreams { reports, errors })
    }

    async fn stop_streaming(&self) -> anyhow::Result<()> {
        if let Ok(mut guard) = self.shared.generator.lock() {
            if let Some(generator) = guard.take() {
                generator.abort();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_monotonic_counters() -> anyhow::Result<()> {
        let source = SyntheticSource::new(0).with_rate(Duration::from_millis(1));
        let mut streams = source.start_streaming().await?;

        let first = streams.reports.recv().await.expect("report");
        let second = streams.reports.recv().await.expect("report");
        assert_eq!(second.packet_counter, first.packet_counter + 1);
        assert!(second.motion_timestamp_us >= first.motion_timestamp_us);

        source.stop_streaming().await?;
        Ok(())
    }

    #[tokio::test]
    async fn meta_is_stable_and_distinct_per_index() {
        let a = SyntheticSource::new(0);
        let b = SyntheticSource::new(1);
        let meta_a = a.meta().expect("meta");
        let meta_b = b.meta().expect("meta");
        assert_ne!(meta_a.mac, meta_b.mac);
        assert!(meta_a.is_active);
    }

    #[tokio::test]
    async fn last_report_tracks_the_stream() -> anyhow::Result<()> {
        let source = SyntheticSource::new(2).with_rate(Duration::from_millis(1));
        assert!(source.last_report().is_none());

        let mut streams = source.start_streaming().await?;
        let received = streams.reports.recv().await.expect("report");
        let snapshot = source.last_report().expect("snapshot");
        assert!(snapshot.packet_counter >= received.packet_counter);

        source.stop_streaming().await?;
        Ok(())
    }
}
