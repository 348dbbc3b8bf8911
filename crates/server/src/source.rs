//! The producer side of the bridge.
//!
//! A [`PadSource`] is whatever turns device traffic into
//! [`NormalizedReport`]s: a HID reader, a network relay, or the synthetic
//! generator used in demos and tests. The server only ever subscribes to its
//! streams and snapshots its metadata; source lifetime stays with the caller.

use async_trait::async_trait;
use padbridge_pad_types::{DualShockMeta, NormalizedReport};
use tokio::sync::mpsc;

/// The pair of streams a source hands over when it starts.
pub struct PadStreams {
    /// Reports in emission order. Dropping the receiver stops the source's
    /// producer loop on its next send.
    pub reports: mpsc::Receiver<NormalizedReport>,
    /// Non-fatal source errors, forwarded verbatim to the server's error
    /// stream.
    pub errors: mpsc::Receiver<anyhow::Error>,
}

#[async_trait]
pub trait PadSource: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Current identifying metadata, or `None` while the device has not
    /// announced itself yet. The server overrides `pad_id` with the mounted
    /// slot index.
    fn meta(&self) -> Option<DualShockMeta>;

    /// Most recent report, if any has been produced.
    fn last_report(&self) -> Option<NormalizedReport>;

    /// Begin producing reports.
    async fn start_streaming(&self) -> anyhow::Result<PadStreams>;

    /// Stop producing reports. Must be safe to call more than once.
    async fn stop_streaming(&self) -> anyhow::Result<()>;
}
