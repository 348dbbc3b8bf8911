//! Server lifecycle: the public [`DsuServer`] handle and the actor task
//! behind it.
//!
//! The actor owns every piece of mutable state (socket, slot table, client
//! registry) and serializes all mutations, so a report arriving while a
//! datagram is being dispatched never races it. The handle is cheap to
//! clone-free: one command channel, replies over oneshots.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::ServerError;
use crate::registry::ClientRegistry;
use crate::slots::{SlotReport, SlotTable};
use crate::source::PadSource;

/// Largest inbound datagram worth reading; real DSU requests are ≤ 28 bytes.
const MAX_DATAGRAM_LEN: usize = 1024;

const COMMAND_BUFFER: usize = 16;
const REPORT_BUFFER: usize = 256;
const ERROR_BUFFER: usize = 64;

/// A point-in-time view of the server, for status lines and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStatus {
    /// Bound address while running, `None` while stopped.
    pub local_addr: Option<SocketAddr>,
    pub client_count: usize,
    pub occupied_slots: usize,
}

enum Command {
    Start {
        addr: SocketAddr,
        reply: oneshot::Sender<Result<SocketAddr, ServerError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    AddSource {
        source: Arc<dyn PadSource>,
        reply: oneshot::Sender<Result<bool, ServerError>>,
    },
    RemoveSource {
        slot: Option<usize>,
        reply: oneshot::Sender<bool>,
    },
    ClearClients {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<ServerStatus>,
    },
}

/// The Cemuhook DSU UDP server.
///
/// Dropping the handle shuts the actor down: the socket closes, mounted
/// sources are stopped and pending sends are abandoned.
pub struct DsuServer {
    server_id: u32,
    config: ServerConfig,
    cmd_tx: mpsc::Sender<Command>,
    error_rx: Option<mpsc::Receiver<ServerError>>,
}

impl DsuServer {
    pub fn new(config: ServerConfig) -> Self {
        // One id per server instance, stable across start/stop cycles so
        // subscribed clients survive a bounce without resubscribing.
        let server_id: u32 = rand::random();

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (report_tx, report_rx) = mpsc::channel(REPORT_BUFFER);
        let (datagram_tx, datagram_rx) = mpsc::channel(REPORT_BUFFER);
        let (error_tx, error_rx) = mpsc::channel(ERROR_BUFFER);

        let actor = Actor {
            dispatcher: Dispatcher::new(
                server_id,
                ClientRegistry::new(config.client_timeout),
            ),
            slots: SlotTable::new(),
            cmd_rx,
            report_rx,
            report_tx,
            datagram_rx,
            datagram_tx,
            error_tx,
            socket: None,
            recv_task: None,
        };
        tokio::spawn(actor.run());

        Self {
            server_id,
            config,
            cmd_tx,
            error_rx: Some(error_rx),
        }
    }

    /// The random id stamped into every outbound header.
    pub fn server_id(&self) -> u32 {
        self.server_id
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The stream of non-fatal server errors. Yields once; the stream has a
    /// single consumer. Errors that nobody listens to are dropped.
    pub fn take_error_stream(&mut self) -> Option<mpsc::Receiver<ServerError>> {
        self.error_rx.take()
    }

    /// Bind and start serving on the configured address, stopping any
    /// previous socket first. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        self.start_on(self.config.socket_addr()).await
    }

    /// Bind and start serving on an explicit address.
    pub async fn start_on(&self, addr: SocketAddr) -> Result<SocketAddr, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { addr, reply }).await?;
        rx.await.map_err(|_| ServerError::Closed)?
    }

    /// Unbind the socket. Idempotent; subscriptions and slots survive.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { reply }).await?;
        rx.await.map_err(|_| ServerError::Closed)
    }

    /// Mount a source in the lowest free slot. `Ok(false)` means all four
    /// slots were occupied (or the handle was already mounted).
    pub async fn add_source(&self, source: Arc<dyn PadSource>) -> Result<bool, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::AddSource { source, reply }).await?;
        rx.await.map_err(|_| ServerError::Closed)?
    }

    /// Unmount the source in `slot` (0..=3). Returns whether a source was
    /// actually mounted there.
    pub async fn remove_source(&self, slot: usize) -> Result<bool, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RemoveSource {
            slot: Some(slot),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ServerError::Closed)
    }

    /// Unmount every source.
    pub async fn remove_all_sources(&self) -> Result<(), ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RemoveSource { slot: None, reply }).await?;
        rx.await.map_err(|_| ServerError::Closed)?;
        Ok(())
    }

    /// Flush the client subscription table.
    pub async fn clear_clients(&self) -> Result<(), ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ClearClients { reply }).await?;
        rx.await.map_err(|_| ServerError::Closed)
    }

    pub async fn status(&self) -> Result<ServerStatus, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply }).await?;
        rx.await.map_err(|_| ServerError::Closed)
    }

    async fn send(&self, command: Command) -> Result<(), ServerError> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| ServerError::Closed)
    }
}

struct Actor {
    dispatcher: Dispatcher,
    slots: SlotTable,
    cmd_rx: mpsc::Receiver<Command>,
    report_rx: mpsc::Receiver<SlotReport>,
    report_tx: mpsc::Sender<SlotReport>,
    datagram_rx: mpsc::Receiver<(Vec<u8>, SocketAddr)>,
    datagram_tx: mpsc::Sender<(Vec<u8>, SocketAddr)>,
    error_tx: mpsc::Sender<ServerError>,
    socket: Option<Arc<UdpSocket>>,
    recv_task: Option<JoinHandle<()>>,
}

impl Actor {
    async fn run(mut self) {
        loop {
            tokio::select! {
                maybe_command = self.cmd_rx.recv() => {
                    match maybe_command {
                        Some(command) => self.handle_command(command).await,
                        // Every handle dropped: shut down.
                        None => break,
                    }
                }
                Some((datagram, peer)) = self.datagram_rx.recv() => {
                    self.on_datagram(&datagram, peer).await;
                }
                Some(slot_report) = self.report_rx.recv() => {
                    self.on_report(slot_report).await;
                }
            }
        }

        self.stop_socket();
        self.slots.clear().await;
        debug!("server actor stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { addr, reply } => {
                let _ = reply.send(self.start_socket(addr).await);
            }
            Command::Stop { reply } => {
                self.stop_socket();
                let _ = reply.send(());
            }
            Command::AddSource { source, reply } => {
                let result = self
                    .slots
                    .add(source, self.report_tx.clone(), self.error_tx.clone())
                    .await
                    .map(|slot| slot.is_some());
                let _ = reply.send(result);
            }
            Command::RemoveSource { slot, reply } => {
                let removed = match slot {
                    Some(slot) => self.slots.remove(slot).await,
                    None => {
                        self.slots.clear().await;
                        true
                    }
                };
                let _ = reply.send(removed);
            }
            Command::ClearClients { reply } => {
                self.dispatcher.registry_mut().clear();
                let _ = reply.send(());
            }
            Command::Status { reply } => {
                let _ = reply.send(ServerStatus {
                    local_addr: self
                        .socket
                        .as_ref()
                        .and_then(|socket| socket.local_addr().ok()),
                    client_count: self.dispatcher.client_count(),
                    occupied_slots: self.slots.occupied(),
                });
            }
        }
    }

    async fn start_socket(&mut self, addr: SocketAddr) -> Result<SocketAddr, ServerError> {
        self.stop_socket();

        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let socket = Arc::new(socket);
        let recv_socket = Arc::clone(&socket);
        let datagram_tx = self.datagram_tx.clone();
        let error_tx = self.error_tx.clone();

        self.recv_task = Some(tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
            loop {
                match recv_socket.recv_from(&mut buf).await {
                    Ok((len, peer)) => {
                        if datagram_tx.send((buf[..len].to_vec(), peer)).await.is_err() {
                            break;
                        }
                    }
                    // UDP receive errors are transient (e.g. ICMP port
                    // unreachable surfacing); report and keep listening.
                    Err(error) => {
                        let _ = error_tx.try_send(ServerError::Receive(error));
                    }
                }
            }
        }));

        self.socket = Some(socket);
        info!(%local_addr, "DSU server listening");
        Ok(local_addr)
    }

    fn stop_socket(&mut self) {
        if let Some(task) = self.recv_task.take() {
            task.abort();
        }
        if self.socket.take().is_some() {
            info!("DSU server stopped listening");
        }
    }

    async fn on_datagram(&mut self, datagram: &[u8], peer: SocketAddr) {
        let now = Instant::now();
        match self
            .dispatcher
            .handle_datagram(datagram, peer, &self.slots, now)
        {
            Ok(responses) => {
                for response in responses {
                    self.send_to(peer, &response).await;
                }
            }
            Err(error) => {
                debug!(%peer, %error, "dropping malformed datagram");
                self.emit_error(ServerError::Malformed {
                    peer,
                    source: error,
                });
            }
        }
    }

    async fn on_report(&mut self, slot_report: SlotReport) {
        if self.socket.is_none() {
            return;
        }
        let sends = self.dispatcher.handle_report(
            slot_report.slot,
            &self.slots,
            &slot_report.report,
            Instant::now(),
        );
        for (target, datagram) in sends {
            self.send_to(target, &datagram).await;
        }
    }

    async fn send_to(&mut self, peer: SocketAddr, datagram: &[u8]) {
        let Some(socket) = self.socket.as_ref() else {
            // Stopped between dispatch and send; drop silently.
            return;
        };
        match socket.send_to(datagram, peer).await {
            Ok(written) if written == datagram.len() => {}
            Ok(written) => {
                warn!(%peer, written, expected = datagram.len(), "short send");
                self.emit_error(ServerError::ShortSend {
                    peer,
                    written,
                    expected: datagram.len(),
                });
            }
            Err(source) => {
                warn!(%peer, %source, "send failed");
                self.emit_error(ServerError::Send { peer, source });
            }
        }
    }

    fn emit_error(&self, error: ServerError) {
        // A full or unclaimed error stream never blocks the serve loop.
        if let Err(error) = self.error_tx.try_send(error) {
            debug!(%error, "error stream saturated, dropping event");
        }
    }
}
