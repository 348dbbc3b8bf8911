//! Request dispatch and report fan-out.
//!
//! Pure bookkeeping: the dispatcher validates and classifies one datagram or
//! one report at a time and hands the datagrams to send back to the caller.
//! All socket work stays in the server actor.

use std::net::SocketAddr;
use std::time::Instant;

use padbridge_dsu_protocol::{
    self as dsu, ProtocolResult, Request,
};
use padbridge_pad_types::NormalizedReport;
use tracing::{debug, trace};

use crate::registry::ClientRegistry;
use crate::slots::SlotTable;

pub(crate) struct Dispatcher {
    server_id: u32,
    registry: ClientRegistry,
}

impl Dispatcher {
    pub fn new(server_id: u32, registry: ClientRegistry) -> Self {
        Self {
            server_id,
            registry,
        }
    }

    pub fn registry_mut(&mut self) -> &mut ClientRegistry {
        &mut self.registry
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// Validate one inbound datagram and produce the responses it earns.
    ///
    /// Any error means the datagram was malformed and must be dropped
    /// without a reply.
    pub fn handle_datagram(
        &mut self,
        datagram: &[u8],
        peer: SocketAddr,
        slots: &SlotTable,
        now: Instant,
    ) -> ProtocolResult<Vec<Vec<u8>>> {
        let (_, request) = dsu::parse_request(datagram)?;

        match request {
            Request::Version => {
                trace!(%peer, "version request");
                Ok(vec![dsu::version_response(self.server_id)])
            }
            Request::ListPorts { pad_indices } => {
                let mut replies = Vec::new();
                for &index in &pad_indices {
                    match slots.meta_for(index as usize) {
                        Some(meta) => {
                            replies.push(dsu::port_info_response(self.server_id, &meta));
                        }
                        None => {
                            debug!(%peer, index, "port info request for empty slot");
                        }
                    }
                }
                trace!(%peer, requested = pad_indices.len(), replied = replies.len(), "port listing");
                Ok(replies)
            }
            Request::PadData(subscription) => {
                if subscription.registers_all_pads() {
                    self.registry.register_all_pads(peer, now);
                }
                if subscription.registers_pad_id() {
                    self.registry.register_pad_id(peer, subscription.pad_id, now);
                }
                if subscription.registers_mac() {
                    self.registry.register_mac(peer, subscription.mac, now);
                }
                trace!(%peer, flags = subscription.flags, "pad data subscription");
                Ok(Vec::new())
            }
        }
    }

    /// Fan one report out to every interested client.
    ///
    /// The datagram is serialized once and cloned per target, so every
    /// client sees identical bytes.
    pub fn handle_report(
        &mut self,
        slot: usize,
        slots: &SlotTable,
        report: &NormalizedReport,
        now: Instant,
    ) -> Vec<(SocketAddr, Vec<u8>)> {
        let Some(meta) = slots.meta_for(slot) else {
            trace!(slot, "dropping report from slot without metadata");
            return Vec::new();
        };

        let targets = self.registry.clients_for(&meta, now);
        if targets.is_empty() {
            return Vec::new();
        }

        let datagram = dsu::pad_data_response(self.server_id, &meta, report);
        targets
            .into_iter()
            .map(|target| (target, datagram.clone()))
            .collect()
    }
}
