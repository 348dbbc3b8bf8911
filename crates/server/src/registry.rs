//! The client subscription table.
//!
//! Clients are keyed by the `(address, port)` pair observed on the inbound
//! datagram, compared by value, so repeated requests from the same peer
//! update one record. A subscription carries up to three timestamp dimensions
//! (all-pads, per-slot, per-MAC); it stays alive while any of them is within
//! the timeout and is swept out opportunistically during fan-out.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use padbridge_dsu_protocol::MAX_PADS;
use padbridge_pad_types::{DualShockMeta, MacAddress};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct ClientSubscription {
    time_all_pads: Option<Instant>,
    time_per_pad: [Option<Instant>; MAX_PADS],
    time_per_mac: HashMap<MacAddress, Instant>,
}

impl ClientSubscription {
    fn is_live(&self, now: Instant, timeout: Duration) -> bool {
        let fresh = |ts: Instant| now.saturating_duration_since(ts) < timeout;
        self.time_all_pads.is_some_and(fresh)
            || self.time_per_pad.iter().flatten().copied().any(fresh)
            || self.time_per_mac.values().copied().any(fresh)
    }

    fn wants(&self, meta: &DualShockMeta, now: Instant, timeout: Duration) -> bool {
        let fresh = |ts: Instant| now.saturating_duration_since(ts) < timeout;
        if self.time_all_pads.is_some_and(fresh) {
            return true;
        }
        if (meta.pad_id as usize) < MAX_PADS
            && self.time_per_pad[meta.pad_id as usize].is_some_and(fresh)
        {
            return true;
        }
        self.time_per_mac.get(&meta.mac).copied().is_some_and(fresh)
    }
}

/// Maps client endpoints to their subscription timestamps.
#[derive(Debug)]
pub struct ClientRegistry {
    timeout: Duration,
    clients: HashMap<SocketAddr, ClientSubscription>,
}

impl ClientRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: HashMap::new(),
        }
    }

    /// Subscribe `endpoint` to reports from every slot.
    pub fn register_all_pads(&mut self, endpoint: SocketAddr, now: Instant) {
        self.clients.entry(endpoint).or_default().time_all_pads = Some(now);
    }

    /// Subscribe `endpoint` to one slot. Out-of-range ids create the record
    /// but stamp nothing.
    pub fn register_pad_id(&mut self, endpoint: SocketAddr, pad_id: u8, now: Instant) {
        let subscription = self.clients.entry(endpoint).or_default();
        if let Some(slot) = subscription.time_per_pad.get_mut(pad_id as usize) {
            *slot = Some(now);
        } else {
            trace!(%endpoint, pad_id, "ignoring per-pad registration outside 0..=3");
        }
    }

    /// Subscribe `endpoint` to the pad with the given hardware address.
    pub fn register_mac(&mut self, endpoint: SocketAddr, mac: MacAddress, now: Instant) {
        self.clients
            .entry(endpoint)
            .or_default()
            .time_per_mac
            .insert(mac, now);
    }

    /// Endpoints whose subscription covers a report with metadata `meta`.
    ///
    /// Doubles as the garbage collector: every client with no timestamp left
    /// inside the timeout window is evicted during the scan, so the registry
    /// never needs a background sweep timer.
    pub fn clients_for(&mut self, meta: &DualShockMeta, now: Instant) -> Vec<SocketAddr> {
        let timeout = self.timeout;
        let mut interested = Vec::new();
        self.clients.retain(|endpoint, subscription| {
            if !subscription.is_live(now, timeout) {
                debug!(%endpoint, "evicting expired client subscription");
                return false;
            }
            if subscription.wants(meta, now, timeout) {
                interested.push(*endpoint);
            }
            true
        });
        interested
    }

    pub fn clear(&mut self) {
        self.clients.clear();
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padbridge_pad_types::{ConnectionType, DualShockMeta};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn endpoint(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().expect("test endpoint")
    }

    fn meta_for_pad(pad_id: u8) -> DualShockMeta {
        DualShockMeta::connected(MacAddress([0, 1, 2, 3, 4, pad_id]), ConnectionType::Usb)
            .with_pad_id(pad_id)
    }

    #[test]
    fn all_pads_subscription_matches_every_slot() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        registry.register_all_pads(endpoint(1000), now);

        for pad_id in 0..4 {
            assert_eq!(
                registry.clients_for(&meta_for_pad(pad_id), now),
                vec![endpoint(1000)]
            );
        }
    }

    #[test]
    fn per_pad_subscription_matches_only_that_slot() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        registry.register_pad_id(endpoint(1000), 2, now);

        assert!(registry.clients_for(&meta_for_pad(0), now).is_empty());
        assert_eq!(
            registry.clients_for(&meta_for_pad(2), now),
            vec![endpoint(1000)]
        );
    }

    #[test]
    fn per_mac_subscription_matches_only_that_address() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        let meta = meta_for_pad(1);
        registry.register_mac(endpoint(1000), meta.mac, now);

        assert_eq!(registry.clients_for(&meta, now), vec![endpoint(1000)]);
        assert!(registry.clients_for(&meta_for_pad(3), now).is_empty());
    }

    #[test]
    fn expired_clients_are_evicted_during_fanout() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        registry.register_all_pads(endpoint(1000), now);
        assert_eq!(registry.len(), 1);

        let later = now + TIMEOUT + Duration::from_millis(1);
        assert!(registry.clients_for(&meta_for_pad(0), later).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn renewal_keeps_a_client_alive() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        registry.register_all_pads(endpoint(1000), now);

        let renewed = now + TIMEOUT - Duration::from_millis(1);
        registry.register_all_pads(endpoint(1000), renewed);

        let later = now + TIMEOUT + Duration::from_millis(1);
        assert_eq!(
            registry.clients_for(&meta_for_pad(0), later),
            vec![endpoint(1000)]
        );
    }

    #[test]
    fn one_live_dimension_retains_but_does_not_match() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        // Stale all-pads stamp, fresh per-pad stamp for slot 3.
        registry.register_all_pads(endpoint(1000), now);
        let later = now + TIMEOUT + Duration::from_millis(1);
        registry.register_pad_id(endpoint(1000), 3, later);

        assert!(registry.clients_for(&meta_for_pad(0), later).is_empty());
        assert_eq!(registry.len(), 1, "client must survive on the per-pad stamp");
        assert_eq!(
            registry.clients_for(&meta_for_pad(3), later),
            vec![endpoint(1000)]
        );
    }

    #[test]
    fn same_endpoint_value_is_one_client() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        registry.register_all_pads(endpoint(1000), now);
        registry.register_all_pads(endpoint(1000), now);
        registry.register_pad_id(endpoint(1000), 1, now);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn out_of_range_pad_id_never_matches() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        registry.register_pad_id(endpoint(1000), 9, now);
        for pad_id in 0..4 {
            assert!(registry.clients_for(&meta_for_pad(pad_id), now).is_empty());
        }
    }

    #[test]
    fn clear_flushes_everything() {
        let mut registry = ClientRegistry::new(TIMEOUT);
        let now = Instant::now();
        registry.register_all_pads(endpoint(1000), now);
        registry.register_all_pads(endpoint(1001), now);
        registry.clear();
        assert!(registry.is_empty());
    }
}
