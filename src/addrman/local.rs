//! Local address table: this node's own self-advertised addresses.

use std::net::IpAddr;

use crate::address::{AddressKey, NetworkAddress};
use crate::classifier::NetClassifier;
use crate::clock::Clock;

use super::{AddrMan, LocalRecord};

impl<C: Clock, N: NetClassifier> AddrMan<C, N> {
    /// Records a self-address this node can advertise to peers. Rejects
    /// unroutable addresses and duplicates.
    pub fn add_local(&mut self, addr: NetworkAddress, score: i32) -> bool {
        if !self.classifier.is_routable(&addr.ip) {
            return false;
        }
        let key = addr.key();
        if self.locals.contains_key(&key) {
            return false;
        }

        let mut addr = addr;
        addr.services = self.self_address.services;
        self.locals.insert(
            key,
            LocalRecord {
                addr,
                score,
                kind: score,
            },
        );
        log::debug!(target: "addrman", "add_local: recorded {key} with score {score}");
        true
    }

    /// Bumps confidence in a self-address on external confirmation. A
    /// no-op if `addr` is unknown.
    pub fn mark_local(&mut self, addr: AddressKey) {
        if let Some(record) = self.locals.get_mut(&addr) {
            record.score += 1;
        }
    }

    /// Picks the best self-address to advertise to `src`. With no `src`,
    /// returns the highest-scored record.
    /// Otherwise, the record with the best [`NetClassifier::reachability`]
    /// from `src`, ties broken by score. Stamps the returned record's
    /// `time` on success.
    pub fn get_local(&mut self, src: Option<IpAddr>) -> Option<NetworkAddress> {
        let now = self.now();
        let best_key = match src {
            None => self
                .locals
                .iter()
                .max_by_key(|(_, r)| r.score)
                .map(|(k, _)| *k)?,
            Some(src_ip) => {
                let classifier = &self.classifier;
                self.locals
                    .iter()
                    .max_by_key(|(_, r)| (classifier.reachability(&src_ip, &r.addr.ip), r.score))
                    .map(|(k, _)| *k)?
            }
        };

        let record = self.locals.get_mut(&best_key)?;
        record.addr.time = now;
        Some(record.addr)
    }

    /// Whether `addr` is a recorded self-address.
    pub fn has_local(&self, addr: AddressKey) -> bool {
        self.locals.contains_key(&addr)
    }

    /// Iterates over every recorded self-address.
    pub fn locals_iter(&self) -> impl Iterator<Item = NetworkAddress> + '_ {
        self.locals.values().map(|r| r.addr)
    }
}
