//! Ban table: an expiring set of IP-only bans.

use crate::address::{AddressKey, NetworkAddress};
use crate::classifier::NetClassifier;
use crate::clock::Clock;

use super::{AddrMan, BanRecord};

impl<C: Clock, N: NetClassifier> AddrMan<C, N> {
    /// Bans the IP behind `addr` (port is ignored; ban records are keyed on
    /// `{IP, 0}`). First writer wins: an existing ban is left untouched.
    pub fn ban(&mut self, addr: AddressKey) {
        let now = self.now();
        self.bans.entry(addr.ip_only()).or_insert_with(|| {
            log::debug!(target: "addrman", "ban: {} banned", addr.ip());
            BanRecord {
                addr: NetworkAddress::new(addr.ip(), 0, 0, now),
            }
        });
    }

    /// Lifts a ban, if any.
    pub fn unban(&mut self, addr: AddressKey) {
        if self.bans.remove(&addr.ip_only()).is_some() {
            log::debug!(target: "addrman", "unban: {} unbanned", addr.ip());
        }
    }

    /// Whether `addr`'s IP is currently banned. Prunes and reports `false`
    /// if the ban has expired.
    pub fn is_banned(&mut self, addr: AddressKey) -> bool {
        let now = self.now();
        let ip = addr.ip_only();
        let Some(record) = self.bans.get(&ip) else {
            return false;
        };
        let expires_at = record.addr.time + self.config.ban_duration.as_secs() as i64;
        if now > expires_at {
            self.bans.remove(&ip);
            return false;
        }
        true
    }

    /// Clears every ban.
    pub fn clear_banned(&mut self) {
        self.bans.clear();
        log::debug!(target: "addrman", "clear_banned: ban table cleared");
    }

    /// Iterates over every currently-recorded ban (not pruned for
    /// expiry, call [`Self::is_banned`] to check a specific address).
    pub fn banned_iter(&self) -> impl Iterator<Item = NetworkAddress> + '_ {
        self.bans.values().map(|r| r.addr)
    }
}
