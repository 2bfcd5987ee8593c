//! The address manager: global index, fresh/used buckets, ban table and
//! local-address table, tied together.

mod ban;
mod insert;
mod local;
mod persist;
mod select;

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use indexmap::IndexSet;
use rand::RngCore;
use slotmap::{new_key_type, SlotMap};

use crate::address::{AddressKey, NetworkAddress, DEFAULT_SERVICES};
use crate::bucket::{FRESH_BUCKET_COUNT, USED_BUCKET_COUNT};
use crate::classifier::{DefaultClassifier, NetClassifier};
use crate::clock::{Clock, SystemClock};
use crate::config::AddrManConfig;
use crate::entry::AddressEntry;

new_key_type! {
    /// Stable arena handle for a stored [`AddressEntry`].
    pub struct EntryId;
}

/// A record in the ban table: a [`NetworkAddress`] with its port zeroed and
/// `time` set to the instant it was banned.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BanRecord {
    pub(crate) addr: NetworkAddress,
}

/// A self-advertised address this node can offer peers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalRecord {
    pub(crate) addr: NetworkAddress,
    pub(crate) score: i32,
    pub(crate) kind: i32,
}

/// The peer address manager.
///
/// Single-owner, single-threaded by design: every public method takes
/// `&mut self` and there are no internal locks. A multithreaded host must
/// serialize access itself.
pub struct AddrMan<C: Clock = SystemClock, N: NetClassifier = DefaultClassifier> {
    pub(crate) entries: SlotMap<EntryId, AddressEntry>,
    pub(crate) index: HashMap<AddressKey, EntryId>,
    pub(crate) fresh: Vec<IndexSet<AddressKey>>,
    pub(crate) used: Vec<Vec<AddressKey>>,
    pub(crate) total_fresh: usize,
    pub(crate) total_used: usize,
    pub(crate) key: [u8; 32],
    pub(crate) self_address: NetworkAddress,
    pub(crate) bans: HashMap<[u8; 16], BanRecord>,
    pub(crate) locals: HashMap<AddressKey, LocalRecord>,
    pub(crate) config: AddrManConfig,
    pub(crate) classifier: N,
    pub(crate) clock: C,
}

impl AddrMan<SystemClock, DefaultClassifier> {
    /// Builds a manager with the system clock and the default classifier.
    pub fn new() -> Self {
        Self::with_clock_and_classifier(SystemClock, DefaultClassifier)
    }

    /// Builds a manager with explicit configuration.
    pub fn with_config(config: AddrManConfig) -> Self {
        let mut am = Self::new();
        am.config = config;
        am
    }
}

impl Default for AddrMan<SystemClock, DefaultClassifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, N: NetClassifier> AddrMan<C, N> {
    /// Builds a manager with an injected clock and classifier, for tests or
    /// hosts that need non-default network classification.
    pub fn with_clock_and_classifier(clock: C, classifier: N) -> Self {
        AddrMan {
            entries: SlotMap::with_key(),
            index: HashMap::new(),
            fresh: (0..FRESH_BUCKET_COUNT).map(|_| IndexSet::new()).collect(),
            used: (0..USED_BUCKET_COUNT).map(|_| Vec::new()).collect(),
            total_fresh: 0,
            total_used: 0,
            key: random_secret(),
            self_address: NetworkAddress::new(
                IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
                0,
                DEFAULT_SERVICES,
                0,
            ),
            bans: HashMap::new(),
            locals: HashMap::new(),
            config: AddrManConfig::default(),
            classifier,
            clock,
        }
    }

    /// The clock this manager reads `now()` from, for tests that need to
    /// advance a [`crate::clock::FixedClock`] between calls.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Current configuration.
    pub fn config(&self) -> &AddrManConfig {
        &self.config
    }

    /// Mutable access to the configuration, for hosts or tests that need to
    /// override a tunable (e.g. `ban_duration`) after construction.
    pub fn config_mut(&mut self) -> &mut AddrManConfig {
        &mut self.config
    }

    /// Resets the manager to a fresh, empty state and regenerates the
    /// bucket secret.
    pub fn reset(&mut self) {
        self.entries = SlotMap::with_key();
        self.index.clear();
        self.fresh = (0..FRESH_BUCKET_COUNT).map(|_| IndexSet::new()).collect();
        self.used = (0..USED_BUCKET_COUNT).map(|_| Vec::new()).collect();
        self.total_fresh = 0;
        self.total_used = 0;
        self.key = random_secret();
        self.bans.clear();
        self.locals.clear();
        log::debug!(target: "addrman", "reset: store cleared, bucket secret regenerated");
    }

    /// Total number of distinct entries known (fresh + used).
    pub fn total(&self) -> usize {
        self.total_fresh + self.total_used
    }

    /// `true` once the fresh side alone could not accept another unique
    /// address: `total_fresh >= 1024 * 64`.
    pub fn is_full(&self) -> bool {
        self.total_fresh >= FRESH_BUCKET_COUNT * 64
    }

    /// Iterates over every known address, fresh and used.
    pub fn iter_addresses(&self) -> impl Iterator<Item = &NetworkAddress> + '_ {
        self.entries.values().map(|e| &e.addr)
    }

    /// Number of entries currently held in fresh bucket `i`, for tests that
    /// need to check the per-bucket capacity invariant directly.
    pub fn fresh_bucket_len(&self, i: usize) -> usize {
        self.fresh[i].len()
    }

    /// Releases any resources held by the manager.
    ///
    /// `open`/`flush` are one-shot whole-file operations: there is no live
    /// file handle to release between calls. This exists for parity with
    /// hosts that expect a `close` and is safe to call at any time,
    /// including never.
    pub fn close(&mut self) {}

    pub(crate) fn now(&self) -> i64 {
        self.clock.now()
    }
}

/// Generates a cryptographically random 32-byte bucket secret.
fn random_secret() -> [u8; 32] {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}
