//! `add`, `evict_fresh`, `mark_attempt`, `mark_success`, `mark_ack`, `remove`.

use rand::Rng;

use crate::address::{AddressKey, NetworkAddress};
use crate::bucket::{fresh_bucket_index, used_bucket_index, FRESH_BUCKET_COUNT, USED_BUCKET_COUNT};
use crate::classifier::NetClassifier;
use crate::clock::Clock;
use crate::entry::{AddressEntry, MAX_REF_COUNT};
use crate::error::{AddrManError, AddrManResult};

use super::{AddrMan, EntryId};

const ONE_DAY: i64 = 86_400;
const ONE_HOUR: i64 = 3_600;
const STALE_HORIZON: i64 = 30 * ONE_DAY;
const RECENT_ATTEMPT_WINDOW: i64 = 60;
const RECENT_SUCCESS_GRACE: i64 = 7 * ONE_DAY;
const FUTURE_SLACK: i64 = 600;
const REFRESH_INTERVAL_SLACK: i64 = 20 * 60;

impl<C: Clock, N: NetClassifier> AddrMan<C, N> {
    /// Inserts or refreshes an address learned from `src`. `addr.port` must
    /// be non-zero; violating that is a programming error and fails loudly.
    ///
    /// Returns `Ok(true)` if the address ends up newly or more deeply
    /// represented in the fresh set, `Ok(false)` for every routine
    /// rejection the design deliberately makes silent (duplicate with no
    /// new information, already used, at the reference cap, or the
    /// stochastic refresh gate declining).
    pub fn add(
        &mut self,
        mut addr: NetworkAddress,
        src: Option<NetworkAddress>,
    ) -> AddrManResult<bool> {
        if addr.port == 0 {
            return Err(AddrManError::InvalidArgument(
                "add: addr.port must be non-zero".into(),
            ));
        }

        let now = self.now();
        let key = addr.key();

        if let Some(&entry_id) = self.index.get(&key) {
            let has_src = src.is_some();
            let entry = &mut self.entries[entry_id];
            entry.addr.services |= addr.services;

            let interval = if now - addr.time < ONE_DAY {
                ONE_HOUR
            } else {
                ONE_DAY
            };
            let penalty = if has_src { 2 * ONE_HOUR } else { 0 };

            if entry.addr.time < addr.time - interval - penalty {
                entry.addr.time = addr.time;
            }

            if addr.time <= entry.addr.time {
                return Ok(false);
            }
            if entry.used {
                return Ok(false);
            }
            if entry.ref_count >= MAX_REF_COUNT {
                return Ok(false);
            }

            let gate = 1.0 / f64::from(1u32 << entry.ref_count);
            if !rand::thread_rng().gen_bool(gate) {
                return Ok(false);
            }

            if !self.insert_into_fresh(entry_id, key) {
                return Ok(false);
            }
            log::trace!(target: "addrman", "add: refreshed {key} into another fresh bucket");
            return Ok(true);
        }

        let src = src.unwrap_or(self.self_address);
        if addr.time <= 100_000_000 || addr.time > now + FUTURE_SLACK {
            addr.time = now - 5 * ONE_DAY;
        }

        let entry = AddressEntry::new(addr, src);
        let entry_id = self.entries.insert(entry);
        self.index.insert(key, entry_id);
        self.total_fresh += 1;

        let _ = self.insert_into_fresh(entry_id, key);
        log::debug!(target: "addrman", "add: learned new address {key}");
        Ok(true)
    }

    /// Places `entry_id` (keyed by `key`) into its fresh bucket, evicting if
    /// the bucket is full, bumping `ref_count` on success. Returns `false`
    /// (without bumping `ref_count`) if the bucket already contains `key`.
    fn insert_into_fresh(&mut self, entry_id: EntryId, key: AddressKey) -> bool {
        let bucket = fresh_bucket_index(&self.key, &self.entries[entry_id], &self.classifier);

        if self.fresh[bucket].contains(&key) {
            return false;
        }
        if self.fresh[bucket].len() >= 64 {
            self.evict_fresh(bucket);
        }
        self.fresh[bucket].insert(key);
        self.entries[entry_id].ref_count += 1;
        true
    }

    /// Single eviction pass over fresh bucket `bucket`: every stale entry
    /// is removed outright; evict_fresh only needs to free a single slot,
    /// so the oldest-by-`addr.time` survivor (first-encountered on ties) is
    /// evicted too only if the pass didn't already remove a stale entry.
    fn evict_fresh(&mut self, bucket: usize) {
        let now = self.now();
        let snapshot: Vec<AddressKey> = self.fresh[bucket].iter().copied().collect();
        let mut oldest: Option<(AddressKey, i64)> = None;
        let mut removed_stale = false;

        for key in snapshot {
            let Some(&entry_id) = self.index.get(&key) else {
                continue;
            };
            if is_stale(&self.entries[entry_id], now) {
                self.fresh[bucket].shift_remove(&key);
                self.dec_fresh_ref_and_maybe_destroy(key, entry_id);
                removed_stale = true;
            } else {
                let t = self.entries[entry_id].addr.time;
                let replace = match oldest {
                    None => true,
                    Some((_, ot)) => t < ot,
                };
                if replace {
                    oldest = Some((key, t));
                }
            }
        }

        if removed_stale {
            return;
        }

        if let Some((key, _)) = oldest {
            if let Some(&entry_id) = self.index.get(&key) {
                self.fresh[bucket].shift_remove(&key);
                self.dec_fresh_ref_and_maybe_destroy(key, entry_id);
            }
        }
    }

    /// Decrements `ref_count` on a fresh entry that was just removed from
    /// one of its buckets; destroys it once no bucket holds it anymore.
    fn dec_fresh_ref_and_maybe_destroy(&mut self, key: AddressKey, entry_id: EntryId) {
        let entry = &mut self.entries[entry_id];
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.index.remove(&key);
            self.total_fresh -= 1;
            self.entries.remove(entry_id);
        }
    }

    /// Records a connection attempt. A no-op if `addr` is unknown.
    pub fn mark_attempt(&mut self, addr: AddressKey) {
        let now = self.now();
        if let Some(&entry_id) = self.index.get(&addr) {
            let entry = &mut self.entries[entry_id];
            entry.attempts += 1;
            entry.last_attempt = now;
        }
    }

    /// Refreshes recency without promoting.
    pub fn mark_success(&mut self, addr: AddressKey) {
        let now = self.now();
        if let Some(&entry_id) = self.index.get(&addr) {
            let entry = &mut self.entries[entry_id];
            if now - entry.addr.time > REFRESH_INTERVAL_SLACK {
                entry.addr.time = now;
            }
        }
    }

    /// Promotes a fresh entry to used after a completed handshake. A no-op
    /// if `addr` is unknown or already used.
    pub fn mark_ack(&mut self, addr: AddressKey, services: u64) {
        let now = self.now();
        let Some(&entry_id) = self.index.get(&addr) else {
            return;
        };

        {
            let entry = &mut self.entries[entry_id];
            entry.addr.services |= services;
            entry.last_success = now;
            entry.last_attempt = now;
            entry.attempts = 0;
            if entry.used {
                return;
            }
        }

        let mut old: Option<usize> = None;
        for i in 0..FRESH_BUCKET_COUNT {
            if self.fresh[i].shift_remove(&addr) {
                self.entries[entry_id].ref_count -= 1;
                old = Some(i);
            }
        }
        debug_assert_eq!(self.entries[entry_id].ref_count, 0);
        let old = old.expect("mark_ack: promoted entry must have lived in a fresh bucket");
        self.total_fresh -= 1;

        let used_idx = used_bucket_index(&self.key, &self.entries[entry_id], &self.classifier);

        if self.used[used_idx].len() < 64 {
            self.entries[entry_id].used = true;
            self.entries[entry_id].used_bucket = Some(used_idx as u16);
            self.used[used_idx].push(addr);
            self.total_used += 1;
            log::debug!(target: "addrman", "mark_ack: promoted {addr} into used bucket {used_idx}");
            return;
        }

        // Used bucket is full: evict the entry with the smallest addr.time
        // (first-encountered on ties) and replace it in place.
        let mut victim_pos = 0usize;
        let mut victim_time = i64::MAX;
        for (pos, k) in self.used[used_idx].iter().enumerate() {
            if let Some(&vid) = self.index.get(k) {
                let t = self.entries[vid].addr.time;
                if t < victim_time {
                    victim_time = t;
                    victim_pos = pos;
                }
            }
        }
        let victim_key = self.used[used_idx][victim_pos];
        let victim_id = self.index[&victim_key];

        let victim_fresh_bucket =
            fresh_bucket_index(&self.key, &self.entries[victim_id], &self.classifier);
        let target_fresh_bucket = if self.fresh[victim_fresh_bucket].len() >= 64 {
            old
        } else {
            victim_fresh_bucket
        };

        self.used[used_idx][victim_pos] = addr;
        self.entries[entry_id].used = true;
        self.entries[entry_id].used_bucket = Some(used_idx as u16);

        let victim = &mut self.entries[victim_id];
        victim.used = false;
        victim.used_bucket = None;
        victim.ref_count = 1;
        self.fresh[target_fresh_bucket].insert(victim_key);
        self.total_fresh += 1;

        log::debug!(
            target: "addrman",
            "mark_ack: used bucket {used_idx} full, evicted {victim_key} back to fresh"
        );
    }

    /// Removes a known address entirely. Returns `false` if `addr` was
    /// unknown.
    pub fn remove(&mut self, addr: AddressKey) -> bool {
        let Some(&entry_id) = self.index.get(&addr) else {
            return false;
        };

        if self.entries[entry_id].used {
            let bucket = self.entries[entry_id]
                .used_bucket
                .expect("used entry must record its owning bucket") as usize;
            let pos = self.used[bucket]
                .iter()
                .position(|k| *k == addr)
                .expect("used bucket must contain its own member");
            self.used[bucket].remove(pos);
            self.total_used -= 1;
        } else {
            for i in 0..FRESH_BUCKET_COUNT {
                if self.fresh[i].shift_remove(&addr) {
                    self.entries[entry_id].ref_count -= 1;
                }
            }
            debug_assert_eq!(self.entries[entry_id].ref_count, 0);
            self.total_fresh -= 1;
        }

        self.index.remove(&addr);
        self.entries.remove(entry_id);
        log::debug!(target: "addrman", "remove: dropped {addr}");
        true
    }
}

/// Whether entry `e` is a preferred eviction victim.
pub(crate) fn is_stale(e: &AddressEntry, now: i64) -> bool {
    if e.last_attempt > now - RECENT_ATTEMPT_WINDOW && e.last_attempt <= now {
        return false;
    }
    if e.addr.time > now + FUTURE_SLACK {
        return true;
    }
    if e.addr.time == 0 {
        return true;
    }
    if now - e.addr.time > STALE_HORIZON {
        return true;
    }
    if e.last_success == 0 && e.attempts >= 3 {
        return true;
    }
    if now - e.last_success > RECENT_SUCCESS_GRACE && e.attempts >= 10 {
        return true;
    }
    false
}
