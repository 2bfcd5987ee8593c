//! `get()`: biased random candidate selection.

use rand::Rng;

use crate::address::NetworkAddress;
use crate::bucket::{FRESH_BUCKET_COUNT, USED_BUCKET_COUNT};
use crate::classifier::NetClassifier;
use crate::clock::Clock;

use super::AddrMan;

const RECENT_ATTEMPT_WINDOW: i64 = 600;
const ACCEPT_SCALE: u32 = 1 << 30;

impl<C: Clock, N: NetClassifier> AddrMan<C, N> {
    /// Draws a candidate weighted by recency and attempt history. Returns
    /// `None` only when the store holds no entries at all.
    ///
    /// The relaxation loop (`factor *= 1.2` on every rejection) is
    /// unbounded by design: an unlucky low-`chance` entry is still
    /// eventually accepted, it just takes more iterations. Do not impose a
    /// hard cap.
    pub fn get(&self) -> Option<NetworkAddress> {
        if self.total_fresh == 0 && self.total_used == 0 {
            return None;
        }

        let mut rng = rand::thread_rng();
        let use_used = if self.total_fresh == 0 {
            true
        } else if self.total_used == 0 {
            false
        } else {
            rng.gen_range(0..2) == 0
        };

        let now = self.now();
        let mut factor = 1.0f64;

        loop {
            let key = if use_used {
                loop {
                    let idx = rng.gen_range(0..USED_BUCKET_COUNT);
                    if !self.used[idx].is_empty() {
                        let pos = rng.gen_range(0..self.used[idx].len());
                        break self.used[idx][pos];
                    }
                }
            } else {
                loop {
                    let idx = rng.gen_range(0..FRESH_BUCKET_COUNT);
                    if !self.fresh[idx].is_empty() {
                        let pos = rng.gen_range(0..self.fresh[idx].len());
                        break *self.fresh[idx]
                            .get_index(pos)
                            .expect("pos is within bounds by construction");
                    }
                }
            };

            let entry_id = self.index[&key];
            let entry = &self.entries[entry_id];
            let c = chance(entry.attempts, entry.last_attempt, now);

            let r: u32 = rng.gen_range(0..ACCEPT_SCALE);
            let threshold = (factor * c * f64::from(ACCEPT_SCALE)) as u64;

            if u64::from(r) < threshold {
                return Some(entry.addr);
            }
            factor *= 1.2;
        }
    }
}

/// Per-entry selection weight: decreases with consecutive failures and
/// with a very recent attempt.
pub(crate) fn chance(attempts: u32, last_attempt: i64, now: i64) -> f64 {
    let a = attempts.min(8);
    let mut c = 1.0f64;
    if now - last_attempt < RECENT_ATTEMPT_WINDOW {
        c *= 0.01;
    }
    c *= 0.66f64.powi(a as i32);
    c
}
