//! Keyed bucket mathematics.
//!
//! Bucket placement is deterministic but unpredictable to a remote peer:
//! it is parameterized by the manager's 32-byte secret, so an attacker
//! cannot precompute which bucket a forged address will land in.

use sha2::{Digest, Sha256};

use crate::classifier::NetClassifier;
use crate::entry::AddressEntry;

/// Number of fresh buckets.
pub const FRESH_BUCKET_COUNT: usize = 1024;
/// Number of used buckets.
pub const USED_BUCKET_COUNT: usize = 256;
/// Maximum entries per bucket, fresh or used.
pub const BUCKET_CAPACITY: usize = 64;

/// `double_SHA256(x...)`: SHA-256 applied twice over the concatenation of
/// `parts`.
pub fn double_sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut first = Sha256::new();
    for p in parts {
        first.update(p);
    }
    let once = first.finalize();
    let twice = Sha256::digest(once);
    twice.into()
}

/// First 4 bytes of `h`, read little-endian.
fn u32le(h: &[u8; 32]) -> u32 {
    u32::from_le_bytes([h[0], h[1], h[2], h[3]])
}

/// Fresh-bucket index for entry `e`:
///
/// ```text
/// s1 = u32le(H(key, group(addr), group(src))) mod 64
/// s2 = u32le(H(key, group(src), s1_as_le32))
/// index = s2 mod 1024
/// ```
pub fn fresh_bucket_index(key: &[u8; 32], e: &AddressEntry, classifier: &dyn NetClassifier) -> usize {
    let group_addr = classifier.group(&e.addr.ip);
    let group_src = classifier.group(&e.src.ip);

    let h1 = double_sha256(&[key, &group_addr, &group_src]);
    let s1 = u32le(&h1) % 64;

    let h2 = double_sha256(&[key, &group_src, &s1.to_le_bytes()]);
    let s2 = u32le(&h2);

    (s2 as usize) % FRESH_BUCKET_COUNT
}

/// Used-bucket index for entry `e`:
///
/// ```text
/// s1 = u32le(H(key, addr.raw, addr.port_le16)) mod 8
/// s2 = u32le(H(key, group(addr), s1_as_le32))
/// index = s2 mod 256
/// ```
pub fn used_bucket_index(key: &[u8; 32], e: &AddressEntry, classifier: &dyn NetClassifier) -> usize {
    let addr_key = e.addr.key();
    let h1 = double_sha256(&[key, &addr_key.raw, &addr_key.port.to_le_bytes()]);
    let s1 = u32le(&h1) % 8;

    let group_addr = classifier.group(&e.addr.ip);
    let h2 = double_sha256(&[key, &group_addr, &s1.to_le_bytes()]);
    let s2 = u32le(&h2);

    (s2 as usize) % USED_BUCKET_COUNT
}
