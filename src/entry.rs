//! The stored unit: an [`AddressEntry`] and its fixed-size wire codec.
//!
//! Field order in the wire form: `key(addr) || services_le64 || time_le64 ||
//! key(src) || attempts_le32 || last_success_le64 || last_attempt_le64`.
//! Transient fields (`used`, `ref_count`, bucket membership) are never
//! persisted; readers zero-initialize them and restamp
//! `src.time`/`src.services`.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::address::{AddressKey, NetworkAddress, DEFAULT_SERVICES};

/// Maximum number of fresh buckets a single entry may occupy simultaneously.
pub const MAX_REF_COUNT: u8 = 8;

/// The unit of storage.
#[derive(Debug, Clone)]
pub struct AddressEntry {
    /// The peer.
    pub addr: NetworkAddress,
    /// Who told us about this peer (self-address when inserted locally).
    pub src: NetworkAddress,
    /// Consecutive failures since the last success.
    pub attempts: u32,
    /// Unix seconds of the last connection attempt, 0 if never attempted.
    pub last_attempt: i64,
    /// Unix seconds of the last successful handshake, 0 if never succeeded.
    pub last_success: i64,
    /// `true` iff this entry lives in a used bucket.
    pub used: bool,
    /// Number of fresh buckets currently holding this entry, 0..=8.
    pub ref_count: u8,
    /// Index of the owning used bucket, when `used`. Stored directly
    /// rather than as `prev`/`next` sibling pointers, so removal never
    /// needs to walk a bucket's membership to find its neighbors.
    pub used_bucket: Option<u16>,
}

impl AddressEntry {
    /// Creates a brand-new fresh entry with zeroed attempt history.
    pub fn new(addr: NetworkAddress, src: NetworkAddress) -> Self {
        AddressEntry {
            addr,
            src,
            attempts: 0,
            last_attempt: 0,
            last_success: 0,
            used: false,
            ref_count: 0,
            used_bucket: None,
        }
    }

    /// Writes the 72-byte wire form described above. `src` is written as
    /// its 18-byte key alone: `src.time`/`src.services` are never
    /// persisted, since readers restamp both on load.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.addr.write_to(w)?;
        self.src.key().write_to(w)?;
        w.write_u32::<LittleEndian>(self.attempts)?;
        w.write_i64::<LittleEndian>(self.last_success)?;
        w.write_i64::<LittleEndian>(self.last_attempt)
    }

    /// Reads the wire form written by [`Self::write_to`], zero-initializing
    /// transient fields and restamping `src.time`/`src.services`.
    pub fn read_from<R: Read>(r: &mut R, now: i64) -> io::Result<Self> {
        let addr = NetworkAddress::read_from(r)?;
        let src_key = AddressKey::read_from(r)?;
        let attempts = r.read_u32::<LittleEndian>()?;
        let last_success = r.read_i64::<LittleEndian>()?;
        let last_attempt = r.read_i64::<LittleEndian>()?;

        let src = NetworkAddress::new(src_key.ip(), src_key.port, DEFAULT_SERVICES, now);

        Ok(AddressEntry {
            addr,
            src,
            attempts,
            last_attempt,
            last_success,
            used: false,
            ref_count: 0,
            used_bucket: None,
        })
    }

    /// Size in bytes of the wire form.
    pub const SIZE: usize = NetworkAddress::SIZE + AddressKey::SIZE + 4 + 8 + 8;
}
