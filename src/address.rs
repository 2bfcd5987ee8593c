//! Network addresses and their fixed-size on-wire key.
//!
//! The in-memory [`NetworkAddress`] carries services and recency metadata;
//! the [`AddressKey`] is the 18-byte `{raw ip, port}` pair used both as the
//! global index's hash key and as the on-disk bucket entry.

use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

/// Default services bitmask assigned to a freshly-read `src` on decode.
pub const DEFAULT_SERVICES: u64 = 1;

/// Fixed-size 18-byte key: 16-byte raw IP (IPv4-mapped for v4) plus a
/// little-endian port. Equality and hashing for the global index are over
/// this pair alone.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressKey {
    /// 16-byte raw IP, IPv4-mapped for IPv4 addresses.
    pub raw: [u8; 16],
    /// Port, host order.
    pub port: u16,
}

impl AddressKey {
    /// Builds a key from an [`IpAddr`] and port.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        AddressKey {
            raw: ip_to_raw(ip),
            port,
        }
    }

    /// A key with the port zeroed, used for ban-table lookups.
    pub fn ip_only(&self) -> [u8; 16] {
        self.raw
    }

    /// Reconstructs the [`IpAddr`] this key was built from.
    pub fn ip(&self) -> IpAddr {
        raw_to_ip(self.raw)
    }

    /// Writes the 18-byte wire form: `raw[16] || port_le16`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.raw)?;
        w.write_u16::<LittleEndian>(self.port)
    }

    /// Reads the 18-byte wire form written by [`Self::write_to`].
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut raw = [0u8; 16];
        r.read_exact(&mut raw)?;
        let port = r.read_u16::<LittleEndian>()?;
        Ok(AddressKey { raw, port })
    }

    /// Size in bytes of the wire form.
    pub const SIZE: usize = 18;
}

impl std::fmt::Debug for AddressKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip(), self.port)
    }
}

impl std::fmt::Display for AddressKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip(), self.port)
    }
}

/// A routable endpoint plus the metadata the address manager tracks about
/// it: services bitmask, last-seen time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkAddress {
    /// The peer's IP.
    pub ip: IpAddr,
    /// The peer's port. Must be non-zero for entries accepted by `add`.
    pub port: u16,
    /// Services bitmask advertised by this address.
    pub services: u64,
    /// Last-seen time, Unix seconds.
    pub time: i64,
}

impl NetworkAddress {
    /// Builds a network address.
    pub fn new(ip: IpAddr, port: u16, services: u64, time: i64) -> Self {
        NetworkAddress {
            ip,
            port,
            services,
            time,
        }
    }

    /// The `{IP, port}` key used by the global index.
    pub fn key(&self) -> AddressKey {
        AddressKey::new(self.ip, self.port)
    }

    /// The `{IP, 0}` key used by the ban table.
    pub fn ban_key(&self) -> [u8; 16] {
        ip_to_raw(self.ip)
    }

    /// Writes the 34-byte wire form: `key || services_le64 || time_le64`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.key().write_to(w)?;
        w.write_u64::<LittleEndian>(self.services)?;
        w.write_i64::<LittleEndian>(self.time)
    }

    /// Reads the address portion written by [`Self::write_to`].
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let key = AddressKey::read_from(r)?;
        let services = r.read_u64::<LittleEndian>()?;
        let time = r.read_i64::<LittleEndian>()?;
        Ok(NetworkAddress {
            ip: key.ip(),
            port: key.port,
            services,
            time,
        })
    }

    /// Size in bytes of the wire form.
    pub const SIZE: usize = AddressKey::SIZE + 8 + 8;
}

fn ip_to_raw(ip: IpAddr) -> [u8; 16] {
    match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
        IpAddr::V6(v6) => v6.octets(),
    }
}

fn raw_to_ip(raw: [u8; 16]) -> IpAddr {
    let v6 = Ipv6Addr::from(raw);
    match v6.to_ipv4_mapped() {
        Some(v4) => IpAddr::V4(v4),
        None => IpAddr::V6(v6),
    }
}

/// Convenience for building loopback-ish test addresses without mapping
/// noise; kept private to the crate's own tests.
#[cfg(test)]
pub(crate) fn v4(a: u8, b: u8, c: u8, d: u8, port: u16) -> NetworkAddress {
    NetworkAddress::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), port, 0, 0)
}
