//! Network classification: `group`, `is_routable` and `reachability` are
//! the externally-supplied collaborators bucket placement depends on.
//!
//! [`DefaultClassifier`] gives this crate a usable, self-contained default,
//! built in the style of `witnet_p2p::peers`'s prefix-based address
//! grouping, while [`NetClassifier`] lets a host node plug in richer
//! classification (Tor, I2P, CJDNS, ASN-based grouping, ...).

use std::net::IpAddr;

/// Width in bytes of the network-group identifier.
pub const GROUP_LEN: usize = 6;

/// Classifies addresses for bucket placement and selection.
pub trait NetClassifier {
    /// A stable 6-byte prefix of `addr`'s routing class: two addresses in
    /// the same group should be treated as a single source by the bucket
    /// math, bounding how many buckets a single network neighborhood can
    /// occupy.
    fn group(&self, addr: &IpAddr) -> [u8; GROUP_LEN];

    /// Whether `addr` is usable as a public endpoint at all (not
    /// unspecified, loopback, link-local, multicast, or other
    /// non-routable range).
    fn is_routable(&self, addr: &IpAddr) -> bool;

    /// Ordering of how good a candidate `dst` is to advertise to `src`;
    /// higher is better. Used by `get_local` to pick the best self-address
    /// to offer a given peer.
    fn reachability(&self, src: &IpAddr, dst: &IpAddr) -> i32;
}

/// A reasonable standalone classifier: IPv4 addresses are grouped by their
/// /16, IPv6 addresses by their /32, mirroring Bitcoin-style netgroup
/// bucketing and `witnet_p2p::peers::get_range_address`'s /8 prefixing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultClassifier;

impl NetClassifier for DefaultClassifier {
    fn group(&self, addr: &IpAddr) -> [u8; GROUP_LEN] {
        match addr {
            IpAddr::V4(v4) => {
                let o = v4.octets();
                [1, o[0], o[1], 0, 0, 0]
            }
            IpAddr::V6(v6) => {
                let o = v6.octets();
                [2, o[0], o[1], o[2], o[3], 0]
            }
        }
    }

    fn is_routable(&self, addr: &IpAddr) -> bool {
        if addr.is_unspecified() || addr.is_loopback() || addr.is_multicast() {
            return false;
        }
        match addr {
            IpAddr::V4(v4) => {
                !(v4.is_private()
                    || v4.is_link_local()
                    || v4.is_broadcast()
                    || v4.is_documentation())
            }
            IpAddr::V6(v6) => {
                // Unique local (fc00::/7) and link-local (fe80::/10) are not routable.
                let o = v6.octets();
                !((o[0] & 0xfe) == 0xfc || (o[0] == 0xfe && (o[1] & 0xc0) == 0x80))
            }
        }
    }

    fn reachability(&self, src: &IpAddr, dst: &IpAddr) -> i32 {
        match (src, dst) {
            (IpAddr::V6(_), IpAddr::V6(_)) => 4,
            (IpAddr::V4(_), IpAddr::V4(_)) => 3,
            (IpAddr::V6(_), IpAddr::V4(_)) => 2,
            (IpAddr::V4(_), IpAddr::V6(_)) => 1,
        }
    }
}
