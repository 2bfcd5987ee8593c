//! Tunables for the address manager, mirroring the shape of
//! `witnet_config::config::defaults::Defaults`: a small struct of
//! environment-overridable knobs instead of scattered magic numbers.

use std::time::Duration;

/// Configuration for [`crate::AddrMan`]. The `Default` impl reproduces the
/// manager's standard tunables.
#[derive(Debug, Clone)]
pub struct AddrManConfig {
    /// How long a ban record remains effective once recorded.
    pub ban_duration: Duration,
    /// The expected active-network magic; loaded dumps must match it.
    pub network_magic: u32,
}

impl Default for AddrManConfig {
    fn default() -> Self {
        AddrManConfig {
            ban_duration: Duration::from_secs(24 * 60 * 60),
            network_magic: 0,
        }
    }
}

/// On-disk format version. Persisted dumps must match exactly.
pub const FORMAT_VERSION: u32 = 0;
