//! Address manager for a Bitcoin-style peer-to-peer node.
//!
//! Remembers network peers learned from gossip, seeds and direct
//! connections; scores their reliability; selects candidates for outbound
//! dial attempts; resists eclipse attacks via keyed bucket placement; and
//! persists the collection across restarts.
//!
//! The manager is single-owner, single-threaded by design: every public
//! method takes `&mut self`, and a multithreaded host must serialize
//! access with its own lock spanning each call.
//!
//! Out of scope: network I/O, name resolution, time synchronization,
//! logging transport, filesystem policy beyond whole-file read/atomic
//! write, and the dialing/handshake logic that consumes selected
//! addresses. See [`clock::Clock`], [`classifier::NetClassifier`] and
//! [`filesystem::Filesystem`] for the seams those collaborators plug into.

pub mod address;
pub mod bucket;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod filesystem;
mod varint;

mod addrman;

pub use addrman::{AddrMan, EntryId};
pub use address::{AddressKey, NetworkAddress};
pub use classifier::{DefaultClassifier, NetClassifier};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AddrManConfig;
pub use entry::AddressEntry;
pub use error::{AddrManError, AddrManResult};
pub use filesystem::{Filesystem, StdFilesystem};
