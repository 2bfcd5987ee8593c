//! Versioned binary dump/load with full invariant revalidation on load.

use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::address::AddressKey;
use crate::bucket::{FRESH_BUCKET_COUNT, USED_BUCKET_COUNT};
use crate::classifier::NetClassifier;
use crate::clock::Clock;
use crate::config::FORMAT_VERSION;
use crate::entry::AddressEntry;
use crate::error::{AddrManError, AddrManResult};
use crate::filesystem::{Filesystem, StdFilesystem};
use crate::varint::{read_compact_size, write_compact_size};

use super::AddrMan;

impl<C: Clock, N: NetClassifier> AddrMan<C, N> {
    /// Loads the store from `path` using the standard filesystem, replacing
    /// whatever was in memory. On any failure the store is left reset
    /// (empty) and the error is returned, so callers can fall back to seed
    /// resolution.
    pub fn open(&mut self, path: &Path) -> AddrManResult<()> {
        self.open_with(path, &StdFilesystem)
    }

    /// Like [`Self::open`], with an injectable [`Filesystem`].
    pub fn open_with(&mut self, path: &Path, fs: &dyn Filesystem) -> AddrManResult<()> {
        let bytes = fs.read(path).map_err(|source| AddrManError::FileError {
            path: path.display().to_string(),
            source,
        })?;
        self.load(&bytes)
    }

    /// Serializes the store and writes it to `path` using the standard
    /// filesystem. Leaves in-memory state intact regardless of outcome.
    pub fn flush(&self, path: &Path) -> AddrManResult<()> {
        self.flush_with(path, &StdFilesystem)
    }

    /// Like [`Self::flush`], with an injectable [`Filesystem`].
    pub fn flush_with(&self, path: &Path, fs: &dyn Filesystem) -> AddrManResult<()> {
        let bytes = self.dump();
        fs.write_atomic(path, &bytes)
            .map_err(|source| AddrManError::FileError {
                path: path.display().to_string(),
                source,
            })
    }

    /// Serializes the whole store: version, network magic, bucket secret,
    /// entry table, then fresh and used bucket membership.
    pub fn dump(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_dump(&mut buf)
            .expect("writing to an in-memory buffer cannot fail");
        buf
    }

    fn write_dump<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        w.write_u32::<LittleEndian>(self.config.network_magic)?;
        w.write_all(&self.key)?;

        write_compact_size(w, self.entries.len() as u64)?;
        for (_, entry) in self.entries.iter() {
            entry.write_to(w)?;
        }

        for bucket in &self.fresh {
            write_compact_size(w, bucket.len() as u64)?;
            for key in bucket {
                key.write_to(w)?;
            }
        }

        for bucket in &self.used {
            write_compact_size(w, bucket.len() as u64)?;
            for key in bucket {
                key.write_to(w)?;
            }
        }

        Ok(())
    }

    /// Resets the store, then parses `bytes` into it, reconstructing every
    /// invariant. Any failure resets the store again and returns
    /// [`AddrManError::DecodeError`].
    pub fn load(&mut self, bytes: &[u8]) -> AddrManResult<()> {
        self.reset();
        match self.read_dump(bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn read_dump(&mut self, bytes: &[u8]) -> AddrManResult<()> {
        let mut cur = Cursor::new(bytes);

        let version = cur.read_u32::<LittleEndian>().map_err(decode_err)?;
        if version != FORMAT_VERSION {
            return Err(AddrManError::DecodeError(format!(
                "version mismatch: expected {FORMAT_VERSION}, got {version}"
            )));
        }
        let magic = cur.read_u32::<LittleEndian>().map_err(decode_err)?;
        if magic != self.config.network_magic {
            return Err(AddrManError::DecodeError(format!(
                "network magic mismatch: expected {}, got {magic}",
                self.config.network_magic
            )));
        }

        let mut key = [0u8; 32];
        cur.read_exact(&mut key).map_err(decode_err)?;
        self.key = key;

        let now = self.now();
        let n = read_compact_size(&mut cur).map_err(decode_err)?;
        for _ in 0..n {
            let entry = AddressEntry::read_from(&mut cur, now).map_err(decode_err)?;
            let key = entry.addr.key();
            if self.index.contains_key(&key) {
                return Err(AddrManError::DecodeError(format!(
                    "duplicate entry for {key}"
                )));
            }
            let id = self.entries.insert(entry);
            self.index.insert(key, id);
        }

        for bucket_idx in 0..FRESH_BUCKET_COUNT {
            let l = read_compact_size(&mut cur).map_err(decode_err)?;
            if l > 64 {
                return Err(AddrManError::DecodeError(format!(
                    "fresh bucket {bucket_idx} has {l} entries, max 64"
                )));
            }
            for _ in 0..l {
                let k = AddressKey::read_from(&mut cur).map_err(decode_err)?;
                let Some(&id) = self.index.get(&k) else {
                    return Err(AddrManError::DecodeError(format!(
                        "fresh bucket {bucket_idx} references unknown key {k}"
                    )));
                };
                if self.fresh[bucket_idx].contains(&k) {
                    return Err(AddrManError::DecodeError(format!(
                        "fresh bucket {bucket_idx} lists {k} twice"
                    )));
                }
                if self.entries[id].ref_count == 0 {
                    self.total_fresh += 1;
                }
                self.entries[id].ref_count += 1;
                self.fresh[bucket_idx].insert(k);
            }
        }

        for bucket_idx in 0..USED_BUCKET_COUNT {
            let m = read_compact_size(&mut cur).map_err(decode_err)?;
            if m > 64 {
                return Err(AddrManError::DecodeError(format!(
                    "used bucket {bucket_idx} has {m} entries, max 64"
                )));
            }
            for _ in 0..m {
                let k = AddressKey::read_from(&mut cur).map_err(decode_err)?;
                let Some(&id) = self.index.get(&k) else {
                    return Err(AddrManError::DecodeError(format!(
                        "used bucket {bucket_idx} references unknown key {k}"
                    )));
                };
                let entry = &mut self.entries[id];
                if entry.used || entry.ref_count != 0 {
                    return Err(AddrManError::DecodeError(format!(
                        "used bucket {bucket_idx} references already-claimed key {k}"
                    )));
                }
                entry.used = true;
                entry.used_bucket = Some(bucket_idx as u16);
                self.used[bucket_idx].push(k);
                self.total_used += 1;
            }
        }

        if (cur.position() as usize) != bytes.len() {
            return Err(AddrManError::DecodeError("trailing bytes after dump".into()));
        }

        for entry in self.entries.values() {
            if !(entry.used || entry.ref_count > 0) {
                return Err(AddrManError::DecodeError(format!(
                    "entry {} is neither used nor referenced by any fresh bucket",
                    entry.addr.key()
                )));
            }
        }

        Ok(())
    }
}

fn decode_err(e: io::Error) -> AddrManError {
    AddrManError::DecodeError(format!("truncated dump: {e}"))
}
