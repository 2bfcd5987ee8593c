//! The Bitcoin "compact size" length-prefix encoding used by the
//! persistence format's variable-length sections.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Writes `n` using compact-size encoding.
pub fn write_compact_size<W: Write>(w: &mut W, n: u64) -> io::Result<()> {
    if n < 0xfd {
        w.write_u8(n as u8)
    } else if n <= 0xffff {
        w.write_u8(0xfd)?;
        w.write_u16::<LittleEndian>(n as u16)
    } else if n <= 0xffff_ffff {
        w.write_u8(0xfe)?;
        w.write_u32::<LittleEndian>(n as u32)
    } else {
        w.write_u8(0xff)?;
        w.write_u64::<LittleEndian>(n)
    }
}

/// Reads a compact-size-encoded value.
pub fn read_compact_size<R: Read>(r: &mut R) -> io::Result<u64> {
    let first = r.read_u8()?;
    match first {
        0xff => r.read_u64::<LittleEndian>(),
        0xfe => r.read_u32::<LittleEndian>().map(u64::from),
        0xfd => r.read_u16::<LittleEndian>().map(u64::from),
        n => Ok(u64::from(n)),
    }
}
