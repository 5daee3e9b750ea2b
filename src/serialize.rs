//! Persisted symbol-store format.
//!
//! A binary, tagged, versioned container: an 8-byte magic plus `u32`
//! version, then a sequence of length-prefixed blocks, one per
//! [`Symbol`](crate::symbol::Symbol), each wrapped in explicit
//! begin/end markers. Unknown block tags are a hard
//! [`CoreError::Serialization`], never silently skipped.
//!
//! Each block's payload is encoded with `bincode` rather than
//! hand-rolling a field-by-field binary layout; the explicit
//! magic/version/begin/end framing around that payload is what makes
//! the format self-describing and gives unknown-tag detection something
//! to reject.

use crate::error::{CoreError, Result};
use crate::store::FinalizedStore;
use crate::symbol::Symbol;
use anyhow::Context;
use std::io::{self, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"MRDCORE\0";
const VERSION: u32 = 1;

const BLOCK_BEGIN: u8 = 0xB0;
const BLOCK_END: u8 = 0xE0;

/// The only block tag this version understands. Kept as an explicit
/// enum (rather than a bare `u8` constant) so `write`/`read` round-trip
/// through an exhaustive match and adding a second block kind later is
/// a compile error at every call site that needs updating, not a
/// silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum BlockTag {
    Symbol = 1,
}

impl BlockTag {
    fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(BlockTag::Symbol),
            _ => None,
        }
    }
}

fn io_err(e: io::Error) -> CoreError {
    CoreError::Serialization(e.to_string())
}

fn bincode_err(e: bincode::Error) -> CoreError {
    CoreError::Serialization(e.to_string())
}

/// Write every stored symbol, in the store's stable iteration order, as
/// one length-prefixed block each.
pub fn write_store<W: Write>(store: &FinalizedStore, mut w: W) -> Result<()> {
    w.write_all(MAGIC).map_err(io_err)?;
    w.write_all(&VERSION.to_le_bytes()).map_err(io_err)?;
    for symbol in store.iter() {
        write_block(&mut w, BlockTag::Symbol, symbol)?;
    }
    Ok(())
}

fn write_block<W: Write>(w: &mut W, tag: BlockTag, symbol: &Symbol) -> Result<()> {
    let payload = bincode::serialize(symbol).map_err(bincode_err)?;
    w.write_all(&[BLOCK_BEGIN]).map_err(io_err)?;
    w.write_all(&[tag as u8]).map_err(io_err)?;
    w.write_all(&(payload.len() as u64).to_le_bytes()).map_err(io_err)?;
    w.write_all(&payload).map_err(io_err)?;
    w.write_all(&[BLOCK_END]).map_err(io_err)?;
    Ok(())
}

/// Read a store previously written by [`write_store`]. Rebuilds a
/// [`FinalizedStore`] preserving the original block order, so symbols
/// stay in a stable order across a round trip.
pub fn read_store<R: Read>(mut r: R) -> Result<FinalizedStore> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic).map_err(io_err)?;
    if &magic != MAGIC {
        return Err(CoreError::Serialization("bad magic: not an mrdocs-core symbol store".into()));
    }
    let mut version_bytes = [0u8; 4];
    r.read_exact(&mut version_bytes).map_err(io_err)?;
    let version = u32::from_le_bytes(version_bytes);
    if version != VERSION {
        return Err(CoreError::Serialization(format!("unsupported format version {version}")));
    }

    let mut symbols = Vec::new();
    loop {
        let mut marker = [0u8; 1];
        match r.read_exact(&mut marker) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(io_err(e)),
        }
        if marker[0] != BLOCK_BEGIN {
            return Err(CoreError::Serialization(format!("expected block-begin marker, found {:#x}", marker[0])));
        }

        let mut tag_byte = [0u8; 1];
        r.read_exact(&mut tag_byte).map_err(io_err)?;
        let tag = BlockTag::from_u8(tag_byte[0])
            .ok_or_else(|| CoreError::Serialization(format!("unknown block tag {:#x}", tag_byte[0])))?;

        let mut len_bytes = [0u8; 8];
        r.read_exact(&mut len_bytes).map_err(io_err)?;
        let len = u64::from_le_bytes(len_bytes) as usize;
        let mut payload = vec![0u8; len];
        r.read_exact(&mut payload).map_err(io_err)?;

        let mut end_marker = [0u8; 1];
        r.read_exact(&mut end_marker).map_err(io_err)?;
        if end_marker[0] != BLOCK_END {
            return Err(CoreError::Serialization(format!("expected block-end marker, found {:#x}", end_marker[0])));
        }

        match tag {
            BlockTag::Symbol => {
                let symbol: Symbol = bincode::deserialize(&payload).map_err(bincode_err)?;
                symbols.push(symbol);
            }
        }
    }

    Ok(FinalizedStore::from_symbols(symbols))
}

/// Convenience wrapper for [`write_store`] at the filesystem boundary.
/// Uses `anyhow::Context` rather than [`CoreError`] here, since a failure
/// at this boundary is about a specific path (open/create/write), not
/// about the store-format invariants `write_store` itself enforces.
pub fn write_store_to_path(store: &FinalizedStore, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating symbol store file at {}", path.display()))?;
    write_store(store, io::BufWriter::new(file))
        .with_context(|| format!("writing symbol store to {}", path.display()))
}

/// Convenience wrapper for [`read_store`] at the filesystem boundary.
pub fn read_store_from_path(path: impl AsRef<Path>) -> anyhow::Result<FinalizedStore> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening symbol store file at {}", path.display()))?;
    read_store(io::BufReader::new(file))
        .with_context(|| format!("reading symbol store from {}", path.display()))
}
