//! GLB binary container.
//!
//! ```text
//! header:  magic u32 | version u32 | total length u32
//! chunk:   length u32 | type u32 | data[length]
//! ```
//!
//! All fields are little-endian. The first chunk must be JSON; the first BIN
//! chunk after it, if any, is the binary buffer. Other chunk types are skipped.

use log::warn;

use crate::error::{LoadError, Result};

/// `"glTF"` read as a little-endian u32.
pub const MAGIC: u32 = 0x46546C67;
pub const VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F534A;
pub const CHUNK_BIN: u32 = 0x004E4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Borrowed views into a parsed GLB file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glb<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

/// Returns true if `bytes` start with the GLB magic.
pub fn is_glb(bytes: &[u8]) -> bool {
    read_u32(bytes, 0) == Some(MAGIC)
}

/// Splits a GLB file into its JSON and BIN chunks.
pub fn parse(bytes: &[u8]) -> Result<Glb<'_>> {
    let header = |offset| {
        read_u32(bytes, offset).ok_or_else(|| LoadError::malformed("GLB header truncated"))
    };

    let magic = header(0)?;
    if magic != MAGIC {
        return Err(LoadError::malformed(format!(
            "GLB magic mismatch: {magic:#010x}"
        )));
    }
    let version = header(4)?;
    if version != VERSION {
        return Err(LoadError::malformed(format!(
            "unsupported GLB version {version}"
        )));
    }
    let length = header(8)? as usize;
    if length > bytes.len() {
        return Err(LoadError::malformed(format!(
            "GLB declares {length} bytes but only {} are present",
            bytes.len()
        )));
    }
    let bytes = &bytes[..length];

    let mut chunks = Chunks {
        bytes,
        offset: HEADER_LEN,
    };

    let (kind, json) = chunks
        .next()
        .ok_or_else(|| LoadError::malformed("GLB has no JSON chunk"))??;
    if kind != CHUNK_JSON {
        return Err(LoadError::malformed(format!(
            "first GLB chunk must be JSON, found {kind:#010x}"
        )));
    }

    let mut bin = None;
    for chunk in chunks {
        let (kind, data) = chunk?;
        match kind {
            CHUNK_BIN if bin.is_none() => bin = Some(data),
            _ => warn!("[gltf] skipping GLB chunk {kind:#010x} ({} bytes)", data.len()),
        }
    }

    Ok(Glb { json, bin })
}

struct Chunks<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<(u32, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        let start = self.offset;
        let chunk = match (read_u32(self.bytes, start), read_u32(self.bytes, start + 4)) {
            (Some(len), Some(kind)) => {
                let data_start = start + CHUNK_HEADER_LEN;
                data_start
                    .checked_add(len as usize)
                    .and_then(|end| self.bytes.get(data_start..end))
                    .map(|data| (kind, data))
            }
            _ => None,
        };

        match chunk {
            Some((kind, data)) => {
                self.offset = start + CHUNK_HEADER_LEN + data.len();
                Some(Ok((kind, data)))
            }
            None => {
                self.offset = self.bytes.len();
                Some(Err(LoadError::malformed(format!(
                    "GLB chunk at byte {start} is truncated"
                ))))
            }
        }
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}
