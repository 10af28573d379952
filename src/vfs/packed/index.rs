/*!
 * Packed Archive Index
 * Name to header-offset map built once at mount time
 */

use ahash::RandomState;
use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};
use tracing::{debug, warn};

use super::header::{Block, EntryKind, Header, Record};
use crate::core::limits::{BLOCK_SIZE, MAX_LONG_NAME_LEN};
use crate::vfs::paths;
use crate::vfs::types::{VfsError, VfsResult};

/// Read one record at an absolute stream position
pub(crate) fn read_block<R: Read + Seek>(stream: &mut R, at: u64) -> io::Result<Block> {
    let mut block: Block = [0; BLOCK_SIZE as usize];
    stream.seek(SeekFrom::Start(at))?;
    stream.read_exact(&mut block)?;
    Ok(block)
}

/// Read and decode the record at an absolute stream position
pub(crate) fn read_header<R: Read + Seek>(stream: &mut R, at: u64) -> VfsResult<Record> {
    let block = read_block(stream, at)
        .map_err(|e| VfsError::from_io(e, format!("read header at {}", at)))?;
    Ok(Header::parse(&block)?)
}

/// Index entry names as stored in an archive
///
/// Leading `./` and trailing `/` are dropped so directory entries are
/// found by the same name a caller would use.
fn index_name(raw: &str) -> String {
    paths::normalize(raw)
}

/// Map from normalized entry name to header position
///
/// Positions are relative to the archive's base offset. The index is
/// read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct PackedArchiveIndex {
    entries: HashMap<String, u64, RandomState>,
}

impl PackedArchiveIndex {
    /// Walk every header from `base` until the end marker
    ///
    /// A stream that ends without an end marker is indexed up to its last
    /// complete record. A corrupt header, or one whose data runs past
    /// `stream_len`, fails the whole scan.
    pub fn scan<R: Read + Seek>(stream: &mut R, base: u64, stream_len: u64) -> VfsResult<Self> {
        let mut entries = HashMap::with_hasher(RandomState::new());
        let mut pending_name: Option<String> = None;
        let mut pos = 0u64;

        loop {
            if base + pos + BLOCK_SIZE > stream_len {
                warn!(position = pos, "Archive ended without an end marker");
                break;
            }

            let header = match read_header(stream, base + pos)? {
                Record::End => break,
                Record::Entry(header) => header,
            };
            let data_at = base + pos + BLOCK_SIZE;
            match data_at.checked_add(header.size) {
                Some(data_end) if data_end <= stream_len => {}
                _ => {
                    return Err(VfsError::InvalidArchive(format!(
                        "entry {:?} at {} declares {} bytes past the end of the archive",
                        header.name, pos, header.size
                    )))
                }
            }
            // Bounded by stream_len once the data fits
            let next = pos + BLOCK_SIZE + header.padded_size()?;

            match header.kind {
                EntryKind::LongName => {
                    pending_name = Some(read_long_name(stream, data_at, header.size)?);
                }
                EntryKind::Extension => {
                    debug!(name = %header.name, "Skipping extension record");
                }
                _ => {
                    let raw = pending_name.take().unwrap_or(header.name);
                    let name = index_name(&raw);
                    if !name.is_empty() {
                        entries.insert(name, pos);
                    }
                }
            }

            pos = next;
        }

        debug!(entries = entries.len(), "Indexed packed archive");
        Ok(Self { entries })
    }

    /// Header position for a normalized name
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries.get(name).copied()
    }

    /// Check if a normalized name is indexed
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names whose immediate parent is `dir`, sorted
    pub fn children(&self, dir: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .filter(|name| paths::parent(name) == dir)
            .map(|name| paths::file_name(name))
            .collect();
        names.sort_unstable();
        names
    }

    /// All indexed names, unordered
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the NUL-terminated name stored in a GNU long-name record
fn read_long_name<R: Read + Seek>(stream: &mut R, at: u64, size: u64) -> VfsResult<String> {
    if size > MAX_LONG_NAME_LEN {
        return Err(VfsError::InvalidArchive(format!(
            "long name record of {} bytes exceeds {}",
            size, MAX_LONG_NAME_LEN
        )));
    }
    let mut data = vec![0u8; size as usize];
    stream
        .seek(SeekFrom::Start(at))
        .and_then(|_| stream.read_exact(&mut data))
        .map_err(|e| VfsError::from_io(e, "read long name"))?;
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    Ok(String::from_utf8_lossy(&data[..end]).into_owned())
}
