/*!
 * Packed Archive Backend
 * Tar-like container reader over a seekable file, with fused-executable support
 */

mod builder;
mod header;
mod index;
mod trailer;

pub use builder::{fuse, PackBuilder};
pub use header::{EntryKind, Header, HeaderError, Record};
pub use index::PackedArchiveIndex;

use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::paths;
use super::traits::Archive;
use super::types::*;
use crate::core::limits::BLOCK_SIZE;
use index::read_header;

/// Single packed file exposed through the archive contract
///
/// All positions are relative to `base`, the start of the container
/// inside the host file (non-zero for fused executables). Each query
/// locks the file handle for its whole seek-and-read sequence.
pub struct PackedArchive {
    host_path: PathBuf,
    base: u64,
    index: PackedArchiveIndex,
    file: Mutex<File>,
}

impl PackedArchive {
    /// Open and index a packed archive
    ///
    /// The container is looked for at offset 0 first, then at the offset
    /// named by a fused-executable trailer.
    pub fn open<P: Into<PathBuf>>(host_path: P) -> VfsResult<Self> {
        let host_path = host_path.into();
        let mut file = File::open(&host_path)
            .map_err(|e| VfsError::from_io(e, format!("open {}", host_path.display())))?;
        let len = file
            .metadata()
            .map_err(|e| VfsError::from_io(e, format!("stat {}", host_path.display())))?
            .len();

        let base = Self::locate(&mut file, len).ok_or_else(|| {
            VfsError::MountFailed(format!("not a packed archive: {}", host_path.display()))
        })?;

        let index = PackedArchiveIndex::scan(&mut file, base, len)?;
        debug!(
            path = %host_path.display(),
            base = base,
            entries = index.len(),
            "Opened packed archive"
        );

        Ok(Self {
            host_path,
            base,
            index,
            file: Mutex::new(file),
        })
    }

    /// Find the container start, if any
    fn locate(file: &mut File, len: u64) -> Option<u64> {
        if Self::starts_with_entry(file, 0) {
            return Some(0);
        }

        let bases = trailer::candidate_bases(file, len).ok()?;
        bases
            .into_iter()
            .find(|&base| Self::starts_with_entry(file, base))
    }

    fn starts_with_entry(file: &mut File, at: u64) -> bool {
        matches!(read_header(file, at), Ok(Record::Entry(_)))
    }

    /// Offset of the container inside the host file
    pub fn base_offset(&self) -> u64 {
        self.base
    }

    /// Header index built at mount time
    pub fn index(&self) -> &PackedArchiveIndex {
        &self.index
    }

    /// Re-read the header for a virtual path
    fn load(&self, path: &str) -> Option<(u64, Header)> {
        let pos = self.index.get(&paths::normalize(path))?;
        let mut file = self.file.lock();
        match read_header(&mut *file, self.base + pos) {
            Ok(Record::Entry(header)) => Some((pos, header)),
            Ok(Record::End) => None,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to re-read indexed header");
                None
            }
        }
    }

    fn not_found(&self, path: &str) -> VfsError {
        VfsError::NotFound(format!("{} in {}", path, self.host_path.display()))
    }
}

impl Archive for PackedArchive {
    fn host_path(&self) -> &Path {
        &self.host_path
    }

    fn exists(&self, path: &str) -> bool {
        self.index.contains(&paths::normalize(path))
    }

    fn is_file(&self, path: &str) -> bool {
        matches!(self.load(path), Some((_, h)) if h.kind == EntryKind::File)
    }

    fn is_directory(&self, path: &str) -> bool {
        matches!(self.load(path), Some((_, h)) if h.kind == EntryKind::Directory)
    }

    fn size(&self, path: &str) -> VfsResult<u64> {
        self.load(path)
            .map(|(_, h)| h.size)
            .ok_or_else(|| self.not_found(path))
    }

    fn last_modified(&self, path: &str) -> u64 {
        self.load(path).map(|(_, h)| h.mtime).unwrap_or(0)
    }

    fn metadata(&self, path: &str) -> VfsResult<Metadata> {
        let (_, header) = self.load(path).ok_or_else(|| self.not_found(path))?;
        let file_type = match header.kind {
            EntryKind::File => FileType::File,
            EntryKind::Directory => FileType::Directory,
            EntryKind::Symlink => FileType::Symlink,
            _ => FileType::Other,
        };
        Ok(Metadata {
            file_type,
            size: header.size,
            modified: header.mtime,
        })
    }

    fn for_each_entry(&self, path: &str, visit: &mut dyn FnMut(&str)) {
        for name in self.index.children(&paths::normalize(path)) {
            visit(name);
        }
    }

    fn read(&self, path: &str) -> VfsResult<Vec<u8>> {
        let (pos, header) = self.load(path).ok_or_else(|| self.not_found(path))?;
        let data_at = self.base + pos + BLOCK_SIZE;
        let len = usize::try_from(header.size).map_err(|_| self.not_found(path))?;

        let mut file = self.file.lock();
        // The host file may have shrunk since the scan
        let host_len = file.metadata().map(|md| md.len()).unwrap_or(0);
        if data_at.checked_add(header.size).map_or(true, |end| end > host_len) {
            warn!(
                path = %path,
                size = header.size,
                host_len = host_len,
                "Entry data past end of packed archive"
            );
            return Err(self.not_found(path));
        }

        let mut data = vec![0u8; len];
        let result = file
            .seek(SeekFrom::Start(data_at))
            .and_then(|_| file.read_exact(&mut data));

        match result {
            Ok(()) => Ok(data),
            Err(e) => {
                warn!(path = %path, error = %e, "Short read from packed archive");
                Err(self.not_found(path))
            }
        }
    }

    fn name(&self) -> &str {
        "packed"
    }

    fn unmount(self: Box<Self>) {
        debug!(path = %self.host_path.display(), "Closing packed archive");
    }
}
