/*!
 * Packed Archive Builder
 * Writes containers readable by PackedArchive and fuses them onto executables
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;
use tracing::info;

use super::header::Header;
use super::trailer;
use crate::core::limits::{BLOCK_SIZE, END_RECORDS};
use crate::vfs::paths;
use crate::vfs::types::{VfsError, VfsResult};

/// Sequential archive writer
pub struct PackBuilder<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> PackBuilder<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Append a regular file entry
    pub fn append_file(&mut self, name: &str, data: &[u8], mtime: u64) -> VfsResult<()> {
        let name = Self::entry_name(name)?;
        let header = Header::file(name, data.len() as u64, mtime);
        self.emit(&header, data)
    }

    /// Append a directory entry
    pub fn append_dir(&mut self, name: &str, mtime: u64) -> VfsResult<()> {
        let name = format!("{}/", Self::entry_name(name)?);
        self.emit(&Header::directory(name, mtime), &[])
    }

    /// Append the contents of a host directory below `prefix`, recursively
    ///
    /// Entries are written in name order so output is reproducible.
    pub fn append_dir_all(&mut self, prefix: &str, host_dir: &Path) -> VfsResult<()> {
        let mut children: Vec<_> = fs::read_dir(host_dir)
            .map_err(|e| VfsError::from_io(e, format!("list {}", host_dir.display())))?
            .collect::<Result<_, _>>()
            .map_err(|e| VfsError::from_io(e, format!("list {}", host_dir.display())))?;
        children.sort_by_key(|entry| entry.file_name());

        for entry in children {
            let file_name = entry.file_name().into_string().map_err(|raw| {
                VfsError::InvalidPath(format!("non-UTF-8 name {:?}", raw))
            })?;
            let name = if prefix.is_empty() {
                file_name
            } else {
                format!("{}/{}", prefix, file_name)
            };
            let host_path = entry.path();
            let md = fs::metadata(&host_path)
                .map_err(|e| VfsError::from_io(e, format!("stat {}", host_path.display())))?;
            let mtime = md
                .modified()
                .ok()
                .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);

            if md.is_dir() {
                self.append_dir(&name, mtime)?;
                self.append_dir_all(&name, &host_path)?;
            } else if md.is_file() {
                let data = fs::read(&host_path)
                    .map_err(|e| VfsError::from_io(e, format!("read {}", host_path.display())))?;
                self.append_file(&name, &data, mtime)?;
            }
        }
        Ok(())
    }

    /// Write the end records and return the writer with the total length
    pub fn finish(mut self) -> VfsResult<(W, u64)> {
        let zeros = vec![0u8; (BLOCK_SIZE * END_RECORDS) as usize];
        self.write_raw(&zeros)?;
        self.out
            .flush()
            .map_err(|e| VfsError::from_io(e, "flush archive"))?;
        Ok((self.out, self.written))
    }

    fn entry_name(name: &str) -> VfsResult<String> {
        let normalized = paths::normalize(name);
        if normalized.is_empty() {
            return Err(VfsError::InvalidPath(format!("empty entry name: {:?}", name)));
        }
        Ok(normalized)
    }

    fn emit(&mut self, header: &Header, data: &[u8]) -> VfsResult<()> {
        let block = header.encode()?;
        self.write_raw(&block)?;
        self.write_raw(data)?;

        let padding = (header.padded_size()? - header.size) as usize;
        if padding > 0 {
            self.write_raw(&vec![0u8; padding])?;
        }
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> VfsResult<()> {
        self.out
            .write_all(bytes)
            .map_err(|e| VfsError::from_io(e, "write archive"))?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

/// Append `archive` and a trailer to a copy of `executable`
///
/// The output mounts as a fused executable. Returns the output length.
pub fn fuse(executable: &Path, archive: &Path, output: &Path) -> VfsResult<u64> {
    let archive_len = fs::metadata(archive)
        .map_err(|e| VfsError::from_io(e, format!("stat {}", archive.display())))?
        .len();
    let trailer = trailer::encode(archive_len).ok_or_else(|| {
        VfsError::InvalidArchive(format!("archive too large to fuse: {} bytes", archive_len))
    })?;

    let mut out = File::create(output)
        .map_err(|e| VfsError::from_io(e, format!("create {}", output.display())))?;
    let mut total = 0u64;
    for source in [executable, archive] {
        let mut input = File::open(source)
            .map_err(|e| VfsError::from_io(e, format!("open {}", source.display())))?;
        total += io::copy(&mut input, &mut out)
            .map_err(|e| VfsError::from_io(e, format!("copy {}", source.display())))?;
    }
    out.write_all(&trailer)
        .map_err(|e| VfsError::from_io(e, format!("write trailer {}", output.display())))?;
    total += trailer.len() as u64;

    info!(
        executable = %executable.display(),
        archive = %archive.display(),
        output = %output.display(),
        bytes = total,
        "Fused archive onto executable"
    );
    Ok(total)
}
