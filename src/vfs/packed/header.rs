/*!
 * Packed Archive Headers
 * Fixed-layout 512-byte ustar records: decoding, checksums and encoding
 */

use thiserror::Error;

use crate::core::limits::{BLOCK_SIZE, HEADER_NAME_LEN, HEADER_PREFIX_LEN};
use crate::vfs::types::VfsError;

const NAME: (usize, usize) = (0, 100);
const MODE: (usize, usize) = (100, 108);
const UID: (usize, usize) = (108, 116);
const GID: (usize, usize) = (116, 124);
const SIZE: (usize, usize) = (124, 136);
const MTIME: (usize, usize) = (136, 148);
const CHECKSUM: (usize, usize) = (148, 156);
const TYPEFLAG: usize = 156;
const MAGIC: (usize, usize) = (257, 263);
const VERSION: (usize, usize) = (263, 265);
const PREFIX: (usize, usize) = (345, 500);

/// One raw archive record
pub type Block = [u8; BLOCK_SIZE as usize];

/// Header decoding and encoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    BadChecksum { stored: u64, computed: u64 },

    #[error("invalid numeric field `{0}`")]
    InvalidNumber(&'static str),

    #[error("value {value} does not fit field `{field}`")]
    Overflow { field: &'static str, value: u64 },

    #[error("entry name too long: {0}")]
    NameTooLong(String),
}

impl From<HeaderError> for VfsError {
    fn from(e: HeaderError) -> Self {
        VfsError::InvalidArchive(e.to_string())
    }
}

/// Declared type of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// GNU long-name record carrying the name of the next entry
    LongName,
    /// pax headers and GNU long-link records; never indexed
    Extension,
    Other(u8),
}

impl EntryKind {
    fn from_flag(flag: u8) -> Self {
        match flag {
            b'0' | b'\0' | b'7' => EntryKind::File,
            b'5' => EntryKind::Directory,
            b'2' => EntryKind::Symlink,
            b'L' => EntryKind::LongName,
            b'x' | b'g' | b'K' => EntryKind::Extension,
            other => EntryKind::Other(other),
        }
    }

    fn flag(self) -> u8 {
        match self {
            EntryKind::File => b'0',
            EntryKind::Directory => b'5',
            EntryKind::Symlink => b'2',
            EntryKind::LongName => b'L',
            EntryKind::Extension => b'x',
            EntryKind::Other(flag) => flag,
        }
    }
}

/// Decoded header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub kind: EntryKind,
    pub mode: u32,
    pub size: u64,
    pub mtime: u64,
}

/// Result of decoding one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Entry(Header),
    /// Null record terminating the archive
    End,
}

impl Header {
    /// Regular file header
    pub fn file(name: impl Into<String>, size: u64, mtime: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            mode: 0o644,
            size,
            mtime,
        }
    }

    /// Directory header
    pub fn directory(name: impl Into<String>, mtime: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            mode: 0o755,
            size: 0,
            mtime,
        }
    }

    /// Bytes occupied by the entry data, rounded up to whole records
    pub fn padded_size(&self) -> Result<u64, HeaderError> {
        self.size
            .div_ceil(BLOCK_SIZE)
            .checked_mul(BLOCK_SIZE)
            .ok_or(HeaderError::Overflow {
                field: "size",
                value: self.size,
            })
    }

    /// Decode a record
    ///
    /// A record whose checksum field starts with NUL is the end marker.
    pub fn parse(block: &Block) -> Result<Record, HeaderError> {
        if block[CHECKSUM.0] == 0 {
            return Ok(Record::End);
        }

        let stored = parse_number(field(block, CHECKSUM), "checksum")?;
        let (unsigned, signed) = checksums(block);
        if stored != unsigned && stored as i64 != signed {
            return Err(HeaderError::BadChecksum {
                stored,
                computed: unsigned,
            });
        }

        let mut name = cstr(field(block, NAME));
        if field(block, MAGIC) == b"ustar\0" {
            let prefix = cstr(field(block, PREFIX));
            if !prefix.is_empty() {
                name = format!("{}/{}", prefix, name);
            }
        }

        Ok(Record::Entry(Header {
            name,
            kind: EntryKind::from_flag(block[TYPEFLAG]),
            mode: u32::try_from(parse_number(field(block, MODE), "mode")?)
                .map_err(|_| HeaderError::InvalidNumber("mode"))?,
            size: parse_number(field(block, SIZE), "size")?,
            mtime: parse_number(field(block, MTIME), "mtime")?,
        }))
    }

    /// Encode as a ustar record
    ///
    /// Names longer than the name field are split at a `/` into the
    /// prefix field when possible.
    pub fn encode(&self) -> Result<Block, HeaderError> {
        let mut block: Block = [0; BLOCK_SIZE as usize];
        let (prefix, name) = split_name(&self.name)?;

        block[NAME.0..NAME.0 + name.len()].copy_from_slice(name.as_bytes());
        block[PREFIX.0..PREFIX.0 + prefix.len()].copy_from_slice(prefix.as_bytes());
        write_octal(&mut block, MODE, u64::from(self.mode), "mode")?;
        write_octal(&mut block, UID, 0, "uid")?;
        write_octal(&mut block, GID, 0, "gid")?;
        write_octal(&mut block, SIZE, self.size, "size")?;
        write_octal(&mut block, MTIME, self.mtime, "mtime")?;
        block[TYPEFLAG] = self.kind.flag();
        block[MAGIC.0..MAGIC.1].copy_from_slice(b"ustar\0");
        block[VERSION.0..VERSION.1].copy_from_slice(b"00");

        let (sum, _) = checksums(&block);
        let digits = format!("{:06o}\0 ", sum);
        block[CHECKSUM.0..CHECKSUM.1].copy_from_slice(digits.as_bytes());
        Ok(block)
    }
}

fn field(block: &Block, (start, end): (usize, usize)) -> &[u8] {
    &block[start..end]
}

/// Bytes up to the first NUL, lossily decoded
fn cstr(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Unsigned and signed header sums with the checksum field read as spaces
fn checksums(block: &Block) -> (u64, i64) {
    let mut unsigned = 0u64;
    let mut signed = 0i64;
    for (i, &b) in block.iter().enumerate() {
        let b = if (CHECKSUM.0..CHECKSUM.1).contains(&i) { b' ' } else { b };
        unsigned += u64::from(b);
        signed += i64::from(b as i8);
    }
    (unsigned, signed)
}

/// Parse an octal field, or a GNU base-256 field when the high bit is set
pub fn parse_number(bytes: &[u8], name: &'static str) -> Result<u64, HeaderError> {
    if let Some(&first) = bytes.first() {
        if first & 0x80 != 0 {
            let mut value = u64::from(first & 0x7f);
            for &b in &bytes[1..] {
                value = value
                    .checked_mul(256)
                    .and_then(|v| v.checked_add(u64::from(b)))
                    .ok_or(HeaderError::InvalidNumber(name))?;
            }
            return Ok(value);
        }
    }

    let digits = bytes
        .iter()
        .skip_while(|&&b| b == b' ' || b == 0)
        .take_while(|&&b| b != b' ' && b != 0);

    let mut value = 0u64;
    for &b in digits {
        if !(b'0'..=b'7').contains(&b) {
            return Err(HeaderError::InvalidNumber(name));
        }
        value = value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
            .ok_or(HeaderError::InvalidNumber(name))?;
    }
    Ok(value)
}

/// Write `value` as zero-padded octal followed by NUL
fn write_octal(
    block: &mut Block,
    (start, end): (usize, usize),
    value: u64,
    name: &'static str,
) -> Result<(), HeaderError> {
    let width = end - start - 1;
    let digits = format!("{:0width$o}", value, width = width);
    if digits.len() > width {
        return Err(HeaderError::Overflow { field: name, value });
    }
    block[start..start + width].copy_from_slice(digits.as_bytes());
    block[end - 1] = 0;
    Ok(())
}

/// Split a name into (prefix, name) so both fit their fields
fn split_name(full: &str) -> Result<(&str, &str), HeaderError> {
    if full.len() <= HEADER_NAME_LEN {
        return Ok(("", full));
    }

    for (idx, _) in full.match_indices('/') {
        let (prefix, rest) = (&full[..idx], &full[idx + 1..]);
        if prefix.len() <= HEADER_PREFIX_LEN && !rest.is_empty() && rest.len() <= HEADER_NAME_LEN {
            return Ok((prefix, rest));
        }
    }
    Err(HeaderError::NameTooLong(full.to_string()))
}
