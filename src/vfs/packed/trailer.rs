/*!
 * Fused Executable Trailer
 * Locates an archive appended to an unrelated executable image
 */

use std::io::{self, Read, Seek, SeekFrom};

use crate::core::limits::{TRAILER_LEN, TRAILER_MAGIC};

/// Encode the trailer for an archive of `archive_len` bytes
///
/// The stored offset is measured from end-of-file, so it covers the
/// archive plus the trailer itself.
pub fn encode(archive_len: u64) -> Option<[u8; TRAILER_LEN as usize]> {
    let offset = u32::try_from(archive_len + TRAILER_LEN).ok()?;
    let mut trailer = [0u8; TRAILER_LEN as usize];
    trailer[..4].copy_from_slice(&TRAILER_MAGIC);
    trailer[4..].copy_from_slice(&offset.to_le_bytes());
    Some(trailer)
}

/// Candidate archive start offsets named by the trailer, best first
///
/// Returns an empty list when the stream is too short or the magic tag
/// does not match. The offset is read both as including the trailer and
/// as counting only the archive bytes.
pub fn candidate_bases<R: Read + Seek>(stream: &mut R, stream_len: u64) -> io::Result<Vec<u64>> {
    if stream_len < TRAILER_LEN {
        return Ok(Vec::new());
    }

    let mut trailer = [0u8; TRAILER_LEN as usize];
    stream.seek(SeekFrom::Start(stream_len - TRAILER_LEN))?;
    stream.read_exact(&mut trailer)?;

    if trailer[..4] != TRAILER_MAGIC {
        return Ok(Vec::new());
    }

    let offset = u64::from(u32::from_le_bytes([
        trailer[4], trailer[5], trailer[6], trailer[7],
    ]));

    let mut bases = Vec::with_capacity(2);
    if let Some(base) = stream_len.checked_sub(offset) {
        bases.push(base);
    }
    if let Some(base) = stream_len
        .checked_sub(TRAILER_LEN)
        .and_then(|end| end.checked_sub(offset))
    {
        bases.push(base);
    }
    Ok(bases)
}
