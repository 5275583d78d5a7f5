//! RIFF/AVI stream-header scanning.
//!
//! Extracts the largest declared `dwSuggestedBufferSize` from an AVI file by
//! scanning the leading bytes for `strh` chunks, without demuxing. Encoders
//! disagree on the exact field layout inside the chunk, so a fixed list of
//! candidate offsets is probed and every read is checked against a
//! plausibility band; values outside it are misaligned reads, not buffer
//! sizes. The result is a conservative upper estimate, not a parse.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AviProbeError;

/// Stream headers for the files this system produces always appear within
/// this many leading bytes.
pub const HEADER_SCAN_WINDOW: usize = 4096;

/// Byte offsets into the chunk data region where producers have been seen to
/// place `dwSuggestedBufferSize`, most likely first. Behavioral contract: do
/// not reorder or extend without device-side validation.
pub const CANDIDATE_OFFSETS: [usize; 4] = [44, 40, 36, 32];

/// Smallest believable buffer size, in bytes.
pub const MIN_PLAUSIBLE: u32 = 1024;

/// Largest believable buffer size, exclusive, in bytes.
pub const MAX_PLAUSIBLE: u32 = 10 * 1024 * 1024;

const RIFF_TAG: &[u8; 4] = b"RIFF";
const AVI_FORM: &[u8; 4] = b"AVI ";
const STREAM_HEADER_TAG: &[u8; 4] = b"strh";

/// Result of inspecting one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamBufferReport {
    /// Number of stream-header chunks located in the scan window.
    pub found_headers: usize,
    /// Largest plausible buffer size across all chunks and candidate
    /// offsets; `None` when nothing plausible was found.
    pub max_buffer_size: Option<u32>,
}

/// Scan `path` for stream-header chunks and report the largest declared
/// buffer size.
///
/// # Errors
///
/// Returns [`AviProbeError::FileNotFound`] or [`AviProbeError::Io`] when the
/// file cannot be opened or read at all. A readable file that merely lacks
/// recognizable headers is not an error; it reports `max_buffer_size: None`.
pub fn inspect(path: &Path) -> Result<StreamBufferReport, AviProbeError> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AviProbeError::FileNotFound(path.to_path_buf())
        } else {
            AviProbeError::Io(e)
        }
    })?;

    let mut window = Vec::with_capacity(HEADER_SCAN_WINDOW);
    file.by_ref()
        .take(HEADER_SCAN_WINDOW as u64)
        .read_to_end(&mut window)?;

    if window.len() < 12 || &window[0..4] != RIFF_TAG || &window[8..12] != AVI_FORM {
        // Weak signal only; some producers pad or reorder the preamble. The
        // authoritative check is the strh scan below.
        tracing::debug!(
            "{}: missing RIFF/AVI signature, scanning anyway",
            path.display()
        );
    }

    let mut found_headers = 0usize;
    let mut max_buffer_size: Option<u32> = None;

    let scan_end = window.len().saturating_sub(STREAM_HEADER_TAG.len());
    for offset in 0..=scan_end {
        if window.len() < STREAM_HEADER_TAG.len()
            || &window[offset..offset + 4] != STREAM_HEADER_TAG
        {
            continue;
        }
        found_headers += 1;

        // Chunk data begins past the 4-byte tag and 4-byte size field.
        let data_start = offset + 8;

        for candidate in CANDIDATE_OFFSETS {
            let field = data_start + candidate;
            let value = match read_u32_le(&window, &mut file, field)? {
                Some(v) => v,
                None => continue,
            };

            if (MIN_PLAUSIBLE..MAX_PLAUSIBLE).contains(&value) {
                tracing::trace!(
                    "strh at {offset}: plausible buffer size {value} at data offset {candidate}"
                );
                max_buffer_size = Some(max_buffer_size.map_or(value, |m| m.max(value)));
            }
        }
    }

    tracing::debug!(
        "{}: {} stream header(s), max buffer size {:?}",
        path.display(),
        found_headers,
        max_buffer_size
    );

    Ok(StreamBufferReport {
        found_headers,
        max_buffer_size,
    })
}

/// Read a little-endian u32 at an absolute file offset, preferring the
/// in-memory window and seeking only when the field lies past it. `None`
/// means the file ends before the field does.
fn read_u32_le(
    window: &[u8],
    file: &mut File,
    offset: usize,
) -> Result<Option<u32>, AviProbeError> {
    let mut bytes = [0u8; 4];

    if offset + 4 <= window.len() {
        bytes.copy_from_slice(&window[offset..offset + 4]);
        return Ok(Some(u32::from_le_bytes(bytes)));
    }

    file.seek(SeekFrom::Start(offset as u64))?;
    match file.read_exact(&mut bytes) {
        Ok(()) => Ok(Some(u32::from_le_bytes(bytes))),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(AviProbeError::Io(e)),
    }
}
