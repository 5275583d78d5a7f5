//! Integration tests for bandcast-probe

use std::io::Write;

use bandcast_probe::{inspect, AviProbeError, CANDIDATE_OFFSETS, HEADER_SCAN_WINDOW};

/// Build a RIFF/AVI preamble padded with zeros.
fn avi_shell(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len.max(12)];
    buf[0..4].copy_from_slice(b"RIFF");
    buf[4..8].copy_from_slice(&((len as u32).saturating_sub(8)).to_le_bytes());
    buf[8..12].copy_from_slice(b"AVI ");
    buf
}

/// Place a strh chunk at `at` with a buffer-size value at the given data
/// offset.
fn put_strh_at_offset(buf: &mut [u8], at: usize, data_offset: usize, buffer_size: u32) {
    buf[at..at + 4].copy_from_slice(b"strh");
    buf[at + 4..at + 8].copy_from_slice(&56u32.to_le_bytes());
    let field = at + 8 + data_offset;
    buf[field..field + 4].copy_from_slice(&buffer_size.to_le_bytes());
}

fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

/// The normative multi-stream case: video and audio headers with different
/// declared sizes; the larger one wins.
#[test]
fn multi_chunk_reports_the_maximum() {
    let mut buf = avi_shell(2048);
    put_strh_at_offset(&mut buf, 100, 44, 5_000);
    put_strh_at_offset(&mut buf, 500, 44, 25_000);
    let f = write_temp(&buf);

    let report = inspect(f.path()).unwrap();
    assert_eq!(report.found_headers, 2);
    assert_eq!(report.max_buffer_size, Some(25_000));
}

/// Every candidate offset in the probe list must be honored.
#[test]
fn all_candidate_offsets_are_probed() {
    for offset in CANDIDATE_OFFSETS {
        let mut buf = avi_shell(1024);
        put_strh_at_offset(&mut buf, 128, offset, 30_000);
        let f = write_temp(&buf);

        let report = inspect(f.path()).unwrap();
        assert_eq!(
            report.max_buffer_size,
            Some(30_000),
            "candidate offset {offset}"
        );
    }
}

/// When several candidate offsets hold plausible values, the maximum across
/// them is reported.
#[test]
fn max_across_candidate_offsets_within_one_chunk() {
    let mut buf = avi_shell(1024);
    put_strh_at_offset(&mut buf, 128, 32, 4_096);
    // Same chunk, stronger candidate.
    let field = 128 + 8 + 44;
    buf[field..field + 4].copy_from_slice(&16_384u32.to_le_bytes());
    let f = write_temp(&buf);

    let report = inspect(f.path()).unwrap();
    assert_eq!(report.found_headers, 1);
    assert_eq!(report.max_buffer_size, Some(16_384));
}

/// Implausible values anywhere in the probe grid never surface.
#[test]
fn implausible_values_never_surface() {
    let mut buf = avi_shell(1024);
    put_strh_at_offset(&mut buf, 128, 44, 200_000_000);
    put_strh_at_offset(&mut buf, 500, 40, 3);
    let f = write_temp(&buf);

    let report = inspect(f.path()).unwrap();
    assert_eq!(report.found_headers, 2);
    assert_eq!(report.max_buffer_size, None);
}

/// A header whose candidate fields spill past the scan window still resolves
/// via a direct file read.
#[test]
fn window_boundary_is_not_a_blind_spot() {
    let mut buf = avi_shell(HEADER_SCAN_WINDOW + 256);
    put_strh_at_offset(&mut buf, HEADER_SCAN_WINDOW - 5, 44, 12_345);
    let f = write_temp(&buf);

    let report = inspect(f.path()).unwrap();
    assert_eq!(report.found_headers, 1);
    assert_eq!(report.max_buffer_size, Some(12_345));
}

/// Report serializes for `inspect --json`.
#[test]
fn report_serializes_to_json() {
    let mut buf = avi_shell(512);
    put_strh_at_offset(&mut buf, 64, 44, 19_000);
    let f = write_temp(&buf);

    let report = inspect(f.path()).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("19000"));
    assert!(json.contains("found_headers"));
}

#[test]
fn nonexistent_file_is_file_not_found() {
    let result = inspect("/this/file/does/not/exist.avi");
    assert!(matches!(result, Err(AviProbeError::FileNotFound(_))));
}

#[test]
fn empty_file_reports_nothing() {
    let f = write_temp(b"");
    let report = inspect(f.path()).unwrap();
    assert_eq!(report.found_headers, 0);
    assert_eq!(report.max_buffer_size, None);
}
