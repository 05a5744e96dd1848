//! Capture-time derivation for snapshots.
//!
//! The primary source is the log header line
//! `Log file open, MM/DD/YY HH:mm:ss`. When that is missing or
//! unparseable, a legacy filename fragment of the form `-DD-HH.MM.SS`
//! supplies day and time-of-day with the year and month pinned to a
//! fixed epoch. When both fail the capture time is undefined and callers
//! fall back to file-modification order for tie-breaking only.

use chrono::{NaiveDate, NaiveDateTime};

use crate::utils::config::{FALLBACK_EPOCH_MONTH, FALLBACK_EPOCH_YEAR};

/// Prefix of the header line carrying the capture timestamp
pub const LOG_OPEN_PREFIX: &str = "Log file open";

/// Parse `"Log file open, MM/DD/YY HH:mm:ss"`
pub fn from_header_line(line: &str) -> Option<NaiveDateTime> {
    let rest = line.strip_prefix(LOG_OPEN_PREFIX)?;
    let rest = rest.trim_start_matches([',', ' ']);
    NaiveDateTime::parse_from_str(rest.trim(), "%m/%d/%y %H:%M:%S").ok()
}

/// Derive a capture time from a filename fragment `-DD-HH.MM.SS`.
///
/// The fragment carries no year or month, so both are pinned to the
/// fallback epoch. Returns None when no fragment is present or the
/// fields are out of range.
pub fn from_file_name(name: &str) -> Option<NaiveDateTime> {
    let bytes = name.as_bytes();

    // scan for '-' DD '-' HH '.' MM '.' SS
    for start in 0..bytes.len().saturating_sub(11) {
        let window = &bytes[start..start + 12];
        let shape_matches = window[0] == b'-'
            && window[1].is_ascii_digit()
            && window[2].is_ascii_digit()
            && window[3] == b'-'
            && window[4].is_ascii_digit()
            && window[5].is_ascii_digit()
            && window[6] == b'.'
            && window[7].is_ascii_digit()
            && window[8].is_ascii_digit()
            && window[9] == b'.'
            && window[10].is_ascii_digit()
            && window[11].is_ascii_digit();
        if !shape_matches {
            continue;
        }

        let two = |i: usize| ((window[i] - b'0') * 10 + (window[i + 1] - b'0')) as u32;
        let (day, hour, minute, second) = (two(1), two(4), two(7), two(10));

        let derived = NaiveDate::from_ymd_opt(FALLBACK_EPOCH_YEAR, FALLBACK_EPOCH_MONTH, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second));
        if derived.is_some() {
            return derived;
        }
    }

    None
}

/// Best-effort capture time: header line first, filename fragment second
pub fn derive_capture_time(header_line: Option<&str>, file_name: &str) -> Option<NaiveDateTime> {
    header_line
        .and_then(from_header_line)
        .or_else(|| from_file_name(file_name))
}
