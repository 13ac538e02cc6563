// Byte-exact decoding of the fixed SMART page layouts.

use crate::probes::SmartPage;

/// Most entries either page can carry.
pub const MAX_ENTRIES: usize = 30;

/// Id of Power-On-Hours. Only its low 32 raw bits hold the hour count;
/// several vendors stuff session data into the upper bytes.
pub const POWER_ON_HOURS: u8 = 0x09;

// Both pages open with a 2-byte structure revision, then 12-byte entries.
const ENTRIES_OFFSET: usize = 2;
const ENTRY_LEN: usize = 12;

/// One attribute entry as it sits on the values page:
/// id, flags (LE), current, worst, six raw bytes, one reserved byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    pub id: u8,
    pub flags: u16,
    pub current: u8,
    pub worst: u8,
    pub raw: [u8; 6],
}

impl RawAttribute {
    /// The six raw bytes packed little-endian.
    pub fn raw_value(&self) -> u64 {
        self.raw
            .iter()
            .enumerate()
            .fold(0u64, |value, (i, b)| value | (u64::from(*b) << (i * 8)))
    }
}

/// One entry of the thresholds page: id, threshold, ten reserved bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawThreshold {
    pub id: u8,
    pub threshold: u8,
}

fn entry(page: &SmartPage, index: usize) -> &[u8] {
    let start = ENTRIES_OFFSET + index * ENTRY_LEN;
    &page[start..start + ENTRY_LEN]
}

/// Decode the populated attribute entries of a values page.
///
/// Entries with id 0 are vacant and skipped; on-page order of the rest is
/// preserved.
pub fn parse_values(page: &SmartPage) -> Vec<RawAttribute> {
    let mut attributes = Vec::new();
    for i in 0..MAX_ENTRIES {
        let entry = entry(page, i);
        if entry[0] == 0 {
            continue;
        }
        let mut raw = [0u8; 6];
        raw.copy_from_slice(&entry[5..11]);
        attributes.push(RawAttribute {
            id: entry[0],
            flags: u16::from_le_bytes([entry[1], entry[2]]),
            current: entry[3],
            worst: entry[4],
            raw,
        });
    }
    attributes
}

/// Decode the populated entries of a thresholds page.
pub fn parse_thresholds(page: &SmartPage) -> Vec<RawThreshold> {
    let mut thresholds = Vec::new();
    for i in 0..MAX_ENTRIES {
        let entry = entry(page, i);
        if entry[0] == 0 {
            continue;
        }
        thresholds.push(RawThreshold {
            id: entry[0],
            threshold: entry[1],
        });
    }
    thresholds
}
