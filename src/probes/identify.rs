// IDENTIFY DEVICE probe and response decoding.
//
// The response is decoded by absolute byte offset within the full 512-byte
// frame. String fields use the ATA convention of swapped byte pairs; the
// sector count is 48-bit little-endian; the RAID status bytes near the end
// of the frame are present in every response, including those for empty
// bays.

use crate::io::BlockTransport;
use crate::probes::{check_slot, payload, ProbeOutcome};
use crate::protocol::channel::SectorChannel;
use crate::protocol::frame::Response;
use crate::{JmError, JmResult};
use serde::{Deserialize, Serialize};

const MODEL_OFFSET: usize = 0x10;
const MODEL_LEN: usize = 32;
const SERIAL_OFFSET: usize = 0x30;
const SERIAL_LEN: usize = 16;
const FIRMWARE_OFFSET: usize = 0x50;
const FIRMWARE_LEN: usize = 8;
const SECTOR_COUNT_OFFSET: usize = 0x4A;
const PRESENT_MASK_OFFSET: usize = 0x1F0;
const REBUILD_FLAG_OFFSET: usize = 0x1F5;
const REBUILD_PHASE_OFFSET: usize = 0x1FA;

/// Model-field quality gate: a real disk shows at least this many printable
/// ASCII bytes, and at least `MIN_NON_SPACE` of them are not spaces.
const MIN_PRINTABLE: usize = 8;
const MIN_NON_SPACE: usize = 5;

/// Capacity sanity window, in sectors (roughly 1 TB to 25 TB).
const MIN_SECTORS: u64 = 2_000_000_000;
const MAX_SECTORS: u64 = 50_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskIdentity {
    pub slot: u8,
    pub model: String,
    pub serial: String,
    pub firmware: String,
    /// 0 when the reported sector count fails the sanity window.
    pub size_mb: u64,
}

/// RAID status bytes carried in every IDENTIFY response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidFlags {
    /// Bit i set ⇔ slot i physically present.
    pub present_mask: u8,
    /// A rebuild is currently running somewhere in the array.
    pub rebuilding: bool,
    /// Raw progress byte; only meaningful while `rebuilding` is set.
    pub rebuild_phase: u8,
}

impl RaidFlags {
    pub(crate) fn from_response(bytes: &[u8; crate::io::SECTOR_SIZE]) -> Self {
        RaidFlags {
            present_mask: bytes[PRESENT_MASK_OFFSET],
            rebuilding: bytes[REBUILD_FLAG_OFFSET] == 0x01,
            rebuild_phase: bytes[REBUILD_PHASE_OFFSET],
        }
    }

    pub fn present_count(&self) -> u8 {
        self.present_mask.count_ones() as u8
    }

    pub fn slot_present(&self, slot: u8) -> bool {
        slot < 8 && self.present_mask & (1 << slot) != 0
    }
}

/// Result of one IDENTIFY exchange. `raid` is available whenever a response
/// validated, even for an empty bay; only a communication fault leaves it
/// unset.
#[derive(Debug)]
pub struct IdentifyProbe {
    pub outcome: ProbeOutcome<DiskIdentity>,
    pub raid: Option<RaidFlags>,
}

pub fn probe_identify<T: BlockTransport>(
    channel: &mut SectorChannel<T>,
    slot: u8,
) -> JmResult<IdentifyProbe> {
    check_slot(slot)?;
    let response = match channel.execute(&payload::identify(slot)) {
        Ok(response) => response,
        Err(fault @ JmError::CrcMismatch { .. }) => {
            return Ok(IdentifyProbe {
                outcome: ProbeOutcome::CommunicationError(fault),
                raid: None,
            })
        }
        Err(fatal) => return Err(fatal),
    };

    Ok(decode_identify(slot, &response))
}

/// Classify and decode a validated IDENTIFY response.
pub fn decode_identify(slot: u8, response: &Response) -> IdentifyProbe {
    let bytes = response.as_bytes();
    let raid = Some(RaidFlags::from_response(bytes));

    if !looks_like_disk(bytes) {
        tracing::debug!(slot, "identify answered for an empty bay");
        return IdentifyProbe {
            outcome: ProbeOutcome::EmptySlot,
            raid,
        };
    }

    let sectors = sector_count(bytes);
    let identity = DiskIdentity {
        slot,
        model: ata_string(&bytes[MODEL_OFFSET..MODEL_OFFSET + MODEL_LEN]),
        serial: ata_string(&bytes[SERIAL_OFFSET..SERIAL_OFFSET + SERIAL_LEN]),
        firmware: ata_string(&bytes[FIRMWARE_OFFSET..FIRMWARE_OFFSET + FIRMWARE_LEN]),
        size_mb: size_mb_from_sectors(sectors),
    };
    tracing::debug!(slot, model = %identity.model, "disk identified");

    IdentifyProbe {
        outcome: ProbeOutcome::Populated(identity),
        raid,
    }
}

/// Decode an ATA string field: swap each adjacent byte pair back, then
/// strip the space padding from both ends. Interior spaces are data.
pub fn ata_string(field: &[u8]) -> String {
    let mut swapped = field.to_vec();
    for pair in swapped.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    let text: String = swapped.iter().map(|&b| b as char).collect();
    text.trim_matches(' ').to_string()
}

/// A response represents an installed disk only if the model field carries
/// enough printable content and the frame head is not a uniform fill.
fn looks_like_disk(bytes: &[u8; crate::io::SECTOR_SIZE]) -> bool {
    let model = &bytes[MODEL_OFFSET..MODEL_OFFSET + MODEL_LEN];
    let mut printable = 0usize;
    let mut non_space = 0usize;
    for &c in model {
        if (0x20..0x7f).contains(&c) {
            printable += 1;
            if c != b' ' {
                non_space += 1;
            }
        }
    }
    if printable < MIN_PRINTABLE || non_space < MIN_NON_SPACE {
        return false;
    }

    let head = &bytes[..64];
    let all_zero = head.iter().all(|&b| b == 0x00);
    let all_ff = head.iter().all(|&b| b == 0xFF);
    !(all_zero || all_ff)
}

fn sector_count(bytes: &[u8; crate::io::SECTOR_SIZE]) -> u64 {
    let mut sectors = 0u64;
    for i in 0..6 {
        sectors |= (bytes[SECTOR_COUNT_OFFSET + i] as u64) << (i * 8);
    }
    sectors
}

/// Convert the 48-bit sector count to MB, refusing values outside the
/// plausible capacity window rather than reporting a bogus figure.
pub fn size_mb_from_sectors(sectors: u64) -> u64 {
    if (MIN_SECTORS..=MAX_SECTORS).contains(&sectors) {
        sectors * 512 / (1024 * 1024)
    } else {
        0
    }
}
