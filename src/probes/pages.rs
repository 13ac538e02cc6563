// SMART page probes. The bridge prefixes each page with a 32-byte protocol
// echo header; everything after it is the ATA SMART page the assessor
// parses.

use crate::io::{BlockTransport, SECTOR_SIZE};
use crate::probes::{check_slot, payload, ProbeOutcome};
use crate::protocol::channel::SectorChannel;
use crate::{JmError, JmResult};

/// Offset of the real SMART page inside a response frame.
pub const SMART_PAGE_OFFSET: usize = 0x20;

/// Bytes of page data available after the echo header.
pub const SMART_PAGE_LEN: usize = SECTOR_SIZE - SMART_PAGE_OFFSET;

pub type SmartPage = [u8; SMART_PAGE_LEN];

/// Read the attribute values page for one slot.
///
/// Page probes never report `EmptySlot`; bay occupancy is the IDENTIFY
/// probe's call, and these are only issued for populated slots.
pub fn read_values_page<T: BlockTransport>(
    channel: &mut SectorChannel<T>,
    slot: u8,
) -> JmResult<ProbeOutcome<SmartPage>> {
    check_slot(slot)?;
    page_probe(channel, &payload::smart_values(slot))
}

/// Read the attribute thresholds page for one slot.
pub fn read_thresholds_page<T: BlockTransport>(
    channel: &mut SectorChannel<T>,
    slot: u8,
) -> JmResult<ProbeOutcome<SmartPage>> {
    check_slot(slot)?;
    page_probe(channel, &payload::smart_thresholds(slot))
}

fn page_probe<T: BlockTransport>(
    channel: &mut SectorChannel<T>,
    payload: &[u8],
) -> JmResult<ProbeOutcome<SmartPage>> {
    let response = match channel.execute(payload) {
        Ok(response) => response,
        Err(fault @ JmError::CrcMismatch { .. }) => {
            return Ok(ProbeOutcome::CommunicationError(fault))
        }
        Err(fatal) => return Err(fatal),
    };

    let mut page = [0u8; SMART_PAGE_LEN];
    page.copy_from_slice(&response.as_bytes()[SMART_PAGE_OFFSET..]);
    Ok(ProbeOutcome::Populated(page))
}
