// Per-disk probe commands: payload construction, response decoding, and
// the populated / empty / fault classification.

pub mod identify;
pub mod pages;
pub mod payload;

pub use identify::{probe_identify, DiskIdentity, IdentifyProbe, RaidFlags};
pub use pages::{read_thresholds_page, read_values_page, SmartPage, SMART_PAGE_LEN};

use crate::{JmError, JmResult};

/// Disk slots addressable behind one bridge.
pub const MAX_SLOTS: u8 = 5;

pub(crate) fn check_slot(slot: u8) -> JmResult<()> {
    if slot >= MAX_SLOTS {
        return Err(JmError::InvalidArgument(format!(
            "disk slot {} out of range (0..{})",
            slot, MAX_SLOTS
        )));
    }
    Ok(())
}

/// What a probe learned about one slot.
///
/// `EmptySlot` is the bridge answering correctly for a bay with nothing in
/// it; `CommunicationError` is an exchange-level fault (checksum mismatch)
/// that says nothing about the slot and is isolated to this one probe.
/// Transport failures do not appear here, they propagate as errors and end
/// the run.
#[derive(Debug)]
pub enum ProbeOutcome<T> {
    Populated(T),
    EmptySlot,
    CommunicationError(JmError),
}

impl<T> ProbeOutcome<T> {
    pub fn is_populated(&self) -> bool {
        matches!(self, ProbeOutcome::Populated(_))
    }
}
