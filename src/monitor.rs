// One full scan of a bridge: open the communication sector, wake the
// firmware, walk all five slots, classify the array, put the sector back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::array::{evaluate_array, ArrayHealth};
use crate::io::{BlockTransport, DEFAULT_SECTOR};
use crate::probes::{
    probe_identify, read_thresholds_page, read_values_page, DiskIdentity, ProbeOutcome, RaidFlags,
    MAX_SLOTS,
};
use crate::protocol::channel::SectorChannel;
use crate::smart::{combine, DiskRecord, ThresholdPolicy};
use crate::{is_interrupted, JmError, JmResult};

/// Caller-tunable knobs for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// LBA of the communication sector.
    pub sector: u32,
    /// Disks the array is supposed to hold; 0 disables the count checks.
    pub expected_disks: u8,
    pub policy: ThresholdPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            sector: DEFAULT_SECTOR,
            expected_disks: 0,
            policy: ThresholdPolicy::default(),
        }
    }
}

/// The three outcome classes of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Array healthy and every present disk passed.
    Healthy,
    /// A failed disk or a degraded array.
    Failure,
    /// The scan itself could not be completed or trusted.
    OperationalError,
}

impl RunOutcome {
    /// Collapse a scan result into the three classes. Callers map these to
    /// exit codes or alerts however they see fit.
    pub fn of(result: &JmResult<ScanReport>) -> RunOutcome {
        match result {
            Ok(report) => report.outcome,
            Err(_) => RunOutcome::OperationalError,
        }
    }
}

/// Everything one scan produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub device: String,
    pub completed_at: DateTime<Utc>,
    /// One record per slot, in slot order.
    pub disks: Vec<DiskRecord>,
    pub raid: RaidFlags,
    pub array: ArrayHealth,
    pub outcome: RunOutcome,
    /// False when the final restore write failed. The sector then still
    /// holds protocol bytes and needs a manual zero-fill.
    pub restore_ok: bool,
}

/// Run a full scan over any block transport.
///
/// The communication sector must read back all-zero, otherwise the scan
/// aborts before writing a single byte. Channel-level faults (ioctl errors,
/// an unusable sector) abort the run; per-slot checksum faults are logged
/// and cost only that slot. If an interrupt flag was raised, the scan stops
/// between slots and the sector is restored on the way out.
pub fn scan_with_transport<T: BlockTransport>(
    transport: T,
    options: &ScanOptions,
) -> JmResult<ScanReport> {
    let mut channel = SectorChannel::open(transport, options.sector)?;
    let device = channel.describe();

    if !channel.backup_is_empty() {
        // Somebody's data lives here. Nothing has been written yet, so
        // dropping the channel touches nothing.
        return Err(JmError::SectorInUse {
            sector: channel.sector(),
        });
    }

    tracing::info!("scanning {} through sector {:#x}", device, options.sector);
    channel.send_wakeup()?;

    let mut disks = Vec::with_capacity(MAX_SLOTS as usize);
    let mut raid: Option<RaidFlags> = None;

    for slot in 0..MAX_SLOTS {
        if is_interrupted() {
            // Dropping the channel restores the backup.
            tracing::warn!("interrupt received, stopping at slot {}", slot);
            return Err(JmError::Interrupted);
        }

        let probe = probe_identify(&mut channel, slot)?;
        if raid.is_none() {
            raid = probe.raid;
        }

        let record = match probe.outcome {
            ProbeOutcome::Populated(identity) => {
                read_slot_pages(&mut channel, identity, &options.policy)?
            }
            ProbeOutcome::EmptySlot => DiskRecord::absent(slot),
            ProbeOutcome::CommunicationError(fault) => {
                tracing::warn!("slot {}: identify failed, skipping: {}", slot, fault);
                DiskRecord::absent(slot)
            }
        };
        disks.push(record);
    }

    // Without one validated response there is no presence bitmask and the
    // records above mean nothing.
    let raid = raid.ok_or(JmError::ProtocolFailure(
        "every response failed validation; no presence bitmask captured",
    ))?;

    let restore_ok = match channel.restore_and_close() {
        Ok(()) => true,
        Err(fault) => {
            tracing::warn!(
                "restore failed, sector {:#x} still holds protocol bytes: {}",
                options.sector, fault
            );
            false
        }
    };

    let array = evaluate_array(raid.present_mask, options.expected_disks, &disks);
    let outcome = if array.is_failure() {
        RunOutcome::Failure
    } else {
        RunOutcome::Healthy
    };

    tracing::info!(
        "{}: {:?}, {} present (expected {})",
        device, array.classification, array.present_count, array.expected_count
    );
    if raid.rebuilding {
        tracing::warn!("{}: rebuild in progress", device);
    }

    Ok(ScanReport {
        device,
        completed_at: Utc::now(),
        disks,
        raid,
        array,
        outcome,
        restore_ok,
    })
}

/// Read both SMART pages for a populated slot and assess them.
///
/// A page that fails validation downgrades the disk to indeterminate
/// instead of failing the run; identity data from the probe is kept.
fn read_slot_pages<T: BlockTransport>(
    channel: &mut SectorChannel<T>,
    identity: DiskIdentity,
    policy: &ThresholdPolicy,
) -> JmResult<DiskRecord> {
    let slot = identity.slot;

    let values = match read_values_page(channel, slot)? {
        ProbeOutcome::Populated(page) => page,
        ProbeOutcome::CommunicationError(fault) => {
            tracing::warn!("slot {}: values page failed: {}", slot, fault);
            return Ok(DiskRecord::indeterminate(&identity));
        }
        ProbeOutcome::EmptySlot => return Ok(DiskRecord::indeterminate(&identity)),
    };

    let thresholds = match read_thresholds_page(channel, slot)? {
        ProbeOutcome::Populated(page) => page,
        ProbeOutcome::CommunicationError(fault) => {
            tracing::warn!("slot {}: thresholds page failed: {}", slot, fault);
            return Ok(DiskRecord::indeterminate(&identity));
        }
        ProbeOutcome::EmptySlot => return Ok(DiskRecord::indeterminate(&identity)),
    };

    Ok(combine(&identity, &values, &thresholds, policy))
}

/// Scan the array behind a SCSI generic device node.
#[cfg(target_os = "linux")]
pub fn scan_device(path: &str, options: &ScanOptions) -> JmResult<ScanReport> {
    let device = crate::io::SgDevice::open(path)?;
    scan_with_transport(device, options)
}
