// Array-level health: presence bitmask plus per-disk verdicts.

use serde::{Deserialize, Serialize};

use crate::smart::DiskRecord;

/// Overall state of the RAID set behind the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayClassification {
    /// Expected population, no failed disk.
    Healthy,
    /// Fewer disks than expected. Redundancy is reduced or gone, so this
    /// counts as a failure even when every present disk passes.
    Degraded,
    /// More disks than expected and none failed. Usually a stale
    /// `expected_disks` setting rather than a hardware problem.
    Oversized,
    /// At least one enumerated disk failed its assessment.
    Failed,
}

/// Classification together with the counts it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayHealth {
    pub classification: ArrayClassification,
    pub present_count: u8,
    /// 0 means the operator declared no expectation.
    pub expected_count: u8,
}

impl ArrayHealth {
    /// Whether this state fails the run.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.classification,
            ArrayClassification::Degraded | ArrayClassification::Failed
        )
    }
}

/// Classify the array from the captured presence bitmask, the operator's
/// expected disk count (0 disables the count checks) and the per-disk
/// records.
pub fn evaluate_array(present_mask: u8, expected: u8, disks: &[DiskRecord]) -> ArrayHealth {
    let present_count = present_mask.count_ones() as u8;
    let any_failed = disks.iter().any(|d| d.is_failed());

    let classification = if expected > 0 && present_count < expected {
        ArrayClassification::Degraded
    } else if expected > 0 && present_count > expected && !any_failed {
        ArrayClassification::Oversized
    } else if any_failed {
        ArrayClassification::Failed
    } else {
        ArrayClassification::Healthy
    };

    ArrayHealth {
        classification,
        present_count,
        expected_count: expected,
    }
}
