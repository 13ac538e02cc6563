// Merges a slot's values page, thresholds page and the active policy into
// per-attribute and per-disk verdicts.

use serde::{Deserialize, Serialize};

use super::attributes::{self, RAW_FAIL_IDS, TEMPERATURE_IDS};
use super::parser::{self, POWER_ON_HOURS};
use super::policy::ThresholdPolicy;
use crate::probes::{DiskIdentity, SmartPage};

/// Verdict for a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeVerdict {
    Passed,
    Failed,
}

/// Verdict for a whole disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskVerdict {
    /// Every parsed attribute passed.
    Passed,
    /// At least one attribute failed.
    Failed,
    /// Present, but no usable SMART data came back.
    Error,
}

/// One attribute after merging values, thresholds and the dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAttribute {
    pub id: u8,
    pub name: String,
    pub current: u8,
    pub worst: u8,
    pub threshold: u8,
    pub raw_value: u64,
    pub verdict: AttributeVerdict,
    /// Dictionary hint: growth here usually precedes failure.
    pub critical: bool,
}

/// Everything the scan learned about one slot.
///
/// `verdict` is `None` exactly when the bay is empty; a present disk always
/// carries one, `Error` standing for present-but-indeterminate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskRecord {
    pub slot: u8,
    pub present: bool,
    pub model: String,
    pub serial: String,
    pub firmware: String,
    pub size_mb: u64,
    pub attributes: Vec<ParsedAttribute>,
    pub verdict: Option<DiskVerdict>,
}

impl DiskRecord {
    /// Record for a bay with nothing in it.
    pub fn absent(slot: u8) -> Self {
        DiskRecord {
            slot,
            present: false,
            model: String::new(),
            serial: String::new(),
            firmware: String::new(),
            size_mb: 0,
            attributes: Vec::new(),
            verdict: None,
        }
    }

    /// Record for a present disk whose SMART pages could not be read.
    pub fn indeterminate(identity: &DiskIdentity) -> Self {
        DiskRecord {
            slot: identity.slot,
            present: true,
            model: identity.model.clone(),
            serial: identity.serial.clone(),
            firmware: identity.firmware.clone(),
            size_mb: identity.size_mb,
            attributes: Vec::new(),
            verdict: Some(DiskVerdict::Error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.verdict == Some(DiskVerdict::Failed)
    }
}

/// Apply the assessment rules to one attribute.
///
/// Rule order is fixed. A policy raw ceiling is consulted first but can only
/// fail the attribute; temperature ids are then judged solely on the
/// temperature rule; the built-in critical set fails on any nonzero raw
/// value; manufacturer thresholds come last and can be disabled by policy.
pub fn assess_attribute(
    id: u8,
    current: u8,
    threshold: u8,
    raw_value: u64,
    policy: &ThresholdPolicy,
) -> AttributeVerdict {
    if let Some(bound) = policy.raw_bound(id) {
        if raw_value > bound {
            return AttributeVerdict::Failed;
        }
    }

    if TEMPERATURE_IDS.contains(&id) {
        // Celsius reading lives in the low byte of the raw value.
        let celsius = raw_value as u8;
        if celsius >= policy.temperature_limit() {
            return AttributeVerdict::Failed;
        }
        return AttributeVerdict::Passed;
    }

    if RAW_FAIL_IDS.contains(&id) && raw_value > 0 {
        return AttributeVerdict::Failed;
    }

    if policy.use_manufacturer_thresholds && threshold > 0 && current <= threshold {
        return AttributeVerdict::Failed;
    }

    AttributeVerdict::Passed
}

/// Merge one slot's identity and SMART pages into a [`DiskRecord`].
///
/// Pure: the same pages and policy always yield the same record.
pub fn combine(
    identity: &DiskIdentity,
    values_page: &SmartPage,
    thresholds_page: &SmartPage,
    policy: &ThresholdPolicy,
) -> DiskRecord {
    let thresholds = parser::parse_thresholds(thresholds_page);
    let mut attributes = Vec::new();

    for raw in parser::parse_values(values_page) {
        let threshold = thresholds
            .iter()
            .find(|t| t.id == raw.id)
            .map_or(0, |t| t.threshold);

        let mut raw_value = raw.raw_value();
        if raw.id == POWER_ON_HOURS {
            raw_value &= u64::from(u32::MAX);
        }

        let def = attributes::lookup(raw.id);
        let name = def.map_or("Unknown_Attribute", |d| d.name);
        let verdict = assess_attribute(raw.id, raw.current, threshold, raw_value, policy);
        if verdict == AttributeVerdict::Failed {
            tracing::debug!(
                "slot {} attribute {:#04x} {} failed (current {}, threshold {}, raw {})",
                identity.slot, raw.id, name, raw.current, threshold, raw_value
            );
        }

        attributes.push(ParsedAttribute {
            id: raw.id,
            name: name.to_string(),
            current: raw.current,
            worst: raw.worst,
            threshold,
            raw_value,
            verdict,
            critical: def.map_or(false, |d| d.critical),
        });
    }

    let verdict = if attributes.is_empty() {
        // Present disk, no parseable data. Not the same thing as absent.
        DiskVerdict::Error
    } else if attributes
        .iter()
        .any(|a| a.verdict == AttributeVerdict::Failed)
    {
        DiskVerdict::Failed
    } else {
        DiskVerdict::Passed
    };

    DiskRecord {
        slot: identity.slot,
        present: true,
        model: identity.model.clone(),
        serial: identity.serial.clone(),
        firmware: identity.firmware.clone(),
        size_mb: identity.size_mb,
        attributes,
        verdict: Some(verdict),
    }
}
