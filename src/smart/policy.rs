// Operator policy consulted during attribute assessment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Celsius reading at or above which a drive is flagged, unless overridden.
pub const DEFAULT_TEMPERATURE_CRITICAL: u8 = 60;

/// Tunable bounds for health assessment.
///
/// Deserializable from a config file; every field stands alone so a partial
/// config fills the rest from defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Compare normalized current values against manufacturer thresholds.
    pub use_manufacturer_thresholds: bool,

    /// Critical temperature in Celsius. `None` means the built-in default.
    pub temperature_critical: Option<u8>,

    /// Per-attribute raw ceilings. A raw value above its ceiling fails the
    /// attribute; at or below it, assessment moves on to the normal rules.
    pub raw_critical: BTreeMap<u8, u64>,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy {
            use_manufacturer_thresholds: true,
            temperature_critical: None,
            raw_critical: BTreeMap::new(),
        }
    }
}

impl ThresholdPolicy {
    /// Effective critical temperature.
    pub fn temperature_limit(&self) -> u8 {
        self.temperature_critical
            .unwrap_or(DEFAULT_TEMPERATURE_CRITICAL)
    }

    /// Raw ceiling configured for an id, if any.
    pub fn raw_bound(&self, id: u8) -> Option<u64> {
        self.raw_critical.get(&id).copied()
    }
}
