// SMART page parsing, the attribute dictionary, and health verdicts.

pub mod assess;
pub mod attributes;
pub mod parser;
pub mod policy;

pub use assess::{
    assess_attribute, combine, AttributeVerdict, DiskRecord, DiskVerdict, ParsedAttribute,
};
pub use attributes::{lookup, AttributeDef, RAW_FAIL_IDS, TEMPERATURE_IDS};
pub use parser::{RawAttribute, RawThreshold};
pub use policy::{ThresholdPolicy, DEFAULT_TEMPERATURE_CRITICAL};
