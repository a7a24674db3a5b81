//! descriptor values wrapped with unit and provenance metadata, the
//! shape both the alvaDesc output JSON and the merged JSON use:
//! `{name: {value, unit, metadata: {software_name, software_version,
//! date}}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MOPAC_NAME: &str = "MOPAC";
pub const MOPAC_VERSION: &str = "v22.1.1";
pub const ALVADESC_NAME: &str = "AlvaDesc";
pub const ALVADESC_VERSION: &str = "alvaDesc v2.0.16";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub value: Value,
    pub unit: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub software_name: String,
    pub software_version: String,
    pub date: String,
}

impl Descriptor {
    /// wrap a computed value with provenance for `software`. no units
    /// are tracked for either tool, so the unit field is the literal
    /// placeholder "None".
    pub fn new(value: impl Into<Value>, software: &str, version: &str) -> Self {
        Self {
            value: value.into(),
            unit: "None".to_owned(),
            metadata: Metadata {
                software_name: software.to_owned(),
                software_version: version.to_owned(),
                date: today(),
            },
        }
    }
}

/// provenance date in the dd.mm.YYYY format the downstream consumers
/// expect
pub fn today() -> String {
    chrono::Local::now().format("%d.%m.%Y").to_string()
}

/// pull the bare `value` field out of one wrapped descriptor entry,
/// dropping unit and metadata. entries without a `value` field collapse
/// to null rather than erroring.
pub fn flatten(entry: &Value) -> Value {
    entry.get("value").cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_carries_provenance() {
        let d = Descriptor::new(1.25, MOPAC_NAME, MOPAC_VERSION);
        assert_eq!(d.value, Value::from(1.25));
        assert_eq!(d.unit, "None");
        assert_eq!(d.metadata.software_name, "MOPAC");
        assert_eq!(d.metadata.software_version, "v22.1.1");
    }

    #[test]
    fn json_round_trip_then_flatten() {
        // writing a descriptor to JSON, reading it back, and flattening
        // must reproduce exactly the original value
        let d = Descriptor::new(-56.332, ALVADESC_NAME, ALVADESC_VERSION);
        let json = serde_json::to_string(&d).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(flatten(&back), Value::from(-56.332));
    }

    #[test]
    fn flatten_tolerates_malformed_entries() {
        assert_eq!(flatten(&serde_json::json!({"unit": "None"})), Value::Null);
        assert_eq!(flatten(&Value::from(42)), Value::Null);
    }

    #[test]
    fn date_format() {
        let d = today();
        // dd.mm.YYYY
        assert_eq!(d.len(), 10);
        assert_eq!(d.matches('.').count(), 2);
    }
}
