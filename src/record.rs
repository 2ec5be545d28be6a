// 💾 Persisted Record - the JSON document mirrored into the key-value store
//
// Shape: {"version":1,"categories":[{"id","name","percentage"}],"totalAmount":"..."}
// Records written before the version field existed decode as version 0.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::allocation::{clamp_percentage, AllocationState, Category};

pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Absent in older records (= version 0)
    #[serde(default)]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,

    /// `None` when missing or falsy (blank string, 0)
    #[serde(
        default,
        deserialize_with = "total_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_amount: Option<String>,
}

impl PersistedState {
    pub fn from_state(state: &AllocationState) -> Self {
        PersistedState {
            version: RECORD_VERSION,
            categories: Some(state.categories.clone()),
            total_amount: Some(state.total_amount.clone()),
        }
    }

    /// Overwrite the fields present in the record; missing fields keep their current value.
    pub fn apply_to(self, state: &mut AllocationState) {
        if let Some(categories) = self.categories {
            state.categories = categories;
        }
        if let Some(total) = self.total_amount {
            state.total_amount = total;
        }
    }
}

pub fn encode(state: &AllocationState) -> serde_json::Result<String> {
    serde_json::to_string(&PersistedState::from_state(state))
}

pub fn decode(payload: &str) -> serde_json::Result<PersistedState> {
    serde_json::from_str(payload)
}

// ============================================================================
// SERDE HELPERS
// ============================================================================

/// Ids were numeric timestamps in older records; keep them as their decimal text.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid category id: {}",
            other
        ))),
    }
}

pub(crate) fn percentage_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(clamp_percentage(value))
}

fn total_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let total = match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    };
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_preserves_state() {
        let mut state = AllocationState::seed();
        state.total_amount = "80000".to_string();
        state.categories.push(Category::new("Emergency Fund", 12.5));

        let payload = encode(&state).unwrap();
        let record = decode(&payload).unwrap();
        assert_eq!(record.version, RECORD_VERSION);

        let mut restored = AllocationState {
            categories: Vec::new(),
            total_amount: String::new(),
        };
        record.apply_to(&mut restored);
        assert_eq!(restored, state);
    }

    #[test]
    fn test_encode_uses_camel_case_fields() {
        let payload = encode(&AllocationState::seed()).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();

        assert!(value.get("totalAmount").is_some());
        assert!(value.get("categories").unwrap().is_array());
        assert_eq!(value["categories"][0]["name"], "Buy Phone");
        assert_eq!(value["categories"][0]["percentage"], 30.0);
    }

    #[test]
    fn test_decode_legacy_record_without_version() {
        let payload = r#"{
            "categories": [
                {"id": 1, "name": "Buy Phone", "percentage": 30},
                {"id": 1718000000000, "name": "Laptop", "percentage": 15.5}
            ],
            "totalAmount": 5000
        }"#;

        let record = decode(payload).unwrap();
        assert_eq!(record.version, 0);

        let categories = record.categories.clone().unwrap();
        assert_eq!(categories[0].id, "1");
        assert_eq!(categories[1].id, "1718000000000");
        assert_eq!(categories[1].percentage, 15.5);
        assert_eq!(record.total_amount.as_deref(), Some("5000"));
    }

    #[test]
    fn test_missing_fields_keep_defaults() {
        let mut state = AllocationState::seed();
        decode(r#"{"totalAmount": "250"}"#).unwrap().apply_to(&mut state);
        assert!(!state.is_seed());
        assert_eq!(state.categories.len(), 3);
        assert_eq!(state.total_amount, "250");

        let mut state = AllocationState::seed();
        decode(r#"{"categories": []}"#).unwrap().apply_to(&mut state);
        assert!(state.categories.is_empty());
        assert_eq!(state.total_amount, "");
    }

    #[test]
    fn test_falsy_total_is_ignored() {
        assert_eq!(decode(r#"{"totalAmount": ""}"#).unwrap().total_amount, None);
        assert_eq!(decode(r#"{"totalAmount": 0}"#).unwrap().total_amount, None);
        assert_eq!(decode(r#"{"totalAmount": null}"#).unwrap().total_amount, None);
    }

    #[test]
    fn test_out_of_range_and_missing_percentages() {
        let payload = r#"{"categories": [
            {"id": "a", "name": "Huge", "percentage": 400},
            {"id": "b", "name": "Negative", "percentage": -5},
            {"id": "c", "name": "Missing"},
            {"id": "d", "name": "Null", "percentage": null}
        ]}"#;

        let categories = decode(payload).unwrap().categories.unwrap();
        let percentages: Vec<f64> = categories.iter().map(|c| c.percentage).collect();
        assert_eq!(percentages, vec![100.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_undecodable_payloads() {
        assert!(decode("not json").is_err());
        assert!(decode("null").is_err());
        assert!(decode("42").is_err());
        assert!(decode(r#"{"categories": "oops"}"#).is_err());
    }
}
