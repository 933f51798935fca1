//! The persisted record of one booking attempt under retry management.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cache::HeaderEntry;
use super::status::Status;

/// Form body after normalization: single values are scalars, repeated fields
/// stay arrays.
pub type NormalizedBody = Map<String, Value>;

/// One booking attempt under retry management.
///
/// Created by the correlator, owned by the retry queue afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryObject {
    pub id: String,
    pub tv_app_id: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub container_number: String,
    #[serde(default)]
    pub current_slot: String,
    #[serde(default)]
    pub start_slot: String,
    #[serde(default)]
    pub end_slot: String,
    #[serde(default)]
    pub status: Status,
    #[serde(rename = "status_message", default)]
    pub status_message: String,
    #[serde(default)]
    pub headers_cache: Vec<HeaderEntry>,
    #[serde(default)]
    pub original_body: NormalizedBody,
    #[serde(default)]
    pub request_url: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl RetryObject {
    /// The slot window shown in status messages, e.g. `"2024-05-10 08:00 - 2024-05-10 10:00"`.
    pub fn time_window(&self) -> String {
        match (self.start_slot.is_empty(), self.end_slot.is_empty()) {
            (true, true) => self.current_slot.clone(),
            (false, true) => self.start_slot.clone(),
            (true, false) => self.end_slot.clone(),
            (false, false) => format!("{} - {}", self.start_slot, self.end_slot),
        }
    }

    /// Flattens the normalized body back into form pairs for resubmission.
    ///
    /// Arrays expand into repeated fields in order; non-string scalars use their
    /// JSON text.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (name, value) in &self.original_body {
            match value {
                Value::Array(values) => {
                    for v in values {
                        pairs.push((name.clone(), value_to_form_string(v)));
                    }
                }
                other => pairs.push((name.clone(), value_to_form_string(other))),
            }
        }
        pairs
    }
}

fn value_to_form_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
