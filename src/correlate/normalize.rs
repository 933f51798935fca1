use serde_json::Value;

use crate::models::{FormSnapshot, NormalizedBody};

/// Collapses a browser form snapshot into the stored body shape.
///
/// One value becomes a scalar, several stay an array, none becomes `""`.
pub fn normalize_form(form: &FormSnapshot) -> NormalizedBody {
    form.iter()
        .map(|(name, values)| {
            let value = match values.as_slice() {
                [] => Value::String(String::new()),
                [single] => Value::String(single.clone()),
                many => Value::Array(many.iter().cloned().map(Value::String).collect()),
            };
            (name.clone(), value)
        })
        .collect()
}

/// First `TvAppId` value of the form, as submitted.
pub fn tv_app_id(form: &FormSnapshot) -> Option<String> {
    form.get("TvAppId").and_then(|values| values.first()).cloned()
}
