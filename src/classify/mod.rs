//! Response classification.
//!
//! Maps the text of a resubmission response onto the next state of the queued
//! item. Classification is pure: it takes the current item by reference and
//! returns a new one, and never fails; malformed input yields a terminal
//! `error` status.

pub mod messages;

use log::debug;
use serde_json::Value;

use crate::models::{RetryObject, Status};

/// Returns the item as it should look after receiving `response_text`.
///
/// `tv_app_id` and `time_window` are only used to build status messages.
pub fn classify(
    req: &RetryObject,
    response_text: &str,
    tv_app_id: &str,
    time_window: &str,
) -> RetryObject {
    if response_text.contains(messages::TOKEN_CANNOT_CREATE_IN_SLOT) {
        return req.clone();
    }
    if response_text.contains(messages::TOKEN_TASK_USED_ELSEWHERE) {
        return with_status(req, Status::AnotherTask, messages::TASK_USED_ELSEWHERE);
    }

    let parsed: Value = match serde_json::from_str(response_text) {
        Ok(value) => value,
        Err(e) => {
            debug!("Response for {tv_app_id} is not JSON: {e}");
            return with_status(req, Status::Error, messages::INVALID_RESPONSE_FORMAT);
        }
    };

    let code = message_code(&parsed).unwrap_or_default();
    if code.contains(messages::CODE_TOO_MANY_TRANSACTIONS) {
        let mut next = req.clone();
        next.status_message = messages::too_many_transactions(tv_app_id, time_window);
        return next;
    }
    if code == messages::CODE_NO_SLOTS {
        return req.clone();
    }
    if code.contains(messages::CODE_EDITED_BY_ANOTHER_USER) {
        return with_status(req, Status::AnotherTask, messages::EDITED_BY_ANOTHER_USER);
    }
    if code.contains(messages::CODE_EDIT_WINDOW_EXPIRED) {
        return with_status(req, Status::Error, messages::EDIT_WINDOW_EXPIRED);
    }

    let message = parsed
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(messages::UNKNOWN_ERROR);
    with_status(req, Status::Error, message)
}

/// Whether a 2xx body still reports a booking error.
///
/// True for any body containing a known upstream token, and for JSON objects
/// carrying a `messageCode`, a non-empty `error` or `"success": false`.
pub fn has_error_token(response_text: &str) -> bool {
    if messages::ERROR_TOKENS
        .iter()
        .any(|token| response_text.contains(token))
    {
        return true;
    }
    let Ok(parsed) = serde_json::from_str::<Value>(response_text) else {
        return false;
    };
    let has_code = parsed.get("messageCode").is_some_and(|code| !code.is_null());
    let has_error = match parsed.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    };
    let failed = parsed.get("success") == Some(&Value::Bool(false));
    has_code || has_error || failed
}

fn message_code(parsed: &Value) -> Option<String> {
    match parsed.get("messageCode")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn with_status(req: &RetryObject, status: Status, message: &str) -> RetryObject {
    let mut next = req.clone();
    next.status = status;
    next.status_message = message.to_string();
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use strum::IntoEnumIterator;

    fn item(status: Status) -> RetryObject {
        RetryObject {
            id: "1715328000000-ab12".to_string(),
            tv_app_id: "TV-1".to_string(),
            driver_name: "Jan Kowalski".to_string(),
            container_number: "MSCU1234567".to_string(),
            current_slot: "2024-05-10 08:00".to_string(),
            start_slot: String::new(),
            end_slot: String::new(),
            status,
            status_message: String::new(),
            headers_cache: Vec::new(),
            original_body: Map::new(),
            request_url: "https://terminal.example/TVApp/EditTvAppSubmit/1".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn run(text: &str) -> RetryObject {
        classify(&item(Status::InProgress), text, "TV-1", "2024-05-10 08:00")
    }

    #[test]
    fn test_cannot_create_in_slot_leaves_item_unchanged() {
        let req = item(Status::InProgress);
        let out = classify(&req, r#"{"messageCode":"CannotCreateTvaInSelectedSlot"}"#, "TV-1", "");
        assert_eq!(out, req);
    }

    #[test]
    fn test_task_used_elsewhere_for_every_input_status() {
        for status in Status::iter() {
            let out = classify(&item(status), "TaskWasUsedInAnotherTva", "TV-1", "");
            assert_eq!(out.status, Status::AnotherTask);
        }
    }

    #[test]
    fn test_too_many_transactions_keeps_status_and_updates_message() {
        let out = run(r#"{"messageCode":"ToMuchTransactionInSector_A"}"#);
        assert_eq!(out.status, Status::InProgress);
        assert!(out.status_message.contains("TV-1"));
        assert!(out.status_message.contains("2024-05-10 08:00"));
    }

    #[test]
    fn test_no_slots_is_exact_match() {
        let req = item(Status::InProgress);
        assert_eq!(run(r#"{"messageCode":"NoSlotsAvailable"}"#), req);

        let out = run(r#"{"messageCode":"NoSlotsAvailableToday"}"#);
        assert_eq!(out.status, Status::Error);
    }

    #[test]
    fn test_edited_by_another_user() {
        let out = run(r#"{"messageCode":"FE_0091"}"#);
        assert_eq!(out.status, Status::AnotherTask);
        assert_eq!(out.status_message, messages::EDITED_BY_ANOTHER_USER);
    }

    #[test]
    fn test_edit_window_expired_always_errors_with_fixed_message() {
        for status in [Status::InProgress, Status::Paused] {
            let out = classify(&item(status), r#"{"messageCode":"VBS_0072"}"#, "TV-9", "x");
            assert_eq!(out.status, Status::Error);
            assert_eq!(out.status_message, messages::EDIT_WINDOW_EXPIRED);
        }
    }

    #[test]
    fn test_other_json_uses_error_field() {
        let out = run(r#"{"messageCode":"XYZ","error":"Container blocked"}"#);
        assert_eq!(out.status, Status::Error);
        assert_eq!(out.status_message, "Container blocked");

        let out = run(r#"{"success":false}"#);
        assert_eq!(out.status, Status::Error);
        assert_eq!(out.status_message, messages::UNKNOWN_ERROR);
    }

    #[test]
    fn test_malformed_json_is_terminal_error() {
        let out = run("<html>oops");
        assert_eq!(out.status, Status::Error);
        assert_eq!(out.status_message, messages::INVALID_RESPONSE_FORMAT);
    }

    #[test]
    fn test_classification_is_pure() {
        let req = item(Status::InProgress);
        let before = req.clone();
        let first = classify(&req, r#"{"messageCode":"FE_0091"}"#, "TV-1", "w");
        let second = classify(&req, r#"{"messageCode":"FE_0091"}"#, "TV-1", "w");
        assert_eq!(first, second);
        assert_eq!(req, before);
    }

    #[test]
    fn test_has_error_token() {
        assert!(has_error_token(r#"{"messageCode":"anything"}"#));
        assert!(has_error_token("prefix TaskWasUsedInAnotherTva suffix"));
        assert!(!has_error_token(r#"{"success":true}"#));
        assert!(!has_error_token(r#"{"messageCode":null}"#));
        assert!(!has_error_token("OK"));
    }

    #[test]
    fn test_error_field_counts_as_error_signal() {
        assert!(has_error_token(r#"{"success":false,"error":"Container blocked"}"#));
        assert!(has_error_token(r#"{"error":{"code":7}}"#));
        assert!(has_error_token(r#"{"success":false}"#));
        assert!(!has_error_token(r#"{"success":true,"error":""}"#));
        assert!(!has_error_token(r#"{"success":true,"error":null}"#));
        assert!(!has_error_token(r#"{"error":false}"#));
    }

    #[test]
    fn test_non_string_message_code_uses_json_text() {
        let out = run(r#"{"messageCode":4012,"error":"Gate closed"}"#);
        assert_eq!(out.status, Status::Error);
        assert_eq!(out.status_message, "Gate closed");

        let out = run(r#"{"messageCode":["VBS_0072"]}"#);
        assert_eq!(out.status, Status::Error);
        assert_eq!(out.status_message, messages::EDIT_WINDOW_EXPIRED);

        let out = run(r#"{"messageCode":{"code":"FE_0091"}}"#);
        assert_eq!(out.status, Status::AnotherTask);
    }
}
