use serde::{Deserialize, Serialize};

use crate::error_handling::QueueError;
use crate::models::{RetryObject, Status};

/// Partial update of a queue item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(rename = "status_message", default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_number: Option<String>,
    /// Apply only while the item is still in this status
    #[serde(skip)]
    pub expected_status: Option<Status>,
}

impl QueueItemPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn status_with_message(status: Status, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            status_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Makes the patch conditional on the item's current status.
    pub fn if_status(mut self, expected: Status) -> Self {
        self.expected_status = Some(expected);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        Self {
            expected_status: None,
            ..self.clone()
        } == Self::default()
    }

    /// Applies the patch to `item`, rejecting disallowed status transitions.
    ///
    /// Leaves `item` untouched on error.
    pub(crate) fn apply(self, item: &mut RetryObject) -> Result<(), QueueError> {
        if let Some(expected) = self.expected_status {
            if item.status != expected {
                return Err(QueueError::StatusChanged {
                    id: item.id.clone(),
                    expected,
                    actual: item.status,
                });
            }
        }
        if let Some(next) = self.status {
            if !item.status.can_transition_to(next) {
                return Err(QueueError::InvalidTransition {
                    id: item.id.clone(),
                    from: item.status,
                    to: next,
                });
            }
            item.status = next;
        }
        let fields = [
            (self.status_message, &mut item.status_message),
            (self.current_slot, &mut item.current_slot),
            (self.start_slot, &mut item.start_slot),
            (self.end_slot, &mut item.end_slot),
            (self.driver_name, &mut item.driver_name),
            (self.container_number, &mut item.container_number),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_wire_names() {
        let patch: QueueItemPatch =
            serde_json::from_str(r#"{"status":"paused","status_message":"hold","currentSlot":"x"}"#)
                .unwrap();
        assert_eq!(patch.status, Some(Status::Paused));
        assert_eq!(patch.status_message.as_deref(), Some("hold"));
        assert_eq!(patch.current_slot.as_deref(), Some("x"));
        assert!(patch.driver_name.is_none());
    }

    #[test]
    fn test_empty_patch() {
        assert!(QueueItemPatch::default().is_empty());
        assert!(QueueItemPatch::default().if_status(Status::Paused).is_empty());
        assert!(!QueueItemPatch::message("x").is_empty());
    }
}
