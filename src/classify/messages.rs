//! Status message texts and upstream tokens.

/// Slot is no longer bookable for this request; retry later as-is.
pub const TOKEN_CANNOT_CREATE_IN_SLOT: &str = "CannotCreateTvaInSelectedSlot";
/// The task was consumed by another booking.
pub const TOKEN_TASK_USED_ELSEWHERE: &str = "TaskWasUsedInAnotherTva";
pub const CODE_TOO_MANY_TRANSACTIONS: &str = "ToMuchTransactionInSector";
pub const CODE_NO_SLOTS: &str = "NoSlotsAvailable";
pub const CODE_EDITED_BY_ANOTHER_USER: &str = "FE_0091";
pub const CODE_EDIT_WINDOW_EXPIRED: &str = "VBS_0072";

/// Upstream tokens that mark a response as a booking error even on 2xx.
pub const ERROR_TOKENS: &[&str] = &[
    TOKEN_CANNOT_CREATE_IN_SLOT,
    TOKEN_TASK_USED_ELSEWHERE,
    CODE_TOO_MANY_TRANSACTIONS,
    CODE_NO_SLOTS,
    CODE_EDITED_BY_ANOTHER_USER,
    CODE_EDIT_WINDOW_EXPIRED,
];

pub const TASK_USED_ELSEWHERE: &str = "The task was used in another booking";
pub const EDITED_BY_ANOTHER_USER: &str = "The booking was edited by another user";
pub const EDIT_WINDOW_EXPIRED: &str =
    "The time to edit this booking has expired; the booking can no longer be changed";
pub const UNKNOWN_ERROR: &str = "Unknown error returned by the terminal";
pub const INVALID_RESPONSE_FORMAT: &str = "Invalid response format from the terminal";
pub const AUTHORIZATION_LOST: &str = "Authorization lost; log in again to resume";
pub const SLOT_EXPIRED: &str = "The requested slot window has passed";

/// Soft-retry message for a congested sector.
pub fn too_many_transactions(tv_app_id: &str, time_window: &str) -> String {
    format!("Too many transactions in sector for {tv_app_id} ({time_window}); retrying")
}

/// Message for a failed attempt that returned no body.
pub fn http_failure(status: Option<u16>, attempt: u32) -> String {
    match status {
        Some(status) => format!("HTTP {status} after {attempt} attempt(s); retrying"),
        None => format!("Request failed after {attempt} attempt(s); retrying"),
    }
}
