//! Mapping of resubmission results onto queue items.

use crate::classify::{classify, has_error_token, messages};
use crate::config::{HTTP_STATUS_FORBIDDEN, HTTP_STATUS_UNAUTHORIZED};
use crate::error_handling::FetchErrorKind;
use crate::fetch::{FetchError, FetchedResponse};
use crate::models::{RetryObject, Status};

/// Next state of `item` after one resubmission.
///
/// `lost_authorization` is set when the terminal rejected the session, in
/// which case the caller also raises the `unauthorized` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub next: RetryObject,
    pub lost_authorization: bool,
}

pub fn map_outcome(item: &RetryObject, result: &Result<FetchedResponse, FetchError>) -> Outcome {
    let tv_app_id = item.tv_app_id.as_str();
    let window = item.time_window();
    let mut lost_authorization = false;

    let next = match result {
        Ok(response) if has_error_token(response.text()) => {
            classify(item, response.text(), tv_app_id, &window)
        }
        Ok(_) => with(item, Status::Success, String::new()),
        Err(error) => match (error.kind, error.status, error.body.as_deref()) {
            (_, Some(status), _) if is_auth_failure(status) => {
                lost_authorization = true;
                with(item, Status::AuthorizationError, messages::AUTHORIZATION_LOST.to_string())
            }
            (FetchErrorKind::Network, _, _) => {
                let message = error
                    .original_error
                    .clone()
                    .unwrap_or_else(|| error.message.clone());
                with(item, Status::NetworkError, message)
            }
            (FetchErrorKind::ClientError | FetchErrorKind::ServerError, _, Some(body))
                if !body.trim().is_empty() =>
            {
                classify(item, body, tv_app_id, &window)
            }
            // HTML error pages and empty bodies carry nothing to classify
            _ => {
                let mut next = item.clone();
                next.status_message = messages::http_failure(error.status, error.attempt);
                next
            }
        },
    };
    Outcome {
        next,
        lost_authorization,
    }
}

fn is_auth_failure(status: u16) -> bool {
    status == HTTP_STATUS_UNAUTHORIZED || status == HTTP_STATUS_FORBIDDEN
}

fn with(item: &RetryObject, status: Status, message: String) -> RetryObject {
    let mut next = item.clone();
    next.status = status;
    next.status_message = message;
    next
}
