//! Data model shared by capture, correlation, queue and scheduler.

mod cache;
mod form;
mod retry_object;
mod status;
mod table;

pub use cache::{
    latest, next_sequence, BodyCache, CachedBody, CachedHeaders, HeaderCache, HeaderEntry,
    SequencedEntry,
};
pub use form::FormSnapshot;
pub use retry_object::{NormalizedBody, RetryObject};
pub use status::Status;
pub use table::{TableData, TableRow};
