//! Application layer.
//!
//! Wires the components behind the engine facade, dispatches incoming messages
//! and keeps the toolbar badge current.

pub mod badge;
pub mod dispatch;
pub mod engine;
pub mod shutdown;

// Re-export public API
pub use badge::{Badge, BadgeColor, BadgeController, BadgeSink, LogBadgeSink};
pub use dispatch::{Dispatcher, Message, Reply};
pub use engine::RetryEngine;
pub use shutdown::shutdown_gracefully;
