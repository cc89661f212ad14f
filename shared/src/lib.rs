//! Shared types for the table ordering core
//!
//! Common types used across crates: domain models, the unified error
//! system, broadcast event taxonomy, and request/response payload shapes.

pub mod error;
pub mod event;
pub mod models;
pub mod request;
pub mod response;

// Re-exports
pub use error::{AppError, AppResult, ErrorKind};
pub use event::{Actor, EventPayload, OrderEvent, Room, StaffRole};
pub use serde::{Deserialize, Serialize};
