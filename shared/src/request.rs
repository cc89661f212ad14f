//! Request payload shapes for the logical operation surface
//!
//! Transport-agnostic: whatever carries these (HTTP, socket frames,
//! in-process calls) deserializes into the same structures. Inputs are
//! validated with `validator` before any mutation is attempted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::OrderStatus;

/// Scan of a table QR code - entry point for every guest device
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScanRequest {
    /// Opaque token from the table QR code
    #[validate(length(min = 1, message = "table token is required"))]
    pub table_token: String,
    /// Optional display name; "Guest N" assigned when missing
    #[validate(length(min = 1, max = 64, message = "guest name must be 1-64 characters"))]
    pub guest_name: Option<String>,
    /// Free-form device description for staff-side display
    #[validate(length(max = 256, message = "device info too long"))]
    pub device_info: Option<String>,
}

/// Add one line to the shared order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddItemRequest {
    pub menu_item_id: i64,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(max = 256, message = "note too long"))]
    pub note: Option<String>,
}

/// Change the quantity of an existing line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, message = "item id is required"))]
    pub item_id: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

/// Staff-side order listing filters; all optional, empty filter lists all
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOrdersFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
    /// Calendar date of creation, in the restaurant's business day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Staff-triggered status transition
///
/// Status arrives as a string and is parsed against the closed set of
/// seven statuses; unknown values are a validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetStatusRequest {
    #[validate(length(min = 1, message = "order id is required"))]
    pub order_id: String,
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    /// Staff member name for event attribution
    #[validate(length(min = 1, max = 64, message = "staff name must be 1-64 characters"))]
    pub staff_name: String,
}
