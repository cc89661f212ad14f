//! Response payload shapes for the logical operation surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderItem, OrderStatus};

/// Guest as visible to other devices - never carries the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestView {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

/// Result of a successful scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub table_id: i64,
    pub table_name: String,
    pub order_id: String,
    pub order_number: String,
    pub order_status: OrderStatus,
    pub guest_id: String,
    pub guest_name: String,
    /// Capability token for all subsequent guest operations; only ever
    /// returned to the device that scanned
    pub session_token: String,
}

/// Full current-state snapshot of the aggregate
///
/// This is what a reconnecting client fetches instead of event replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderState {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub guests: Vec<GuestView>,
}

/// One guest's share of the bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestBill {
    pub guest_id: String,
    pub guest_name: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub service_charge: f64,
    pub total: f64,
}

/// Per-guest bill split
///
/// Tax and service are applied independently to each guest's subtotal, so
/// the sum of per-guest totals may differ from `order_total` by a few
/// minor currency units. `order_total` is included for cross-check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillSplit {
    pub order_id: String,
    pub order_number: String,
    pub guests: Vec<GuestBill>,
    pub order_total: f64,
}
