//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Physical table status
///
/// While an order is active the status is derived from order lifecycle
/// events, not independently mutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub capacity: i32,
    /// Opaque token encoded in the table's QR code, presented on scan
    pub qr_token: String,
    pub status: TableStatus,
}
