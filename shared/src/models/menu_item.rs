//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Menu item entity
///
/// Price and availability are snapshotted onto order items at add time;
/// later menu edits never retroactively change placed items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub price: f64,
    pub is_available: bool,
}
