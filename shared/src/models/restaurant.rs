//! Restaurant Model

use serde::{Deserialize, Serialize};

/// Restaurant entity
///
/// Read-only to the ordering core: tax and service rates are consumed when
/// computing totals, never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    /// Tax rate in percent (e.g. 14 for 14%)
    pub tax_rate: f64,
    /// Service charge rate in percent
    pub service_charge_rate: f64,
    pub is_active: bool,
}
