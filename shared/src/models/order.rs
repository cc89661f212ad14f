//! Order aggregate models
//!
//! The order plus its items and guest attributions form one consistency
//! unit: every mutation is serialized per order id and committed with a
//! version bump.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Forward path: Pending → Confirmed → Preparing → Ready → Served →
/// Completed. Cancelled is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Statuses that count as "active": a table may hold at most one
    /// order in this set, and guest session tokens are valid only while
    /// the bound order stays in it.
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Terminal statuses freeze the order and release the table
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Item mutation window: only while guests are still composing
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Position on the forward path (Cancelled sits outside it)
    fn ordinal(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::Preparing => 2,
            Self::Ready => 3,
            Self::Served => 4,
            Self::Completed => 5,
            Self::Cancelled => 6,
        }
    }

    /// Whether a transition to `target` is legal
    ///
    /// Forward skips are allowed (kitchen may jump Preparing → Served);
    /// backward moves are not. Cancelled is reachable from any
    /// non-terminal state. Terminal states accept nothing.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target == Self::Cancelled {
            return true;
        }
        target.ordinal() > self.ordinal()
    }

    /// Parse a staff-supplied status string
    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "PREPARING" => Some(Self::Preparing),
            "READY" => Some(Self::Ready),
            "SERVED" => Some(Self::Served),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Served => "SERVED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Order aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-readable number: ORD-<yyyymmdd>-<restaurant>-<seq>,
    /// monotone per restaurant-day only
    pub order_number: String,
    pub restaurant_id: i64,
    pub table_id: i64,
    pub status: OrderStatus,
    /// Σ item.subtotal, rounded at storage
    pub subtotal: f64,
    pub tax_amount: f64,
    pub service_charge: f64,
    pub discount_amount: f64,
    /// subtotal + tax + service − discount
    pub total_amount: f64,
    /// Optimistic concurrency counter, bumped on every committed
    /// mutation; doubles as the event sequence for this order
    pub version: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Fresh Pending order with zeroed totals
    pub fn new(id: String, order_number: String, restaurant_id: i64, table_id: i64) -> Self {
        Self {
            id,
            order_number,
            restaurant_id,
            table_id,
            status: OrderStatus::Pending,
            subtotal: 0.0,
            tax_amount: 0.0,
            service_charge: 0.0,
            discount_amount: 0.0,
            total_amount: 0.0,
            version: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// One guest device participating in a shared order
///
/// Not a persistent customer identity; the row never outlives its order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderGuest {
    pub id: String,
    pub order_id: String,
    /// Display name, auto-assigned "Guest N" when unspecified
    pub name: String,
    /// Opaque unguessable capability token; never exposed to other guests
    pub session_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// One line of the order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: i64,
    /// Guest the line is attributed to (for the bill split)
    pub guest_id: String,
    /// Name snapshot taken at add time
    pub name: String,
    /// Unit price snapshot taken at add time; menu price changes never
    /// retroactively alter this
    pub unit_price: f64,
    pub quantity: i32,
    /// quantity × unit_price, rounded at storage
    pub subtotal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_set_matches_lifecycle() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Ready.is_active());
        assert!(!OrderStatus::Served.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    #[test]
    fn transitions_move_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Served));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn cancelled_reachable_from_any_non_terminal() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Served.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for target in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Served,
            OrderStatus::Completed,
        ] {
            assert!(!OrderStatus::Completed.can_transition_to(target));
            assert!(!OrderStatus::Cancelled.can_transition_to(target));
        }
    }

    #[test]
    fn parse_round_trips_display() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Served,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(&status.to_string()), Some(status));
        }
        assert_eq!(OrderStatus::parse("REFUNDED"), None);
    }

    #[test]
    fn only_pending_is_mutable() {
        assert!(OrderStatus::Pending.is_mutable());
        assert!(!OrderStatus::Confirmed.is_mutable());
        assert!(!OrderStatus::Ready.is_mutable());
    }
}
