//! Broadcast events - immutable facts emitted after each committed mutation
//!
//! Events form a closed, versioned set of variants with fixed schemas.
//! `sequence` is the order version produced by the committing mutation,
//! unique per commit, and is the authoritative per-order ordering:
//! item and lifecycle events arrive in commit order, while guest joins
//! publish outside the per-order lock and may arrive displaced from
//! their sequence. Presence-only events (GuestLeft) commit nothing and
//! carry the order version current at emission, which an adjacent
//! mutation event may share. Delivery is best-effort; a reconnecting
//! client requests a full snapshot instead of relying on replay.

use crate::models::{OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};

/// Staff role rooms fan out to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Kitchen,
    Cashier,
}

/// A logical broadcast group
///
/// One room per order (all joined guest devices) and one room per
/// {restaurant, staff role} for kitchen/cashier views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Room {
    Order { order_id: String },
    Staff { restaurant_id: i64, role: StaffRole },
}

impl Room {
    pub fn order(order_id: impl Into<String>) -> Self {
        Self::Order {
            order_id: order_id.into(),
        }
    }

    pub fn staff(restaurant_id: i64, role: StaffRole) -> Self {
        Self::Staff {
            restaurant_id,
            role,
        }
    }
}

/// Who triggered the event, for UI attribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Guest(String),
    Staff(String),
}

impl Actor {
    pub fn name(&self) -> &str {
        match self {
            Self::Guest(name) | Self::Staff(name) => name,
        }
    }
}

/// Event payload variants - each carries the minimal delta
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Presence ==========
    GuestJoined {
        guest_id: String,
        guest_name: String,
    },

    GuestLeft {
        guest_id: String,
        guest_name: String,
    },

    // ========== Items ==========
    ItemAdded {
        item: OrderItem,
        subtotal: f64,
        total_amount: f64,
    },

    ItemUpdated {
        item: OrderItem,
        subtotal: f64,
        total_amount: f64,
    },

    ItemRemoved {
        item_id: String,
        item_name: String,
        subtotal: f64,
        total_amount: f64,
    },

    // ========== Lifecycle ==========
    OrderSubmitted {
        order_number: String,
        total_amount: f64,
    },

    OrderStatusUpdated {
        from: OrderStatus,
        to: OrderStatus,
    },

    // ========== Staff notifications ==========
    /// Sent to the kitchen room when an order enters Confirmed
    KitchenNewOrder {
        order_number: String,
        table_id: i64,
        items: Vec<OrderItem>,
    },

    /// Sent to the cashier room when an order enters Ready or Completed
    CashierReadyForPayment {
        order_number: String,
        table_id: i64,
        total_amount: f64,
        status: OrderStatus,
    },
}

/// Broadcast event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Order version produced by the committing mutation; authoritative
    /// per-order ordering of mutation events. Presence-only events carry
    /// the current version instead.
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Who triggered the mutation
    pub actor: Actor,
    /// Event payload
    pub payload: EventPayload,
}

impl OrderEvent {
    /// Create a new event stamped with the server clock
    pub fn new(sequence: u64, order_id: String, actor: Actor, payload: EventPayload) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: chrono::Utc::now().timestamp_millis(),
            actor,
            payload,
        }
    }
}
