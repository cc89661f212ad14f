//! Order status state machine
//!
//! Pure planning: given the current order row and a target status, produce
//! the updated row and its side effects. The engine commits the plan
//! atomically and fans out the events.

use chrono::Utc;
use shared::models::{Order, OrderStatus};
use shared::{AppError, AppResult, Room, StaffRole};

/// A validated transition, ready to commit
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    /// Order row after the transition, version already bumped
    pub updated: Order,
    pub from: OrderStatus,
    /// Terminal transitions release the table in the same commit
    pub release_table: bool,
}

/// Validate a transition and build its plan
///
/// Legal moves are strictly forward on the lifecycle path, or to
/// Cancelled from any non-terminal state. Entering a terminal state stamps
/// `completed_at` and releases the table.
pub fn plan_transition(order: &Order, target: OrderStatus) -> AppResult<TransitionPlan> {
    if !order.status.can_transition_to(target) {
        return Err(AppError::conflict(format!(
            "Invalid status transition {} -> {}",
            order.status, target
        )));
    }

    let from = order.status;
    let mut updated = order.clone();
    updated.status = target;
    updated.version = order.version + 1;
    if target.is_terminal() {
        updated.completed_at = Some(Utc::now());
    }

    Ok(TransitionPlan {
        updated,
        from,
        release_table: target.is_terminal(),
    })
}

/// Staff rooms to notify when an order enters `target`
///
/// Confirmed goes to the kitchen; Ready and Completed go to the cashier.
pub fn staff_rooms(restaurant_id: i64, target: OrderStatus) -> Vec<Room> {
    match target {
        OrderStatus::Confirmed => vec![Room::staff(restaurant_id, StaffRole::Kitchen)],
        OrderStatus::Ready | OrderStatus::Completed => {
            vec![Room::staff(restaurant_id, StaffRole::Cashier)]
        }
        _ => vec![],
    }
}
