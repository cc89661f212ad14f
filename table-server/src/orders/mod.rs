//! Order aggregate engine - item mutations, totals, lifecycle
//!
//! All mutations on one order id are serialized through a per-order lock
//! and committed with a version-checked conditional write; a version
//! conflict (an external writer raced us) is retried a bounded number of
//! times before surfacing as ResourceBusy. Operations on different orders
//! proceed fully in parallel.
//!
//! # Mutation flow
//!
//! ```text
//! mutate(order_id)
//!     ├─ 1. Acquire per-order lock
//!     ├─ 2. Load order, validate status window
//!     ├─ 3. Build the change + recompute totals (Decimal)
//!     ├─ 4. Conditional commit keyed on order version
//!     ├─ 5. On version conflict: re-read and retry (bounded)
//!     └─ 6. Broadcast exactly one event, sequence = new version
//! ```

pub mod money;
pub mod status;

use std::sync::Arc;

use shared::models::{Order, OrderGuest, OrderItem, OrderStatus, TableStatus};
use shared::{Actor, AppError, AppResult, EventPayload, OrderEvent, Room};

use crate::broadcast::BroadcastHub;
use crate::config::Config;
use crate::gateway::{ItemChange, OrderCommit, OrderGateway};
use crate::locks::KeyedLocks;

/// Order aggregate engine
pub struct OrderEngine {
    gateway: Arc<dyn OrderGateway>,
    hub: Arc<BroadcastHub>,
    locks: KeyedLocks<String>,
    max_retries: u32,
}

impl OrderEngine {
    pub fn new(gateway: Arc<dyn OrderGateway>, hub: Arc<BroadcastHub>, config: &Config) -> Self {
        Self {
            gateway,
            hub,
            locks: KeyedLocks::new(),
            max_retries: config.max_mutation_retries,
        }
    }

    /// Add a line to the order, snapshotting the current menu price
    ///
    /// Permitted only while the order is Pending. The snapshot freezes
    /// name and unit price; later menu edits never touch this line.
    pub async fn add_item(
        &self,
        order_id: &str,
        guest: &OrderGuest,
        menu_item_id: i64,
        quantity: i32,
        note: Option<String>,
    ) -> AppResult<OrderItem> {
        let _guard = self.locks.lock(order_id.to_string()).await;

        let mut attempt = 0;
        loop {
            let order = self.load_mutable(order_id).await?;

            let menu_item = self
                .gateway
                .menu_item(menu_item_id)
                .await?
                .filter(|m| m.restaurant_id == order.restaurant_id)
                .ok_or_else(|| AppError::not_found("Menu item"))?;
            if !menu_item.is_available {
                return Err(AppError::conflict(format!(
                    "Menu item '{}' is currently unavailable",
                    menu_item.name
                )));
            }
            money::validate_line(menu_item.price, quantity)?;

            let item = OrderItem {
                id: uuid::Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                menu_item_id,
                guest_id: guest.id.clone(),
                name: menu_item.name.clone(),
                unit_price: menu_item.price,
                quantity,
                subtotal: money::line_subtotal(menu_item.price, quantity),
                note: note.clone(),
            };

            let mut items = self.gateway.items_for_order(order_id).await?;
            items.push(item.clone());
            let updated = self.recompute(&order, &items).await?;

            let commit = OrderCommit::update(updated.clone(), order.version)
                .with_item_change(ItemChange::Insert(item.clone()));
            match self.gateway.commit(commit).await {
                Ok(()) => {
                    self.publish_order_event(
                        &updated,
                        Actor::Guest(guest.name.clone()),
                        EventPayload::ItemAdded {
                            item: item.clone(),
                            subtotal: updated.subtotal,
                            total_amount: updated.total_amount,
                        },
                    );
                    return Ok(item);
                }
                Err(err) => self.retry_or_fail(order_id, err, &mut attempt)?,
            }
        }
    }

    /// Change the quantity of an existing line and recompute its subtotal
    pub async fn update_item_quantity(
        &self,
        order_id: &str,
        guest: &OrderGuest,
        item_id: &str,
        quantity: i32,
    ) -> AppResult<OrderItem> {
        let _guard = self.locks.lock(order_id.to_string()).await;

        let mut attempt = 0;
        loop {
            let order = self.load_mutable(order_id).await?;

            let mut item = self
                .gateway
                .item(item_id)
                .await?
                .filter(|i| i.order_id == order.id)
                .ok_or_else(|| AppError::not_found("Order item"))?;
            money::validate_line(item.unit_price, quantity)?;
            item.quantity = quantity;
            item.subtotal = money::line_subtotal(item.unit_price, quantity);

            let mut items = self.gateway.items_for_order(order_id).await?;
            if let Some(existing) = items.iter_mut().find(|i| i.id == item.id) {
                *existing = item.clone();
            }
            let updated = self.recompute(&order, &items).await?;

            let commit = OrderCommit::update(updated.clone(), order.version)
                .with_item_change(ItemChange::Update(item.clone()));
            match self.gateway.commit(commit).await {
                Ok(()) => {
                    self.publish_order_event(
                        &updated,
                        Actor::Guest(guest.name.clone()),
                        EventPayload::ItemUpdated {
                            item: item.clone(),
                            subtotal: updated.subtotal,
                            total_amount: updated.total_amount,
                        },
                    );
                    return Ok(item);
                }
                Err(err) => self.retry_or_fail(order_id, err, &mut attempt)?,
            }
        }
    }

    /// Remove a line; the attributed guest and the order itself survive
    pub async fn remove_item(
        &self,
        order_id: &str,
        guest: &OrderGuest,
        item_id: &str,
    ) -> AppResult<()> {
        let _guard = self.locks.lock(order_id.to_string()).await;

        let mut attempt = 0;
        loop {
            let order = self.load_mutable(order_id).await?;

            let item = self
                .gateway
                .item(item_id)
                .await?
                .filter(|i| i.order_id == order.id)
                .ok_or_else(|| AppError::not_found("Order item"))?;

            let mut items = self.gateway.items_for_order(order_id).await?;
            items.retain(|i| i.id != item.id);
            let updated = self.recompute(&order, &items).await?;

            let commit = OrderCommit::update(updated.clone(), order.version)
                .with_item_change(ItemChange::Remove(item.id.clone()));
            match self.gateway.commit(commit).await {
                Ok(()) => {
                    self.publish_order_event(
                        &updated,
                        Actor::Guest(guest.name.clone()),
                        EventPayload::ItemRemoved {
                            item_id: item.id,
                            item_name: item.name,
                            subtotal: updated.subtotal,
                            total_amount: updated.total_amount,
                        },
                    );
                    return Ok(());
                }
                Err(err) => self.retry_or_fail(order_id, err, &mut attempt)?,
            }
        }
    }

    /// Guest-triggered submission: Pending → Confirmed
    ///
    /// Fails on an empty item collection; the kitchen room is notified on
    /// success.
    pub async fn submit(&self, order_id: &str, guest: &OrderGuest) -> AppResult<Order> {
        let _guard = self.locks.lock(order_id.to_string()).await;

        let mut attempt = 0;
        loop {
            let order = self
                .gateway
                .order(order_id)
                .await?
                .ok_or_else(|| AppError::not_found("Order"))?;
            if order.status != OrderStatus::Pending {
                return Err(AppError::conflict(format!(
                    "Order {} cannot be submitted from status {}",
                    order.order_number, order.status
                )));
            }

            let items = self.gateway.items_for_order(order_id).await?;
            if items.is_empty() {
                return Err(AppError::validation("Cannot submit an empty order"));
            }

            let plan = status::plan_transition(&order, OrderStatus::Confirmed)?;
            match self
                .gateway
                .commit(OrderCommit::update(plan.updated.clone(), order.version))
                .await
            {
                Ok(()) => {
                    let actor = Actor::Guest(guest.name.clone());
                    self.publish_order_event(
                        &plan.updated,
                        actor.clone(),
                        EventPayload::OrderSubmitted {
                            order_number: plan.updated.order_number.clone(),
                            total_amount: plan.updated.total_amount,
                        },
                    );
                    self.notify_staff(&plan.updated, &items, actor);
                    return Ok(plan.updated);
                }
                Err(err) => self.retry_or_fail(order_id, err, &mut attempt)?,
            }
        }
    }

    /// Staff-triggered transition to any forward status or Cancelled
    ///
    /// Terminal targets release the table in the same commit and freeze
    /// the order.
    pub async fn set_status(
        &self,
        restaurant_id: i64,
        order_id: &str,
        target: OrderStatus,
        staff_name: &str,
    ) -> AppResult<Order> {
        let _guard = self.locks.lock(order_id.to_string()).await;

        let mut attempt = 0;
        loop {
            let order = self
                .gateway
                .order(order_id)
                .await?
                .filter(|o| o.restaurant_id == restaurant_id)
                .ok_or_else(|| AppError::not_found("Order"))?;

            let plan = status::plan_transition(&order, target)?;
            let mut commit = OrderCommit::update(plan.updated.clone(), order.version);
            if plan.release_table {
                commit = commit.with_table_status(order.table_id, TableStatus::Available);
            }

            match self.gateway.commit(commit).await {
                Ok(()) => {
                    let actor = Actor::Staff(staff_name.to_string());
                    self.publish_order_event(
                        &plan.updated,
                        actor.clone(),
                        EventPayload::OrderStatusUpdated {
                            from: plan.from,
                            to: target,
                        },
                    );
                    let items = if target == OrderStatus::Confirmed {
                        self.gateway.items_for_order(order_id).await?
                    } else {
                        Vec::new()
                    };
                    self.notify_staff(&plan.updated, &items, actor);

                    if plan.release_table {
                        self.settle(order_id);
                    }
                    return Ok(plan.updated);
                }
                Err(err) => self.retry_or_fail(order_id, err, &mut attempt)?,
            }
        }
    }

    // ========== Internals ==========

    /// Load the order and enforce the item mutation window
    async fn load_mutable(&self, order_id: &str) -> AppResult<Order> {
        let order = self
            .gateway
            .order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))?;
        if !order.status.is_mutable() {
            return Err(AppError::conflict(format!(
                "Order {} is not modifiable in status {}",
                order.order_number, order.status
            )));
        }
        Ok(order)
    }

    /// Recompute money fields over the full item collection
    async fn recompute(&self, order: &Order, items: &[OrderItem]) -> AppResult<Order> {
        let restaurant = self
            .gateway
            .restaurant(order.restaurant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Restaurant"))?;
        let totals = money::compute_totals(items, &restaurant, order.discount_amount);

        let mut updated = order.clone();
        updated.subtotal = totals.subtotal;
        updated.tax_amount = totals.tax_amount;
        updated.service_charge = totals.service_charge;
        updated.discount_amount = totals.discount_amount;
        updated.total_amount = totals.total_amount;
        updated.version = order.version + 1;
        Ok(updated)
    }

    /// Bounded retry on transient commit failures
    ///
    /// The per-order lock already serializes this engine's own writers, so
    /// a version conflict means an external writer raced us between read
    /// and commit; re-reading and retrying is safe because every attempt
    /// rebuilds the change from fresh state.
    fn retry_or_fail(&self, order_id: &str, err: AppError, attempt: &mut u32) -> AppResult<()> {
        if err.kind().is_transient() && *attempt < self.max_retries {
            *attempt += 1;
            tracing::warn!(
                order_id = %order_id,
                attempt = *attempt,
                error = %err,
                "Version conflict on commit, retrying"
            );
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Publish the single per-commit event to the order room
    fn publish_order_event(&self, order: &Order, actor: Actor, payload: EventPayload) {
        let event = OrderEvent::new(order.version, order.id.clone(), actor, payload);
        self.hub.publish(&Room::order(order.id.clone()), event);
    }

    /// Fan out staff notifications for a freshly entered status
    fn notify_staff(&self, order: &Order, items: &[OrderItem], actor: Actor) {
        for room in status::staff_rooms(order.restaurant_id, order.status) {
            let payload = match order.status {
                OrderStatus::Confirmed => EventPayload::KitchenNewOrder {
                    order_number: order.order_number.clone(),
                    table_id: order.table_id,
                    items: items.to_vec(),
                },
                OrderStatus::Ready | OrderStatus::Completed => {
                    EventPayload::CashierReadyForPayment {
                        order_number: order.order_number.clone(),
                        table_id: order.table_id,
                        total_amount: order.total_amount,
                        status: order.status,
                    }
                }
                _ => continue,
            };
            let event = OrderEvent::new(order.version, order.id.clone(), actor.clone(), payload);
            self.hub.publish(&room, event);
        }
    }

    /// Release per-order resources once the order is terminal
    fn settle(&self, order_id: &str) {
        self.locks.remove(&order_id.to_string());
        self.hub.close_room(&Room::order(order_id.to_string()));
    }
}

impl std::fmt::Debug for OrderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderEngine")
            .field("max_retries", &self.max_retries)
            .field("locked_orders", &self.locks.len())
            .finish()
    }
}
