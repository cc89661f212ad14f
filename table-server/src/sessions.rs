//! Session manager - table scan entry point
//!
//! Resolves a table QR token to the table's single active order, creating
//! one when none exists. The find-or-create sequence runs under a
//! per-table lock so two concurrent scans of an empty table produce
//! exactly one order, with the second scan joining the first scan's
//! order. The gateway's one-active-order-per-table constraint backs this
//! up against writers outside this process: an insert that loses that
//! race falls back to joining the winner's order.

use std::sync::Arc;

use chrono::Utc;
use shared::models::{DiningTable, Order, OrderGuest, Restaurant, TableStatus};
use shared::{Actor, AppError, AppResult, EventPayload, OrderEvent, Room};

use crate::broadcast::BroadcastHub;
use crate::config::Config;
use crate::gateway::{OrderCommit, OrderGateway};
use crate::guests::GuestRegistry;
use crate::locks::KeyedLocks;

/// Outcome of a scan
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub restaurant: Restaurant,
    pub table: DiningTable,
    pub order: Order,
    pub guest: OrderGuest,
    /// Whether this scan created the order (first device at the table)
    pub created_order: bool,
}

/// Session manager
pub struct SessionManager {
    gateway: Arc<dyn OrderGateway>,
    hub: Arc<BroadcastHub>,
    registry: Arc<GuestRegistry>,
    table_locks: KeyedLocks<i64>,
    max_retries: u32,
}

impl SessionManager {
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        hub: Arc<BroadcastHub>,
        registry: Arc<GuestRegistry>,
        config: &Config,
    ) -> Self {
        Self {
            gateway,
            hub,
            registry,
            table_locks: KeyedLocks::new(),
            max_retries: config.max_mutation_retries,
        }
    }

    /// Resolve a table token to its active order, creating the order when
    /// none exists, and mint a guest session bound to it
    pub async fn resolve_or_create(
        &self,
        qr_token: &str,
        guest_name: Option<String>,
        device_info: Option<String>,
    ) -> AppResult<ResolvedSession> {
        let table = self
            .gateway
            .table_by_token(qr_token)
            .await?
            .ok_or_else(|| AppError::not_found("Table"))?;
        if table.status == TableStatus::Maintenance {
            return Err(AppError::conflict(format!(
                "Table {} is under maintenance",
                table.name
            )));
        }

        let restaurant = self
            .gateway
            .restaurant(table.restaurant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Restaurant"))?;
        if !restaurant.is_active {
            return Err(AppError::conflict(format!(
                "Restaurant {} is not active",
                restaurant.name
            )));
        }

        // Serialization point: one find-or-create at a time per table
        let _guard = self.table_locks.lock(table.id).await;

        let existing = self.gateway.find_active_order_for_table(table.id).await?;
        let (order, guest, created) = match existing {
            Some(order) => {
                let (order, guest) = self
                    .join_order(order, guest_name.clone(), device_info.clone())
                    .await?;
                (order, guest, false)
            }
            None => {
                match self
                    .create_order(&restaurant, &table, guest_name.clone(), device_info.clone())
                    .await
                {
                    Ok((order, guest)) => (order, guest, true),
                    // An external writer created the order between our read
                    // and insert; join it instead of failing the scan
                    Err(err) if err.kind() == shared::ErrorKind::Conflict => {
                        let order = self
                            .gateway
                            .find_active_order_for_table(table.id)
                            .await?
                            .ok_or(err)?;
                        let (order, guest) =
                            self.join_order(order, guest_name, device_info).await?;
                        (order, guest, false)
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        let event = OrderEvent::new(
            order.version,
            order.id.clone(),
            Actor::Guest(guest.name.clone()),
            EventPayload::GuestJoined {
                guest_id: guest.id.clone(),
                guest_name: guest.name.clone(),
            },
        );
        self.hub.publish(&Room::order(order.id.clone()), event);

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            guest = %guest.name,
            created,
            "Guest session resolved"
        );

        Ok(ResolvedSession {
            restaurant,
            table,
            order,
            guest,
            created_order: created,
        })
    }

    /// Create the table's order and its first guest in one commit,
    /// occupying the table as a side effect
    async fn create_order(
        &self,
        restaurant: &Restaurant,
        table: &DiningTable,
        guest_name: Option<String>,
        device_info: Option<String>,
    ) -> AppResult<(Order, OrderGuest)> {
        let today = Utc::now().date_naive();
        // Consumed before the commit: a lost insert race burns the number.
        // Ticket numbers are monotone per restaurant-day, not gap-free.
        let sequence = self
            .gateway
            .next_order_sequence(restaurant.id, today)
            .await?;
        let order_number = format!(
            "ORD-{}-{}-{:04}",
            today.format("%Y%m%d"),
            restaurant.id,
            sequence
        );

        let order = Order::new(
            uuid::Uuid::new_v4().to_string(),
            order_number,
            restaurant.id,
            table.id,
        );
        let guest = self
            .registry
            .build_guest(&order.id, guest_name, device_info)
            .await?;

        let commit = OrderCommit {
            expected_version: None,
            order: order.clone(),
            item_change: None,
            insert_guest: Some(guest.clone()),
            table_status: Some((table.id, TableStatus::Occupied)),
        };
        self.gateway.commit(commit).await?;

        Ok((order, guest))
    }

    /// Join an existing order: insert the guest row and bump the aggregate
    /// version so the join is ordered against concurrent item mutations
    async fn join_order(
        &self,
        mut order: Order,
        guest_name: Option<String>,
        device_info: Option<String>,
    ) -> AppResult<(Order, OrderGuest)> {
        let mut attempt = 0;
        loop {
            let guest = self
                .registry
                .build_guest(&order.id, guest_name.clone(), device_info.clone())
                .await?;

            let mut updated = order.clone();
            updated.version = order.version + 1;
            let commit = OrderCommit::update(updated.clone(), order.version).with_guest(guest.clone());

            match self.gateway.commit(commit).await {
                Ok(()) => return Ok((updated, guest)),
                Err(err) if err.kind().is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        order_id = %order.id,
                        attempt,
                        error = %err,
                        "Version conflict while joining order, retrying"
                    );
                    order = self
                        .gateway
                        .order(&order.id)
                        .await?
                        .filter(|o| o.status.is_active())
                        .ok_or_else(|| {
                            AppError::conflict("Order settled while joining the table")
                        })?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("locked_tables", &self.table_locks.len())
            .finish()
    }
}
