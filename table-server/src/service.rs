//! Transport-agnostic operation surface
//!
//! One method per logical operation. Guest operations authenticate with
//! the opaque session token; staff operations are scoped by restaurant id
//! (staff authentication itself is external to this core). Dependencies
//! are passed in at construction; nothing here reaches for ambient state.

use std::sync::Arc;

use shared::models::{Order, OrderItem, OrderStatus};
use shared::request::{
    AddItemRequest, ListOrdersFilter, ScanRequest, SetStatusRequest, UpdateItemRequest,
};
use shared::response::{BillSplit, GuestView, OrderState, ScanResponse};
use shared::{Actor, AppError, AppResult, EventPayload, OrderEvent, Room};
use validator::Validate;

use crate::billing;
use crate::broadcast::BroadcastHub;
use crate::config::Config;
use crate::gateway::OrderGateway;
use crate::guests::GuestRegistry;
use crate::orders::OrderEngine;
use crate::sessions::SessionManager;

/// The collaborative ordering service
pub struct OrderSessionService {
    gateway: Arc<dyn OrderGateway>,
    hub: Arc<BroadcastHub>,
    registry: Arc<GuestRegistry>,
    sessions: SessionManager,
    engine: OrderEngine,
}

impl OrderSessionService {
    pub fn new(gateway: Arc<dyn OrderGateway>, config: Config) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.event_channel_capacity));
        let registry = Arc::new(GuestRegistry::new(gateway.clone()));
        let sessions = SessionManager::new(gateway.clone(), hub.clone(), registry.clone(), &config);
        let engine = OrderEngine::new(gateway.clone(), hub.clone(), &config);
        Self {
            gateway,
            hub,
            registry,
            sessions,
            engine,
        }
    }

    /// Broadcast hub, for subscribing to rooms
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    // ========== Guest operations ==========

    /// Scan a table QR code: find or create the table's active order and
    /// mint a guest session bound to it
    pub async fn scan(&self, request: ScanRequest) -> AppResult<ScanResponse> {
        request.validate()?;
        let resolved = self
            .sessions
            .resolve_or_create(
                &request.table_token,
                request.guest_name,
                request.device_info,
            )
            .await?;

        Ok(ScanResponse {
            restaurant_id: resolved.restaurant.id,
            restaurant_name: resolved.restaurant.name,
            table_id: resolved.table.id,
            table_name: resolved.table.name,
            order_id: resolved.order.id,
            order_number: resolved.order.order_number,
            order_status: resolved.order.status,
            guest_id: resolved.guest.id,
            guest_name: resolved.guest.name,
            session_token: resolved.guest.session_token,
        })
    }

    /// Full current-state snapshot of the session's order
    pub async fn get_order_state(&self, session_token: &str) -> AppResult<OrderState> {
        let session = self.registry.validate(session_token).await?;
        let items = self.gateway.items_for_order(&session.order.id).await?;
        let guests = self.gateway.guests_for_order(&session.order.id).await?;
        Ok(OrderState {
            order: session.order,
            items,
            guests: guests
                .into_iter()
                .map(|g| GuestView {
                    id: g.id,
                    name: g.name,
                    joined_at: g.joined_at,
                })
                .collect(),
        })
    }

    /// Add an item to the session's order
    pub async fn add_item(
        &self,
        session_token: &str,
        request: AddItemRequest,
    ) -> AppResult<OrderItem> {
        request.validate()?;
        let session = self.registry.validate(session_token).await?;
        self.engine
            .add_item(
                &session.order.id,
                &session.guest,
                request.menu_item_id,
                request.quantity,
                request.note,
            )
            .await
    }

    /// Change the quantity of an item in the session's order
    pub async fn update_item(
        &self,
        session_token: &str,
        request: UpdateItemRequest,
    ) -> AppResult<OrderItem> {
        request.validate()?;
        let session = self.registry.validate(session_token).await?;
        self.engine
            .update_item_quantity(
                &session.order.id,
                &session.guest,
                &request.item_id,
                request.quantity,
            )
            .await
    }

    /// Remove an item from the session's order
    pub async fn remove_item(&self, session_token: &str, item_id: &str) -> AppResult<()> {
        let session = self.registry.validate(session_token).await?;
        self.engine
            .remove_item(&session.order.id, &session.guest, item_id)
            .await
    }

    /// Submit the session's order to the kitchen (Pending → Confirmed)
    pub async fn submit_order(&self, session_token: &str) -> AppResult<Order> {
        let session = self.registry.validate(session_token).await?;
        self.engine.submit(&session.order.id, &session.guest).await
    }

    /// Announce that this device is leaving the table
    ///
    /// Presence only: the guest row and its item attributions survive for
    /// the bill split; the room just learns the device is gone.
    pub async fn leave_order(&self, session_token: &str) -> AppResult<()> {
        let session = self.registry.validate(session_token).await?;
        let event = OrderEvent::new(
            session.order.version,
            session.order.id.clone(),
            Actor::Guest(session.guest.name.clone()),
            EventPayload::GuestLeft {
                guest_id: session.guest.id.clone(),
                guest_name: session.guest.name.clone(),
            },
        );
        self.hub.publish(&Room::order(session.order.id), event);
        Ok(())
    }

    /// Per-guest bill split over the current aggregate snapshot
    pub async fn get_bill_split(&self, session_token: &str) -> AppResult<BillSplit> {
        let session = self.registry.validate(session_token).await?;
        let restaurant = self
            .gateway
            .restaurant(session.order.restaurant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Restaurant"))?;
        let items = self.gateway.items_for_order(&session.order.id).await?;
        let guests = self.gateway.guests_for_order(&session.order.id).await?;
        Ok(billing::split_bill(
            &session.order,
            &items,
            &guests,
            &restaurant,
        ))
    }

    // ========== Staff operations ==========

    /// List a restaurant's orders, optionally filtered by status, table
    /// or creation date; no match yields an empty list, not an error
    pub async fn list_orders(
        &self,
        restaurant_id: i64,
        filter: ListOrdersFilter,
    ) -> AppResult<Vec<Order>> {
        self.gateway.list_orders(restaurant_id, &filter).await
    }

    /// Staff status transition; the target arrives as a string and must
    /// name one of the seven known statuses
    pub async fn set_status(
        &self,
        restaurant_id: i64,
        request: SetStatusRequest,
    ) -> AppResult<Order> {
        request.validate()?;
        let target = OrderStatus::parse(&request.status).ok_or_else(|| {
            AppError::validation(format!("Unknown order status '{}'", request.status))
        })?;
        self.engine
            .set_status(restaurant_id, &request.order_id, target, &request.staff_name)
            .await
    }
}

impl std::fmt::Debug for OrderSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSessionService")
            .field("sessions", &self.sessions)
            .field("engine", &self.engine)
            .finish()
    }
}
