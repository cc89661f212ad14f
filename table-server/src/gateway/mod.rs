//! Persistence gateway
//!
//! The durable store is external to this core; it is reached through this
//! trait as a key-value/relational store supporting reads, conditional
//! writes and small transactions. [`OrderCommit`] is the single write
//! entry point for the order aggregate: one commit carries the new order
//! row plus at most one item change, one guest insert and one table
//! status side effect, applied atomically or not at all.
//!
//! Concurrency contract:
//!
//! - `expected_version: None` inserts a new order and must fail with
//!   `Conflict` if the table already has an active order (the
//!   one-active-order-per-table uniqueness constraint).
//! - `expected_version: Some(v)` succeeds only when the stored order is
//!   still at version `v`, and must fail with `ResourceBusy` otherwise.
//!   The committed row carries `v + 1`.
//!
//! Implementations must fail within bounded time; a timed-out call fails
//! the enclosing operation rather than leave the aggregate partially
//! mutated.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{
    DiningTable, MenuItem, Order, OrderGuest, OrderItem, Restaurant, TableStatus,
};
use shared::request::ListOrdersFilter;
use shared::AppResult;

/// Item collection change carried by a commit
#[derive(Debug, Clone)]
pub enum ItemChange {
    Insert(OrderItem),
    Update(OrderItem),
    Remove(String),
}

/// One atomic aggregate write
#[derive(Debug, Clone)]
pub struct OrderCommit {
    /// None = insert a new order; Some(v) = conditional update
    pub expected_version: Option<u64>,
    /// Full new order row, version already bumped by the caller
    pub order: Order,
    /// Optional item collection change
    pub item_change: Option<ItemChange>,
    /// Optional guest row created in the same transaction
    pub insert_guest: Option<OrderGuest>,
    /// Optional table status side effect (occupy on create, release on
    /// terminal transition)
    pub table_status: Option<(i64, TableStatus)>,
}

impl OrderCommit {
    /// Plain order-row update with no side effects
    pub fn update(order: Order, expected_version: u64) -> Self {
        Self {
            expected_version: Some(expected_version),
            order,
            item_change: None,
            insert_guest: None,
            table_status: None,
        }
    }

    pub fn with_item_change(mut self, change: ItemChange) -> Self {
        self.item_change = Some(change);
        self
    }

    pub fn with_guest(mut self, guest: OrderGuest) -> Self {
        self.insert_guest = Some(guest);
        self
    }

    pub fn with_table_status(mut self, table_id: i64, status: TableStatus) -> Self {
        self.table_status = Some((table_id, status));
        self
    }
}

/// Async persistence gateway for the ordering core
#[async_trait]
pub trait OrderGateway: Send + Sync {
    // ========== Reads ==========

    async fn restaurant(&self, id: i64) -> AppResult<Option<Restaurant>>;

    async fn table(&self, id: i64) -> AppResult<Option<DiningTable>>;

    /// Resolve the opaque QR token printed on the table
    async fn table_by_token(&self, qr_token: &str) -> AppResult<Option<DiningTable>>;

    async fn menu_item(&self, id: i64) -> AppResult<Option<MenuItem>>;

    async fn order(&self, id: &str) -> AppResult<Option<Order>>;

    /// Most recent order for the table whose status is in the active set
    async fn find_active_order_for_table(&self, table_id: i64) -> AppResult<Option<Order>>;

    /// Staff listing; empty filter returns everything for the restaurant
    async fn list_orders(
        &self,
        restaurant_id: i64,
        filter: &ListOrdersFilter,
    ) -> AppResult<Vec<Order>>;

    async fn items_for_order(&self, order_id: &str) -> AppResult<Vec<OrderItem>>;

    async fn item(&self, id: &str) -> AppResult<Option<OrderItem>>;

    async fn guests_for_order(&self, order_id: &str) -> AppResult<Vec<OrderGuest>>;

    async fn guest_by_token(&self, session_token: &str) -> AppResult<Option<OrderGuest>>;

    // ========== Writes ==========

    /// Insert a guest joining an existing order
    async fn insert_guest(&self, guest: OrderGuest) -> AppResult<()>;

    /// Next value of the per-restaurant per-business-day order counter;
    /// crash-safe and monotone within one restaurant-day
    async fn next_order_sequence(&self, restaurant_id: i64, date: NaiveDate) -> AppResult<u32>;

    /// Apply one atomic aggregate write (see module docs for the
    /// version/uniqueness contract)
    async fn commit(&self, commit: OrderCommit) -> AppResult<()>;
}
