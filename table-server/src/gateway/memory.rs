//! In-memory gateway implementation
//!
//! Backs tests and in-process embedding. A single `RwLock` over the whole
//! state makes every [`OrderCommit`] trivially atomic; the conditional
//! semantics (active-order uniqueness, version check) are enforced the
//! same way a real store would with a unique index and a version column.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use shared::models::{DiningTable, MenuItem, Order, OrderGuest, OrderItem, Restaurant};
use shared::request::ListOrdersFilter;
use shared::{AppError, AppResult};

use super::{ItemChange, OrderCommit, OrderGateway};

#[derive(Debug, Default)]
struct State {
    restaurants: HashMap<i64, Restaurant>,
    tables: HashMap<i64, DiningTable>,
    menu_items: HashMap<i64, MenuItem>,
    orders: HashMap<String, Order>,
    items: HashMap<String, OrderItem>,
    guests: HashMap<String, OrderGuest>,
    /// (restaurant_id, business day) -> last issued sequence
    sequences: HashMap<(i64, NaiveDate), u32>,
}

/// In-memory [`OrderGateway`]
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: RwLock<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Seeding (catalog/table CRUD is external to the core) ==========

    pub fn seed_restaurant(&self, restaurant: Restaurant) {
        self.state
            .write()
            .restaurants
            .insert(restaurant.id, restaurant);
    }

    pub fn seed_table(&self, table: DiningTable) {
        self.state.write().tables.insert(table.id, table);
    }

    pub fn seed_menu_item(&self, item: MenuItem) {
        self.state.write().menu_items.insert(item.id, item);
    }

    /// Flip menu availability, as the external catalog would
    pub fn set_menu_item_available(&self, id: i64, available: bool) {
        if let Some(item) = self.state.write().menu_items.get_mut(&id) {
            item.is_available = available;
        }
    }

    /// Change a menu price, as the external catalog would; existing order
    /// items keep their snapshot
    pub fn set_menu_item_price(&self, id: i64, price: f64) {
        if let Some(item) = self.state.write().menu_items.get_mut(&id) {
            item.price = price;
        }
    }
}

fn find_active(state: &State, table_id: i64) -> Option<Order> {
    state
        .orders
        .values()
        .filter(|o| o.table_id == table_id && o.status.is_active())
        .max_by_key(|o| o.created_at)
        .cloned()
}

#[async_trait]
impl OrderGateway for MemoryGateway {
    async fn restaurant(&self, id: i64) -> AppResult<Option<Restaurant>> {
        Ok(self.state.read().restaurants.get(&id).cloned())
    }

    async fn table(&self, id: i64) -> AppResult<Option<DiningTable>> {
        Ok(self.state.read().tables.get(&id).cloned())
    }

    async fn table_by_token(&self, qr_token: &str) -> AppResult<Option<DiningTable>> {
        Ok(self
            .state
            .read()
            .tables
            .values()
            .find(|t| t.qr_token == qr_token)
            .cloned())
    }

    async fn menu_item(&self, id: i64) -> AppResult<Option<MenuItem>> {
        Ok(self.state.read().menu_items.get(&id).cloned())
    }

    async fn order(&self, id: &str) -> AppResult<Option<Order>> {
        Ok(self.state.read().orders.get(id).cloned())
    }

    async fn find_active_order_for_table(&self, table_id: i64) -> AppResult<Option<Order>> {
        Ok(find_active(&self.state.read(), table_id))
    }

    async fn list_orders(
        &self,
        restaurant_id: i64,
        filter: &ListOrdersFilter,
    ) -> AppResult<Vec<Order>> {
        let state = self.state.read();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.restaurant_id == restaurant_id)
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.table_id.is_none_or(|t| o.table_id == t))
            .filter(|o| filter.date.is_none_or(|d| o.created_at.date_naive() == d))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn items_for_order(&self, order_id: &str) -> AppResult<Vec<OrderItem>> {
        let state = self.state.read();
        let mut items: Vec<OrderItem> = state
            .items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn item(&self, id: &str) -> AppResult<Option<OrderItem>> {
        Ok(self.state.read().items.get(id).cloned())
    }

    async fn guests_for_order(&self, order_id: &str) -> AppResult<Vec<OrderGuest>> {
        let state = self.state.read();
        let mut guests: Vec<OrderGuest> = state
            .guests
            .values()
            .filter(|g| g.order_id == order_id)
            .cloned()
            .collect();
        guests.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        Ok(guests)
    }

    async fn guest_by_token(&self, session_token: &str) -> AppResult<Option<OrderGuest>> {
        Ok(self
            .state
            .read()
            .guests
            .values()
            .find(|g| g.session_token == session_token)
            .cloned())
    }

    async fn insert_guest(&self, guest: OrderGuest) -> AppResult<()> {
        let mut state = self.state.write();
        if state
            .guests
            .values()
            .any(|g| g.session_token == guest.session_token)
        {
            return Err(AppError::conflict("Session token already exists"));
        }
        state.guests.insert(guest.id.clone(), guest);
        Ok(())
    }

    async fn next_order_sequence(&self, restaurant_id: i64, date: NaiveDate) -> AppResult<u32> {
        let mut state = self.state.write();
        let counter = state.sequences.entry((restaurant_id, date)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn commit(&self, commit: OrderCommit) -> AppResult<()> {
        let mut state = self.state.write();

        match commit.expected_version {
            None => {
                // Insert path: enforce one active order per table
                if state.orders.contains_key(&commit.order.id) {
                    return Err(AppError::conflict("Order already exists"));
                }
                if find_active(&state, commit.order.table_id).is_some() {
                    return Err(AppError::conflict("Table already has an active order"));
                }
            }
            Some(expected) => {
                let current = state
                    .orders
                    .get(&commit.order.id)
                    .ok_or_else(|| AppError::not_found("Order"))?;
                if current.version != expected {
                    return Err(AppError::busy(format!(
                        "Order {} version {} != expected {}",
                        commit.order.id, current.version, expected
                    )));
                }
            }
        }

        if let Some(guest) = &commit.insert_guest {
            if state
                .guests
                .values()
                .any(|g| g.session_token == guest.session_token)
            {
                return Err(AppError::conflict("Session token already exists"));
            }
        }

        // All checks passed; apply everything in one critical section
        state
            .orders
            .insert(commit.order.id.clone(), commit.order.clone());

        match commit.item_change {
            Some(ItemChange::Insert(item)) | Some(ItemChange::Update(item)) => {
                state.items.insert(item.id.clone(), item);
            }
            Some(ItemChange::Remove(item_id)) => {
                state.items.remove(&item_id);
            }
            None => {}
        }

        if let Some(guest) = commit.insert_guest {
            state.guests.insert(guest.id.clone(), guest);
        }

        if let Some((table_id, status)) = commit.table_status {
            if let Some(table) = state.tables.get_mut(&table_id) {
                table.status = status;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderStatus, TableStatus};

    fn table(id: i64) -> DiningTable {
        DiningTable {
            id,
            restaurant_id: 1,
            name: format!("T{}", id),
            capacity: 4,
            qr_token: format!("tok-{}", id),
            status: TableStatus::Available,
        }
    }

    fn order(id: &str, table_id: i64) -> Order {
        Order::new(id.to_string(), format!("ORD-{}", id), 1, table_id)
    }

    fn insert_commit(order: Order) -> OrderCommit {
        OrderCommit {
            expected_version: None,
            order,
            item_change: None,
            insert_guest: None,
            table_status: None,
        }
    }

    #[tokio::test]
    async fn second_active_order_for_table_conflicts() {
        let gw = MemoryGateway::new();
        gw.seed_table(table(1));

        gw.commit(insert_commit(order("o-1", 1))).await.unwrap();
        let err = gw.commit(insert_commit(order("o-2", 1))).await.unwrap_err();
        assert_eq!(err.kind(), shared::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn insert_allowed_after_previous_order_settles() {
        let gw = MemoryGateway::new();
        gw.seed_table(table(1));
        gw.commit(insert_commit(order("o-1", 1))).await.unwrap();

        let mut done = gw.order("o-1").await.unwrap().unwrap();
        done.status = OrderStatus::Completed;
        done.version += 1;
        gw.commit(OrderCommit::update(done, 0)).await.unwrap();

        gw.commit(insert_commit(order("o-2", 1))).await.unwrap();
    }

    #[tokio::test]
    async fn stale_version_is_busy() {
        let gw = MemoryGateway::new();
        gw.seed_table(table(1));
        gw.commit(insert_commit(order("o-1", 1))).await.unwrap();

        let mut a = gw.order("o-1").await.unwrap().unwrap();
        a.version += 1;
        gw.commit(OrderCommit::update(a.clone(), 0)).await.unwrap();

        // Writer that read version 0 loses
        let mut b = order("o-1", 1);
        b.version = 1;
        let err = gw.commit(OrderCommit::update(b, 0)).await.unwrap_err();
        assert_eq!(err.kind(), shared::ErrorKind::ResourceBusy);
    }

    #[tokio::test]
    async fn commit_applies_table_side_effect() {
        let gw = MemoryGateway::new();
        gw.seed_table(table(1));
        let o = order("o-1", 1);
        gw.commit(insert_commit(o.clone()).with_table_status(1, TableStatus::Occupied))
            .await
            .unwrap();
        assert_eq!(
            gw.table(1).await.unwrap().unwrap().status,
            TableStatus::Occupied
        );
    }

    #[tokio::test]
    async fn sequence_is_per_restaurant_day() {
        let gw = MemoryGateway::new();
        let day1 = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        assert_eq!(gw.next_order_sequence(1, day1).await.unwrap(), 1);
        assert_eq!(gw.next_order_sequence(1, day1).await.unwrap(), 2);
        assert_eq!(gw.next_order_sequence(2, day1).await.unwrap(), 1);
        assert_eq!(gw.next_order_sequence(1, day2).await.unwrap(), 1);
    }
}
