//! Guest registry - per-device capability tokens
//!
//! A guest is one device participating in a shared order, not a customer
//! identity. Its session token is a 128-bit random capability standing in
//! for login credentials; it stays valid exactly as long as the bound
//! order remains in the active status set. Validation failures are
//! deliberately uniform so "never existed" and "expired" cannot be told
//! apart by probing.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use shared::models::{Order, OrderGuest};
use shared::{AppError, AppResult};

use crate::gateway::OrderGateway;

/// Bytes of entropy per session token (hex-encoded to 32 chars)
const TOKEN_BYTES: usize = 16;

/// A validated guest session
#[derive(Debug, Clone)]
pub struct GuestSession {
    pub guest: OrderGuest,
    pub order: Order,
}

/// Guest registry
pub struct GuestRegistry {
    gateway: Arc<dyn OrderGateway>,
}

impl GuestRegistry {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    /// Mint a cryptographically random session token
    pub fn mint_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Build a guest row for an order, assigning "Guest N" when no name
    /// was requested
    ///
    /// N is the current guest count plus one; callers serialize per table
    /// (the session manager holds the table lock), so the count cannot
    /// race within this core.
    pub async fn build_guest(
        &self,
        order_id: &str,
        requested_name: Option<String>,
        device_info: Option<String>,
    ) -> AppResult<OrderGuest> {
        let name = match requested_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                let existing = self.gateway.guests_for_order(order_id).await?;
                format!("Guest {}", existing.len() + 1)
            }
        };

        Ok(OrderGuest {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            name,
            session_token: Self::mint_token(),
            device_info,
            joined_at: Utc::now(),
        })
    }

    /// Resolve a session token
    ///
    /// Succeeds only while the bound order is still active. Every failure
    /// collapses into the same Session error.
    pub async fn validate(&self, session_token: &str) -> AppResult<GuestSession> {
        if session_token.is_empty() {
            return Err(AppError::session());
        }

        let guest = self
            .gateway
            .guest_by_token(session_token)
            .await?
            .ok_or_else(AppError::session)?;

        let order = self
            .gateway
            .order(&guest.order_id)
            .await?
            .ok_or_else(AppError::session)?;
        if !order.status.is_active() {
            return Err(AppError::session());
        }

        Ok(GuestSession { guest, order })
    }
}

impl std::fmt::Debug for GuestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestRegistry").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::gateway::OrderCommit;
    use shared::models::{DiningTable, OrderStatus, TableStatus};
    use std::collections::HashSet;

    #[test]
    fn tokens_are_long_and_unique() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let token = GuestRegistry::mint_token();
            assert_eq!(token.len(), TOKEN_BYTES * 2);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(seen.insert(token));
        }
    }

    async fn seeded_registry() -> (Arc<MemoryGateway>, GuestRegistry, Order) {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed_table(DiningTable {
            id: 1,
            restaurant_id: 1,
            name: "T1".into(),
            capacity: 4,
            qr_token: "tok-1".into(),
            status: TableStatus::Available,
        });
        let order = Order::new("o-1".to_string(), "ORD-1".to_string(), 1, 1);
        gateway
            .commit(OrderCommit {
                expected_version: None,
                order: order.clone(),
                item_change: None,
                insert_guest: None,
                table_status: None,
            })
            .await
            .unwrap();
        let registry = GuestRegistry::new(gateway.clone());
        (gateway, registry, order)
    }

    #[tokio::test]
    async fn auto_names_count_up() {
        let (gateway, registry, order) = seeded_registry().await;

        let first = registry.build_guest(&order.id, None, None).await.unwrap();
        assert_eq!(first.name, "Guest 1");
        gateway.insert_guest(first).await.unwrap();

        let second = registry
            .build_guest(&order.id, Some("  ".into()), None)
            .await
            .unwrap();
        assert_eq!(second.name, "Guest 2");
        gateway.insert_guest(second).await.unwrap();

        let named = registry
            .build_guest(&order.id, Some("Dana".into()), None)
            .await
            .unwrap();
        assert_eq!(named.name, "Dana");
    }

    #[tokio::test]
    async fn validate_is_uniform_on_failure() {
        let (gateway, registry, order) = seeded_registry().await;
        let guest = registry.build_guest(&order.id, None, None).await.unwrap();
        let token = guest.session_token.clone();
        gateway.insert_guest(guest).await.unwrap();

        // Valid while the order is active
        assert!(registry.validate(&token).await.is_ok());

        // Unknown token fails the same way as an expired one
        let unknown = registry.validate("deadbeef").await.unwrap_err();

        let mut done = gateway.order(&order.id).await.unwrap().unwrap();
        done.status = OrderStatus::Completed;
        done.version += 1;
        gateway
            .commit(OrderCommit::update(done, 0))
            .await
            .unwrap();
        let expired = registry.validate(&token).await.unwrap_err();

        assert_eq!(unknown.to_string(), expired.to_string());
        assert_eq!(unknown.kind(), shared::ErrorKind::Session);
        assert_eq!(expired.kind(), shared::ErrorKind::Session);
    }
}
