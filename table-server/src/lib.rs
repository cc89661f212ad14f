//! Table Server - collaborative table ordering core
//!
//! Several independent guest devices at one physical table converge on
//! exactly one active order, mutate it concurrently without losing
//! updates, and follow it through a kitchen-visible lifecycle, with
//! consistent fan-out to guest and staff rooms.
//!
//! # Module structure
//!
//! ```text
//! table-server/src/
//! ├── config/      # Environment-driven configuration
//! ├── logging/     # Tracing subscriber setup
//! ├── gateway/     # Persistence gateway trait + in-memory implementation
//! ├── locks/       # Per-key async mutual exclusion
//! ├── sessions/    # Table scan: find-or-create the active order
//! ├── guests/      # Guest capability tokens
//! ├── orders/      # Aggregate mutations, totals, status machine
//! ├── broadcast/   # Room fan-out hub
//! ├── billing/     # Per-guest bill split
//! └── service/     # Transport-agnostic operation surface
//! ```

pub mod billing;
pub mod broadcast;
pub mod config;
pub mod gateway;
pub mod guests;
pub mod locks;
pub mod logging;
pub mod orders;
pub mod service;
pub mod sessions;

// Re-export public types
pub use broadcast::BroadcastHub;
pub use config::Config;
pub use gateway::{memory::MemoryGateway, ItemChange, OrderCommit, OrderGateway};
pub use service::OrderSessionService;
