//! Domain models for the table ordering core

pub mod dining_table;
pub mod menu_item;
pub mod order;
pub mod restaurant;

pub use dining_table::{DiningTable, TableStatus};
pub use menu_item::MenuItem;
pub use order::{Order, OrderGuest, OrderItem, OrderStatus};
pub use restaurant::Restaurant;
