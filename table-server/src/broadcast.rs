//! Broadcast hub - room fan-out for committed mutations
//!
//! One `tokio::sync::broadcast` channel per room, created lazily on first
//! use. Because mutations on one order are serialized, events for that
//! order are published in commit order and the channel preserves it per
//! subscriber. Delivery is best-effort: no acknowledgement, no retry, no
//! persistence of missed events. A subscriber that lags past the channel
//! capacity, or connects late, requests a full snapshot instead of replay.

use dashmap::DashMap;
use shared::{OrderEvent, Room};
use tokio::sync::broadcast;

/// Room fan-out hub
#[derive(Debug)]
pub struct BroadcastHub {
    rooms: DashMap<Room, broadcast::Sender<OrderEvent>>,
    channel_capacity: usize,
}

impl BroadcastHub {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            channel_capacity,
        }
    }

    fn sender(&self, room: &Room) -> broadcast::Sender<OrderEvent> {
        self.rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .clone()
    }

    /// Publish an event to one room, fire-and-forget
    ///
    /// A send error only means the room has no live subscribers; the
    /// underlying mutation is already committed either way.
    pub fn publish(&self, room: &Room, event: OrderEvent) {
        let sender = self.sender(room);
        if sender.send(event).is_err() {
            tracing::debug!(?room, "No subscribers in room, event dropped");
        }
    }

    /// Subscribe to a room's events from this point onward
    pub fn subscribe(&self, room: &Room) -> broadcast::Receiver<OrderEvent> {
        self.sender(room).subscribe()
    }

    /// Drop the channel of a settled room (terminal order)
    pub fn close_room(&self, room: &Room) {
        self.rooms.remove(room);
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
