//! Publish collaborator: where snapshots go after a mutation.
//!
//! Room actors call [`Publisher::publish`] right after a store commit and
//! before taking their next command, so per-room publish order always
//! matches mutation order. Delivery to viewers (SSE, WebSocket, log) is
//! the publisher's business.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stagematch_protocol::RoomId;
use tokio::sync::{broadcast, mpsc};

use crate::RoomSnapshot;

/// Receives every snapshot the engine produces.
///
/// Fire-and-forget: `publish` must not block and cannot fail the mutation
/// that produced the snapshot.
pub trait Publisher: Send + Sync + 'static {
    fn publish(&self, snapshot: RoomSnapshot);
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    fn publish(&self, snapshot: RoomSnapshot) {
        (**self).publish(snapshot);
    }
}

/// A plain channel works as a publisher. Snapshots published after the
/// receiver is dropped are discarded.
impl Publisher for mpsc::UnboundedSender<RoomSnapshot> {
    fn publish(&self, snapshot: RoomSnapshot) {
        let _ = self.send(snapshot);
    }
}

// ---------------------------------------------------------------------------
// SnapshotHub
// ---------------------------------------------------------------------------

/// Default number of snapshots a slow subscriber may fall behind by before
/// it starts missing some.
pub const DEFAULT_HUB_CAPACITY: usize = 256;

/// Fan-out publisher with replay-on-connect.
///
/// Keeps the latest snapshot of every room and forwards each new one to all
/// live subscribers over a `broadcast` channel. A new subscriber first gets
/// the cached snapshots, then the live stream, with no gap and no duplicate
/// between the two.
#[derive(Debug)]
pub struct SnapshotHub {
    /// Latest snapshot per room. Also serializes `publish` against
    /// `subscribe`.
    latest: Mutex<HashMap<RoomId, RoomSnapshot>>,
    sender: broadcast::Sender<RoomSnapshot>,
}

/// A viewer's view of the hub.
#[derive(Debug)]
pub struct Subscription {
    /// Latest snapshot of every room at subscribe time, ordered by room id.
    pub replay: Vec<RoomSnapshot>,
    /// Every snapshot published after subscribe time.
    pub receiver: broadcast::Receiver<RoomSnapshot>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HUB_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: Mutex::new(HashMap::new()),
            sender,
        }
    }

    /// Subscribes to all rooms.
    pub fn subscribe(&self) -> Subscription {
        let latest = self.lock();
        // Subscribing while holding the lock means every snapshot is either
        // already in `latest` or will arrive on `receiver`, never both.
        let receiver = self.sender.subscribe();
        let mut replay: Vec<RoomSnapshot> = latest.values().cloned().collect();
        replay.sort_by_key(|s| s.id);
        Subscription { replay, receiver }
    }

    /// The latest snapshot of one room, if any was published.
    pub fn latest(&self, room_id: RoomId) -> Option<RoomSnapshot> {
        self.lock().get(&room_id).cloned()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RoomId, RoomSnapshot>> {
        // The map is only ever replaced entry-by-entry, so a panic while
        // holding the lock cannot leave it half-written.
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for SnapshotHub {
    fn publish(&self, snapshot: RoomSnapshot) {
        let mut latest = self.lock();
        latest.insert(snapshot.id, snapshot.clone());
        // No subscribers is not an error; the snapshot is still cached.
        let _ = self.sender.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use stagematch_protocol::UserId;

    use super::*;
    use crate::{Room, RoomConfig};

    fn snapshot(room: u64, stage: i32) -> RoomSnapshot {
        let mut room = Room::new(RoomId(room), None, &RoomConfig::default());
        room.stage = stage;
        room.participants.insert(UserId(1));
        RoomSnapshot::new(&room, &[], None)
    }

    #[test]
    fn test_new_subscriber_replays_latest_per_room() {
        let hub = SnapshotHub::new();
        hub.publish(snapshot(2, 10));
        hub.publish(snapshot(1, 10));
        hub.publish(snapshot(1, 11));

        let sub = hub.subscribe();
        let stages: Vec<(RoomId, i32)> = sub.replay.iter().map(|s| (s.id, s.stage)).collect();
        assert_eq!(stages, vec![(RoomId(1), 11), (RoomId(2), 10)]);
    }

    #[test]
    fn test_live_stream_after_subscribe() {
        let hub = SnapshotHub::new();
        hub.publish(snapshot(1, 10));
        let mut sub = hub.subscribe();

        hub.publish(snapshot(1, 9));
        hub.publish(snapshot(1, 8));

        assert_eq!(sub.receiver.try_recv().unwrap().stage, 9);
        assert_eq!(sub.receiver.try_recv().unwrap().stage, 8);
        assert!(sub.receiver.try_recv().is_err());
        assert_eq!(hub.latest(RoomId(1)).unwrap().stage, 8);
    }

    #[test]
    fn test_publish_without_subscribers_is_cached() {
        let hub = SnapshotHub::new();
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(snapshot(5, 3));
        assert_eq!(hub.latest(RoomId(5)).unwrap().stage, 3);
        assert!(hub.latest(RoomId(6)).is_none());
    }

    #[test]
    fn test_channel_publisher() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.publish(snapshot(1, 4));
        assert_eq!(rx.try_recv().unwrap().stage, 4);
    }
}
