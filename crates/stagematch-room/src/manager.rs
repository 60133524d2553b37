//! Room manager: creates rooms and routes commands to their actors.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use stagematch_protocol::{RoomId, UserId};

use crate::room::spawn_room;
use crate::{
    Outcome, Publisher, Room, RoomConfig, RoomError, RoomHandle, RoomSnapshot, RoomStore,
    Submission,
};

/// Counter for generating unique room ids.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Tracks one actor per room.
///
/// The store is the source of truth for which rooms exist. Actors are
/// spawned on creation, or lazily the first time a stored room is
/// addressed (rooms created by another process, or before a restart).
pub struct RoomManager<S: RoomStore, P: Publisher> {
    rooms: HashMap<RoomId, RoomHandle>,
    store: Arc<S>,
    publisher: Arc<P>,
    config: RoomConfig,
}

impl<S: RoomStore, P: Publisher> RoomManager<S, P> {
    pub fn new(store: S, publisher: P, config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            store: Arc::new(store),
            publisher: Arc::new(publisher),
            config,
        }
    }

    /// The rules every room of this manager plays by.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates an empty room, persists it, spawns its actor, and publishes
    /// its first snapshot.
    pub async fn create_room(&mut self, name: Option<String>) -> Result<RoomSnapshot, RoomError> {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let room = Room::new(room_id, name, &self.config);
        self.store.insert_room(&room).await?;

        let handle = self.spawn(room_id);
        self.rooms.insert(room_id, handle);

        // No other command can reach the actor before this returns, so this
        // is the first snapshot of the room.
        let snapshot = RoomSnapshot::new(&room, &[], None);
        self.publisher.publish(snapshot.clone());
        tracing::info!(%room_id, "room created");
        Ok(snapshot)
    }

    /// Returns a handle to the room's actor, spawning it if the room exists
    /// in the store but has no actor yet.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the store doesn't know the room.
    pub async fn handle(&mut self, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        if let Some(handle) = self.rooms.get(&room_id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }

        self.store.load_room(room_id).await?;
        let handle = self.spawn(room_id);
        self.rooms.insert(room_id, handle.clone());
        tracing::debug!(%room_id, "room actor attached");
        Ok(handle)
    }

    /// Seats `user` in a room.
    pub async fn join_room(&mut self, user: UserId, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        self.handle(room_id).await?.join(user).await
    }

    /// Starts a room.
    pub async fn start_room(&mut self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        self.handle(room_id).await?.start().await
    }

    /// Routes a submission to its room.
    pub async fn submit(&mut self, submission: Submission) -> Result<Outcome, RoomError> {
        self.handle(submission.room_id).await?.submit(submission).await
    }

    /// Returns the current snapshot of a room.
    pub async fn snapshot(&mut self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        self.handle(room_id).await?.snapshot().await
    }

    /// Every stored room paired with its live actor, if any.
    ///
    /// Only the store is read here. Callers that share the manager behind a
    /// lock can release it before calling [`RoomListing::snapshots`].
    pub async fn listing(&self) -> Result<RoomListing<S>, RoomError> {
        let rooms = self.store.list_rooms().await?;
        let entries = rooms
            .into_iter()
            .map(|room| {
                let handle = self.rooms.get(&room.id).filter(|h| !h.is_closed()).cloned();
                (room.id, handle)
            })
            .collect();
        Ok(RoomListing {
            store: Arc::clone(&self.store),
            entries,
        })
    }

    /// Snapshots of every stored room, ordered by id.
    pub async fn list_rooms(&self) -> Result<Vec<RoomSnapshot>, RoomError> {
        self.listing().await?.snapshots().await
    }

    /// Stops a room's actor and waits for it to exit. The stored room is
    /// untouched; the next command for it attaches a new actor.
    pub async fn shutdown_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "room actor detached");
        Ok(())
    }

    /// Number of rooms with a live actor.
    pub fn active_rooms(&self) -> usize {
        self.rooms.values().filter(|h| !h.is_closed()).count()
    }

    /// Ids of rooms with an attached actor.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    fn spawn(&self, room_id: RoomId) -> RoomHandle {
        spawn_room(
            room_id,
            Arc::clone(&self.store),
            Arc::clone(&self.publisher),
            self.config.clone(),
        )
    }
}

/// The rooms to list, detached from the manager.
pub struct RoomListing<S: RoomStore> {
    store: Arc<S>,
    entries: Vec<(RoomId, Option<RoomHandle>)>,
}

impl<S: RoomStore> RoomListing<S> {
    /// Snapshots in id order.
    ///
    /// Rooms with a live actor answer through it, so their snapshot carries
    /// `last_round`. The rest are read straight from the store; no actor is
    /// spawned for them.
    pub async fn snapshots(self) -> Result<Vec<RoomSnapshot>, RoomError> {
        let mut snapshots = Vec::with_capacity(self.entries.len());
        for (room_id, handle) in self.entries {
            if let Some(handle) = handle {
                match handle.snapshot().await {
                    Ok(snapshot) => {
                        snapshots.push(snapshot);
                        continue;
                    }
                    // Stopped since the listing was taken.
                    Err(RoomError::Unavailable(_)) => {}
                    Err(err) => return Err(err),
                }
            }
            let room = self.store.load_room(room_id).await?;
            let choices = self.store.load_choices(room_id, room.round).await?;
            snapshots.push(RoomSnapshot::new(&room, &choices, None));
        }
        Ok(snapshots)
    }
}
