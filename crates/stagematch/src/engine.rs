//! `Engine` builder and typed entry points.
//!
//! The engine ties the room layer to its collaborators: a [`RoomStore`]
//! for persistence and a [`Publisher`] for snapshots. Callers pass user
//! ids that are already authenticated; the [`Gateway`](crate::Gateway)
//! wraps an engine for callers that still hold a raw token and bytes.

use std::sync::Arc;

use stagematch_protocol::{RawChoice, RoomId, UserId};
use stagematch_room::{
    Outcome, Publisher, RoomConfig, RoomHandle, RoomManager, RoomSnapshot, RoomStore, Submission,
};
use tokio::sync::Mutex;

use crate::StagematchError;

/// Builder for configuring an [`Engine`].
///
/// # Example
///
/// ```rust
/// use stagematch::prelude::*;
///
/// # async fn run() -> Result<(), StagematchError> {
/// let engine = EngineBuilder::new()
///     .room_config(RoomConfig { auto_start: true, ..RoomConfig::default() })
///     .build(MemoryStore::new(), SnapshotHub::new());
/// let room = engine.create_room(Some("lobby".into())).await?;
/// engine.join(UserId(1), room.id).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    room_config: RoomConfig,
}

impl EngineBuilder {
    /// Creates a builder with the default game rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rules and limits for every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds the engine around the given collaborators.
    ///
    /// Must be called inside a Tokio runtime: room actors are spawned on
    /// demand.
    pub fn build<S: RoomStore, P: Publisher>(self, store: S, publisher: P) -> Engine<S, P> {
        Engine {
            rooms: Arc::new(Mutex::new(RoomManager::new(store, publisher, self.room_config))),
        }
    }
}

/// The game engine. Cheap to clone; clones share the same rooms.
pub struct Engine<S: RoomStore, P: Publisher> {
    rooms: Arc<Mutex<RoomManager<S, P>>>,
}

impl<S: RoomStore, P: Publisher> Clone for Engine<S, P> {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
        }
    }
}

impl<S: RoomStore, P: Publisher> Engine<S, P> {
    /// Creates an empty room.
    pub async fn create_room(&self, name: Option<String>) -> Result<RoomSnapshot, StagematchError> {
        let snapshot = self.rooms.lock().await.create_room(name).await?;
        Ok(snapshot)
    }

    /// Seats `user` in a room.
    pub async fn join(&self, user: UserId, room_id: RoomId) -> Result<RoomSnapshot, StagematchError> {
        Ok(self.handle(room_id).await?.join(user).await?)
    }

    /// Starts a room whose seats are both taken.
    pub async fn start(&self, room_id: RoomId) -> Result<RoomSnapshot, StagematchError> {
        Ok(self.handle(room_id).await?.start().await?)
    }

    /// Submits `user`'s guess for the room's current round.
    pub async fn submit(
        &self,
        user: UserId,
        room_id: RoomId,
        value: i64,
    ) -> Result<Outcome, StagematchError> {
        let submission = Submission::new(user, room_id, value);
        Ok(self.handle(room_id).await?.submit(submission).await?)
    }

    /// Like [`submit`](Self::submit), for a value that hasn't been checked
    /// yet. Missing and non-integer values fail with `InvalidChoice` before
    /// the room is touched.
    pub async fn submit_raw(
        &self,
        user: UserId,
        room_id: RoomId,
        value: Option<&RawChoice>,
    ) -> Result<Outcome, StagematchError> {
        let submission = Submission::from_raw(user, room_id, value)?;
        Ok(self.handle(room_id).await?.submit(submission).await?)
    }

    /// The current snapshot of a room.
    pub async fn room(&self, room_id: RoomId) -> Result<RoomSnapshot, StagematchError> {
        Ok(self.handle(room_id).await?.snapshot().await?)
    }

    /// Snapshots of every room, ordered by id.
    pub async fn rooms(&self) -> Result<Vec<RoomSnapshot>, StagematchError> {
        let listing = self.rooms.lock().await.listing().await?;
        Ok(listing.snapshots().await?)
    }

    /// Stops a room's actor once the commands already sent to it are done.
    /// Its stored state is kept and a new actor is attached the next time
    /// the room is addressed.
    pub async fn shutdown_room(&self, room_id: RoomId) -> Result<(), StagematchError> {
        Ok(self.rooms.lock().await.shutdown_room(room_id).await?)
    }

    /// Looks up the room's actor. The manager lock is released before the
    /// caller talks to the actor, so slow rooms don't hold up others.
    async fn handle(&self, room_id: RoomId) -> Result<RoomHandle, StagematchError> {
        Ok(self.rooms.lock().await.handle(room_id).await?)
    }
}
