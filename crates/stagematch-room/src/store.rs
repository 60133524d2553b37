//! Storage collaborator for rooms and choices.
//!
//! The engine never owns persistence. It talks to whatever implements
//! [`RoomStore`]: a database in production, [`MemoryStore`] in tests and
//! demos. The only hard requirement is that
//! [`save_room_and_choice`](RoomStore::save_room_and_choice) is atomic and
//! refuses to commit over a room that changed since its [`ReadStamp`] was
//! taken.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use stagematch_protocol::{RoomId, UserId};
use tokio::sync::RwLock;

use crate::{Choice, Room, RoomStatus};

/// Errors reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No room with this id.
    #[error("room {0} not found in store")]
    RoomNotFound(RoomId),

    /// A room with this id already exists.
    #[error("room {0} already exists in store")]
    RoomExists(RoomId),

    /// The `(user, room, round)` uniqueness constraint was violated.
    #[error("choice of user {user} for round {round} of room {room_id} already stored")]
    DuplicateChoice {
        user: UserId,
        room_id: RoomId,
        round: u32,
    },

    /// The room or its round changed between read and commit.
    #[error("room {0} changed since it was read")]
    Conflict(RoomId),

    /// Anything else the backend can fail with (connection lost, timeout).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// What a decision was based on: the room's progress and how many choices
/// its current round held when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStamp {
    pub round: u32,
    pub stage: i32,
    pub status: RoomStatus,
    pub choices: usize,
}

impl ReadStamp {
    /// Stamps `room` as loaded. Choices from other rounds are not counted.
    pub fn new(room: &Room, round_choices: &[Choice]) -> Self {
        Self {
            round: room.round,
            stage: room.stage,
            status: room.status,
            choices: round_choices.iter().filter(|c| c.round == room.round).count(),
        }
    }
}

/// Loads and saves rooms and their choices.
///
/// Methods return `impl Future + Send` so room actors, which run on the
/// multi-threaded Tokio runtime, can await them. Implementations can still
/// be written with plain `async fn`.
pub trait RoomStore: Send + Sync + 'static {
    /// Persists a freshly created room.
    fn insert_room(&self, room: &Room) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Loads one room.
    ///
    /// # Errors
    /// [`StoreError::RoomNotFound`] if it doesn't exist.
    fn load_room(&self, id: RoomId) -> impl Future<Output = Result<Room, StoreError>> + Send;

    /// Loads every room, ordered by id.
    fn list_rooms(&self) -> impl Future<Output = Result<Vec<Room>, StoreError>> + Send;

    /// Overwrites an existing room (joins, starts).
    fn save_room(&self, room: &Room) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Loads the choices recorded for one round of a room.
    fn load_choices(
        &self,
        room_id: RoomId,
        round: u32,
    ) -> impl Future<Output = Result<Vec<Choice>, StoreError>> + Send;

    /// Overwrites `room` and inserts `choice` as one transaction: either
    /// both are written or neither is.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] if the stored room no longer matches `read`.
    fn save_room_and_choice(
        &self,
        read: ReadStamp,
        room: &Room,
        choice: &Choice,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Shared stores are stores too, so callers can keep a handle for
/// inspection while the engine owns another.
impl<S: RoomStore> RoomStore for Arc<S> {
    fn insert_room(&self, room: &Room) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert_room(room)
    }

    fn load_room(&self, id: RoomId) -> impl Future<Output = Result<Room, StoreError>> + Send {
        (**self).load_room(id)
    }

    fn list_rooms(&self) -> impl Future<Output = Result<Vec<Room>, StoreError>> + Send {
        (**self).list_rooms()
    }

    fn save_room(&self, room: &Room) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).save_room(room)
    }

    fn load_choices(
        &self,
        room_id: RoomId,
        round: u32,
    ) -> impl Future<Output = Result<Vec<Choice>, StoreError>> + Send {
        (**self).load_choices(room_id, round)
    }

    fn save_room_and_choice(
        &self,
        read: ReadStamp,
        room: &Room,
        choice: &Choice,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).save_room_and_choice(read, room, choice)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Tables {
    rooms: HashMap<RoomId, Room>,
    /// Choices keyed by `(room, round)`.
    choices: HashMap<(RoomId, u32), Vec<Choice>>,
}

/// An in-process [`RoomStore`].
///
/// A single `RwLock` guards both tables, which is what makes
/// `save_room_and_choice` a transaction: every check and both writes happen
/// under one write guard.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of choices stored for a room, across all rounds.
    pub async fn choice_count(&self, room_id: RoomId) -> usize {
        let tables = self.tables.read().await;
        tables
            .choices
            .iter()
            .filter(|((rid, _), _)| *rid == room_id)
            .map(|(_, choices)| choices.len())
            .sum()
    }
}

impl RoomStore for MemoryStore {
    async fn insert_room(&self, room: &Room) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.rooms.contains_key(&room.id) {
            return Err(StoreError::RoomExists(room.id));
        }
        tables.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn load_room(&self, id: RoomId) -> Result<Room, StoreError> {
        let tables = self.tables.read().await;
        tables.rooms.get(&id).cloned().ok_or(StoreError::RoomNotFound(id))
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let tables = self.tables.read().await;
        let mut rooms: Vec<Room> = tables.rooms.values().cloned().collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn save_room(&self, room: &Room) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .rooms
            .get_mut(&room.id)
            .ok_or(StoreError::RoomNotFound(room.id))?;
        *slot = room.clone();
        Ok(())
    }

    async fn load_choices(&self, room_id: RoomId, round: u32) -> Result<Vec<Choice>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices
            .get(&(room_id, round))
            .cloned()
            .unwrap_or_default())
    }

    async fn save_room_and_choice(
        &self,
        read: ReadStamp,
        room: &Room,
        choice: &Choice,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        let Some(stored) = tables.rooms.get(&room.id) else {
            return Err(StoreError::RoomNotFound(room.id));
        };
        let stored_choices = tables
            .choices
            .get(&(room.id, stored.round))
            .map_or(&[][..], Vec::as_slice);
        let current = ReadStamp::new(stored, stored_choices);

        if choice.room_id != room.id {
            return Err(StoreError::Backend(format!(
                "choice for room {} saved with room {}",
                choice.room_id, room.id
            )));
        }
        let key = (choice.room_id, choice.round);
        let duplicate = tables
            .choices
            .get(&key)
            .is_some_and(|existing| existing.iter().any(|c| c.user_id == choice.user_id));
        if duplicate {
            return Err(StoreError::DuplicateChoice {
                user: choice.user_id,
                room_id: choice.room_id,
                round: choice.round,
            });
        }
        if current != read {
            return Err(StoreError::Conflict(room.id));
        }

        tables.rooms.insert(room.id, room.clone());
        tables.choices.entry(key).or_default().push(*choice);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoomConfig, RoomStatus};

    fn room(id: u64) -> Room {
        Room::new(RoomId(id), None, &RoomConfig::default())
    }

    fn choice(user: u64, round: u32) -> Choice {
        Choice {
            user_id: UserId(user),
            room_id: RoomId(1),
            value: 5,
            round,
        }
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let store = MemoryStore::new();
        store.insert_room(&room(1)).await.unwrap();
        assert_eq!(store.load_room(RoomId(1)).await.unwrap(), room(1));
        assert!(matches!(
            store.load_room(RoomId(2)).await,
            Err(StoreError::RoomNotFound(RoomId(2)))
        ));
    }

    #[tokio::test]
    async fn test_insert_twice_fails() {
        let store = MemoryStore::new();
        store.insert_room(&room(1)).await.unwrap();
        assert!(matches!(
            store.insert_room(&room(1)).await,
            Err(StoreError::RoomExists(_))
        ));
    }

    #[tokio::test]
    async fn test_list_rooms_sorted() {
        let store = MemoryStore::new();
        store.insert_room(&room(3)).await.unwrap();
        store.insert_room(&room(1)).await.unwrap();
        let ids: Vec<RoomId> = store.list_rooms().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RoomId(1), RoomId(3)]);
    }

    #[tokio::test]
    async fn test_save_room_requires_existing() {
        let store = MemoryStore::new();
        assert!(store.save_room(&room(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_save_room_and_choice_writes_both() {
        let store = MemoryStore::new();
        store.insert_room(&room(1)).await.unwrap();

        let mut updated = room(1);
        updated.status = RoomStatus::Started;
        let read = ReadStamp::new(&room(1), &[]);
        store.save_room_and_choice(read, &updated, &choice(7, 1)).await.unwrap();

        assert_eq!(store.load_room(RoomId(1)).await.unwrap().status, RoomStatus::Started);
        assert_eq!(store.load_choices(RoomId(1), 1).await.unwrap(), vec![choice(7, 1)]);
        assert!(store.load_choices(RoomId(1), 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_choice_writes_nothing() {
        let store = MemoryStore::new();
        store.insert_room(&room(1)).await.unwrap();
        let read = ReadStamp::new(&room(1), &[]);
        store.save_room_and_choice(read, &room(1), &choice(7, 1)).await.unwrap();

        let mut changed = room(1);
        changed.stage = 3;
        let read = ReadStamp::new(&room(1), &[choice(7, 1)]);
        let result = store.save_room_and_choice(read, &changed, &choice(7, 1)).await;

        assert!(matches!(result, Err(StoreError::DuplicateChoice { round: 1, .. })));
        assert_eq!(store.load_room(RoomId(1)).await.unwrap().stage, 10);
        assert_eq!(store.choice_count(RoomId(1)).await, 1);
    }

    #[tokio::test]
    async fn test_same_user_may_choose_in_next_round() {
        let store = MemoryStore::new();
        store.insert_room(&room(1)).await.unwrap();
        let mut next = room(1);
        next.round = 2;
        store
            .save_room_and_choice(ReadStamp::new(&room(1), &[]), &next, &choice(7, 1))
            .await
            .unwrap();
        store
            .save_room_and_choice(ReadStamp::new(&next, &[]), &next, &choice(7, 2))
            .await
            .unwrap();
        assert_eq!(store.choice_count(RoomId(1)).await, 2);
    }

    #[tokio::test]
    async fn test_stale_read_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_room(&room(1)).await.unwrap();

        // Two writers both read the room before either committed.
        let stale = ReadStamp::new(&room(1), &[]);
        store.save_room_and_choice(stale, &room(1), &choice(7, 1)).await.unwrap();
        let result = store.save_room_and_choice(stale, &room(1), &choice(8, 1)).await;

        assert!(matches!(result, Err(StoreError::Conflict(RoomId(1)))));
        assert_eq!(store.choice_count(RoomId(1)).await, 1);
    }

    #[test]
    fn test_read_stamp_counts_current_round_only() {
        let mut room = room(1);
        room.round = 2;
        let stamp = ReadStamp::new(&room, &[choice(7, 1), choice(8, 2)]);
        assert_eq!(stamp.choices, 1);
        assert_eq!(stamp.round, 2);
    }
}
