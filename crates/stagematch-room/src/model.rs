//! Rooms, choices, and submissions: the data the engine persists and
//! reasons about.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use stagematch_protocol::{RawChoice, RoomId, UserId};

use crate::{RoomConfig, RoomError, RoomStatus};

/// Seats in a room. The game compares exactly two guesses per round.
pub const SEATS: usize = 2;

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// The authoritative state of one game room.
///
/// `participants` is a `BTreeSet` so snapshots list seats in a stable order;
/// which user joined first has no effect on the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: Option<String>,
    pub status: RoomStatus,
    /// Shared score. Stays within the configured bounds while the game
    /// runs; once `Done` it keeps the out-of-range value that ended it.
    pub stage: i32,
    /// The round currently being played. Never decreases.
    pub round: u32,
    pub participants: BTreeSet<UserId>,
}

impl Room {
    /// Creates an empty room in `Joining` state at round 1.
    pub fn new(id: RoomId, name: Option<String>, config: &RoomConfig) -> Self {
        Self {
            id,
            name,
            status: RoomStatus::Joining,
            stage: config.initial_stage,
            round: 1,
            participants: BTreeSet::new(),
        }
    }

    /// Returns `true` if `user` holds a seat.
    pub fn is_participant(&self, user: UserId) -> bool {
        self.participants.contains(&user)
    }

    /// Returns the participant that isn't `user`, if the other seat is taken.
    pub fn other_participant(&self, user: UserId) -> Option<UserId> {
        self.participants.iter().copied().find(|p| *p != user)
    }

    /// The start guard: both seats are taken.
    pub fn may_start(&self) -> bool {
        self.participants.len() == SEATS
    }

    /// Seats `user`, enforcing capacity and lifecycle.
    ///
    /// # Errors
    /// - [`RoomError::RoomClosed`]: the game is over
    /// - [`RoomError::AlreadyJoined`]: the user already has a seat
    /// - [`RoomError::RoomFull`]: no seat left, or the game already started
    pub fn join(&mut self, user: UserId) -> Result<(), RoomError> {
        if self.status.is_terminal() {
            return Err(RoomError::RoomClosed(self.id));
        }
        if self.is_participant(user) {
            return Err(RoomError::AlreadyJoined(user, self.id));
        }
        if !self.status.is_joinable() || self.participants.len() >= SEATS {
            return Err(RoomError::RoomFull(self.id));
        }
        self.participants.insert(user);
        Ok(())
    }

    /// Moves the room from `Joining` to `Started`.
    ///
    /// # Errors
    /// - [`RoomError::RoomClosed`]: the game is over
    /// - [`RoomError::InvalidTransition`]: the room already started
    /// - [`RoomError::NotReady`]: a seat is still empty
    pub fn start(&mut self) -> Result<(), RoomError> {
        if self.status.is_terminal() {
            return Err(RoomError::RoomClosed(self.id));
        }
        if !self.status.can_transition_to(RoomStatus::Started) {
            return Err(RoomError::InvalidTransition {
                room_id: self.id,
                from: self.status,
                to: RoomStatus::Started,
            });
        }
        if !self.may_start() {
            return Err(RoomError::NotReady(self.id, self.participants.len()));
        }
        self.status = RoomStatus::Started;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// One participant's guess for one round. Written once, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub value: i64,
    pub round: u32,
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A validated request to record a guess. Carries no round: the round is
/// always the room's current one at the moment the submission is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub value: i64,
}

impl Submission {
    pub fn new(user_id: UserId, room_id: RoomId, value: i64) -> Self {
        Self {
            user_id,
            room_id,
            value,
        }
    }

    /// Builds a submission from a raw wire value.
    ///
    /// # Errors
    /// [`RoomError::InvalidChoice`] if the value is missing or not an integer.
    pub fn from_raw(
        user_id: UserId,
        room_id: RoomId,
        raw: Option<&RawChoice>,
    ) -> Result<Self, RoomError> {
        let raw = raw.ok_or_else(|| RoomError::InvalidChoice("missing value".into()))?;
        let value = raw
            .as_integer()
            .ok_or_else(|| RoomError::InvalidChoice(format!("{raw:?} is not an integer")))?;
        Ok(Self::new(user_id, room_id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(RoomId(1), None, &RoomConfig::default())
    }

    #[test]
    fn test_new_room_defaults() {
        let room = room();
        assert_eq!(room.status, RoomStatus::Joining);
        assert_eq!(room.stage, 10);
        assert_eq!(room.round, 1);
        assert!(room.participants.is_empty());
        assert!(!room.may_start());
    }

    #[test]
    fn test_join_until_full() {
        let mut room = room();
        room.join(UserId(1)).unwrap();
        assert!(!room.may_start());
        room.join(UserId(2)).unwrap();
        assert!(room.may_start());

        let err = room.join(UserId(3)).unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
        assert_eq!(room.participants.len(), 2);
    }

    #[test]
    fn test_join_twice_rejected() {
        let mut room = room();
        room.join(UserId(1)).unwrap();
        let err = room.join(UserId(1)).unwrap_err();
        assert!(matches!(err, RoomError::AlreadyJoined(UserId(1), _)));
    }

    #[test]
    fn test_join_done_room_is_closed() {
        let mut room = room();
        room.status = RoomStatus::Done;
        let err = room.join(UserId(1)).unwrap_err();
        assert!(matches!(err, RoomError::RoomClosed(_)));
    }

    #[test]
    fn test_start_requires_both_seats() {
        let mut room = room();
        room.join(UserId(1)).unwrap();
        let err = room.start().unwrap_err();
        assert!(matches!(err, RoomError::NotReady(_, 1)));
        assert_eq!(room.status, RoomStatus::Joining);

        room.join(UserId(2)).unwrap();
        room.start().unwrap();
        assert_eq!(room.status, RoomStatus::Started);
    }

    #[test]
    fn test_start_twice_is_invalid_transition() {
        let mut room = room();
        room.join(UserId(1)).unwrap();
        room.join(UserId(2)).unwrap();
        room.start().unwrap();
        let err = room.start().unwrap_err();
        assert!(matches!(
            err,
            RoomError::InvalidTransition {
                from: RoomStatus::Started,
                ..
            }
        ));
    }

    #[test]
    fn test_other_participant() {
        let mut room = room();
        room.join(UserId(1)).unwrap();
        assert_eq!(room.other_participant(UserId(1)), None);
        room.join(UserId(2)).unwrap();
        assert_eq!(room.other_participant(UserId(1)), Some(UserId(2)));
        assert_eq!(room.other_participant(UserId(2)), Some(UserId(1)));
    }

    #[test]
    fn test_submission_from_raw() {
        let ok = Submission::from_raw(UserId(1), RoomId(1), Some(&RawChoice::Text("7".into())));
        assert_eq!(ok.unwrap().value, 7);

        let missing = Submission::from_raw(UserId(1), RoomId(1), None);
        assert!(matches!(missing, Err(RoomError::InvalidChoice(_))));

        let float = Submission::from_raw(UserId(1), RoomId(1), Some(&RawChoice::Float(1.5)));
        assert!(matches!(float, Err(RoomError::InvalidChoice(_))));
    }
}
