//! Error types for the room layer.

use stagematch_protocol::{RoomId, UserId};

use crate::{RoomStatus, StoreError};

/// Errors that can occur during room operations.
///
/// Every variant except `StorageFailure` and `Unavailable` is a validation
/// failure: it is detected before anything is written, so the room is
/// exactly as it was before the request.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room exists but is not in play (still gathering participants).
    #[error("room {0} is not accepting choices")]
    RoomNotActive(RoomId),

    /// The game in this room is over.
    #[error("room {0} is closed")]
    RoomClosed(RoomId),

    /// The user holds no seat in this room.
    #[error("user {0} is not a participant of room {1}")]
    NotAParticipant(UserId, RoomId),

    /// The user already chose for this round.
    #[error("user {user} already chose in round {round} of room {room_id}")]
    DuplicateChoice {
        user: UserId,
        room_id: RoomId,
        round: u32,
    },

    /// The submitted value is missing or not an integer.
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// Both seats are taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The user already holds a seat in this room.
    #[error("user {0} already in room {1}")]
    AlreadyJoined(UserId, RoomId),

    /// The room cannot start yet; the count is how many seats are taken.
    #[error("room {0} cannot start with {1} participant(s)")]
    NotReady(RoomId, usize),

    /// The requested status change breaks `Joining → Started → Done`.
    #[error("room {room_id} cannot move from {from} to {to}")]
    InvalidTransition {
        room_id: RoomId,
        from: RoomStatus,
        to: RoomStatus,
    },

    /// The storage collaborator failed. Nothing was applied.
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),

    /// The room's actor stopped or its command queue is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

/// Lets `?` lift store errors: a missing row is a plain `NotFound`, a
/// uniqueness violation is a `DuplicateChoice`, anything else is a
/// storage failure.
impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(room_id) => Self::NotFound(room_id),
            StoreError::DuplicateChoice {
                user,
                room_id,
                round,
            } => Self::DuplicateChoice {
                user,
                room_id,
                round,
            },
            other => Self::StorageFailure(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_becomes_not_found() {
        let err: RoomError = StoreError::RoomNotFound(RoomId(4)).into();
        assert!(matches!(err, RoomError::NotFound(RoomId(4))));
    }

    #[test]
    fn test_store_backend_becomes_storage_failure() {
        let err: RoomError = StoreError::Backend("disk on fire".into()).into();
        assert!(matches!(err, RoomError::StorageFailure(_)));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_duplicate_choice_message() {
        let err = RoomError::DuplicateChoice {
            user: UserId(1),
            room_id: RoomId(2),
            round: 3,
        };
        assert_eq!(err.to_string(), "user U-1 already chose in round 3 of room R-2");
    }
}
