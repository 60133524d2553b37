//! Unified error type for the Stagematch engine.

use stagematch_protocol::ProtocolError;
use stagematch_room::RoomError;

use crate::AuthError;

/// Top-level error wrapping every layer's error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum StagematchError {
    /// The request bytes could not be decoded, or a response could not be
    /// encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The caller's credential was rejected.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The room refused the operation, or its storage failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl StagematchError {
    /// HTTP-style status code for this error.
    ///
    /// Validation failures are client errors (4xx); storage failures and
    /// stopped actors are server errors (5xx).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Protocol(_) => 400,
            Self::Auth(_) => 401,
            Self::Room(err) => match err {
                RoomError::InvalidChoice(_) => 400,
                RoomError::NotAParticipant(..) => 403,
                RoomError::NotFound(_) => 404,
                RoomError::RoomNotActive(_)
                | RoomError::RoomClosed(_)
                | RoomError::DuplicateChoice { .. }
                | RoomError::RoomFull(_)
                | RoomError::AlreadyJoined(..)
                | RoomError::NotReady(..)
                | RoomError::InvalidTransition { .. } => 409,
                RoomError::StorageFailure(_) => 500,
                RoomError::Unavailable(_) => 503,
            },
        }
    }

    /// Returns `true` for 5xx errors.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}
