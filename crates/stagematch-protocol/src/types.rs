//! Core protocol types: identities and client requests.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user, already resolved from their credential.
///
/// Newtype over `u64` so a `UserId` can never be passed where a `RoomId`
/// is expected. `#[serde(transparent)]` keeps it a bare number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a room (one two-player game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RawChoice: a guess as the client sent it
// ---------------------------------------------------------------------------

/// A choice value exactly as it arrived, before integer validation.
///
/// Clients are loose about types: some send `3`, some send `"3"`. The
/// protocol accepts any scalar here and leaves the decision to
/// [`RawChoice::as_integer`], so a bad value becomes an `InvalidChoice`
/// rejection from the room layer rather than an opaque decode error.
///
/// `#[serde(untagged)]` tries each variant in order, so `4` lands in
/// `Integer`, `4.5` in `Float`, `"4"` in `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChoice {
    Integer(i64),
    Float(f64),
    Text(String),
    Flag(bool),
}

impl RawChoice {
    /// Returns the value as an integer guess, or `None` if it isn't one.
    ///
    /// Integers pass through. Strings holding a base-10 integer (surrounding
    /// whitespace allowed) are parsed. Floats, booleans, and anything else
    /// are rejected, including floats with no fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Float(_) | Self::Flag(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientRequest
// ---------------------------------------------------------------------------

/// Everything a client can ask the engine to do.
///
/// The caller's identity is NOT part of the request: it comes from the
/// bearer token, resolved by the authenticator before dispatch.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "SubmitChoice", "room_id": 1, "value": 3 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Create an empty room in `Joining` state.
    CreateRoom {
        #[serde(default)]
        name: Option<String>,
    },

    /// Take one of the two participant seats.
    JoinRoom { room_id: RoomId },

    /// Move a full room from `Joining` to `Started`.
    StartRoom { room_id: RoomId },

    /// Submit a guess for the room's current round.
    ///
    /// `value` is optional on the wire so that a missing guess is reported
    /// as an invalid choice instead of a malformed request.
    SubmitChoice {
        room_id: RoomId,
        #[serde(default)]
        value: Option<RawChoice>,
    },

    /// Fetch the current snapshot of one room.
    GetRoom { room_id: RoomId },

    /// Fetch snapshots of every known room.
    ListRooms,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_with_prefix() {
        assert_eq!(UserId(42).to_string(), "U-42");
        assert_eq!(RoomId(7).to_string(), "R-7");
    }

    #[test]
    fn test_raw_integer_passes_through() {
        assert_eq!(RawChoice::Integer(-3).as_integer(), Some(-3));
    }

    #[test]
    fn test_raw_text_is_parsed() {
        assert_eq!(RawChoice::Text(" 12 ".into()).as_integer(), Some(12));
        assert_eq!(RawChoice::Text("-4".into()).as_integer(), Some(-4));
    }

    #[test]
    fn test_raw_text_rejects_non_numbers() {
        assert_eq!(RawChoice::Text("three".into()).as_integer(), None);
        assert_eq!(RawChoice::Text("3.5".into()).as_integer(), None);
        assert_eq!(RawChoice::Text(String::new()).as_integer(), None);
    }

    #[test]
    fn test_raw_float_and_bool_rejected() {
        assert_eq!(RawChoice::Float(3.0).as_integer(), None);
        assert_eq!(RawChoice::Float(2.5).as_integer(), None);
        assert_eq!(RawChoice::Flag(true).as_integer(), None);
    }
}
