//! Room configuration and lifecycle state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Rules and limits applied to every room a manager creates.
///
/// The defaults are the classic game: stage starts at 10 and the game ends
/// as soon as it leaves `0..=20`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Stage value of a freshly created room.
    pub initial_stage: i32,

    /// Lowest stage that keeps the game running (inclusive).
    pub min_stage: i32,

    /// Highest stage that keeps the game running (inclusive).
    pub max_stage: i32,

    /// Start the room as soon as the last seat is taken instead of waiting
    /// for an explicit start request.
    pub auto_start: bool,

    /// Bound of each room actor's command queue.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            initial_stage: 10,
            min_stage: 0,
            max_stage: 20,
            auto_start: false,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered and never go backwards:
///
/// ```text
/// Joining → Started → Done
/// ```
///
/// - **Joining**: zero or one participant, seats still open.
/// - **Started**: both seats taken, choices are accepted round by round.
/// - **Done**: the stage left its bounds. Terminal and read-only.
///
/// Serialized in lowercase (`"joining"`) to match what viewers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Joining,
    Started,
    Done,
}

impl RoomStatus {
    /// Returns `true` if the room is still accepting participants.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Joining)
    }

    /// Returns `true` if the room accepts choices.
    pub fn accepts_choices(&self) -> bool {
        matches!(self, Self::Started)
    }

    /// Returns `true` once the game is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the only status this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Joining => Some(Self::Started),
            Self::Started => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns `true` if moving to `target` respects the ordering.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joining => write!(f, "Joining"),
            Self::Started => write!(f, "Started"),
            Self::Done => write!(f, "Done"),
        }
    }
}
