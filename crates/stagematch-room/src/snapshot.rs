//! The observer-facing view of a room.

use serde::{Deserialize, Serialize};
use stagematch_protocol::{RoomId, UserId};

use crate::{Choice, Room, RoomStatus, RoundResult, Verdict};

/// A guess as viewers see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    pub user_id: UserId,
    pub value: i64,
    pub round: u32,
}

impl From<&Choice> for ChoiceView {
    fn from(choice: &Choice) -> Self {
        Self {
            user_id: choice.user_id,
            value: choice.value,
            round: choice.round,
        }
    }
}

/// The last round this room's actor resolved.
///
/// Kept in memory only: it survives as long as the actor does and is not
/// reconstructed from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub verdict: Verdict,
    pub choices: Vec<ChoiceView>,
}

impl From<&RoundResult> for RoundSummary {
    fn from(result: &RoundResult) -> Self {
        Self {
            round: result.round,
            verdict: result.verdict,
            choices: result.choices.iter().map(ChoiceView::from).collect(),
        }
    }
}

/// The serialized state of a room pushed to observers after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: Option<String>,
    pub status: RoomStatus,
    pub stage: i32,
    pub round: u32,
    pub participants: Vec<UserId>,
    /// Guesses recorded for `round`.
    pub choices: Vec<ChoiceView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_round: Option<RoundSummary>,
}

impl RoomSnapshot {
    /// Builds a snapshot of `room`. Choices from rounds other than the
    /// room's current one are left out.
    pub fn new(room: &Room, choices: &[Choice], last_round: Option<RoundSummary>) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            status: room.status,
            stage: room.stage,
            round: room.round,
            participants: room.participants.iter().copied().collect(),
            choices: choices
                .iter()
                .filter(|c| c.round == room.round)
                .map(ChoiceView::from)
                .collect(),
            last_round,
        }
    }
}
