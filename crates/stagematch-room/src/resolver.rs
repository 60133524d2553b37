//! Round resolution: the game rules.
//!
//! [`RoundResolver`] is pure. Given a room, the choices already stored for
//! its current round, and an incoming submission, it decides whether the
//! submission is valid and what the room looks like afterwards. It never
//! touches storage or publishes anything; the room actor does that with the
//! [`Resolution`] it returns.

use serde::{Deserialize, Serialize};

use crate::{Choice, Room, RoomConfig, RoomError, RoomStatus, Submission};

/// Whether the two guesses of a round were equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Same value: the stage goes up by one.
    Match,
    /// Different values: the stage goes down by one.
    Mismatch,
}

/// A completed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// The room after the round was applied.
    pub room: Room,
    /// The round that was resolved (the room may already be on the next).
    pub round: u32,
    /// Both guesses, the earlier one first.
    pub choices: [Choice; 2],
    pub verdict: Verdict,
}

impl RoundResult {
    /// Returns `true` if this round ended the game.
    pub fn finished(&self) -> bool {
        self.room.status.is_terminal()
    }
}

/// What happened to a valid submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// First guess of the round. Stored; waiting for the other participant.
    Pending { choice: Choice },
    /// Second guess of the round. Both guesses were compared and applied.
    RoundResolved(RoundResult),
}

/// Everything the caller must persist, atomically, to apply a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The room to save. Unchanged for a pending outcome.
    pub room: Room,
    /// The new choice to insert.
    pub choice: Choice,
    pub outcome: Outcome,
}

/// Validates submissions and computes round outcomes.
///
/// Holds only the stage bounds, so it is cheap to clone into every room
/// actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResolver {
    min_stage: i32,
    max_stage: i32,
}

impl RoundResolver {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            min_stage: config.min_stage,
            max_stage: config.max_stage,
        }
    }

    /// Resolves `submission` against `room`.
    ///
    /// `round_choices` are the choices already stored for the room; entries
    /// from other rounds are ignored. Checks run in this order and all of
    /// them happen before anything is computed:
    ///
    /// 1. the room is `Done` → [`RoomError::RoomClosed`]
    /// 2. the room is not `Started` → [`RoomError::RoomNotActive`]
    /// 3. the user has no seat → [`RoomError::NotAParticipant`]
    /// 4. the user already chose this round → [`RoomError::DuplicateChoice`]
    ///
    /// Whichever participant submits second triggers the comparison, so the
    /// result doesn't depend on who went first.
    pub fn resolve(
        &self,
        room: &Room,
        round_choices: &[Choice],
        submission: &Submission,
    ) -> Result<Resolution, RoomError> {
        if submission.room_id != room.id {
            return Err(RoomError::NotFound(submission.room_id));
        }
        if room.status.is_terminal() {
            return Err(RoomError::RoomClosed(room.id));
        }
        if !room.status.accepts_choices() {
            return Err(RoomError::RoomNotActive(room.id));
        }
        let user = submission.user_id;
        if !room.is_participant(user) {
            return Err(RoomError::NotAParticipant(user, room.id));
        }

        let mut current = round_choices.iter().filter(|c| c.round == room.round);
        if current.clone().any(|c| c.user_id == user) {
            return Err(RoomError::DuplicateChoice {
                user,
                room_id: room.id,
                round: room.round,
            });
        }

        let choice = Choice {
            user_id: user,
            room_id: room.id,
            value: submission.value,
            round: room.round,
        };

        let other = room
            .other_participant(user)
            .and_then(|opponent| current.find(|c| c.user_id == opponent));
        let Some(other) = other.copied() else {
            return Ok(Resolution {
                room: room.clone(),
                choice,
                outcome: Outcome::Pending { choice },
            });
        };

        let verdict = if other.value == choice.value {
            Verdict::Match
        } else {
            Verdict::Mismatch
        };
        let next = match verdict {
            Verdict::Match => room.stage + 1,
            Verdict::Mismatch => room.stage - 1,
        };

        let mut updated = room.clone();
        updated.stage = next;
        if (self.min_stage..=self.max_stage).contains(&next) {
            updated.round += 1;
        } else {
            // The out-of-range stage is kept as-is; the round stays on the
            // one that ended the game.
            updated.status = RoomStatus::Done;
        }

        let result = RoundResult {
            room: updated.clone(),
            round: room.round,
            choices: [other, choice],
            verdict,
        };
        Ok(Resolution {
            room: updated,
            choice,
            outcome: Outcome::RoundResolved(result),
        })
    }
}

impl Default for RoundResolver {
    fn default() -> Self {
        Self::new(&RoomConfig::default())
    }
}
