//! Room actor: the single writer for one room.
//!
//! Each room runs in its own Tokio task and takes commands one at a time
//! from an mpsc channel. A command's whole read → decide → write → publish
//! sequence finishes before the next command is received, which is what
//! keeps two near-simultaneous submissions from both seeing an empty round.

use std::sync::Arc;

use stagematch_protocol::{RoomId, UserId};
use tokio::sync::{mpsc, oneshot};

use crate::{
    Choice, Outcome, Publisher, ReadStamp, Room, RoomConfig, RoomError, RoomSnapshot, RoomStore,
    RoundResolver, RoundSummary, Submission,
};

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to a room actor through its channel.
///
/// The `reply` in each variant is a oneshot "reply channel": the caller
/// sends the command and awaits the answer there.
pub(crate) enum RoomCommand {
    /// Seat a user.
    Join { user: UserId, reply: Reply<RoomSnapshot> },

    /// Move the room from `Joining` to `Started`.
    Start { reply: Reply<RoomSnapshot> },

    /// Record a guess for the current round.
    Submit {
        submission: Submission,
        reply: Reply<Outcome>,
    },

    /// Read the current snapshot.
    Snapshot { reply: Reply<RoomSnapshot> },

    /// Stop the actor. `done` fires once it has stopped taking commands.
    Shutdown { done: oneshot::Sender<()> },
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` and an id. The `RoomManager`
/// keeps one per room and hands out clones.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Join { user, .. } => write!(f, "Join({user})"),
            Self::Start { .. } => write!(f, "Start"),
            Self::Submit { submission, .. } => write!(f, "Submit({})", submission.user_id),
            Self::Snapshot { .. } => write!(f, "Snapshot"),
            Self::Shutdown { .. } => write!(f, "Shutdown"),
        }
    }
}

impl RoomHandle {
    /// Returns the room's id.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats `user` and returns the resulting snapshot.
    pub async fn join(&self, user: UserId) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Join { user, reply }).await
    }

    /// Starts the game.
    pub async fn start(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Start { reply }).await
    }

    /// Submits a guess and waits for its outcome.
    pub async fn submit(&self, submission: Submission) -> Result<Outcome, RoomError> {
        self.request(|reply| RoomCommand::Submit { submission, reply })
            .await
    }

    /// Returns the room's current snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    /// Tells the actor to stop and waits until it has. Commands queued
    /// before the shutdown are finished first; later ones fail with
    /// [`RoomError::Unavailable`].
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Shutdown { done: done_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        // A dropped `done` means the actor is gone, which is just as final.
        let _ = done_rx.await;
        Ok(())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }
}

/// The actor itself. Owns nothing persistent: every command reloads the
/// room from the store, so the store stays the source of truth.
struct RoomActor<S: RoomStore, P: Publisher> {
    room_id: RoomId,
    store: Arc<S>,
    publisher: Arc<P>,
    config: RoomConfig,
    resolver: RoundResolver,
    /// Summary of the last round this actor resolved.
    last_round: Option<RoundSummary>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<S: RoomStore, P: Publisher> RoomActor<S, P> {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { user, reply } => {
                    let result = self.handle_join(user).await;
                    self.log_rejection("join", &result);
                    let _ = reply.send(result);
                }
                RoomCommand::Start { reply } => {
                    let result = self.handle_start().await;
                    self.log_rejection("start", &result);
                    let _ = reply.send(result);
                }
                RoomCommand::Submit { submission, reply } => {
                    let result = self.handle_submit(submission).await;
                    self.log_rejection("submit", &result);
                    let _ = reply.send(result);
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.current_snapshot().await);
                }
                RoomCommand::Shutdown { done } => {
                    self.receiver.close();
                    tracing::info!(room_id = %self.room_id, "room actor stopped");
                    let _ = done.send(());
                    return;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    async fn handle_join(&mut self, user: UserId) -> Result<RoomSnapshot, RoomError> {
        let mut room = self.store.load_room(self.room_id).await?;
        room.join(user)?;
        tracing::info!(
            room_id = %self.room_id,
            %user,
            participants = room.participants.len(),
            "user joined"
        );

        if self.config.auto_start && room.may_start() {
            room.start()?;
            tracing::info!(room_id = %self.room_id, "room started automatically");
        }

        self.store.save_room(&room).await?;
        Ok(self.publish(&room, &[]))
    }

    async fn handle_start(&mut self) -> Result<RoomSnapshot, RoomError> {
        let mut room = self.store.load_room(self.room_id).await?;
        room.start()?;
        self.store.save_room(&room).await?;
        tracing::info!(room_id = %self.room_id, stage = room.stage, "room started");
        Ok(self.publish(&room, &[]))
    }

    async fn handle_submit(&mut self, submission: Submission) -> Result<Outcome, RoomError> {
        let room = self.store.load_room(self.room_id).await?;
        let mut choices = self.store.load_choices(room.id, room.round).await?;
        let read = ReadStamp::new(&room, &choices);

        let resolution = self.resolver.resolve(&room, &choices, &submission)?;
        self.store
            .save_room_and_choice(read, &resolution.room, &resolution.choice)
            .await?;

        // Committed. From here on nothing can fail the submission.
        match &resolution.outcome {
            Outcome::Pending { choice } => {
                tracing::debug!(
                    room_id = %self.room_id,
                    user = %choice.user_id,
                    round = choice.round,
                    "choice recorded, waiting for opponent"
                );
            }
            Outcome::RoundResolved(result) => {
                tracing::info!(
                    room_id = %self.room_id,
                    round = result.round,
                    verdict = ?result.verdict,
                    stage = result.room.stage,
                    "round resolved"
                );
                if result.finished() {
                    tracing::info!(
                        room_id = %self.room_id,
                        stage = result.room.stage,
                        "game finished"
                    );
                }
                self.last_round = Some(RoundSummary::from(result));
            }
        }

        choices.push(resolution.choice);
        self.publish(&resolution.room, &choices);
        Ok(resolution.outcome)
    }

    async fn current_snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let room = self.store.load_room(self.room_id).await?;
        let choices = self.store.load_choices(room.id, room.round).await?;
        Ok(RoomSnapshot::new(&room, &choices, self.last_round.clone()))
    }

    /// Builds the snapshot of `room` and hands it to the publisher.
    /// `choices` from rounds other than the room's current one are dropped.
    fn publish(&self, room: &Room, choices: &[Choice]) -> RoomSnapshot {
        let snapshot = RoomSnapshot::new(room, choices, self.last_round.clone());
        self.publisher.publish(snapshot.clone());
        snapshot
    }

    fn log_rejection<T>(&self, command: &str, result: &Result<T, RoomError>) {
        match result {
            Err(err @ RoomError::StorageFailure(_)) => {
                tracing::warn!(room_id = %self.room_id, command, error = %err, "storage failed");
            }
            Err(err) => {
                tracing::debug!(room_id = %self.room_id, command, error = %err, "command rejected");
            }
            Ok(_) => {}
        }
    }
}

/// Spawns a room actor and returns a handle to it.
///
/// `config.channel_size` bounds the command queue: when it fills up,
/// callers wait.
pub(crate) fn spawn_room<S: RoomStore, P: Publisher>(
    room_id: RoomId,
    store: Arc<S>,
    publisher: Arc<P>,
    config: RoomConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = RoomActor {
        room_id,
        store,
        publisher,
        resolver: RoundResolver::new(&config),
        config,
        last_round: None,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
