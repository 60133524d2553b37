//! Two bots play one room to the end while a viewer prints every snapshot.
//!
//! Run with `RUST_LOG=stagematch_room=debug cargo run -p duel` to see the
//! room actor's side of things.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use stagematch::prelude::*;
use tokio::sync::broadcast::error::RecvError;

type Bot = Gateway<MemoryStore, Arc<SnapshotHub>, TokenTable>;
type DemoResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const ALICE: (&str, UserId) = ("alice-token", UserId(1));
const BOB: (&str, UserId) = ("bob-token", UserId(2));

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn call(gateway: &Bot, token: &str, request: &ClientRequest) -> DemoResult<Response> {
    let bytes = JsonCodec.encode(request)?;
    let reply = gateway.handle(token, &bytes).await?;
    Ok(JsonCodec.decode(&reply)?)
}

async fn room(gateway: &Bot, token: &str, request: ClientRequest) -> DemoResult<RoomSnapshot> {
    match call(gateway, token, &request).await? {
        Response::Room { room } => Ok(room),
        other => Err(format!("{request:?} failed: {other:?}").into()),
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Guesses 1, 2 or 3 once per round until the room is done.
async fn play(gateway: Arc<Bot>, (token, me): (&'static str, UserId), room_id: RoomId) -> DemoResult<u32> {
    let mut submitted = 0;
    loop {
        let snapshot = room(&gateway, token, ClientRequest::GetRoom { room_id }).await?;
        if snapshot.status.is_terminal() {
            return Ok(submitted);
        }
        if snapshot.choices.iter().any(|c| c.user_id == me) {
            tokio::time::sleep(Duration::from_millis(2)).await;
            continue;
        }

        let value = rand::rng().random_range(1..=3);
        let request = ClientRequest::SubmitChoice {
            room_id,
            value: Some(RawChoice::Integer(value)),
        };
        match call(&gateway, token, &request).await? {
            Response::ChoiceAccepted { .. } => submitted += 1,
            // Lost a race with the round closing or the game ending.
            Response::Error { code: 409, message } => {
                tracing::debug!(user = %me, %message, "choice refused");
            }
            other => return Err(format!("unexpected reply: {other:?}").into()),
        }
    }
}

/// Prints snapshots of `room_id` as JSON until the game is over.
async fn watch(mut subscription: Subscription, room_id: RoomId) -> DemoResult<RoomSnapshot> {
    let mut last = None;
    for snapshot in subscription.replay.drain(..).filter(|s| s.id == room_id) {
        println!("{}", serde_json::to_string(&snapshot)?);
        last = Some(snapshot);
    }
    loop {
        if let Some(snapshot) = last.take() {
            if snapshot.status.is_terminal() {
                return Ok(snapshot);
            }
        }
        let snapshot = match subscription.receiver.recv().await {
            Ok(snapshot) if snapshot.id == room_id => snapshot,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "viewer fell behind");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        println!("{}", serde_json::to_string(&snapshot)?);
        last = Some(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

async fn run_duel() -> DemoResult<RoomSnapshot> {
    let hub = Arc::new(SnapshotHub::new());
    let engine = EngineBuilder::new().build(MemoryStore::new(), Arc::clone(&hub));
    let tokens = TokenTable::new().with(ALICE.0, ALICE.1).with(BOB.0, BOB.1);
    let gateway = Arc::new(Gateway::new(engine, tokens));

    let created = room(&gateway, ALICE.0, ClientRequest::CreateRoom { name: Some("duel".into()) }).await?;
    let room_id = created.id;
    tracing::info!(%room_id, "room created");

    // Subscribe before anyone joins so the viewer sees every change.
    let viewer = tokio::spawn(watch(hub.subscribe(), room_id));

    room(&gateway, ALICE.0, ClientRequest::JoinRoom { room_id }).await?;
    room(&gateway, BOB.0, ClientRequest::JoinRoom { room_id }).await?;
    room(&gateway, ALICE.0, ClientRequest::StartRoom { room_id }).await?;

    let alice = tokio::spawn(play(Arc::clone(&gateway), ALICE, room_id));
    let bob = tokio::spawn(play(Arc::clone(&gateway), BOB, room_id));
    let (alice, bob) = (alice.await??, bob.await??);
    tracing::info!(alice_choices = alice, bob_choices = bob, "players done");

    viewer.await?
}

#[tokio::main]
async fn main() -> DemoResult<()> {
    stagematch::init_logging("info");

    let last = run_duel().await?;
    eprintln!(
        "game over after {} round(s) at stage {}",
        last.round, last.stage
    );
    Ok(())
}
