//! # Stagematch
//!
//! A two-player stage guessing game engine.
//!
//! Two participants sit in a room and each submit a number per round.
//! Matching numbers move the room's stage up by one, different numbers
//! move it down by one. The game ends as soon as the stage leaves its
//! configured range. Every committed change is published as a
//! [`RoomSnapshot`](stagematch_room::RoomSnapshot), in order, exactly once.
//!
//! The crates underneath:
//!
//! - `stagematch-protocol`: ids, client requests and the codec
//! - `stagematch-room`: room state, the round resolver, storage and
//!   publishing collaborators, and the per-room actors
//! - `stagematch` (this crate): the [`Engine`] facade, authentication and
//!   the request [`Gateway`]
//!
//! ## Quick Start
//!
//! ```rust
//! use stagematch::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StagematchError> {
//! let engine = EngineBuilder::new().build(MemoryStore::new(), SnapshotHub::new());
//! let room = engine.create_room(None).await?;
//! engine.join(UserId(1), room.id).await?;
//! engine.join(UserId(2), room.id).await?;
//! engine.start(room.id).await?;
//!
//! engine.submit(UserId(1), room.id, 3).await?;
//! let outcome = engine.submit(UserId(2), room.id, 3).await?;
//! assert!(matches!(outcome, Outcome::RoundResolved(_)));
//! assert_eq!(engine.room(room.id).await?.stage, 11);
//! # Ok(())
//! # }
//! ```

mod auth;
mod engine;
mod error;
mod handler;
mod logging;

pub use auth::{AuthError, Authenticator, TokenTable};
pub use engine::{Engine, EngineBuilder};
pub use error::StagematchError;
pub use handler::{Gateway, Response};
pub use logging::init_logging;

pub mod prelude {
    pub use crate::{
        AuthError, Authenticator, Engine, EngineBuilder, Gateway, Response, StagematchError,
        TokenTable, init_logging,
    };
    pub use stagematch_protocol::{ClientRequest, Codec, JsonCodec, RawChoice, RoomId, UserId};
    pub use stagematch_room::{
        MemoryStore, Outcome, Publisher, RoomConfig, RoomSnapshot, RoomStatus, RoomStore,
        RoundResult, SnapshotHub, Subscription, Verdict,
    };
}
