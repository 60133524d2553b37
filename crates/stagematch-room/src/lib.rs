//! Room lifecycle and round resolution for Stagematch.
//!
//! Each room runs as an isolated Tokio task (actor model). The actor is the
//! only writer for its room: it loads state from the [`RoomStore`], lets the
//! [`RoundResolver`] decide, commits the result atomically, and hands a
//! [`RoomSnapshot`] to the [`Publisher`], one command at a time.
//!
//! # Key types
//!
//! - [`RoomStatus`]: lifecycle state machine (`Joining → Started → Done`)
//! - [`Room`], [`Choice`], [`Submission`]: the data model
//! - [`RoundResolver`]: pure validation and outcome computation
//! - [`RoomStore`] / [`MemoryStore`]: storage collaborator
//! - [`Publisher`] / [`SnapshotHub`]: publish collaborator
//! - [`RoomManager`] / [`RoomHandle`]: actors and routing

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod manager;
mod model;
mod publish;
mod resolver;
mod room;
mod snapshot;
mod store;

pub use config::{RoomConfig, RoomStatus};
pub use error::RoomError;
pub use manager::{RoomListing, RoomManager};
pub use model::{Choice, Room, SEATS, Submission};
pub use publish::{DEFAULT_HUB_CAPACITY, Publisher, SnapshotHub, Subscription};
pub use resolver::{Outcome, Resolution, RoundResolver, RoundResult, Verdict};
pub use room::RoomHandle;
pub use snapshot::{ChoiceView, RoomSnapshot, RoundSummary};
pub use store::{MemoryStore, ReadStamp, RoomStore, StoreError};
