//! Wire vocabulary for Stagematch.
//!
//! This crate holds everything that crosses the boundary between a client
//! and the engine:
//!
//! - **Identity** ([`UserId`], [`RoomId`]): newtypes shared by every layer.
//! - **Requests** ([`ClientRequest`], [`RawChoice`]): what a client asks for,
//!   before any validation against room state.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how requests and snapshots
//!   turn into bytes and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing that.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about rooms, rounds, or stages. It only
//! knows how to name things and how to move them across the wire.
//!
//! ```text
//! Client bytes → Protocol (ClientRequest) → Room layer (Submission, Room)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientRequest, RawChoice, RoomId, UserId};
