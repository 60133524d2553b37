//! Request handling: authenticate, decode, dispatch, encode.
//!
//! The flow for one request:
//!   1. Resolve the bearer token to a `UserId`
//!   2. Decode the bytes into a [`ClientRequest`]
//!   3. Dispatch to the engine
//!   4. Encode a [`Response`] (errors included) back to bytes
//!
//! A request that fails at any step still gets an encoded `Error`
//! response. Only a failure to encode that response is returned as `Err`.

use serde::{Deserialize, Serialize};
use stagematch_protocol::{ClientRequest, Codec, JsonCodec, UserId};
use stagematch_room::{Outcome, Publisher, RoomSnapshot, RoomStore};

use crate::{Authenticator, Engine, StagematchError};

/// What the gateway sends back for a request.
///
/// `#[serde(tag = "type")]`: `{ "type": "Room", "room": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// One room's snapshot (create, join, start, get).
    Room { room: RoomSnapshot },
    /// All rooms.
    Rooms { rooms: Vec<RoomSnapshot> },
    /// A choice was stored; `outcome` says whether it closed the round.
    ChoiceAccepted { outcome: Outcome },
    /// The request failed. `code` follows HTTP conventions.
    Error { code: u16, message: String },
}

impl Response {
    fn from_error(err: &StagematchError) -> Self {
        Self::Error {
            code: err.status_code(),
            message: err.to_string(),
        }
    }
}

/// The request boundary in front of an [`Engine`].
pub struct Gateway<S: RoomStore, P: Publisher, A: Authenticator, C: Codec = JsonCodec> {
    engine: Engine<S, P>,
    auth: A,
    codec: C,
}

impl<S: RoomStore, P: Publisher, A: Authenticator> Gateway<S, P, A, JsonCodec> {
    /// A gateway speaking JSON.
    pub fn new(engine: Engine<S, P>, auth: A) -> Self {
        Self::with_codec(engine, auth, JsonCodec)
    }
}

impl<S, P, A, C> Gateway<S, P, A, C>
where
    S: RoomStore,
    P: Publisher,
    A: Authenticator,
    C: Codec,
{
    pub fn with_codec(engine: Engine<S, P>, auth: A, codec: C) -> Self {
        Self {
            engine,
            auth,
            codec,
        }
    }

    /// The engine behind this gateway.
    pub fn engine(&self) -> &Engine<S, P> {
        &self.engine
    }

    /// Handles one encoded request on behalf of the holder of `token`.
    pub async fn handle(&self, token: &str, data: &[u8]) -> Result<Vec<u8>, StagematchError> {
        let response = match self.process(token, data).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_server_error() {
                    tracing::warn!(error = %err, "request failed");
                } else {
                    tracing::debug!(error = %err, "request rejected");
                }
                Response::from_error(&err)
            }
        };
        Ok(self.codec.encode(&response)?)
    }

    async fn process(&self, token: &str, data: &[u8]) -> Result<Response, StagematchError> {
        let user = self.auth.authenticate(token).await?;
        let request: ClientRequest = self.codec.decode(data)?;
        self.dispatch(user, request).await
    }

    /// Executes an already decoded request for an authenticated user.
    pub async fn dispatch(
        &self,
        user: UserId,
        request: ClientRequest,
    ) -> Result<Response, StagematchError> {
        tracing::trace!(%user, ?request, "dispatching request");
        let response = match request {
            ClientRequest::CreateRoom { name } => Response::Room {
                room: self.engine.create_room(name).await?,
            },
            ClientRequest::JoinRoom { room_id } => Response::Room {
                room: self.engine.join(user, room_id).await?,
            },
            ClientRequest::StartRoom { room_id } => Response::Room {
                room: self.engine.start(room_id).await?,
            },
            ClientRequest::SubmitChoice { room_id, value } => Response::ChoiceAccepted {
                outcome: self.engine.submit_raw(user, room_id, value.as_ref()).await?,
            },
            ClientRequest::GetRoom { room_id } => Response::Room {
                room: self.engine.room(room_id).await?,
            },
            ClientRequest::ListRooms => Response::Rooms {
                rooms: self.engine.rooms().await?,
            },
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use stagematch_protocol::{RawChoice, RoomId};
    use stagematch_room::{MemoryStore, RoomStatus};

    use super::*;
    use crate::{EngineBuilder, TokenTable};

    type TestGateway = Gateway<MemoryStore, stagematch_room::SnapshotHub, TokenTable>;

    fn gateway() -> TestGateway {
        let engine = EngineBuilder::new().build(MemoryStore::new(), stagematch_room::SnapshotHub::new());
        Gateway::new(engine, TokenTable::new().with("a", UserId(1)).with("b", UserId(2)))
    }

    async fn call(gw: &TestGateway, token: &str, body: &str) -> Response {
        let bytes = gw.handle(token, body.as_bytes()).await.unwrap();
        JsonCodec.decode(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthenticated_request() {
        let gw = gateway();
        match call(&gw, "nobody", r#"{"type":"ListRooms"}"#).await {
            Response::Error { code, .. } => assert_eq!(code, 401),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_request() {
        let gw = gateway();
        match call(&gw, "a", "{nope").await {
            Response::Error { code, .. } => assert_eq!(code, 400),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_and_join() {
        let gw = gateway();
        let room = match call(&gw, "a", r#"{"type":"CreateRoom","name":"pit"}"#).await {
            Response::Room { room } => room,
            other => panic!("expected room, got {other:?}"),
        };
        assert_eq!(room.status, RoomStatus::Joining);

        let body = format!(r#"{{"type":"JoinRoom","room_id":{}}}"#, room.id.0);
        match call(&gw, "Bearer b", &body).await {
            Response::Room { room } => assert_eq!(room.participants, vec![UserId(2)]),
            other => panic!("expected room, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_invalid_choice() {
        let gw = gateway();
        let err = gw
            .dispatch(
                UserId(1),
                ClientRequest::SubmitChoice {
                    room_id: RoomId(1),
                    value: Some(RawChoice::Text("seven".into())),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
