//! Codec trait and implementations for serializing/deserializing messages.
//!
//! Requests arrive as bytes and snapshots leave as bytes. The engine does
//! not care which format sits in between; it only needs something that
//! implements [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because a codec is shared by every request
/// handler task for the lifetime of the engine.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Snapshots pushed to viewers are JSON, so this is the default codec.
/// It sits behind the `json` feature (enabled by default).
///
/// ## Example
///
/// ```rust
/// use stagematch_protocol::{ClientRequest, Codec, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
/// let request: ClientRequest = codec
///     .decode(br#"{"type":"JoinRoom","room_id":7}"#)
///     .unwrap();
/// assert_eq!(request, ClientRequest::JoinRoom { room_id: RoomId(7) });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientRequest, RawChoice, RoomId};

    #[test]
    fn test_decode_submit_choice_with_integer() {
        let req: ClientRequest = JsonCodec
            .decode(br#"{"type":"SubmitChoice","room_id":3,"value":4}"#)
            .unwrap();
        assert_eq!(
            req,
            ClientRequest::SubmitChoice {
                room_id: RoomId(3),
                value: Some(RawChoice::Integer(4)),
            }
        );
    }

    #[test]
    fn test_decode_submit_choice_without_value() {
        let req: ClientRequest = JsonCodec
            .decode(br#"{"type":"SubmitChoice","room_id":3}"#)
            .unwrap();
        assert_eq!(
            req,
            ClientRequest::SubmitChoice {
                room_id: RoomId(3),
                value: None,
            }
        );
    }

    #[test]
    fn test_decode_unknown_type_fails() {
        let result: Result<ClientRequest, _> =
            JsonCodec.decode(br#"{"type":"Teleport","room_id":1}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<ClientRequest, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_create_room_name_is_optional() {
        let req: ClientRequest = JsonCodec.decode(br#"{"type":"CreateRoom"}"#).unwrap();
        assert_eq!(req, ClientRequest::CreateRoom { name: None });
    }
}
