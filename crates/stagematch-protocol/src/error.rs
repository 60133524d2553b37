//! Error types for the protocol layer.
//!
//! Each Stagematch crate defines its own error enum, so a `ProtocolError`
//! always means "the bytes were wrong", never "the room said no".

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, an unknown request `type`, or a
    /// field with the wrong shape (an object where an id was expected).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
