//! Error types for the protocol layer.
//!
//! Each crate in Lycan defines its own error enum. A `ProtocolError`
//! always means a frame could not be turned into bytes or back, never
//! that a game rule was broken.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a frame into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (malformed JSON, unknown frame type,
    /// missing fields).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded fine but is not valid at this point of the
    /// conversation, e.g. a `Say` before the `Hello`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
