//! Document codec boundary.
//!
//! The engine never touches bytes directly; it delegates encoding and
//! decoding to a [`DocumentCodec`]. [`JsonCodec`] is the reference
//! implementation and the default wired in by the engine builder.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while encoding or decoding a document.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document could not be serialized.
    #[error("encode failed: {message}")]
    Encode {
        /// Underlying serializer message.
        message: String,
    },

    /// The bytes were malformed or incompatible with the document shape.
    #[error("decode failed: {message}")]
    Decode {
        /// Underlying deserializer message.
        message: String,
    },
}

/// Pure byte-level codec for a document type.
///
/// Implementations must round-trip every field losslessly, including open
/// string-to-string maps; `decode(encode(d)) == d` for any document `d`.
pub trait DocumentCodec<T>: Send + Sync {
    /// Encodes a document to bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::Encode`] if serialization fails.
    fn encode(&self, document: &T) -> Result<Vec<u8>, CodecError>;

    /// Decodes a document from bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::Decode`] on malformed or incompatible bytes.
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec over `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Creates a JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<T> DocumentCodec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, document: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(document).map_err(|e| CodecError::Encode {
            message: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            message: e.to_string(),
        })
    }
}
