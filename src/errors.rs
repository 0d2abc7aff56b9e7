//! Error types

use crate::layer_type::LayerType;

/// Bytes of the input kept in [`Error::TooShort`].
pub const TOO_SHORT_DATA_LEN: usize = 64;

/// Errors returned by `burin`.
///
/// Decode errors never escape a [`Packet`][`crate::Packet`], they are kept as the
/// [`DecodeFailure`][`crate::layers::payload::DecodeFailure`] layer of the packet. Registration
/// and endpoint construction return them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Fewer bytes were available than the layer requires. `data` is the hex of at most the
    /// first [`TOO_SHORT_DATA_LEN`] of them.
    TooShort {
        layer: LayerType,
        required: usize,
        available: usize,
        data: String,
    },
    /// A field holds a value the layer cannot continue decoding with.
    Malformed { layer: LayerType, reason: String },
    /// The layer names an inner protocol we have no layer type for.
    UnsupportedNextLayer { layer: LayerType, value: u32 },
    /// A decoder reported contents or payload outside of its input.
    InvalidSpan {
        layer: LayerType,
        header: usize,
        payload_end: usize,
        available: usize,
    },
    RegisterError(String),
    InvalidEndpoint(String),
    /// Bytes or text that do not form an address of the requested kind.
    InvalidAddress(String),
}

impl Error {
    /// Shorthand for a [`Error::TooShort`] error over `bytes`.
    pub fn too_short(layer: LayerType, required: usize, bytes: &[u8]) -> Self {
        Error::TooShort {
            layer,
            required,
            available: bytes.len(),
            data: hex::encode(&bytes[..bytes.len().min(TOO_SHORT_DATA_LEN)]),
        }
    }

    /// Shorthand for a [`Error::Malformed`] error.
    pub fn malformed(layer: LayerType, reason: impl Into<String>) -> Self {
        Error::Malformed {
            layer,
            reason: reason.into(),
        }
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TooShort {
                layer,
                required,
                available,
                ..
            } => write!(
                f,
                "{} layer too short: required {} bytes, available {}",
                layer, required, available
            ),
            Error::Malformed { layer, reason } => write!(f, "malformed {} layer: {}", layer, reason),
            Error::UnsupportedNextLayer { layer, value } => write!(
                f,
                "unable to decode {} payload of type 0x{:x}",
                layer, value
            ),
            Error::InvalidSpan {
                layer,
                header,
                payload_end,
                available,
            } => write!(
                f,
                "{} decoder reported header {} / payload end {} beyond {} bytes",
                layer, header, payload_end, available
            ),
            Error::RegisterError(what) => write!(f, "registration failed: {}", what),
            Error::InvalidEndpoint(what) => write!(f, "invalid endpoint: {}", what),
            Error::InvalidAddress(what) => write!(f, "invalid address: {}", what),
        }
    }
}
