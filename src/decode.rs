//! The decoder contract and decode options.
//!
//! A decoder is a plain function from the undecoded bytes to a [`Decoded`] record. It never keeps
//! the bytes around and has no side effects besides building the layer. Every indexing into the
//! input must be preceded by a length check; running short of bytes is reported as
//! [`Error::TooShort`][`crate::Error::TooShort`].

use core::ops::Range;

use crate::errors::Error;
use crate::layer::Layer;
use crate::layer_type::LayerType;

/// Decoder function signature, as registered for a [`LayerType`].
pub type DecodeFn = fn(&[u8]) -> Result<Decoded, Error>;

/// What the pipeline does after a layer was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextLayer {
    /// Run the decoder registered for this type on the payload.
    ///
    /// If no decoder is registered, the payload is kept as an opaque `Payload` layer.
    Decode(LayerType),
    /// Stop decoding, a non-empty payload becomes a `Payload` layer.
    Payload,
    /// Stop decoding, the payload (padding, trailers) is not part of any layer.
    Done,
    /// The inner protocol id has no layer type. The layer itself is kept, a non-empty payload
    /// becomes a failure layer with [`Error::UnsupportedNextLayer`][`crate::Error`].
    Unsupported(u32),
}

/// A successfully decoded layer and how to continue.
///
/// `header` and `payload` are relative to the bytes given to the decoder. The layer's contents
/// are `bytes[..header]` and the bytes handed to the next decoder are `bytes[payload]`, which
/// lets a layer drop trailing padding by ending its payload before the end of its input.
#[derive(Debug)]
pub struct Decoded {
    pub layer: Box<dyn Layer>,
    pub header: usize,
    pub payload: Range<usize>,
    pub next: NextLayer,
    /// The layer declared more bytes than were available.
    pub truncated: bool,
}

impl Decoded {
    /// A layer occupying `header` bytes of an input of length `len`, with the rest as payload.
    ///
    /// Continues with [`NextLayer::Payload`] unless changed with [`Decoded::next`].
    pub fn new<L: Layer>(layer: L, header: usize, len: usize) -> Self {
        Self {
            layer: Box::new(layer),
            header,
            payload: header..len,
            next: NextLayer::Payload,
            truncated: false,
        }
    }

    pub fn next(mut self, next: NextLayer) -> Self {
        self.next = next;
        self
    }

    /// Limit the payload to `len` bytes following the header.
    pub fn payload_len(mut self, len: usize) -> Self {
        self.payload = self.header..self.header.saturating_add(len);
        self
    }

    pub fn truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }
}

/// Options controlling how a [`Packet`][`crate::Packet`] decodes its bytes.
///
/// `lazy` defers decoding of every layer until a query needs it. `no_copy` makes the packet
/// borrow the caller's bytes instead of copying them; the bytes then have to outlive the packet
/// and every layer view obtained from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub lazy: bool,
    pub no_copy: bool,
}

impl DecodeOptions {
    /// Decode everything up front, on a private copy of the bytes.
    pub const DEFAULT: DecodeOptions = DecodeOptions {
        lazy: false,
        no_copy: false,
    };

    /// Decode on first access, on a private copy of the bytes.
    pub const LAZY: DecodeOptions = DecodeOptions {
        lazy: true,
        no_copy: false,
    };

    /// Decode everything up front, directly from the caller's bytes.
    pub const NO_COPY: DecodeOptions = DecodeOptions {
        lazy: false,
        no_copy: true,
    };

    /// Decode on first access, directly from the caller's bytes.
    pub const LAZY_NO_COPY: DecodeOptions = DecodeOptions {
        lazy: true,
        no_copy: true,
    };
}
