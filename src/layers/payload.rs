//! Payload and decode failure layers
//!
//! These two layers are produced by the [`Packet`][`crate::Packet`] itself rather than through a
//! registered protocol. A `Payload` layer wraps bytes no decoder claimed. A `DecodeFailure` layer
//! takes the place of the layer a decoder failed to decode and holds the bytes it was given.

use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::layer::{ApplicationLayer, ErrorLayer, Layer};
use crate::layer_type::{LayerType, LAYER_TYPE_DECODE_FAILURE, LAYER_TYPE_PAYLOAD};

/// Opaque bytes, the contents of the layer are the data.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    length: usize,
}

impl Payload {
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Decoder for [`LAYER_TYPE_PAYLOAD`], consumes everything.
pub fn decode_payload(bytes: &[u8]) -> Result<Decoded, Error> {
    let length = bytes.len();

    Ok(Decoded::new(Payload { length }, length, length).next(NextLayer::Done))
}

impl Layer for Payload {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_PAYLOAD
    }

    fn short_name(&self) -> &'static str {
        "payload"
    }

    fn as_application(&self) -> Option<&dyn ApplicationLayer> {
        Some(self)
    }
}

impl ApplicationLayer for Payload {}

/// The failure that ended decoding of a packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeFailure {
    #[serde(serialize_with = "crate::types::hex::serialize_display")]
    error: Error,
}

impl DecodeFailure {
    pub fn new(error: Error) -> Self {
        Self { error }
    }
}

impl Layer for DecodeFailure {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_DECODE_FAILURE
    }

    fn short_name(&self) -> &'static str {
        "failure"
    }

    fn as_error(&self) -> Option<&dyn ErrorLayer> {
        Some(self)
    }
}

impl ErrorLayer for DecodeFailure {
    fn error(&self) -> &Error {
        &self.error
    }
}
