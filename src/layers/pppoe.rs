//! PPP over Ethernet (PPPoE)

use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::layer::Layer;
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_PPP, LAYER_TYPE_PPPOE};
use crate::layers::ethernet;
use crate::types::{ETHERTYPE_PPPOE_DISCOVERY, ETHERTYPE_PPPOE_SESSION};

pub const PPPOE_HEADER_LENGTH: usize = 6_usize;

/// Code of session stage packets, which carry PPP.
pub const PPPOE_CODE_SESSION: u8 = 0x00;

pub(crate) fn register_defaults() -> Result<(), Error> {
    register_layer_type_id(LAYER_TYPE_PPPOE, "PPPoE", decode_pppoe)?;

    ethernet::register_ethertype(ETHERTYPE_PPPOE_DISCOVERY, LAYER_TYPE_PPPOE)?;
    ethernet::register_ethertype(ETHERTYPE_PPPOE_SESSION, LAYER_TYPE_PPPOE)
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PPPoE {
    version: u8,
    #[serde(rename = "type")]
    typ: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    code: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    session_id: u16,
    length: u16,
}

impl PPPoE {
    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn session_id(&self) -> u16 {
        self.session_id
    }
}

/// Decoder for [`LAYER_TYPE_PPPOE`].
///
/// Session packets continue with PPP, the discovery tags of other codes are kept as payload.
pub fn decode_pppoe(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < PPPOE_HEADER_LENGTH {
        return Err(Error::too_short(LAYER_TYPE_PPPOE, PPPOE_HEADER_LENGTH, bytes));
    }

    let pppoe = PPPoE {
        version: bytes[0] >> 4,
        typ: bytes[0] & 0x0f,
        code: bytes[1],
        session_id: (bytes[2] as u16) << 8 | bytes[3] as u16,
        length: (bytes[4] as u16) << 8 | bytes[5] as u16,
    };

    let length = pppoe.length as usize;
    let available = bytes.len() - PPPOE_HEADER_LENGTH;
    if length > available {
        return Err(Error::too_short(
            LAYER_TYPE_PPPOE,
            PPPOE_HEADER_LENGTH + length,
            bytes,
        ));
    }

    let next = if pppoe.code == PPPOE_CODE_SESSION {
        NextLayer::Decode(LAYER_TYPE_PPP)
    } else {
        NextLayer::Payload
    };

    Ok(Decoded::new(pppoe, PPPOE_HEADER_LENGTH, bytes.len())
        .payload_len(length)
        .next(next))
}

impl Layer for PPPoE {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_PPPOE
    }

    fn short_name(&self) -> &'static str {
        "pppoe"
    }
}
