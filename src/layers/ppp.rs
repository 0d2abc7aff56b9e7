//! Point-to-Point Protocol (PPP) Layer

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::flows::{Endpoint, Flow};
use crate::layer::{Layer, LinkLayer};
use crate::layer_type::{
    register_layer_type_id, LayerType, LAYER_TYPE_IPV4, LAYER_TYPE_IPV6, LAYER_TYPE_MPLS,
    LAYER_TYPE_PPP,
};
use crate::packet::register_link_type;
use crate::types::LINK_TYPE_PPP;

pub const PPP_TYPE_IPV4: u16 = 0x0021;
pub const PPP_TYPE_IPV6: u16 = 0x0057;
pub const PPP_TYPE_MPLS_UNICAST: u16 = 0x0281;

lazy_static! {
    static ref PPP_TYPES_MAP: RwLock<HashMap<u16, LayerType>> = RwLock::new(HashMap::new());
}

// The network protocols are registered here rather than by themselves, PPP numbers them
// differently than Ethernet does.
pub(crate) fn register_defaults() -> Result<(), Error> {
    lazy_static::initialize(&PPP_TYPES_MAP);

    register_layer_type_id(LAYER_TYPE_PPP, "PPP", decode_ppp)?;
    register_link_type(LINK_TYPE_PPP, LAYER_TYPE_PPP)?;

    register_ppp_type(PPP_TYPE_IPV4, LAYER_TYPE_IPV4)?;
    register_ppp_type(PPP_TYPE_IPV6, LAYER_TYPE_IPV6)?;
    register_ppp_type(PPP_TYPE_MPLS_UNICAST, LAYER_TYPE_MPLS)?;

    Ok(())
}

/// Register the layer decoding a PPP protocol number.
pub fn register_ppp_type(ppp_type: u16, layer: LayerType) -> Result<(), Error> {
    let mut map = PPP_TYPES_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&ppp_type) {
        return Err(Error::RegisterError(format!("ppp type: {:#06x}", ppp_type)));
    }
    map.insert(ppp_type, layer);

    Ok(())
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PPP {
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    protocol: u16,
}

impl PPP {
    pub fn protocol(&self) -> u16 {
        self.protocol
    }
}

/// Decoder for [`LAYER_TYPE_PPP`].
///
/// The address and control bytes (`ff 03`) are optional, and the protocol field is a single byte
/// when its low bit is set (protocol field compression).
pub fn decode_ppp(bytes: &[u8]) -> Result<Decoded, Error> {
    let mut offset = 0_usize;
    if bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0x03 {
        offset = 2;
    }

    if bytes.len() < offset + 1 {
        return Err(Error::too_short(LAYER_TYPE_PPP, offset + 1, bytes));
    }
    let protocol = if bytes[offset] & 0x01 != 0 {
        offset += 1;
        bytes[offset - 1] as u16
    } else {
        if bytes.len() < offset + 2 {
            return Err(Error::too_short(LAYER_TYPE_PPP, offset + 2, bytes));
        }
        offset += 2;
        (bytes[offset - 2] as u16) << 8 | bytes[offset - 1] as u16
    };

    let next = PPP_TYPES_MAP
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&protocol)
        .map_or(NextLayer::Unsupported(protocol as u32), |next| {
            NextLayer::Decode(*next)
        });

    Ok(Decoded::new(PPP { protocol }, offset, bytes.len()).next(next))
}

impl Layer for PPP {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_PPP
    }

    fn short_name(&self) -> &'static str {
        "ppp"
    }

    fn as_link(&self) -> Option<&dyn LinkLayer> {
        Some(self)
    }
}

impl LinkLayer for PPP {
    fn link_flow(&self) -> Flow {
        Flow::between(Endpoint::ppp(), Endpoint::ppp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_control_and_long_protocol() {
        let _ = crate::register_defaults();

        let decoded = decode_ppp(&[0xff, 0x03, 0x00, 0x21, 0x45]).unwrap();
        assert_eq!(decoded.header, 4);
        assert_eq!(decoded.next, NextLayer::Decode(LAYER_TYPE_IPV4));
        assert_eq!(decoded.layer.downcast_ref::<PPP>().unwrap().protocol(), 0x21);
    }

    #[test]
    fn compressed_protocol() {
        let _ = crate::register_defaults();

        let decoded = decode_ppp(&[0x57, 0x60]).unwrap();
        assert_eq!(decoded.header, 1);
        assert_eq!(decoded.next, NextLayer::Decode(LAYER_TYPE_IPV6));
    }

    #[test]
    fn truncated_protocol() {
        assert!(decode_ppp(&[0xff, 0x03]).is_err());
        assert!(decode_ppp(&[0x00]).is_err());
        assert!(decode_ppp(&[]).is_err());
    }

    #[test]
    fn unknown_protocol() {
        let _ = crate::register_defaults();

        let decoded = decode_ppp(&[0xc0, 0x21, 0x01]).unwrap();
        assert_eq!(decoded.next, NextLayer::Unsupported(0xc021));
        assert_eq!(decoded.header, 2);
    }
}
