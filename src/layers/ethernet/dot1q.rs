//! IEEE 802.1Q VLAN tag

use serde::Serialize;

use crate::decode::Decoded;
use crate::errors::Error;
use crate::layer::Layer;
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_DOT1Q};
use crate::types::{EtherType, ETHERTYPE_DOT1Q, ETHERTYPE_QINQ};

use super::{ethertype_decoded, register_ethertype};

pub const DOT1Q_HEADER_LENGTH: usize = 4_usize;

// Customer tags and 802.1ad service tags share the tag layout.
pub(crate) fn register_defaults() -> Result<(), Error> {
    register_layer_type_id(LAYER_TYPE_DOT1Q, "Dot1Q", decode_dot1q)?;

    register_ethertype(ETHERTYPE_DOT1Q, LAYER_TYPE_DOT1Q)?;
    register_ethertype(ETHERTYPE_QINQ, LAYER_TYPE_DOT1Q)
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Dot1Q {
    priority: u8,
    drop_eligible: bool,
    vlan_id: u16,
    ethertype: EtherType,
}

impl Dot1Q {
    pub fn vlan_id(&self) -> u16 {
        self.vlan_id
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn ethertype(&self) -> EtherType {
        self.ethertype
    }
}

/// Decoder for [`LAYER_TYPE_DOT1Q`].
pub fn decode_dot1q(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < DOT1Q_HEADER_LENGTH {
        return Err(Error::too_short(LAYER_TYPE_DOT1Q, DOT1Q_HEADER_LENGTH, bytes));
    }

    let tci = (bytes[0] as u16) << 8 | bytes[1] as u16;
    let tag = Dot1Q {
        priority: (tci >> 13) as u8,
        drop_eligible: tci & 0x1000 != 0,
        vlan_id: tci & 0x0FFF,
        ethertype: EtherType((bytes[2] as u16) << 8 | bytes[3] as u16),
    };
    let ethertype = tag.ethertype;

    Ok(ethertype_decoded(tag, ethertype, DOT1Q_HEADER_LENGTH, bytes))
}

impl Layer for Dot1Q {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_DOT1Q
    }

    fn short_name(&self) -> &'static str {
        "dot1q"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::NextLayer;
    use crate::layer_type::LAYER_TYPE_IPV4;

    #[test]
    fn vlan_tag_fields() {
        let _ = crate::register_defaults();

        let decoded = decode_dot1q(&[0xa0, 0x64, 0x08, 0x00, 0x45]).unwrap();
        let tag = decoded.layer.downcast_ref::<Dot1Q>().unwrap();

        assert_eq!(tag.priority(), 5);
        assert_eq!(tag.vlan_id(), 100);
        assert_eq!(decoded.header, 4);
        assert_eq!(decoded.payload, 4..5);
        assert_eq!(decoded.next, NextLayer::Decode(LAYER_TYPE_IPV4));
    }

    #[test]
    fn short_tag() {
        assert!(decode_dot1q(&[0x00, 0x64, 0x08]).is_err());
    }
}
