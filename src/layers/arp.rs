//! Address Resolution Protocol (ARP) Handling

use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::layer::Layer;
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_ARP};
use crate::layers::ethernet;
use crate::types::ETHERTYPE_ARP;

/// Length of the fixed part of the header, addresses follow.
pub const ARP_FIXED_HDR_LENGTH: usize = 8_usize;

// Register outselves with Ethernet layer
pub(crate) fn register_defaults() -> Result<(), Error> {
    register_layer_type_id(LAYER_TYPE_ARP, "ARP", decode_arp)?;

    ethernet::register_ethertype(ETHERTYPE_ARP, LAYER_TYPE_ARP)
}

/// ARP packet, addresses are kept as raw bytes as their length is given by the header.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ARP {
    #[serde(serialize_with = "crate::types::hex::serialize_upper_hex_u16")]
    htype: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_upper_hex_u16")]
    ptype: u16,
    hlen: u8,
    plen: u8,
    oper: u16,
    #[serde(serialize_with = "hex::serde::serialize")]
    sender_ha: Vec<u8>,
    #[serde(serialize_with = "hex::serde::serialize")]
    sender_pa: Vec<u8>,
    #[serde(serialize_with = "hex::serde::serialize")]
    target_ha: Vec<u8>,
    #[serde(serialize_with = "hex::serde::serialize")]
    target_pa: Vec<u8>,
}

impl ARP {
    pub fn operation(&self) -> u16 {
        self.oper
    }

    pub fn sender_hw_address(&self) -> &[u8] {
        &self.sender_ha
    }

    pub fn sender_proto_address(&self) -> &[u8] {
        &self.sender_pa
    }

    pub fn target_hw_address(&self) -> &[u8] {
        &self.target_ha
    }

    pub fn target_proto_address(&self) -> &[u8] {
        &self.target_pa
    }
}

/// Decoder for [`LAYER_TYPE_ARP`].
///
/// Whatever follows the addresses is Ethernet padding, decoding ends here.
pub fn decode_arp(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < ARP_FIXED_HDR_LENGTH {
        return Err(Error::too_short(LAYER_TYPE_ARP, ARP_FIXED_HDR_LENGTH, bytes));
    }

    let hlen = bytes[4] as usize;
    let plen = bytes[5] as usize;
    let length = ARP_FIXED_HDR_LENGTH + 2 * (hlen + plen);
    if bytes.len() < length {
        return Err(Error::too_short(LAYER_TYPE_ARP, length, bytes));
    }

    let mut start = ARP_FIXED_HDR_LENGTH;
    let mut address = |len: usize| {
        let field = bytes[start..start + len].to_vec();
        start += len;
        field
    };

    let arp = ARP {
        htype: (bytes[0] as u16) << 8 | bytes[1] as u16,
        ptype: (bytes[2] as u16) << 8 | bytes[3] as u16,
        hlen: bytes[4],
        plen: bytes[5],
        oper: (bytes[6] as u16) << 8 | bytes[7] as u16,
        sender_ha: address(hlen),
        sender_pa: address(plen),
        target_ha: address(hlen),
        target_pa: address(plen),
    };

    Ok(Decoded::new(arp, length, bytes.len()).next(NextLayer::Done))
}

impl Layer for ARP {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_ARP
    }

    fn short_name(&self) -> &'static str {
        "arp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_addresses() {
        let bytes = hex::decode(
            "0001080006040001c401325800000a000001c402326b00000a000002000000000000000000",
        )
        .unwrap();
        let decoded = decode_arp(&bytes).unwrap();
        let arp = decoded.layer.downcast_ref::<ARP>().unwrap();

        assert_eq!(decoded.header, 28);
        assert_eq!(decoded.next, NextLayer::Done);
        assert_eq!(arp.operation(), 1);
        assert_eq!(arp.sender_hw_address(), &[0xc4, 0x01, 0x32, 0x58, 0x00, 0x00]);
        assert_eq!(arp.sender_proto_address(), &[10, 0, 0, 1]);
        assert_eq!(arp.target_proto_address(), &[10, 0, 0, 2]);
    }

    #[test]
    fn addresses_beyond_buffer() {
        // hlen of 255 needs far more bytes than there are
        let bytes = hex::decode("00010800ff040001c4013258").unwrap();
        assert!(matches!(
            decode_arp(&bytes),
            Err(Error::TooShort { required: 526, .. })
        ));
    }
}
