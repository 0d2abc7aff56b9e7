//! Multi Label Protocol Switching

use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::layer::Layer;
use crate::layer_type::{
    register_layer_type_id, LayerType, LAYER_TYPE_IPV4, LAYER_TYPE_IPV6, LAYER_TYPE_MPLS,
};
use crate::layers::{ethernet, ipv4, ipv6};
use crate::types::{ETHERTYPE_MPLS_MULTICAST, ETHERTYPE_MPLS_UNICAST};

/// Length of a single label stack entry
pub const MPLS_HEADER_LENGTH: usize = 4_usize;
/// IANA Assigned protocol number for MPLS in IP
pub const IPPROTO_MPLS: u8 = 137_u8;

// Register Ourselves to the Ethernet layer, as this is a 2.5 layer protocol, and for MPLS in IP.
pub(crate) fn register_defaults() -> Result<(), Error> {
    register_layer_type_id(LAYER_TYPE_MPLS, "MPLS", decode_mpls)?;

    ethernet::register_ethertype(ETHERTYPE_MPLS_UNICAST, LAYER_TYPE_MPLS)?;
    ethernet::register_ethertype(ETHERTYPE_MPLS_MULTICAST, LAYER_TYPE_MPLS)?;
    ipv4::register_protocol(IPPROTO_MPLS, LAYER_TYPE_MPLS)?;
    ipv6::register_next_header(IPPROTO_MPLS, LAYER_TYPE_MPLS)
}

#[derive(Debug, Default, Serialize, Copy, Clone, PartialEq, Eq)]
pub struct MPLSLabel {
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
    label: u32, // 20 bits
    exp: u8, // 3 bits
    bos: bool,
    ttl: u8,
}

impl MPLSLabel {
    pub fn label(&self) -> u32 {
        self.label
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }
}

/// The whole label stack, up to and including the bottom of stack entry.
#[derive(Debug, Default, Serialize, Clone)]
pub struct MPLS {
    labels: Vec<MPLSLabel>,
}

impl MPLS {
    pub fn labels(&self) -> &[MPLSLabel] {
        &self.labels
    }
}

/// Decoder for [`LAYER_TYPE_MPLS`].
///
/// MPLS does not say what it carries, the IP version nibble of the first byte after the stack
/// decides between IPv4 and IPv6.
pub fn decode_mpls(bytes: &[u8]) -> Result<Decoded, Error> {
    let mut mpls = MPLS::default();
    let mut byte_offset = 0_usize;

    loop {
        if bytes.len() < byte_offset + MPLS_HEADER_LENGTH {
            return Err(Error::too_short(
                LAYER_TYPE_MPLS,
                byte_offset + MPLS_HEADER_LENGTH,
                bytes,
            ));
        }

        let entry = &bytes[byte_offset..byte_offset + MPLS_HEADER_LENGTH];
        let label = MPLSLabel {
            label: (entry[0] as u32) << 12 | (entry[1] as u32) << 4 | (entry[2] as u32) >> 4,
            exp: (entry[2] >> 1) & 0x07,
            bos: entry[2] & 0x01 == 0x01,
            ttl: entry[3],
        };
        mpls.labels.push(label);
        byte_offset += MPLS_HEADER_LENGTH;

        if label.bos {
            break;
        }
    }

    let next = match bytes.get(byte_offset).map(|b| b >> 4) {
        Some(4) => NextLayer::Decode(LAYER_TYPE_IPV4),
        Some(6) => NextLayer::Decode(LAYER_TYPE_IPV6),
        // Nothing else can be told from the first nibble.
        Some(version) => NextLayer::Unsupported(version as u32),
        None => NextLayer::Done,
    };

    Ok(Decoded::new(mpls, byte_offset, bytes.len()).next(next))
}

impl Layer for MPLS {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_MPLS
    }

    fn short_name(&self) -> &'static str {
        "mpls"
    }
}
