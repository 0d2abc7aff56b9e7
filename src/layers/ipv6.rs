//! IPv6 Layer

use core::convert::TryInto;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::flows::{Endpoint, Flow};
use crate::layer::{Layer, NetworkLayer};
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_IPV6};
use crate::types::IPv6Address;

pub const IPV6_BASE_HDR_LEN: usize = 40_usize;

lazy_static! {
    static ref NEXT_HEADERS_MAP: RwLock<HashMap<u8, LayerType>> = RwLock::new(HashMap::new());
}

// Register ourselves to well-known Layer 2
pub(crate) fn register_defaults() -> Result<(), Error> {
    use crate::layers::ethernet::register_ethertype;

    lazy_static::initialize(&NEXT_HEADERS_MAP);

    register_layer_type_id(LAYER_TYPE_IPV6, "IPv6", decode_ipv6)?;
    register_ethertype(crate::types::ETHERTYPE_IP6, LAYER_TYPE_IPV6)?;

    Ok(())
}

/// Register Next Header
///
/// All the Protocols use this value, in addition to IPv6 Extension headers.
pub fn register_next_header(header: u8, layer: LayerType) -> Result<(), Error> {
    lazy_static::initialize(&NEXT_HEADERS_MAP);

    let mut map = NEXT_HEADERS_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&header) {
        return Err(Error::RegisterError(format!("next header: {}", header)));
    }
    map.insert(header, layer);

    Ok(())
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct IPv6 {
    version: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    traffic_class: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
    flow_label: u32,
    payload_len: u16,
    next_hdr: u8,
    hop_limit: u8,
    src_addr: IPv6Address,
    dst_addr: IPv6Address,
}

impl IPv6 {
    pub fn traffic_class(&self) -> u8 {
        self.traffic_class
    }

    pub fn flow_label(&self) -> u32 {
        self.flow_label
    }

    pub fn next_header(&self) -> u8 {
        self.next_hdr
    }

    pub fn hop_limit(&self) -> u8 {
        self.hop_limit
    }

    pub fn src_addr(&self) -> IPv6Address {
        self.src_addr
    }

    pub fn dst_addr(&self) -> IPv6Address {
        self.dst_addr
    }
}

/// Decoder for [`LAYER_TYPE_IPV6`].
///
/// Like with IPv4, the payload length bounds the payload and a length of 0 (jumbograms, or
/// segmentation offload) means the rest of the buffer.
pub fn decode_ipv6(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < IPV6_BASE_HDR_LEN {
        return Err(Error::too_short(LAYER_TYPE_IPV6, IPV6_BASE_HDR_LEN, bytes));
    }

    let version = bytes[0] >> 4;
    if version != 6 {
        return Err(Error::malformed(
            LAYER_TYPE_IPV6,
            format!("version {}", version),
        ));
    }

    let ipv6 = IPv6 {
        version,
        traffic_class: ((bytes[0] & 0x0f) << 4) | (bytes[1] >> 4),
        flow_label: ((bytes[1] & 0x0f) as u32) << 16 | (bytes[2] as u32) << 8 | bytes[3] as u32,
        payload_len: (bytes[4] as u16) << 8 | bytes[5] as u16,
        next_hdr: bytes[6],
        hop_limit: bytes[7],
        src_addr: bytes[8..24].try_into()?,
        dst_addr: bytes[24..40].try_into()?,
    };

    let available = bytes.len() - IPV6_BASE_HDR_LEN;
    let length = match ipv6.payload_len as usize {
        0 => available,
        len => len,
    };

    let next = {
        let map = NEXT_HEADERS_MAP
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        map.get(&ipv6.next_hdr)
            .map_or(NextLayer::Unsupported(ipv6.next_hdr as u32), |next| {
                NextLayer::Decode(*next)
            })
    };

    Ok(Decoded::new(ipv6, IPV6_BASE_HDR_LEN, bytes.len())
        .payload_len(length.min(available))
        .truncated(length > available)
        .next(next))
}

impl Layer for IPv6 {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_IPV6
    }

    fn short_name(&self) -> &'static str {
        "ip6"
    }

    fn as_network(&self) -> Option<&dyn NetworkLayer> {
        Some(self)
    }
}

impl NetworkLayer for IPv6 {
    fn network_flow(&self) -> Flow {
        Flow::between(
            Endpoint::ipv6(self.src_addr.octets()),
            Endpoint::ipv6(self.dst_addr.octets()),
        )
    }
}
