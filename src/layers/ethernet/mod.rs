//! Ethernet Layer

use core::convert::TryInto;

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::flows::{Endpoint, Flow};
use crate::layer::{Layer, LinkLayer};
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_ETHERNET};
use crate::packet::register_link_type;
use crate::types::{EtherType, MACAddress, LINK_TYPE_ETHERNET};

pub mod dot1q;

pub const ETH_HEADER_LENGTH: usize = 14_usize;

pub fn get_ethertypes_map() -> &'static RwLock<HashMap<EtherType, LayerType>> {
    /// A Map maintaining EtherType -> LayerType of the L3 Layers.
    pub(crate) static ETHERTYPES_MAP: OnceLock<RwLock<HashMap<EtherType, LayerType>>> =
        OnceLock::new();
    ETHERTYPES_MAP.get_or_init(|| RwLock::new(HashMap::new()))
}

// Register our decoder and make Ethernet the first layer of Ethernet link type frames.
pub(crate) fn register_defaults() -> Result<(), Error> {
    get_ethertypes_map();

    register_layer_type_id(LAYER_TYPE_ETHERNET, "Ethernet", decode_ethernet)?;
    register_link_type(LINK_TYPE_ETHERNET, LAYER_TYPE_ETHERNET)
}

/// Register for a given EtherType
///
/// A Layer that would handle subsequent decoding for a given Ethertype, should register itself
/// by calling this function. For example [`crate::layers::ipv4`] would call `register_ethertype`
/// with [`EtherType`] value of 0x0800, passing its own layer type. The same table is used by
/// every layer carrying an EtherType, like [`dot1q::Dot1Q`].
pub fn register_ethertype(eth_type: EtherType, layer: LayerType) -> Result<(), Error> {
    let mut map = get_ethertypes_map()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&eth_type) {
        return Err(Error::RegisterError(format!("ether_type: {}", eth_type)));
    }
    map.insert(eth_type, layer);

    Ok(())
}

/// The layer to decode next for an EtherType found in `layer`.
pub(crate) fn ethertype_next_layer(eth_type: EtherType) -> NextLayer {
    let map = get_ethertypes_map()
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    map.get(&eth_type)
        .map_or(NextLayer::Unsupported(eth_type.0 as u32), |next| {
            NextLayer::Decode(*next)
        })
}

/// Decodes what follows an EtherType field ending at `header`.
///
/// Values up to 1500 are the length of an IEEE 802.3 payload, which is kept opaque and without
/// the padding following it.
pub(crate) fn ethertype_decoded<L: Layer>(
    layer: L,
    eth_type: EtherType,
    header: usize,
    bytes: &[u8],
) -> Decoded {
    let decoded = Decoded::new(layer, header, bytes.len());
    if eth_type.is_length() {
        let length = eth_type.0 as usize;
        let available = bytes.len() - header;
        return decoded
            .payload_len(length.min(available))
            .truncated(length > available);
    }

    decoded.next(ethertype_next_layer(eth_type))
}

/// Structure representing the Ethernet Header of a Packet.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Ethernet {
    dst_mac: MACAddress,
    src_mac: MACAddress,
    ethertype: EtherType,
}

impl Ethernet {
    pub fn src_mac(&self) -> MACAddress {
        self.src_mac
    }

    pub fn dst_mac(&self) -> MACAddress {
        self.dst_mac
    }

    pub fn ethertype(&self) -> EtherType {
        self.ethertype
    }
}

/// Decoder for [`LAYER_TYPE_ETHERNET`].
pub fn decode_ethernet(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < ETH_HEADER_LENGTH {
        return Err(Error::too_short(LAYER_TYPE_ETHERNET, ETH_HEADER_LENGTH, bytes));
    }

    let eth = Ethernet {
        dst_mac: bytes[0..6].try_into()?,
        src_mac: bytes[6..12].try_into()?,
        ethertype: EtherType((bytes[12] as u16) << 8 | bytes[13] as u16),
    };
    let ethertype = eth.ethertype;

    Ok(ethertype_decoded(eth, ethertype, ETH_HEADER_LENGTH, bytes))
}

impl Layer for Ethernet {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_ETHERNET
    }

    fn short_name(&self) -> &'static str {
        "eth"
    }

    fn as_link(&self) -> Option<&dyn LinkLayer> {
        Some(self)
    }
}

impl LinkLayer for Ethernet {
    fn link_flow(&self) -> Flow {
        Flow::between(
            Endpoint::mac(self.src_mac.octets()),
            Endpoint::mac(self.dst_mac.octets()),
        )
    }
}
