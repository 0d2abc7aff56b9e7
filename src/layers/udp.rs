//! UDP Layer

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use serde::Serialize;

use crate::decode::Decoded;
use crate::errors::Error;
use crate::flows::{Endpoint, Flow};
use crate::layer::{Layer, TransportLayer};
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_UDP};

use crate::layers::tcp::app_next_layer;
use crate::layers::{ipv4, ipv6};

lazy_static! {
    static ref UDP_APPS_MAP: RwLock<HashMap<u16, LayerType>> = RwLock::new(HashMap::new());
}

/// UDP header length
pub const UDP_HDR_LEN: usize = 8_usize;
/// IANA Assigned protocol number for UDP
pub const IPPROTO_UDP: u8 = 17_u8;

// Register UDP with Protocol Handler in IPv4 and IPv6
pub(crate) fn register_defaults() -> Result<(), Error> {
    lazy_static::initialize(&UDP_APPS_MAP);

    register_layer_type_id(LAYER_TYPE_UDP, "UDP", decode_udp)?;

    ipv4::register_protocol(IPPROTO_UDP, LAYER_TYPE_UDP)?;
    ipv6::register_next_header(IPPROTO_UDP, LAYER_TYPE_UDP)?;

    Ok(())
}

/// API for an Application to register with us
///
/// This is a public API function for an App whose decoder should be called after UDP Layer's if
/// the Source or Destination port matches one of the ports.
pub fn register_app(port: u16, app: LayerType) -> Result<(), Error> {
    lazy_static::initialize(&UDP_APPS_MAP);

    let mut map = UDP_APPS_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&port) {
        return Err(Error::RegisterError(format!("UDP Port: {}", port)));
    }
    map.insert(port, app);

    Ok(())
}

/// Structure representing the UDP Header.
#[derive(Debug, Default, Clone, Serialize)]
pub struct UDP {
    src_port: u16,
    dst_port: u16,
    length: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
}

impl UDP {
    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn length(&self) -> u16 {
        self.length
    }
}

/// Decoder for [`LAYER_TYPE_UDP`].
///
/// The length field bounds the payload. A length of 0 (jumbograms) means the rest of the buffer.
pub fn decode_udp(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < UDP_HDR_LEN {
        return Err(Error::too_short(LAYER_TYPE_UDP, UDP_HDR_LEN, bytes));
    }

    let udp = UDP {
        src_port: (bytes[0] as u16) << 8 | (bytes[1] as u16),
        dst_port: (bytes[2] as u16) << 8 | (bytes[3] as u16),
        length: (bytes[4] as u16) << 8 | (bytes[5] as u16),
        checksum: (bytes[6] as u16) << 8 | (bytes[7] as u16),
    };

    let total = match udp.length as usize {
        0 => bytes.len(),
        len if len < UDP_HDR_LEN => {
            return Err(Error::malformed(
                LAYER_TYPE_UDP,
                format!("length {} shorter than header", len),
            ))
        }
        len => len,
    };
    let available = bytes.len() - UDP_HDR_LEN;
    let length = total - UDP_HDR_LEN;

    let next = app_next_layer(&UDP_APPS_MAP, udp.src_port, udp.dst_port);

    Ok(Decoded::new(udp, UDP_HDR_LEN, bytes.len())
        .payload_len(length.min(available))
        .truncated(length > available)
        .next(next))
}

impl Layer for UDP {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_UDP
    }

    fn short_name(&self) -> &'static str {
        "udp"
    }

    fn as_transport(&self) -> Option<&dyn TransportLayer> {
        Some(self)
    }
}

impl TransportLayer for UDP {
    fn transport_flow(&self) -> Flow {
        Flow::between(
            Endpoint::udp_port(self.src_port),
            Endpoint::udp_port(self.dst_port),
        )
    }
}
