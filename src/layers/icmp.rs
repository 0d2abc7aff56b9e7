//! ICMP Datagram

use std::convert::TryInto;

use serde::Serialize;

use crate::decode::Decoded;
use crate::errors::Error;
use crate::layer::Layer;
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_ICMPV4};
use crate::layers::ipv4;
use crate::types::IPv4Address;

/// IANA Assigned protocol number for ICMP
pub const IPPROTO_ICMP: u8 = 1_u8;
/// ICMP header length
pub const ICMP_HEADER_LENGTH: usize = 8_usize;

/// ICMP types
pub const ICMP_ECHO_REPLY: u8 = 0_u8;
pub const ICMP_ECHO_REQUEST: u8 = 8_u8;
pub const ICMP_DESTINATION_UNREACHABLE: u8 = 3_u8;
pub const ICMP_SOURCE_QUENCH: u8 = 4_u8;
pub const ICMP_REDIRECT: u8 = 5_u8;
pub const ICMP_TIME_EXCEEDED: u8 = 11_u8;

// Register ICMP with Protocol Handler in IPv4
pub(crate) fn register_defaults() -> Result<(), Error> {
    register_layer_type_id(LAYER_TYPE_ICMPV4, "ICMPv4", decode_icmp)?;

    ipv4::register_protocol(IPPROTO_ICMP, LAYER_TYPE_ICMPV4)
}

#[derive(Default, Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum IcmpType {
    #[default]
    Empty,
    Unsupported(IcmpUnsupported),
    EchoRequest(IcmpEcho),
    EchoReply(IcmpEcho),
    Redirect(IcmpRedirect),
}

#[derive(Default, Debug, Clone, Serialize)]
pub struct IcmpEcho {
    identifier: u16,
    sequence_number: u16,
}

#[derive(Default, Debug, Clone, Serialize)]
pub struct IcmpRedirect {
    gateway_address: IPv4Address,
}

/// Rest of the header of types we do not know the layout of.
#[derive(Default, Debug, Clone, Serialize)]
pub struct IcmpUnsupported {
    #[serde(serialize_with = "hex::serde::serialize")]
    unsupported: Vec<u8>,
}

/// Structure representing the ICMP Header
#[derive(Default, Debug, Clone, Serialize)]
pub struct ICMP {
    #[serde(rename = "type")]
    icmp_type: u8,
    code: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    #[serde(flatten)]
    rest_of_header: IcmpType,
}

impl ICMP {
    pub fn icmp_type(&self) -> u8 {
        self.icmp_type
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn rest_of_header(&self) -> &IcmpType {
        &self.rest_of_header
    }
}

/// Decoder for [`LAYER_TYPE_ICMPV4`].
///
/// Echo data and the datagram quoted by error messages are kept as payload.
pub fn decode_icmp(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < ICMP_HEADER_LENGTH {
        return Err(Error::too_short(LAYER_TYPE_ICMPV4, ICMP_HEADER_LENGTH, bytes));
    }

    let icmp_type = bytes[0];
    let echo = || IcmpEcho {
        identifier: (bytes[4] as u16) << 8 | (bytes[5] as u16),
        sequence_number: (bytes[6] as u16) << 8 | (bytes[7] as u16),
    };

    // process the next 4 bytes depending on the type of ICMP packet
    let rest_of_header = match icmp_type {
        ICMP_ECHO_REPLY => IcmpType::EchoReply(echo()),
        ICMP_ECHO_REQUEST => IcmpType::EchoRequest(echo()),
        ICMP_REDIRECT => IcmpType::Redirect(IcmpRedirect {
            gateway_address: bytes[4..8].try_into()?,
        }),
        ICMP_DESTINATION_UNREACHABLE | ICMP_SOURCE_QUENCH | ICMP_TIME_EXCEEDED => IcmpType::Empty,
        _ => IcmpType::Unsupported(IcmpUnsupported {
            unsupported: bytes[4..8].to_vec(),
        }),
    };

    let icmp = ICMP {
        icmp_type,
        code: bytes[1],
        checksum: (bytes[2] as u16) << 8 | (bytes[3] as u16),
        rest_of_header,
    };

    Ok(Decoded::new(icmp, ICMP_HEADER_LENGTH, bytes.len()))
}

impl Layer for ICMP {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_ICMPV4
    }

    fn short_name(&self) -> &'static str {
        "icmp"
    }
}
