//! IPv4 Layer

use core::convert::TryInto as _;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::flows::{Endpoint, Flow};
use crate::layer::{Layer, NetworkLayer};
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_IPV4};
use crate::types::IPv4Address;

/// Basic Length of the IPv4 Header when no options are present
pub const IPV4_BASE_HEADER_LENGTH: usize = 20_usize;

pub const IPV4_OPTION_EOOL: u8 = 0;
pub const IPV4_OPTION_NOP: u8 = 1;
pub const IPV4_OPTION_RR: u8 = 7;
pub const IPV4_OPTION_MTUP: u8 = 11;
pub const IPV4_OPTION_MTUR: u8 = 12;

pub const IPV4_FLAG_MORE_FRAGMENTS: u8 = 0x01;

lazy_static! {
    static ref PROTOCOLS_MAP: RwLock<HashMap<u8, LayerType>> = RwLock::new(HashMap::new());
}

// Register ourselves to well-known Layer 2
pub(crate) fn register_defaults() -> Result<(), Error> {
    use crate::layers::ethernet::register_ethertype;

    lazy_static::initialize(&PROTOCOLS_MAP);

    register_layer_type_id(LAYER_TYPE_IPV4, "IPv4", decode_ipv4)?;
    register_ethertype(crate::types::ETHERTYPE_IP, LAYER_TYPE_IPV4)?;

    Ok(())
}

/// Register a Transport Protocol for dissection.
///
/// Higher level protocols should call this function to register themselves for decoding with the
/// IPv4 Layer. For example, [TCP Protocol][`crate::layers::tcp`] would call this function with a
/// protocol number 6 and similarly [UDP Protocol][`crate::layers::udp`] would call this function
/// with a protocol number of 17.
pub fn register_protocol(proto: u8, layer: LayerType) -> Result<(), Error> {
    lazy_static::initialize(&PROTOCOLS_MAP);

    let mut map = PROTOCOLS_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&proto) {
        return Err(Error::RegisterError(format!("proto: {}", proto)));
    }
    map.insert(proto, layer);

    Ok(())
}

fn protocol_next_layer(proto: u8) -> NextLayer {
    let map = PROTOCOLS_MAP.read().unwrap_or_else(PoisonError::into_inner);
    map.get(&proto)
        .map_or(NextLayer::Unsupported(proto as u32), |next| {
            NextLayer::Decode(*next)
        })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum IPOption {
    EOOL,
    NOP,
    RR {
        len: u8,
        ptr: u8,
        route: Vec<IPv4Address>,
    },
    MTUP {
        len: u8,
        value: u16,
    },
    MTUR {
        len: u8,
        value: u16,
    },
    Other {
        value: u8,
        len: u8,
        data: Vec<u8>,
    },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct IPv4 {
    version: u8,
    hdr_len: u8,
    tos: u8,
    len: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    id: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    frag_offset: u16,
    ttl: u8,
    proto: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    src_addr: IPv4Address,
    dst_addr: IPv4Address,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<IPOption>,
}

impl IPv4 {
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Header length in 32 bit words.
    pub fn hdr_len(&self) -> u8 {
        self.hdr_len
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn protocol(&self) -> u8 {
        self.proto
    }

    /// Total length as found in the header, 0 with TCP segmentation offload.
    pub fn total_length(&self) -> u16 {
        self.len
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn frag_offset(&self) -> u16 {
        self.frag_offset
    }

    pub fn src_addr(&self) -> IPv4Address {
        self.src_addr
    }

    pub fn dst_addr(&self) -> IPv4Address {
        self.dst_addr
    }

    pub fn options(&self) -> &[IPOption] {
        &self.options
    }

    pub fn is_fragment(&self) -> bool {
        self.flags & IPV4_FLAG_MORE_FRAGMENTS != 0 || self.frag_offset != 0
    }

    // `bytes` are the option bytes of the header, as given by the header length.
    fn options_from_bytes(mut bytes: &[u8]) -> Result<Vec<IPOption>, Error> {
        let mut options = Vec::new();

        while !bytes.is_empty() {
            let (option, consumed) = Self::option_from_bytes(bytes)?;
            bytes = &bytes[consumed..];

            let done = option == IPOption::EOOL;
            options.push(option);
            if done {
                break;
            }
        }

        Ok(options)
    }

    fn option_from_bytes(bytes: &[u8]) -> Result<(IPOption, usize), Error> {
        let value = match bytes.first() {
            Some(value) => *value,
            None => return Err(Error::too_short(LAYER_TYPE_IPV4, 1, bytes)),
        };

        // from: https://www.iana.org/assignments/ip-parameters/ip-parameters.xhtml
        let option = match value {
            IPV4_OPTION_EOOL => return Ok((IPOption::EOOL, 1)),
            IPV4_OPTION_NOP => return Ok((IPOption::NOP, 1)),
            IPV4_OPTION_RR => {
                let (len, data) = Self::option_data_from_bytes(bytes)?;
                let ptr = match data.first() {
                    Some(ptr) => *ptr,
                    None => {
                        return Err(Error::malformed(
                            LAYER_TYPE_IPV4,
                            "record route option without pointer",
                        ))
                    }
                };

                // Slots are recorded up to the pointer, which counts from the option start and
                // points at the first free slot (the first slot is at 4).
                let route = data[1..]
                    .chunks_exact(4)
                    .enumerate()
                    .take_while(|(slot, _)| 4 + 4 * slot < ptr as usize)
                    .filter_map(|(_, addr)| addr.try_into().ok())
                    .collect();

                IPOption::RR { len, ptr, route }
            }
            IPV4_OPTION_MTUP | IPV4_OPTION_MTUR => {
                let (len, data) = Self::option_data_from_bytes(bytes)?;
                if data.len() < 2 {
                    return Err(Error::too_short(LAYER_TYPE_IPV4, 4, bytes));
                }

                let mtu = (data[0] as u16) << 8 | data[1] as u16;
                if value == IPV4_OPTION_MTUP {
                    IPOption::MTUP { len, value: mtu }
                } else {
                    IPOption::MTUR { len, value: mtu }
                }
            }
            value => {
                let (len, data) = Self::option_data_from_bytes(bytes)?;

                IPOption::Other {
                    value,
                    len,
                    data: data.into(),
                }
            }
        };

        let consumed = match &option {
            IPOption::RR { len, .. }
            | IPOption::MTUP { len, .. }
            | IPOption::MTUR { len, .. }
            | IPOption::Other { len, .. } => *len as usize,
            IPOption::EOOL | IPOption::NOP => 1,
        };

        Ok((option, consumed))
    }

    // Type, length and data of an option, the length includes the type and len octets.
    fn option_data_from_bytes(bytes: &[u8]) -> Result<(u8, &[u8]), Error> {
        if bytes.len() < 2 {
            return Err(Error::too_short(LAYER_TYPE_IPV4, 2, bytes));
        }

        let len = bytes[1] as usize;
        if len < 2 {
            return Err(Error::malformed(
                LAYER_TYPE_IPV4,
                format!("option {} length {}", bytes[0], len),
            ));
        }
        if bytes.len() < len {
            return Err(Error::too_short(LAYER_TYPE_IPV4, len, bytes));
        }

        Ok((len as u8, &bytes[2..len]))
    }
}

/// Decoder for [`LAYER_TYPE_IPV4`].
///
/// The payload ends where the total length says, anything after it is link layer padding. A total
/// length of 0 is seen with TCP segmentation offload and means the rest of the buffer. Fragments
/// are not reassembled, their payload is kept opaque.
pub fn decode_ipv4(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < IPV4_BASE_HEADER_LENGTH {
        return Err(Error::too_short(LAYER_TYPE_IPV4, IPV4_BASE_HEADER_LENGTH, bytes));
    }

    let version = bytes[0] >> 4;
    if version != 4 {
        return Err(Error::malformed(
            LAYER_TYPE_IPV4,
            format!("version {}", version),
        ));
    }

    let hdr_len = bytes[0] & 0x0f;
    // Length is in 4 octets
    let header = hdr_len as usize * 4;
    if header < IPV4_BASE_HEADER_LENGTH {
        return Err(Error::malformed(
            LAYER_TYPE_IPV4,
            format!("header length {}", header),
        ));
    }
    if bytes.len() < header {
        return Err(Error::too_short(LAYER_TYPE_IPV4, header, bytes));
    }

    let flags_offset = (bytes[6] as u16) << 8 | bytes[7] as u16;
    let ipv4 = IPv4 {
        version,
        hdr_len,
        tos: bytes[1],
        len: (bytes[2] as u16) << 8 | bytes[3] as u16,
        id: (bytes[4] as u16) << 8 | bytes[5] as u16,
        flags: (flags_offset >> 13) as u8,
        frag_offset: flags_offset & 0x1fff,
        ttl: bytes[8],
        proto: bytes[9],
        checksum: (bytes[10] as u16) << 8 | bytes[11] as u16,
        src_addr: bytes[12..16].try_into()?,
        dst_addr: bytes[16..20].try_into()?,
        options: IPv4::options_from_bytes(&bytes[IPV4_BASE_HEADER_LENGTH..header])?,
    };

    let total = match ipv4.len as usize {
        0 => bytes.len(),
        len if len < header => {
            return Err(Error::malformed(
                LAYER_TYPE_IPV4,
                format!("total length {} shorter than header {}", len, header),
            ))
        }
        len => len,
    };
    let truncated = total > bytes.len();
    let payload_len = total.min(bytes.len()) - header;

    let next = if ipv4.is_fragment() {
        NextLayer::Payload
    } else {
        protocol_next_layer(ipv4.proto)
    };

    Ok(Decoded::new(ipv4, header, bytes.len())
        .payload_len(payload_len)
        .truncated(truncated)
        .next(next))
}

impl Layer for IPv4 {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_IPV4
    }

    fn short_name(&self) -> &'static str {
        "ip"
    }

    fn as_network(&self) -> Option<&dyn NetworkLayer> {
        Some(self)
    }
}

impl NetworkLayer for IPv4 {
    fn network_flow(&self) -> Flow {
        Flow::between(
            Endpoint::ipv4(self.src_addr.octets()),
            Endpoint::ipv4(self.dst_addr.octets()),
        )
    }
}
