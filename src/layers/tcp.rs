//! TCP Layer

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use serde::Serialize;

use crate::decode::{Decoded, NextLayer};
use crate::errors::Error;
use crate::flows::{Endpoint, Flow};
use crate::layer::{Layer, TransportLayer};
use crate::layer_type::{register_layer_type_id, LayerType, LAYER_TYPE_TCP};

use crate::layers::{ipv4, ipv6};

lazy_static! {
    static ref TCP_APPS_MAP: RwLock<HashMap<u16, LayerType>> = RwLock::new(HashMap::new());
}

/// TCP header length
pub const TCP_BASE_HDR_LEN: usize = 20_usize;
/// IANA Assigned protocol number for TCP
pub const IPPROTO_TCP: u8 = 6_u8;

pub const TCP_FLAG_FIN: u16 = 0x001;
pub const TCP_FLAG_SYN: u16 = 0x002;
pub const TCP_FLAG_RST: u16 = 0x004;
pub const TCP_FLAG_PSH: u16 = 0x008;
pub const TCP_FLAG_ACK: u16 = 0x010;

pub const TCP_OPTION_EOL: u8 = 0;
pub const TCP_OPTION_NOP: u8 = 1;
pub const TCP_OPTION_MSS: u8 = 2;
pub const TCP_OPTION_WINDOW_SCALE: u8 = 3;
pub const TCP_OPTION_SACK_PERMITTED: u8 = 4;
pub const TCP_OPTION_SACK: u8 = 5;
pub const TCP_OPTION_TIMESTAMP: u8 = 8;

// Register ourselves With IPv4 and IPv6
pub(crate) fn register_defaults() -> Result<(), Error> {
    lazy_static::initialize(&TCP_APPS_MAP);

    register_layer_type_id(LAYER_TYPE_TCP, "TCP", decode_tcp)?;

    ipv4::register_protocol(IPPROTO_TCP, LAYER_TYPE_TCP)?;
    ipv6::register_next_header(IPPROTO_TCP, LAYER_TYPE_TCP)?;

    Ok(())
}

/// Register An App for decoding after TCP Layer
///
/// This is a public API function for an App whose decoder should be called after TCP Layer's if
/// the Source or Destination port matches one of the ports. The destination port is looked up
/// first.
pub fn register_app(port: u16, app: LayerType) -> Result<(), Error> {
    lazy_static::initialize(&TCP_APPS_MAP);

    let mut map = TCP_APPS_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&port) {
        return Err(Error::RegisterError(format!("TCP Port: {}", port)));
    }
    map.insert(port, app);

    Ok(())
}

pub(crate) fn app_next_layer(
    map: &RwLock<HashMap<u16, LayerType>>,
    src_port: u16,
    dst_port: u16,
) -> NextLayer {
    let map = map.read().unwrap_or_else(PoisonError::into_inner);
    map.get(&dst_port)
        .or_else(|| map.get(&src_port))
        .map_or(NextLayer::Payload, |app| NextLayer::Decode(*app))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum TcpOption {
    EOL,
    NOP,
    MSS {
        value: u16,
    },
    WindowScale {
        shift: u8,
    },
    SackPermitted,
    Sack {
        blocks: Vec<(u32, u32)>,
    },
    Timestamp {
        value: u32,
        echo: u32,
    },
    Other {
        value: u8,
        #[serde(serialize_with = "hex::serde::serialize")]
        data: Vec<u8>,
    },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct TCP {
    src_port: u16,
    dst_port: u16,
    seq_no: u32,
    ack_no: u32,
    data_offset: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    flags: u16,
    window_size: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    urgent_ptr: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<TcpOption>,
}

impl TCP {
    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn seq_no(&self) -> u32 {
        self.seq_no
    }

    pub fn ack_no(&self) -> u32 {
        self.ack_no
    }

    /// Header length in 32 bit words.
    pub fn data_offset(&self) -> u8 {
        self.data_offset
    }

    /// The nine flag bits, NS down to FIN.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn window_size(&self) -> u16 {
        self.window_size
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn options(&self) -> &[TcpOption] {
        &self.options
    }

    fn options_from_bytes(mut bytes: &[u8]) -> Result<Vec<TcpOption>, Error> {
        let mut options = Vec::new();

        while let Some(&kind) = bytes.first() {
            let option = match kind {
                TCP_OPTION_EOL => {
                    options.push(TcpOption::EOL);
                    break;
                }
                TCP_OPTION_NOP => {
                    bytes = &bytes[1..];
                    options.push(TcpOption::NOP);
                    continue;
                }
                _ => {
                    if bytes.len() < 2 {
                        return Err(Error::too_short(LAYER_TYPE_TCP, 2, bytes));
                    }
                    let len = bytes[1] as usize;
                    if len < 2 {
                        return Err(Error::malformed(
                            LAYER_TYPE_TCP,
                            format!("option {} length {}", kind, len),
                        ));
                    }
                    if bytes.len() < len {
                        return Err(Error::too_short(LAYER_TYPE_TCP, len, bytes));
                    }
                    let data = &bytes[2..len];
                    bytes = &bytes[len..];

                    Self::option_from_data(kind, data)
                }
            };
            options.push(option);
        }

        Ok(options)
    }

    // Options of known kinds with an unexpected length are kept as `Other`.
    fn option_from_data(kind: u8, data: &[u8]) -> TcpOption {
        let be_u32 = |b: &[u8]| u32::from_be_bytes([b[0], b[1], b[2], b[3]]);

        match (kind, data.len()) {
            (TCP_OPTION_MSS, 2) => TcpOption::MSS {
                value: (data[0] as u16) << 8 | data[1] as u16,
            },
            (TCP_OPTION_WINDOW_SCALE, 1) => TcpOption::WindowScale { shift: data[0] },
            (TCP_OPTION_SACK_PERMITTED, 0) => TcpOption::SackPermitted,
            (TCP_OPTION_SACK, len) if len % 8 == 0 => TcpOption::Sack {
                blocks: data
                    .chunks_exact(8)
                    .map(|block| (be_u32(&block[0..4]), be_u32(&block[4..8])))
                    .collect(),
            },
            (TCP_OPTION_TIMESTAMP, 8) => TcpOption::Timestamp {
                value: be_u32(&data[0..4]),
                echo: be_u32(&data[4..8]),
            },
            (value, _) => TcpOption::Other {
                value,
                data: data.to_vec(),
            },
        }
    }
}

/// Decoder for [`LAYER_TYPE_TCP`].
///
/// Segments without data produce no further layer. Data goes to the app registered for one of
/// the ports, or is kept as payload.
pub fn decode_tcp(bytes: &[u8]) -> Result<Decoded, Error> {
    if bytes.len() < TCP_BASE_HDR_LEN {
        return Err(Error::too_short(LAYER_TYPE_TCP, TCP_BASE_HDR_LEN, bytes));
    }

    let data_offset = bytes[12] >> 4;
    let header = data_offset as usize * 4;
    if header < TCP_BASE_HDR_LEN {
        return Err(Error::malformed(
            LAYER_TYPE_TCP,
            format!("data offset {}", data_offset),
        ));
    }
    if bytes.len() < header {
        return Err(Error::too_short(LAYER_TYPE_TCP, header, bytes));
    }

    let tcp = TCP {
        src_port: (bytes[0] as u16) << 8 | (bytes[1] as u16),
        dst_port: (bytes[2] as u16) << 8 | (bytes[3] as u16),
        seq_no: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        ack_no: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        data_offset,
        flags: ((bytes[12] as u16) << 8 | (bytes[13] as u16)) & 0x01FF,
        window_size: (bytes[14] as u16) << 8 | (bytes[15] as u16),
        checksum: (bytes[16] as u16) << 8 | (bytes[17] as u16),
        urgent_ptr: (bytes[18] as u16) << 8 | (bytes[19] as u16),
        options: TCP::options_from_bytes(&bytes[TCP_BASE_HDR_LEN..header])?,
    };

    let next = app_next_layer(&TCP_APPS_MAP, tcp.src_port, tcp.dst_port);

    Ok(Decoded::new(tcp, header, bytes.len()).next(next))
}

impl Layer for TCP {
    fn layer_type(&self) -> LayerType {
        LAYER_TYPE_TCP
    }

    fn short_name(&self) -> &'static str {
        "tcp"
    }

    fn as_transport(&self) -> Option<&dyn TransportLayer> {
        Some(self)
    }
}

impl TransportLayer for TCP {
    fn transport_flow(&self) -> Flow {
        Flow::between(
            Endpoint::tcp_port(self.src_port),
            Endpoint::tcp_port(self.dst_port),
        )
    }
}
