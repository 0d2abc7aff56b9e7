//! Endpoints and flows.
//!
//! An [`Endpoint`] is one side of a communication: an [`EndpointType`] and up to
//! [`MAX_ENDPOINT_SIZE`] raw address bytes. A [`Flow`] is a directional pair of endpoints of the
//! same type. Both are small `Copy` values with structural equality and hashing, so they can be
//! used as map keys directly, including as part of `[Flow; 2]` keys bundling a network and a
//! transport flow.

use core::cmp::Ordering;
use core::fmt;

use serde::{Serialize, Serializer};

use crate::errors::Error;
use crate::types::{IPv4Address, IPv6Address, MACAddress};

/// Largest number of raw address bytes an [`Endpoint`] holds.
pub const MAX_ENDPOINT_SIZE: usize = 16;

/// Address family of an [`Endpoint`], selecting how it is displayed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EndpointType(u16);

impl EndpointType {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    pub fn name(self) -> &'static str {
        match self {
            ENDPOINT_MAC => "MAC",
            ENDPOINT_PPP => "PPP",
            ENDPOINT_IPV4 => "IPv4",
            ENDPOINT_IPV6 => "IPv6",
            ENDPOINT_TCP_PORT => "TCP",
            ENDPOINT_UDP_PORT => "UDP",
            ENDPOINT_INVALID => "invalid",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

pub const ENDPOINT_INVALID: EndpointType = EndpointType(0);
pub const ENDPOINT_MAC: EndpointType = EndpointType(1);
/// Point to point links have no addresses.
pub const ENDPOINT_PPP: EndpointType = EndpointType(2);
pub const ENDPOINT_IPV4: EndpointType = EndpointType(3);
pub const ENDPOINT_IPV6: EndpointType = EndpointType(4);
pub const ENDPOINT_TCP_PORT: EndpointType = EndpointType(5);
pub const ENDPOINT_UDP_PORT: EndpointType = EndpointType(6);

/// One side of a communication.
///
/// Two endpoints are equal iff their types and raw bytes are equal. Ordering compares the type
/// first, then the raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    endpoint_type: EndpointType,
    len: u8,
    raw: [u8; MAX_ENDPOINT_SIZE],
}

impl Endpoint {
    /// Creates an endpoint from raw address bytes.
    ///
    /// Fails if `raw` is longer than [`MAX_ENDPOINT_SIZE`].
    pub fn new(endpoint_type: EndpointType, raw: &[u8]) -> Result<Self, Error> {
        if raw.len() > MAX_ENDPOINT_SIZE {
            return Err(Error::InvalidEndpoint(format!(
                "{} bytes for {} endpoint: {}",
                raw.len(),
                endpoint_type.name(),
                hex::encode(raw)
            )));
        }
        let mut endpoint = Self {
            endpoint_type,
            len: raw.len() as u8,
            raw: [0; MAX_ENDPOINT_SIZE],
        };
        endpoint.raw[..raw.len()].copy_from_slice(raw);

        Ok(endpoint)
    }

    const fn from_array<const N: usize>(endpoint_type: EndpointType, bytes: [u8; N]) -> Self {
        let mut raw = [0; MAX_ENDPOINT_SIZE];
        let mut i = 0;
        while i < N {
            raw[i] = bytes[i];
            i += 1;
        }
        Self {
            endpoint_type,
            len: N as u8,
            raw,
        }
    }

    pub const fn mac(address: [u8; 6]) -> Self {
        Self::from_array(ENDPOINT_MAC, address)
    }

    pub const fn ipv4(address: [u8; 4]) -> Self {
        Self::from_array(ENDPOINT_IPV4, address)
    }

    pub const fn ipv6(address: [u8; 16]) -> Self {
        Self::from_array(ENDPOINT_IPV6, address)
    }

    pub const fn tcp_port(port: u16) -> Self {
        Self::from_array(ENDPOINT_TCP_PORT, port.to_be_bytes())
    }

    pub const fn udp_port(port: u16) -> Self {
        Self::from_array(ENDPOINT_UDP_PORT, port.to_be_bytes())
    }

    /// The single endpoint of a point to point link.
    pub const fn ppp() -> Self {
        Self::from_array(ENDPOINT_PPP, [])
    }

    pub fn endpoint_type(&self) -> EndpointType {
        self.endpoint_type
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw[..self.len as usize]
    }

    /// A non-cryptographic hash of the endpoint, stable across processes.
    pub fn fast_hash(&self) -> u64 {
        let mut h = fnv_hash(FNV_OFFSET, self.raw());
        h ^= self.endpoint_type.0 as u64;
        h.wrapping_mul(FNV_PRIME)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv_hash(mut h: u64, bytes: &[u8]) -> u64 {
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

impl PartialOrd for Endpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Endpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.endpoint_type
            .cmp(&other.endpoint_type)
            .then_with(|| self.raw().cmp(other.raw()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.raw();
        match self.endpoint_type {
            ENDPOINT_MAC if raw.len() == 6 => {
                let mac: Result<MACAddress, _> = raw.try_into();
                match mac {
                    Ok(mac) => fmt::Display::fmt(&mac, f),
                    Err(_) => f.write_str(&hex::encode(raw)),
                }
            }
            ENDPOINT_IPV4 if raw.len() == 4 => {
                let ip: Result<IPv4Address, _> = raw.try_into();
                match ip {
                    Ok(ip) => fmt::Display::fmt(&ip, f),
                    Err(_) => f.write_str(&hex::encode(raw)),
                }
            }
            ENDPOINT_IPV6 if raw.len() == 16 => {
                let ip: Result<IPv6Address, _> = raw.try_into();
                match ip {
                    Ok(ip) => fmt::Display::fmt(&ip, f),
                    Err(_) => f.write_str(&hex::encode(raw)),
                }
            }
            ENDPOINT_TCP_PORT | ENDPOINT_UDP_PORT if raw.len() == 2 => {
                write!(f, "{}", (raw[0] as u16) << 8 | raw[1] as u16)
            }
            ENDPOINT_PPP => f.write_str("point"),
            _ => f.write_str(&hex::encode(raw)),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint_type.name(), self)
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(format!("{}", self).as_str())
    }
}

/// A directional pair of endpoints.
///
/// `A -> B` and `B -> A` are different flows; [`Flow::reverse`] turns one into the other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Flow {
    src: Endpoint,
    dst: Endpoint,
}

impl Flow {
    /// Creates a flow from the raw bytes of both endpoints.
    pub fn new(endpoint_type: EndpointType, src: &[u8], dst: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            src: Endpoint::new(endpoint_type, src)?,
            dst: Endpoint::new(endpoint_type, dst)?,
        })
    }

    /// Creates a flow from two endpoints, which need to be of the same type.
    pub fn from_endpoints(src: Endpoint, dst: Endpoint) -> Result<Self, Error> {
        if src.endpoint_type != dst.endpoint_type {
            return Err(Error::InvalidEndpoint(format!(
                "flow from {:?} to {:?} mixes endpoint types",
                src, dst
            )));
        }
        Ok(Self { src, dst })
    }

    // Callers guarantee both endpoints share a type.
    pub(crate) const fn between(src: Endpoint, dst: Endpoint) -> Self {
        Self { src, dst }
    }

    pub fn endpoint_type(&self) -> EndpointType {
        self.src.endpoint_type
    }

    pub fn src(&self) -> Endpoint {
        self.src
    }

    pub fn dst(&self) -> Endpoint {
        self.dst
    }

    pub fn endpoints(&self) -> (Endpoint, Endpoint) {
        (self.src, self.dst)
    }

    pub fn reverse(&self) -> Flow {
        Flow {
            src: self.dst,
            dst: self.src,
        }
    }

    /// A non-cryptographic hash which is the same for a flow and its reverse.
    ///
    /// Useful to put both directions of a conversation into the same bucket.
    pub fn fast_hash(&self) -> u64 {
        let (a, b) = if self.src <= self.dst {
            (self.src, self.dst)
        } else {
            (self.dst, self.src)
        };
        let h = fnv_hash(FNV_OFFSET, a.raw());
        let h = fnv_hash(h, b.raw());
        (h ^ self.endpoint_type().0 as u64).wrapping_mul(FNV_PRIME)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint_type().name(), self)
    }
}
