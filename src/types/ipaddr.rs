//! IPv4 and IPv6 addresses as they appear in decoded headers.
//!
//! Both display in their usual text form and serialize as that text.

use core::convert::TryFrom;
use core::fmt;

use serde::{Serialize, Serializer};

use crate::errors::Error as CrateError;

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IPv4Address([u8; 4]);

impl IPv4Address {
    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }
}

impl From<[u8; 4]> for IPv4Address {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl TryFrom<&'_ [u8]> for IPv4Address {
    type Error = CrateError;

    fn try_from(slice: &'_ [u8]) -> Result<Self, Self::Error> {
        <[u8; 4]>::try_from(slice)
            .map(Self)
            .map_err(|_| CrateError::InvalidAddress(format!("IPv4Address: {}", hex::encode(slice))))
    }
}

impl From<IPv4Address> for std::net::Ipv4Addr {
    fn from(ip: IPv4Address) -> Self {
        ip.0.into()
    }
}

impl fmt::Display for IPv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl fmt::Debug for IPv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for IPv4Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// An IPv6 address, kept as its eight 16 bit segments.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IPv6Address([u16; 8]);

impl IPv6Address {
    pub fn octets(&self) -> [u8; 16] {
        let mut octets = [0u8; 16];
        for (pair, segment) in octets.chunks_exact_mut(2).zip(self.0) {
            pair.copy_from_slice(&segment.to_be_bytes());
        }
        octets
    }

    pub const fn segments(&self) -> [u16; 8] {
        self.0
    }

    // Start and length of the longest run of zero segments, first one on a tie.
    fn longest_zero_run(&self) -> (usize, usize) {
        let mut best = (0, 0);
        let mut run_start = None;
        for i in 0..=self.0.len() {
            match (self.0.get(i) == Some(&0), run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    if i - start > best.1 {
                        best = (start, i - start);
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
        best
    }
}

impl TryFrom<&'_ [u8]> for IPv6Address {
    type Error = CrateError;

    fn try_from(slice: &'_ [u8]) -> Result<Self, Self::Error> {
        let octets = <[u8; 16]>::try_from(slice).map_err(|_| {
            CrateError::InvalidAddress(format!("IPv6Address: {}", hex::encode(slice)))
        })?;

        let mut ip = IPv6Address::default();
        for (segment, pair) in ip.0.iter_mut().zip(octets.chunks_exact(2)) {
            *segment = u16::from_be_bytes([pair[0], pair[1]]);
        }
        Ok(ip)
    }
}

impl From<[u16; 8]> for IPv6Address {
    fn from(segments: [u16; 8]) -> Self {
        Self(segments)
    }
}

// RFC 5952 text form: lower case hex, the longest run of at least two zero segments replaced
// by `::`.
impl fmt::Display for IPv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_segments(f: &mut fmt::Formatter<'_>, segments: &[u16]) -> fmt::Result {
            for (i, segment) in segments.iter().enumerate() {
                if i > 0 {
                    f.write_str(":")?;
                }
                write!(f, "{:x}", segment)?;
            }
            Ok(())
        }

        let (start, len) = self.longest_zero_run();
        if len < 2 {
            return write_segments(f, &self.0);
        }

        write_segments(f, &self.0[..start])?;
        f.write_str("::")?;
        write_segments(f, &self.0[start + len..])
    }
}

impl fmt::Debug for IPv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for IPv6Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
