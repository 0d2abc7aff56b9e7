//! MAC Address Type

use core::convert::TryFrom;
use core::fmt;

use serde::{Serialize, Serializer};

use crate::errors::Error as CrateError;

/// A 48 bit hardware address.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MACAddress([u8; 6]);

impl MACAddress {
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub const fn is_broadcast(&self) -> bool {
        matches!(self.0, [0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
    }
}

impl From<[u8; 6]> for MACAddress {
    fn from(value: [u8; 6]) -> Self {
        Self(value)
    }
}

impl TryFrom<&'_ [u8]> for MACAddress {
    type Error = CrateError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 6]>::try_from(slice)
            .map(Self)
            .map_err(|_| CrateError::InvalidAddress(format!("MACAddress: {}", hex::encode(slice))))
    }
}

impl fmt::Display for MACAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MACAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for MACAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
