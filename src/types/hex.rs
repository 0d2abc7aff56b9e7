//! Serde helpers to output integer fields as Hex strings
//!
//! Flags, checksums and identifiers read better as hex in the serialized output of a packet. Use
//! these with `#[serde(serialize_with = "...")]` on the fields.

macro_rules! generate_serialize_hex_fns {
    (($fn:ident, $format:literal, $trait:path)) => {
        pub fn $fn<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
            T: $trait,
        {
            serializer.serialize_str(format!($format, value).as_str())
        }
    };

    ($($tt:tt,)*) => {
        $(
            generate_serialize_hex_fns!($tt);
        )+
    };
}

generate_serialize_hex_fns! {
    (serialize_lower_hex_u8, "0x{:02x}", core::fmt::LowerHex),
    (serialize_lower_hex_u16, "0x{:04x}", core::fmt::LowerHex),
    (serialize_lower_hex_u32, "0x{:08x}", core::fmt::LowerHex),
    (serialize_upper_hex_u16, "0x{:04X}", core::fmt::UpperHex),
}

/// Serialize anything displayable as its display string.
pub fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: core::fmt::Display,
{
    serializer.collect_str(value)
}
