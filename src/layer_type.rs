//! Layer types and the layer type registry.
//!
//! A [`LayerType`] is a small integer identifying a protocol. Every layer type that can be decoded
//! is registered once at startup together with a display name and a decoder function (see
//! [`DecodeFn`][`crate::decode::DecodeFn`]). The registry is read-only once startup is over;
//! registering while packets are being decoded is not supported.
//!
//! Three values are reserved and always have a name, whether registered or not:
//! [`LAYER_TYPE_ZERO`], [`LAYER_TYPE_DECODE_FAILURE`] and [`LAYER_TYPE_PAYLOAD`].

use core::fmt;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use serde::{Serialize, Serializer};

use crate::decode::DecodeFn;
use crate::errors::Error;

/// Identifier of a protocol layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LayerType(u16);

impl LayerType {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    /// Registered name of the layer type.
    ///
    /// Never fails, unregistered types are named `"unknown"`.
    pub fn name(self) -> &'static str {
        match self {
            LAYER_TYPE_PAYLOAD => "Payload",
            LAYER_TYPE_DECODE_FAILURE => "Decode failure",
            LAYER_TYPE_ZERO => "unknown",
            _ => read_registry()
                .types
                .get(&self)
                .map(|meta| meta.name)
                .unwrap_or("unknown"),
        }
    }

    /// Decoder function registered for this layer type, if any.
    pub fn decoder(self) -> Option<DecodeFn> {
        if self == LAYER_TYPE_PAYLOAD {
            return Some(crate::layers::payload::decode_payload);
        }
        read_registry().types.get(&self).map(|meta| meta.decoder)
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl Serialize for LayerType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// Undecoded or unknown data.
pub const LAYER_TYPE_ZERO: LayerType = LayerType(0);
/// The layer produced when a decoder fails.
pub const LAYER_TYPE_DECODE_FAILURE: LayerType = LayerType(1);
/// Opaque bytes no decoder claimed.
pub const LAYER_TYPE_PAYLOAD: LayerType = LayerType(2);

pub const LAYER_TYPE_ETHERNET: LayerType = LayerType(10);
pub const LAYER_TYPE_DOT1Q: LayerType = LayerType(11);
pub const LAYER_TYPE_ARP: LayerType = LayerType(12);
pub const LAYER_TYPE_PPP: LayerType = LayerType(13);
pub const LAYER_TYPE_PPPOE: LayerType = LayerType(14);
pub const LAYER_TYPE_MPLS: LayerType = LayerType(15);
pub const LAYER_TYPE_IPV4: LayerType = LayerType(20);
pub const LAYER_TYPE_IPV6: LayerType = LayerType(21);
pub const LAYER_TYPE_ICMPV4: LayerType = LayerType(22);
pub const LAYER_TYPE_TCP: LayerType = LayerType(30);
pub const LAYER_TYPE_UDP: LayerType = LayerType(31);

/// First identifier handed out by [`register_layer_type`].
pub const LAYER_TYPE_USER_BASE: u16 = 1000;

struct LayerTypeMetadata {
    name: &'static str,
    decoder: DecodeFn,
}

struct Registry {
    types: HashMap<LayerType, LayerTypeMetadata>,
    next_user_id: u16,
    max_id: u16,
}

lazy_static! {
    static ref LAYER_TYPES: RwLock<Registry> = RwLock::new(Registry {
        types: HashMap::new(),
        next_user_id: LAYER_TYPE_USER_BASE,
        max_id: LAYER_TYPE_PAYLOAD.0,
    });
}

// A panic while holding the lock cannot leave the table half updated, every write is a single
// insert.
fn read_registry() -> std::sync::RwLockReadGuard<'static, Registry> {
    LAYER_TYPES.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_registry() -> std::sync::RwLockWriteGuard<'static, Registry> {
    LAYER_TYPES.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn register_defaults() -> Result<(), Error> {
    lazy_static::initialize(&LAYER_TYPES);

    Ok(())
}

/// Register a new layer type with a fresh identifier.
///
/// Identifiers are handed out starting from [`LAYER_TYPE_USER_BASE`] and are never reused.
pub fn register_layer_type(name: &'static str, decoder: DecodeFn) -> Result<LayerType, Error> {
    let mut registry = write_registry();

    let id = registry.next_user_id;
    if id == u16::MAX {
        return Err(Error::RegisterError(format!(
            "layer type {}: no identifiers left",
            name
        )));
    }
    registry.next_user_id += 1;
    registry.max_id = registry.max_id.max(id);

    let layer_type = LayerType(id);
    registry
        .types
        .insert(layer_type, LayerTypeMetadata { name, decoder });

    Ok(layer_type)
}

/// Register a decoder for a well known layer type identifier.
///
/// The reserved types, identifiers from [`LAYER_TYPE_USER_BASE`] on and identifiers that are
/// already registered are rejected.
pub fn register_layer_type_id(
    layer_type: LayerType,
    name: &'static str,
    decoder: DecodeFn,
) -> Result<(), Error> {
    if layer_type.0 <= LAYER_TYPE_PAYLOAD.0 {
        return Err(Error::RegisterError(format!(
            "layer type {}: {} is reserved",
            name, layer_type.0
        )));
    }
    // Those belong to register_layer_type.
    if layer_type.0 >= LAYER_TYPE_USER_BASE {
        return Err(Error::RegisterError(format!(
            "layer type {}: {} is in the fresh identifier range",
            name, layer_type.0
        )));
    }

    let mut registry = write_registry();
    if registry.types.contains_key(&layer_type) {
        return Err(Error::RegisterError(format!(
            "layer type {}: {} already registered",
            name, layer_type.0
        )));
    }
    registry.max_id = registry.max_id.max(layer_type.0);
    registry
        .types
        .insert(layer_type, LayerTypeMetadata { name, decoder });

    Ok(())
}

/// Largest identifier that was registered so far.
pub fn max_layer_type() -> LayerType {
    LayerType(read_registry().max_id)
}
