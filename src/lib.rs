//! Burin: layered, lazy and zero-copy packet decoding.
//!
//! A Basic unit in burin is a [`Packet`], a struct representing a frame captured from the wire,
//! decoded into a sequence of [`Layer`]s. Each protocol is decoded by a plain function registered
//! for its [`LayerType`]; a decoder returns the decoded layer and the layer type to decode next.
//!
//! Decoding is either done when the packet is created or, with [`DecodeOptions::LAZY`], one layer
//! at a time as queries need them. With [`DecodeOptions::NO_COPY`] the packet decodes the
//! caller's bytes in place instead of a private copy.
//!
//! ```rust
//! use burin::layers::tcp::TCP;
//! use burin::{DecodeOptions, Packet, LAYER_TYPE_ETHERNET, LAYER_TYPE_TCP};
//!
//! let _ = burin::register_defaults();
//!
//! let bytes = hex::decode("00e08100b02800096b8850ef08004500002a0001000040060000c0a80001c0a80002c5f70050000000000000000050180000000000000102").unwrap();
//! let packet = Packet::new(&bytes, LAYER_TYPE_ETHERNET, DecodeOptions::LAZY);
//!
//! let tcp = packet.layer(LAYER_TYPE_TCP).unwrap();
//! assert_eq!(tcp.downcast_ref::<TCP>().unwrap().dst_port(), 80);
//! assert_eq!(
//!     packet.transport_layer().map(|l| l.as_transport().unwrap().transport_flow().to_string()),
//!     Some("50679->80".to_string())
//! );
//! ```

#[macro_use]
mod cfg_macros;

pub mod decode;
pub mod errors;
pub mod flows;
pub mod layer;
pub mod layer_class;
pub mod layer_type;
pub mod layers;
pub mod packet;
pub mod types;

#[doc(inline)]
pub use errors::Error;

#[doc(inline)]
pub use layer::{ApplicationLayer, ErrorLayer, Layer, LinkLayer, NetworkLayer, TransportLayer};

#[doc(inline)]
pub use layer_type::*;

#[doc(inline)]
pub use decode::{DecodeFn, DecodeOptions, Decoded, NextLayer};

#[doc(inline)]
pub use packet::{register_link_type, LayerRef, Packet};

#[doc(inline)]
pub use flows::{Endpoint, EndpointType, Flow};

#[doc(inline)]
pub use layer_class::{new_layer_class, LayerClass, LayerClassMap, LayerClassSlice};

#[doc(inline)]
pub use types::LinkType;

include!(concat!(env!("OUT_DIR"), "/register_defaults.rs"));
