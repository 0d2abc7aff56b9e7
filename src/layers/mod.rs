//! Burin Layers
//!
//! Each module holds the decoder of one protocol and registers it, together with its entries in
//! the dispatch tables of the protocols carrying it, from its own `register_defaults`. Those are
//! all called by [`crate::register_defaults`].
//!
//! Layers defined outside the crate do the same through the public `register_*` functions, e.g.
//! [`udp::register_app`] with a layer type obtained from
//! [`register_layer_type`][`crate::layer_type::register_layer_type`].

pub mod arp;
pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod ipv6;
pub mod mpls;
pub mod payload;
pub mod ppp;
pub mod pppoe;
pub mod tcp;
pub mod udp;
