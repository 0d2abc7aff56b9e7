//! 'Layer' trait
//!
//! [`Layer`] trait is central to [`burin`][`crate`]. All the decoders for individual protocols
//! produce a value implementing the `Layer` trait. On top of it, a layer may implement one or more
//! of the narrower capabilities: [`LinkLayer`], [`NetworkLayer`], [`TransportLayer`],
//! [`ApplicationLayer`] and [`ErrorLayer`]. The capabilities of a layer are fixed by its type and
//! are reached through the `as_*` accessors of the `Layer` trait.

use core::any::Any;
use core::fmt::Debug;

use erased_serde::serialize_trait_object;

use crate::errors::Error;
use crate::flows::Flow;
use crate::layer_type::LayerType;

/// Access to a value as [`Any`], for downcasting `dyn Layer` to the concrete layer.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `Layer` Trait defines a 'Layer' in a Packet
///
/// A layer only holds the decoded fields. The bytes it was decoded from (its contents) and the
/// bytes it carries (its payload) live in the [`Packet`][`crate::Packet`] and are reached through
/// a [`LayerRef`][`crate::LayerRef`].
pub trait Layer: AsAny + Send + Sync + Debug + erased_serde::Serialize {
    /// Type of this layer.
    fn layer_type(&self) -> LayerType;

    /// Short name for the given layer, used as key when serializing a packet.
    fn short_name(&self) -> &'static str;

    /// Name for the given layer.
    fn name(&self) -> &'static str {
        self.layer_type().name()
    }

    fn as_link(&self) -> Option<&dyn LinkLayer> {
        None
    }

    fn as_network(&self) -> Option<&dyn NetworkLayer> {
        None
    }

    fn as_transport(&self) -> Option<&dyn TransportLayer> {
        None
    }

    fn as_application(&self) -> Option<&dyn ApplicationLayer> {
        None
    }

    fn as_error(&self) -> Option<&dyn ErrorLayer> {
        None
    }
}

serialize_trait_object!(Layer);

impl dyn Layer {
    /// Downcast to the concrete layer, e.g. `layer.downcast_ref::<TCP>()`.
    pub fn downcast_ref<T: Layer>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Layer>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// A layer addressing hardware endpoints (Ethernet, PPP).
pub trait LinkLayer: Layer {
    fn link_flow(&self) -> Flow;
}

/// A layer addressing network endpoints (IPv4, IPv6).
pub trait NetworkLayer: Layer {
    fn network_flow(&self) -> Flow;
}

/// A layer addressing ports (TCP, UDP).
pub trait TransportLayer: Layer {
    fn transport_flow(&self) -> Flow;
}

/// A layer carrying application data.
pub trait ApplicationLayer: Layer {
    /// The application data within this layer's `contents`.
    fn application_data<'b>(&self, contents: &'b [u8]) -> &'b [u8] {
        contents
    }
}

/// A decode failure recorded in place of a layer.
pub trait ErrorLayer: Layer {
    fn error(&self) -> &Error;
}
