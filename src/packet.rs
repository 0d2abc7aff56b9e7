//! Packet Structure
//!
//! A [`Packet`] runs the decoders over a frame, starting from the decoder of a given layer type
//! and following the [`NextLayer`] each decoder returns. Decoding either happens when the packet
//! is created, or, with [`DecodeOptions::lazy`], one layer at a time whenever a query needs more
//! layers than were decoded so far.
//!
//! Layers are handed out as [`LayerRef`]s, which give access to the decoded layer as well as its
//! contents and payload bytes within the packet.

use core::fmt;
use core::ops::{Deref, Range};

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use lazy_static::lazy_static;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::decode::{DecodeOptions, Decoded, NextLayer};
use crate::errors::Error;
use crate::layer::Layer;
use crate::layer_class::LayerClass;
use crate::layer_type::{LayerType, LAYER_TYPE_PAYLOAD};
use crate::layers::payload::{decode_payload, DecodeFailure};
use crate::types::LinkType;

/// Most layers a single packet decodes to, anything deeper ends in a decode failure.
pub const MAX_LAYERS: usize = 128;

lazy_static! {
    static ref LINK_TYPES_MAP: RwLock<HashMap<LinkType, LayerType>> = RwLock::new(HashMap::new());
}

/// Register the layer type decoding frames of a given link type.
///
/// Link layer protocols register themselves, e.g. Ethernet for
/// [`LINK_TYPE_ETHERNET`][`crate::types::LINK_TYPE_ETHERNET`].
pub fn register_link_type(link_type: LinkType, layer_type: LayerType) -> Result<(), Error> {
    let mut map = LINK_TYPES_MAP
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&link_type) {
        return Err(Error::RegisterError(format!("link type: {}", link_type.0)));
    }
    map.insert(link_type, layer_type);

    Ok(())
}

/// The layer type registered for `link_type`.
pub fn link_type_layer(link_type: LinkType) -> Option<LayerType> {
    LINK_TYPES_MAP
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&link_type)
        .copied()
}

#[derive(Clone)]
struct DecodedLayer {
    layer: Arc<dyn Layer>,
    contents: Range<usize>,
    payload: Range<usize>,
}

// Where decoding resumes: the decoder to run and the bytes to run it on.
#[derive(Debug)]
struct Cursor {
    next: LayerType,
    range: Range<usize>,
}

#[derive(Default)]
struct DecodeState {
    layers: Vec<DecodedLayer>,
    link: Option<usize>,
    network: Option<usize>,
    transport: Option<usize>,
    application: Option<usize>,
    failure: Option<usize>,
    truncated: bool,
    cursor: Option<Cursor>,
}

impl DecodeState {
    fn new(first: LayerType, len: usize) -> Self {
        Self {
            cursor: Some(Cursor {
                next: first,
                range: 0..len,
            }),
            ..Default::default()
        }
    }

    fn decode_all(&mut self, data: &[u8]) {
        while self.decode_next(data) {}
    }

    // Decodes one more layer. Returns `false` once decoding is over.
    fn decode_next(&mut self, data: &[u8]) -> bool {
        let Cursor { next, range } = match self.cursor.take() {
            Some(cursor) => cursor,
            None => return false,
        };
        let Some(bytes) = data.get(range.clone()) else {
            return false;
        };

        if self.layers.len() >= MAX_LAYERS {
            let e = Error::malformed(next, format!("more than {} layers", MAX_LAYERS));
            self.push_failure(e, range);
            return true;
        }

        let decode = match next.decoder() {
            Some(decode) => decode,
            None => {
                log_debug!(
                    "no decoder for {:?}, keeping {} bytes as payload",
                    next,
                    bytes.len()
                );
                decode_payload
            }
        };

        match decode(bytes) {
            Ok(decoded) => self.push_decoded(next, decoded, range),
            Err(e) => {
                log_warn!("decoding {} failed: {}", next, e);
                self.push_failure(e, range);
            }
        }

        true
    }

    fn push_decoded(&mut self, decoding: LayerType, decoded: Decoded, range: Range<usize>) {
        let Decoded {
            layer,
            header,
            payload,
            next,
            truncated,
        } = decoded;

        let available = range.len();
        if header > available || payload.start > payload.end || payload.end > available {
            let e = Error::InvalidSpan {
                layer: decoding,
                header,
                payload_end: payload.end,
                available,
            };
            self.push_failure(e, range);
            return;
        }

        let base = range.start;
        let contents = base..base + header;
        let payload = base + payload.start..base + payload.end;
        self.truncated |= truncated;

        log_trace!(
            "decoded {} at {:?}, payload {:?}, next {:?}",
            layer.name(),
            contents,
            payload,
            next
        );

        self.push(Arc::from(layer), contents, payload.clone());

        if payload.is_empty() {
            return;
        }
        self.cursor = match next {
            NextLayer::Decode(next) => Some(Cursor {
                next,
                range: payload,
            }),
            NextLayer::Payload => Some(Cursor {
                next: LAYER_TYPE_PAYLOAD,
                range: payload,
            }),
            NextLayer::Done => None,
            NextLayer::Unsupported(value) => {
                let e = Error::UnsupportedNextLayer {
                    layer: decoding,
                    value,
                };
                log_debug!("{}", e);
                self.push_failure(e, payload);
                None
            }
        };
    }

    fn push_failure(&mut self, error: Error, range: Range<usize>) {
        let end = range.end;
        self.push(Arc::new(DecodeFailure::new(error)), range, end..end);
    }

    fn push(&mut self, layer: Arc<dyn Layer>, contents: Range<usize>, payload: Range<usize>) {
        let index = self.layers.len();
        if layer.as_link().is_some() {
            self.link = Some(index);
        }
        if layer.as_network().is_some() {
            self.network = Some(index);
        }
        if layer.as_transport().is_some() {
            self.transport = Some(index);
        }
        if layer.as_application().is_some() {
            self.application = Some(index);
        }
        if layer.as_error().is_some() {
            self.failure = Some(index);
        }
        self.layers.push(DecodedLayer {
            layer,
            contents,
            payload,
        });
    }
}

/// A decoded (or, lazily, to be decoded) packet.
///
/// With [`DecodeOptions::no_copy`] the packet borrows the bytes it was created from, otherwise it
/// decodes a private copy. Queries never fail: bytes that cannot be decoded end up in a
/// [`DecodeFailure`] layer, reachable through [`Packet::error_layer`], and every layer decoded
/// before it stays available.
///
/// Decoding progress sits behind a mutex, so a lazy packet can be queried from several threads.
pub struct Packet<'a> {
    data: Cow<'a, [u8]>,
    options: DecodeOptions,
    state: Mutex<DecodeState>,
}

impl<'a> Packet<'a> {
    /// Create a Packet from a u8 buffer, decoding it with the decoder registered for `first`.
    ///
    /// This is the main API function. [`register_defaults`][`crate::register_defaults`] has to
    /// be called before, otherwise the whole buffer is kept as a single `Payload` layer.
    pub fn new(data: &'a [u8], first: LayerType, options: DecodeOptions) -> Self {
        let data = if options.no_copy {
            Cow::Borrowed(data)
        } else {
            Cow::Owned(data.to_vec())
        };

        Self::with_data(data, first, options)
    }

    /// Create a Packet for a frame of the given link type.
    ///
    /// Frames of unregistered link types are kept as a single `Payload` layer.
    pub fn from_link_type(data: &'a [u8], link_type: LinkType, options: DecodeOptions) -> Self {
        let first = link_type_layer(link_type).unwrap_or(LAYER_TYPE_PAYLOAD);

        Self::new(data, first, options)
    }

    fn with_data(data: Cow<'a, [u8]>, first: LayerType, options: DecodeOptions) -> Self {
        let mut packet = Self {
            state: Mutex::new(DecodeState::new(first, data.len())),
            data,
            options,
        };

        if !options.lazy {
            let Packet { data, state, .. } = &mut packet;
            state
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .decode_all(data.as_ref());
        }

        packet
    }

    fn lock(&self) -> MutexGuard<'_, DecodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn layer_ref(&self, decoded: &DecodedLayer) -> LayerRef<'_> {
        LayerRef {
            data: self.data.as_ref(),
            decoded: decoded.clone(),
        }
    }

    /// The bytes of the packet.
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// All layers of the packet, in the order they appear on the wire.
    pub fn layers(&self) -> Vec<LayerRef<'_>> {
        let mut state = self.lock();
        state.decode_all(self.data.as_ref());

        state.layers.iter().map(|l| self.layer_ref(l)).collect()
    }

    /// The first layer of type `t`.
    ///
    /// A lazy packet decodes only up to the first such layer.
    pub fn layer(&self, t: LayerType) -> Option<LayerRef<'_>> {
        self.find(|candidate| candidate == t)
    }

    /// The first layer whose type belongs to `class`.
    ///
    /// A lazy packet decodes only up to the first such layer.
    pub fn layer_class<C: LayerClass + ?Sized>(&self, class: &C) -> Option<LayerRef<'_>> {
        self.find(|candidate| class.contains(candidate))
    }

    fn find(&self, matches: impl Fn(LayerType) -> bool) -> Option<LayerRef<'_>> {
        let mut state = self.lock();
        let mut checked = 0;
        loop {
            if let Some(found) = state.layers[checked..]
                .iter()
                .find(|l| matches(l.layer.layer_type()))
            {
                return Some(self.layer_ref(found));
            }
            checked = state.layers.len();

            log_debug!("resuming decode after {} layers", checked);
            if !state.decode_next(self.data.as_ref()) {
                return None;
            }
        }
    }

    // The capability slots are only final once everything is decoded.
    fn slot(&self, pick: impl Fn(&DecodeState) -> Option<usize>) -> Option<LayerRef<'_>> {
        let mut state = self.lock();
        state.decode_all(self.data.as_ref());

        pick(&state).map(|index| self.layer_ref(&state.layers[index]))
    }

    /// The last layer implementing [`LinkLayer`][`crate::LinkLayer`].
    pub fn link_layer(&self) -> Option<LayerRef<'_>> {
        self.slot(|state| state.link)
    }

    /// The last layer implementing [`NetworkLayer`][`crate::NetworkLayer`].
    pub fn network_layer(&self) -> Option<LayerRef<'_>> {
        self.slot(|state| state.network)
    }

    /// The last layer implementing [`TransportLayer`][`crate::TransportLayer`].
    pub fn transport_layer(&self) -> Option<LayerRef<'_>> {
        self.slot(|state| state.transport)
    }

    /// The last layer implementing [`ApplicationLayer`][`crate::ApplicationLayer`].
    pub fn application_layer(&self) -> Option<LayerRef<'_>> {
        self.slot(|state| state.application)
    }

    /// The decode failure that ended decoding, if any.
    pub fn error_layer(&self) -> Option<LayerRef<'_>> {
        self.slot(|state| state.failure)
    }

    /// Whether some layer declared more bytes than the packet holds.
    pub fn is_truncated(&self) -> bool {
        let mut state = self.lock();
        state.decode_all(self.data.as_ref());

        state.truncated
    }
}

impl Packet<'static> {
    /// Create a Packet owning `data`.
    ///
    /// The buffer is moved into the packet, `options.no_copy` makes no difference here.
    pub fn from_vec(data: Vec<u8>, first: LayerType, options: DecodeOptions) -> Self {
        Self::with_data(Cow::Owned(data), first, options)
    }
}

impl fmt::Debug for Packet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Packet")
            .field("options", &self.options)
            .field("len", &self.data.len())
            .field(
                "layers",
                &state.layers.iter().map(|l| &l.layer).collect::<Vec<_>>(),
            )
            .field("truncated", &state.truncated)
            .field("resume", &state.cursor)
            .finish()
    }
}

impl Serialize for Packet<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let layers = self.layers();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut map = serializer.serialize_map(Some(layers.len()))?;
        for layer in &layers {
            let name = layer.short_name();
            let repeat = seen.entry(name).or_default();
            // A repeated layer, as in Q-in-Q, is keyed "dot1q.1", "dot1q.2" and on.
            match *repeat {
                0 => map.serialize_entry(name, layer.layer())?,
                n => map.serialize_entry(&format!("{}.{}", name, n), layer.layer())?,
            }
            *repeat += 1;
        }
        map.end()
    }
}

/// A decoded layer together with the packet bytes it covers.
#[derive(Clone)]
pub struct LayerRef<'p> {
    data: &'p [u8],
    decoded: DecodedLayer,
}

impl<'p> LayerRef<'p> {
    pub fn layer(&self) -> &dyn Layer {
        &*self.decoded.layer
    }

    /// The bytes this layer was decoded from, its header.
    pub fn contents(&self) -> &'p [u8] {
        self.data
            .get(self.decoded.contents.clone())
            .unwrap_or_default()
    }

    /// The bytes this layer carries, handed to the next decoder.
    pub fn payload(&self) -> &'p [u8] {
        self.data
            .get(self.decoded.payload.clone())
            .unwrap_or_default()
    }

    /// Application data, for layers implementing [`ApplicationLayer`][`crate::ApplicationLayer`].
    pub fn application_data(&self) -> Option<&'p [u8]> {
        let contents = self.contents();
        self.layer()
            .as_application()
            .map(|app| app.application_data(contents))
    }

    /// The failure, for the [`DecodeFailure`] layer.
    pub fn error(&self) -> Option<&Error> {
        self.layer().as_error().map(|failure| failure.error())
    }
}

impl Deref for LayerRef<'_> {
    type Target = dyn Layer;

    fn deref(&self) -> &Self::Target {
        &*self.decoded.layer
    }
}

impl fmt::Debug for LayerRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRef")
            .field("layer", &self.decoded.layer)
            .field("contents", &self.decoded.contents)
            .field("payload", &self.decoded.payload)
            .finish()
    }
}
