//! Layer classes: sets of layer types.
//!
//! A [`LayerClass`] answers "is this one of the types I am interested in". Two implementations
//! with identical behavior exist. [`LayerClassSlice`] is a table indexed by the layer type
//! identifier, which is the fastest to query but takes memory proportional to the largest
//! identifier in the set. [`LayerClassMap`] is a hash set, taking memory proportional to the
//! number of types. [`new_layer_class`] picks one based on the identifiers involved.

use std::collections::HashSet;

use crate::layer_type::LayerType;

/// Largest identifier [`new_layer_class`] still builds a [`LayerClassSlice`] for.
pub const MAX_SLICE_LAYER_TYPE: u16 = 2000;

/// A set of [`LayerType`]s.
pub trait LayerClass: Send + Sync {
    fn contains(&self, t: LayerType) -> bool;

    /// Members of the class, in increasing order.
    fn layer_types(&self) -> Vec<LayerType>;
}

impl LayerClass for LayerType {
    fn contains(&self, t: LayerType) -> bool {
        *self == t
    }

    fn layer_types(&self) -> Vec<LayerType> {
        vec![*self]
    }
}

/// A [`LayerClass`] backed by a table indexed by the layer type identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerClassSlice(Vec<bool>);

impl LayerClassSlice {
    pub fn new(types: &[LayerType]) -> Self {
        let len = types.iter().map(|t| t.id() as usize + 1).max().unwrap_or(0);
        let mut table = vec![false; len];
        for t in types {
            table[t.id() as usize] = true;
        }
        Self(table)
    }
}

impl LayerClass for LayerClassSlice {
    #[inline]
    fn contains(&self, t: LayerType) -> bool {
        self.0.get(t.id() as usize).copied().unwrap_or(false)
    }

    fn layer_types(&self) -> Vec<LayerType> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, member)| **member)
            .map(|(id, _)| LayerType::new(id as u16))
            .collect()
    }
}

/// A [`LayerClass`] backed by a hash set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerClassMap(HashSet<LayerType>);

impl LayerClassMap {
    pub fn new(types: &[LayerType]) -> Self {
        Self(types.iter().copied().collect())
    }
}

impl LayerClass for LayerClassMap {
    #[inline]
    fn contains(&self, t: LayerType) -> bool {
        self.0.contains(&t)
    }

    fn layer_types(&self) -> Vec<LayerType> {
        let mut types: Vec<_> = self.0.iter().copied().collect();
        types.sort();
        types
    }
}

/// Builds the layer class best suited for `types`.
///
/// Small identifiers get a [`LayerClassSlice`], anything above [`MAX_SLICE_LAYER_TYPE`] a
/// [`LayerClassMap`].
pub fn new_layer_class(types: &[LayerType]) -> Box<dyn LayerClass> {
    if types.iter().any(|t| t.id() > MAX_SLICE_LAYER_TYPE) {
        Box::new(LayerClassMap::new(types))
    } else {
        Box::new(LayerClassSlice::new(types))
    }
}
