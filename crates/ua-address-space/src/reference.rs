// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed directional edges and their normalization.
use std::fmt;

use rustc_hash::FxHashSet;

use crate::address_space::AddressSpace;
use crate::error::AddressSpaceError;
use crate::ident::{NodeClass, NodeId, QualifiedName};

/// A typed, directional edge as stored in a node's reference index.
///
/// Two references are the same edge when all three fields match. The mirror
/// of `A --(T, forward)--> B` stored on `B` is `(T, inverse, A)`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Reference {
    /// Reference type node id.
    pub reference_type: NodeId,
    /// Direction as seen from the node holding the reference.
    pub is_forward: bool,
    /// The node at the other end.
    pub target: NodeId,
}

impl Reference {
    /// Builds a reference.
    #[must_use]
    pub const fn new(reference_type: NodeId, is_forward: bool, target: NodeId) -> Self {
        Self {
            reference_type,
            is_forward,
            target,
        }
    }

    /// Forward reference to `target`.
    #[must_use]
    pub const fn forward(reference_type: NodeId, target: NodeId) -> Self {
        Self::new(reference_type, true, target)
    }

    /// Inverse reference to `target`.
    #[must_use]
    pub const fn inverse(reference_type: NodeId, target: NodeId) -> Self {
        Self::new(reference_type, false, target)
    }

    /// The same edge as held by `self.target`, pointing back at `source`.
    #[must_use]
    pub fn mirror(&self, source: &NodeId) -> Self {
        Self::new(self.reference_type.clone(), !self.is_forward, source.clone())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.is_forward { "->" } else { "<-" };
        write!(f, "[{}] {arrow} {}", self.reference_type, self.target)
    }
}

/// Insertion-ordered set of references held by one node.
#[derive(Debug, Default, Clone)]
pub(crate) struct ReferenceIndex {
    entries: Vec<Reference>,
    keys: FxHashSet<Reference>,
}

impl ReferenceIndex {
    /// Inserts `reference`; returns false when the edge is already present.
    pub(crate) fn insert(&mut self, reference: Reference) -> bool {
        if !self.keys.insert(reference.clone()) {
            return false;
        }
        self.entries.push(reference);
        true
    }

    pub(crate) fn remove(&mut self, reference: &Reference) -> bool {
        if !self.keys.remove(reference) {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|entry| entry != reference);
        debug_assert_eq!(
            before - 1,
            self.entries.len(),
            "reference index desync while removing {reference}"
        );
        true
    }

    pub(crate) fn contains(&self, reference: &Reference) -> bool {
        self.keys.contains(reference)
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, Reference> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn to_vec(&self) -> Vec<Reference> {
        self.entries.clone()
    }
}

/// How a caller names a reference type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ReferenceTypeRef {
    /// By node id.
    Id(NodeId),
    /// By browse name or inverse name, optionally `n:`-qualified.
    Name(String),
}

impl From<NodeId> for ReferenceTypeRef {
    fn from(value: NodeId) -> Self {
        Self::Id(value)
    }
}

impl From<&NodeId> for ReferenceTypeRef {
    fn from(value: &NodeId) -> Self {
        Self::Id(value.clone())
    }
}

impl From<&str> for ReferenceTypeRef {
    fn from(value: &str) -> Self {
        Self::Name(value.to_owned())
    }
}

impl From<String> for ReferenceTypeRef {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl fmt::Display for ReferenceTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => id.fmt(f),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Caller-facing description of a reference, before normalization.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReferenceSpec {
    /// Reference type by id, browse name or inverse name.
    pub reference_type: ReferenceTypeRef,
    /// Direction; defaults to forward.
    pub is_forward: bool,
    /// The node at the other end.
    pub target: NodeId,
}

impl ReferenceSpec {
    /// Forward reference of the given type to `target`.
    pub fn new(reference_type: impl Into<ReferenceTypeRef>, target: NodeId) -> Self {
        Self {
            reference_type: reference_type.into(),
            is_forward: true,
            target,
        }
    }

    /// Same spec with the direction flipped to inverse.
    pub fn inverse(mut self) -> Self {
        self.is_forward = false;
        self
    }

    /// Same spec with an explicit direction.
    pub fn with_forward(mut self, is_forward: bool) -> Self {
        self.is_forward = is_forward;
        self
    }
}

impl From<Reference> for ReferenceSpec {
    fn from(value: Reference) -> Self {
        Self {
            reference_type: ReferenceTypeRef::Id(value.reference_type),
            is_forward: value.is_forward,
            target: value.target,
        }
    }
}

/// Direction filter for browse and reference queries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum BrowseDirection {
    /// Forward references only.
    #[default]
    Forward,
    /// Inverse references only.
    Inverse,
    /// Both directions.
    Both,
    /// Out-of-range value received from a caller.
    Invalid,
}

impl BrowseDirection {
    /// Decodes the protocol's numeric encoding; values above 2 are `Invalid`.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Forward,
            1 => Self::Inverse,
            2 => Self::Both,
            _ => Self::Invalid,
        }
    }

    /// True when a reference with the given direction passes this filter.
    #[must_use]
    pub const fn matches(self, is_forward: bool) -> bool {
        match self {
            Self::Forward => is_forward,
            Self::Inverse => !is_forward,
            Self::Both => true,
            Self::Invalid => false,
        }
    }
}

impl AddressSpace {
    /// Resolves the reference type of `spec` and returns the canonical edge.
    ///
    /// Naming the type by its inverse name flips the direction. While
    /// back-reference propagation is suspended an unknown type *id* is kept as
    /// is and checked by [`AddressSpace::resume_back_references`].
    pub fn normalize_reference(&self, spec: ReferenceSpec) -> Result<Reference, AddressSpaceError> {
        let ReferenceSpec {
            reference_type,
            is_forward,
            target,
        } = spec;
        match reference_type {
            ReferenceTypeRef::Id(id) => {
                let resolved = self
                    .find_node(&id)
                    .is_some_and(|node| node.node_class() == NodeClass::ReferenceType);
                if !resolved && !self.is_suspended() {
                    return Err(AddressSpaceError::UnknownReferenceType(id.to_string()));
                }
                Ok(Reference::new(id, is_forward, target))
            }
            ReferenceTypeRef::Name(name) => {
                if let Some(node) = self.find_reference_type(&name) {
                    return Ok(Reference::new(node.node_id().clone(), is_forward, target));
                }
                if let Some(node) = self.find_reference_type_by_inverse_name(&name) {
                    return Ok(Reference::new(node.node_id().clone(), !is_forward, target));
                }
                Err(AddressSpaceError::UnknownReferenceType(name))
            }
        }
    }

    /// Name of the opposite direction of a reference type.
    ///
    /// Given a browse name, returns the inverse name; given an inverse name,
    /// returns the browse name. Symmetric types map to themselves.
    pub fn inverse_reference_type(&self, name: &str) -> Option<String> {
        if let Some(node) = self.find_reference_type(name) {
            let attrs = node.as_reference_type()?;
            return match &attrs.inverse_name {
                Some(inverse) => Some(inverse.text.clone()),
                None if attrs.symmetric => Some(node.browse_name().name.clone()),
                None => None,
            };
        }
        self.find_reference_type_by_inverse_name(name)
            .map(|node| node.browse_name().name.clone())
    }

    pub(crate) fn split_qualified(name: &str) -> (Option<u16>, QualifiedName) {
        let qualified = QualifiedName::parse(name);
        if name.contains(':') && qualified.name != name {
            (Some(qualified.namespace_index), qualified)
        } else {
            (None, qualified)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_swaps_direction_and_endpoint() {
        let a = NodeId::numeric(1, 1);
        let b = NodeId::numeric(1, 2);
        let forward = Reference::forward(NodeId::numeric(0, 47), b);
        let mirror = forward.mirror(&a);
        assert!(!mirror.is_forward);
        assert_eq!(mirror.target, a);
        assert_eq!(mirror.reference_type, forward.reference_type);
    }

    #[test]
    fn index_rejects_duplicates_and_keeps_order() {
        let mut index = ReferenceIndex::default();
        let r1 = Reference::forward(NodeId::numeric(0, 47), NodeId::numeric(1, 5));
        let r2 = Reference::forward(NodeId::numeric(0, 46), NodeId::numeric(1, 4));
        assert!(index.insert(r1.clone()));
        assert!(index.insert(r2.clone()));
        assert!(!index.insert(r1.clone()));
        assert_eq!(index.to_vec(), vec![r1.clone(), r2.clone()]);
        assert!(index.remove(&r1));
        assert!(!index.remove(&r1));
        assert_eq!(index.len(), 1);
        assert!(index.contains(&r2));
    }

    #[test]
    fn raw_direction_decodes() {
        assert_eq!(BrowseDirection::from_raw(2), BrowseDirection::Both);
        assert_eq!(BrowseDirection::from_raw(7), BrowseDirection::Invalid);
        assert!(!BrowseDirection::Invalid.matches(true));
        assert!(BrowseDirection::Inverse.matches(false));
    }
}
