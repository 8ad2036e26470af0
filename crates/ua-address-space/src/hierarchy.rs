// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type hierarchy queries over `HasSubtype` edges.
//!
//! Every type node has at most one supertype. Results of `is_subtype_of`
//! are memoized on the candidate node; memos are dropped when a `HasSubtype`
//! edge changes anywhere.
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::address_space::AddressSpace;
use crate::error::AddressSpaceError;
use crate::ident::{NodeClass, NodeId};
use crate::standard::{data_types, reference_types};
use crate::value::BuiltinType;

impl AddressSpace {
    /// Direct supertype of a type node.
    #[must_use]
    pub fn supertype_of(&self, type_id: &NodeId) -> Option<NodeId> {
        let node = self.find_node(type_id)?;
        if !node.node_class().is_type() {
            return None;
        }
        node.all_references()
            .find(|reference| {
                !reference.is_forward && reference.reference_type == reference_types::HAS_SUBTYPE
            })
            .map(|reference| reference.target.clone())
    }

    /// `type_id` followed by its supertypes up to the root of its kind.
    ///
    /// Stops early on a missing supertype node or a cycle.
    #[must_use]
    pub fn supertype_chain(&self, type_id: &NodeId) -> Vec<NodeId> {
        let mut chain = vec![type_id.clone()];
        let mut seen: FxHashSet<NodeId> = chain.iter().cloned().collect();
        let mut current = type_id.clone();
        while let Some(supertype) = self.supertype_of(&current) {
            if !self.contains(&supertype) {
                break;
            }
            if !seen.insert(supertype.clone()) {
                warn!(type_id = %type_id, at = %supertype, "supertype cycle");
                break;
            }
            chain.push(supertype.clone());
            current = supertype;
        }
        chain
    }

    /// Direct subtypes of a type node.
    #[must_use]
    pub fn subtypes_of(&self, type_id: &NodeId) -> Vec<NodeId> {
        self.find_node(type_id)
            .map(|node| {
                node.find_references(&reference_types::HAS_SUBTYPE, true)
                    .into_iter()
                    .map(|reference| reference.target.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when `candidate` is `base` or derives from it.
    #[must_use]
    pub fn is_subtype_of(&self, candidate: &NodeId, base: &NodeId) -> bool {
        if candidate == base {
            return true;
        }
        let Some(node) = self.find_node(candidate) else {
            return false;
        };
        if let Some(hit) = node.cache.subtype_of.borrow().get(base).copied() {
            return hit;
        }

        let mut seen = FxHashSet::default();
        let mut current = candidate.clone();
        let mut found = false;
        while let Some(supertype) = self.supertype_of(&current) {
            if supertype == *base {
                found = true;
                break;
            }
            if !seen.insert(supertype.clone()) {
                warn!(candidate = %candidate, at = %supertype, "supertype cycle");
                break;
            }
            current = supertype;
        }

        if !self.suspended {
            node.cache
                .subtype_of
                .borrow_mut()
                .insert(base.clone(), found);
        }
        found
    }

    /// Wire-level primitive a data type is encoded as.
    ///
    /// Walks supertypes to the first namespace-0 builtin (ids 1 to 25).
    /// Enumerations encode as `Int32`.
    pub fn basic_encoding_kind(&self, data_type: &NodeId) -> Result<BuiltinType, AddressSpaceError> {
        let node = self
            .find_node(data_type)
            .filter(|node| node.node_class() == NodeClass::DataType)
            .ok_or_else(|| AddressSpaceError::UnresolvedDataType(data_type.clone()))?;
        if let Some(kind) = node.cache.basic_kind.get() {
            return Ok(*kind);
        }
        let kind = self
            .supertype_chain(data_type)
            .iter()
            .find_map(|id| {
                if *id == data_types::ENUMERATION {
                    return Some(BuiltinType::Int32);
                }
                BuiltinType::from_id(id.standard_numeric()?)
            })
            .ok_or_else(|| AddressSpaceError::UnresolvedDataType(data_type.clone()))?;
        if !self.suspended {
            let _ = node.cache.basic_kind.set(kind);
        }
        Ok(kind)
    }
}
