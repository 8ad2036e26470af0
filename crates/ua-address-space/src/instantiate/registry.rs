// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Original-to-clone bookkeeping for one instantiation call.
use rustc_hash::FxHashMap;

use crate::ident::NodeId;

/// Maps every original visited during cloning to its clone.
///
/// Several originals may share one clone: each type level maps to the
/// instance root, and a member re-declared by a subtype shadows the base
/// declaration of the same name.
#[derive(Debug, Default)]
pub(crate) struct CloneRegistry {
    pairs: Vec<(NodeId, NodeId)>,
    index: FxHashMap<NodeId, NodeId>,
    created: Vec<NodeId>,
}

impl CloneRegistry {
    /// Records a freshly created clone of `original`.
    pub(crate) fn record(&mut self, original: NodeId, clone: NodeId) {
        self.created.push(clone.clone());
        self.link(original, clone);
    }

    /// Maps `original` to an existing clone.
    pub(crate) fn shadow(&mut self, original: NodeId, clone: NodeId) {
        self.link(original, clone);
    }

    /// Marks a node created by the call that has no original.
    pub(crate) fn created(&mut self, clone: NodeId) {
        self.created.push(clone);
    }

    fn link(&mut self, original: NodeId, clone: NodeId) {
        self.index
            .entry(original.clone())
            .or_insert_with(|| clone.clone());
        self.pairs.push((original, clone));
    }

    pub(crate) fn clone_of(&self, original: &NodeId) -> Option<&NodeId> {
        self.index.get(original)
    }

    pub(crate) fn pairs(&self) -> &[(NodeId, NodeId)] {
        &self.pairs
    }

    /// Nodes created by the call, in creation order.
    pub(crate) fn created_nodes(&self) -> &[NodeId] {
        &self.created
    }
}
