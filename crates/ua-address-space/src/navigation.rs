// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cached per-node navigation: children by name, parent, type definition.
use tracing::warn;

use crate::address_space::AddressSpace;
use crate::ident::{NodeId, QualifiedName};
use crate::node::{ModellingRule, Node};
use crate::reference::{BrowseDirection, Reference};
use crate::standard::reference_types;

impl AddressSpace {
    /// References of `node` whose type is `reference_type` or one of its
    /// subtypes, filtered by direction.
    #[must_use]
    pub fn find_references_ex(
        &self,
        node: &NodeId,
        reference_type: &NodeId,
        direction: BrowseDirection,
    ) -> Vec<Reference> {
        let Some(node) = self.find_node(node) else {
            return Vec::new();
        };
        node.all_references()
            .filter(|reference| direction.matches(reference.is_forward))
            .filter(|reference| self.is_subtype_of(&reference.reference_type, reference_type))
            .cloned()
            .collect()
    }

    /// Targets of forward references of `reference_type` (or a subtype).
    #[must_use]
    pub fn targets_of(&self, node: &NodeId, reference_type: &NodeId) -> Vec<NodeId> {
        self.find_references_ex(node, reference_type, BrowseDirection::Forward)
            .into_iter()
            .map(|reference| reference.target)
            .collect()
    }

    /// Hierarchical children of `node` in reference order, keyed by browse name.
    ///
    /// Cached on the node until its references change.
    #[must_use]
    pub fn children(&self, node: &NodeId) -> Vec<(QualifiedName, NodeId)> {
        let Some(entry) = self.find_node(node) else {
            return Vec::new();
        };
        if self.suspended {
            return self.compute_children(entry);
        }
        entry
            .cache
            .children
            .get_or_init(|| self.compute_children(entry))
            .clone()
    }

    fn compute_children(&self, node: &Node) -> Vec<(QualifiedName, NodeId)> {
        node.all_references()
            .filter(|reference| reference.is_forward)
            .filter(|reference| {
                self.is_subtype_of(
                    &reference.reference_type,
                    &reference_types::HIERARCHICAL_REFERENCES,
                )
            })
            .filter_map(|reference| {
                let child = self.find_node(&reference.target)?;
                Some((child.browse_name().clone(), reference.target.clone()))
            })
            .collect()
    }

    /// Hierarchical child of `parent` whose browse name is `name`.
    ///
    /// The namespace of the browse name is ignored; the first match in
    /// reference order wins. The returned node's [`body`](Node::body) carries
    /// its class.
    #[must_use]
    pub fn child_by_name(&self, parent: &NodeId, name: &str) -> Option<&Node> {
        let child = self
            .children(parent)
            .into_iter()
            .find(|(browse_name, _)| browse_name.name == name)?;
        self.find_node(&child.1)
    }

    /// Hierarchical child matching both namespace and name.
    #[must_use]
    pub fn child_by_qualified_name(&self, parent: &NodeId, name: &QualifiedName) -> Option<&Node> {
        let child = self
            .children(parent)
            .into_iter()
            .find(|(browse_name, _)| browse_name == name)?;
        self.find_node(&child.1)
    }

    /// Resolves a dotted child path such as `Config.Threshold` from `root`.
    #[must_use]
    pub fn descendant_by_path(&self, root: &NodeId, path: &str) -> Option<&Node> {
        let mut current = self.find_node(root)?;
        for segment in path.split('.') {
            current = self.child_by_name(current.node_id(), segment)?;
        }
        Some(current)
    }

    /// Target of the node's inverse Aggregates-class reference.
    ///
    /// When several exist the lowest node id wins.
    #[must_use]
    pub fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        let entry = self.find_node(node)?;
        if self.suspended {
            return self.compute_parent(entry);
        }
        entry
            .cache
            .parent
            .get_or_init(|| self.compute_parent(entry))
            .clone()
    }

    fn compute_parent(&self, node: &Node) -> Option<NodeId> {
        let mut parents: Vec<&NodeId> = node
            .all_references()
            .filter(|reference| !reference.is_forward)
            .filter(|reference| {
                self.is_subtype_of(&reference.reference_type, &reference_types::AGGREGATES)
            })
            .map(|reference| &reference.target)
            .collect();
        parents.sort();
        parents.dedup();
        if parents.len() > 1 {
            warn!(
                node = %node.node_id(),
                count = parents.len(),
                chosen = %parents[0],
                "node has several parents; using the lowest id"
            );
        }
        parents.first().map(|id| (*id).clone())
    }

    /// Target of the node's forward `HasTypeDefinition` reference.
    #[must_use]
    pub fn type_definition_of(&self, node: &NodeId) -> Option<NodeId> {
        let entry = self.find_node(node)?;
        let compute = || {
            entry
                .find_references(&reference_types::HAS_TYPE_DEFINITION, true)
                .first()
                .map(|reference| reference.target.clone())
        };
        if self.suspended {
            return compute();
        }
        entry.cache.type_definition.get_or_init(compute).clone()
    }

    /// Modelling rule attached through a forward `HasModellingRule` reference.
    #[must_use]
    pub fn modelling_rule_of(&self, node: &NodeId) -> Option<ModellingRule> {
        self.find_node(node)?
            .find_references(&reference_types::HAS_MODELLING_RULE, true)
            .iter()
            .find_map(|reference| ModellingRule::from_node_id(&reference.target))
    }

    /// Members of a type or instance: forward Aggregates-class references with
    /// their target, in reference order.
    pub(crate) fn aggregates_of(&self, node: &NodeId) -> Vec<Reference> {
        self.find_references_ex(node, &reference_types::AGGREGATES, BrowseDirection::Forward)
    }

    /// Fills the children cache of `node` and its descendants ahead of use.
    pub(crate) fn prime_child_cache(&self, node: &NodeId) {
        let mut stack = vec![node.clone()];
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for reference in self.aggregates_of(&current) {
                stack.push(reference.target);
            }
            let _ = self.children(&current);
        }
    }
}
