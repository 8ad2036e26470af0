// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Namespaces: URI, alias table, authoritative node index and identity allocation.
use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ident::{Identifier, NodeClass, NodeId, QualifiedName};
use crate::node::NodeIndex;

/// One partition of the identity space.
///
/// Holds the slot of every node whose id names this namespace. The address
/// space never stores a node in a namespace other than its id's.
#[derive(Debug)]
pub struct Namespace {
    uri: String,
    index: u16,
    aliases: BTreeMap<String, NodeId>,
    nodes: FxHashMap<NodeId, NodeIndex>,
    reserved: FxHashSet<NodeId>,
    next_numeric: u32,
    // Several types may share a name; the earliest registered one wins lookups.
    types_by_name: FxHashMap<(NodeClass, String), Vec<NodeId>>,
    reference_types_by_inverse_name: FxHashMap<String, Vec<NodeId>>,
}

impl Namespace {
    pub(crate) fn new(uri: impl Into<String>, index: u16, first_numeric_id: u32) -> Self {
        Self {
            uri: uri.into(),
            index,
            aliases: BTreeMap::new(),
            nodes: FxHashMap::default(),
            reserved: FxHashSet::default(),
            next_numeric: first_numeric_id,
            types_by_name: FxHashMap::default(),
            reference_types_by_inverse_name: FxHashMap::default(),
        }
    }

    /// Namespace URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Position in the namespace table.
    #[must_use]
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Number of nodes owned by this namespace.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when a node with this id is registered here.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Adds or replaces an alias.
    pub fn add_alias(&mut self, name: impl Into<String>, target: NodeId) {
        self.aliases.insert(name.into(), target);
    }

    /// Node id an alias stands for.
    #[must_use]
    pub fn resolve_alias(&self, name: &str) -> Option<&NodeId> {
        self.aliases.get(name)
    }

    /// All aliases, sorted by name.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &NodeId)> {
        self.aliases.iter().map(|(name, id)| (name.as_str(), id))
    }

    /// Keeps `id` away from the allocator without creating a node.
    pub fn reserve(&mut self, id: NodeId) {
        self.reserved.insert(id);
    }

    /// Next free numeric id; skips ids that are registered or reserved.
    pub(crate) fn allocate_numeric(&mut self) -> NodeId {
        loop {
            let candidate = NodeId::numeric(self.index, self.next_numeric);
            self.next_numeric = self.next_numeric.wrapping_add(1);
            if !self.is_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// `s=<parent>-<name>` for string parents when free.
    pub(crate) fn derive_child_id(&self, parent: &NodeId, browse_name: &QualifiedName) -> Option<NodeId> {
        let Identifier::String(parent_text) = &parent.identifier else {
            return None;
        };
        if parent.namespace != self.index {
            return None;
        }
        let candidate = NodeId::string(self.index, format!("{parent_text}-{}", browse_name.name));
        (!self.is_taken(&candidate)).then_some(candidate)
    }

    fn is_taken(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id) || self.reserved.contains(id)
    }

    pub(crate) fn slot(&self, id: &NodeId) -> Option<NodeIndex> {
        self.nodes.get(id).copied()
    }

    pub(crate) fn register(&mut self, id: NodeId, slot: NodeIndex) {
        let previous = self.nodes.insert(id, slot);
        debug_assert!(previous.is_none(), "namespace {} registered a node twice", self.index);
    }

    pub(crate) fn unregister(&mut self, id: &NodeId) -> Option<NodeIndex> {
        self.types_by_name.retain(|_, ids| {
            ids.retain(|type_id| type_id != id);
            !ids.is_empty()
        });
        self.reference_types_by_inverse_name.retain(|_, ids| {
            ids.retain(|type_id| type_id != id);
            !ids.is_empty()
        });
        self.nodes.remove(id)
    }

    pub(crate) fn clear_nodes(&mut self) {
        self.nodes.clear();
        self.types_by_name.clear();
        self.reference_types_by_inverse_name.clear();
    }

    pub(crate) fn index_type(&mut self, class: NodeClass, name: &str, id: &NodeId) {
        self.types_by_name
            .entry((class, name.to_owned()))
            .or_default()
            .push(id.clone());
    }

    pub(crate) fn index_inverse_name(&mut self, inverse_name: &str, id: &NodeId) {
        self.reference_types_by_inverse_name
            .entry(inverse_name.to_owned())
            .or_default()
            .push(id.clone());
    }

    pub(crate) fn type_by_name(&self, class: NodeClass, name: &str) -> Option<&NodeId> {
        self.types_by_name.get(&(class, name.to_owned()))?.first()
    }

    pub(crate) fn reference_type_by_inverse_name(&self, name: &str) -> Option<&NodeId> {
        self.reference_types_by_inverse_name.get(name)?.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_skips_registered_and_reserved_ids() {
        let mut ns = Namespace::new("urn:test", 1, 1000);
        ns.register(NodeId::numeric(1, 1000), NodeIndex(0));
        ns.reserve(NodeId::numeric(1, 1001));
        assert_eq!(ns.allocate_numeric(), NodeId::numeric(1, 1002));
        assert_eq!(ns.allocate_numeric(), NodeId::numeric(1, 1003));
    }

    #[test]
    fn derived_ids_follow_string_parents_only() {
        let ns = Namespace::new("urn:test", 1, 1000);
        let name = QualifiedName::new(1, "Speed");
        assert_eq!(
            ns.derive_child_id(&NodeId::string(1, "Pump1"), &name),
            Some(NodeId::string(1, "Pump1-Speed"))
        );
        assert_eq!(ns.derive_child_id(&NodeId::numeric(1, 5), &name), None);
        assert_eq!(ns.derive_child_id(&NodeId::string(2, "Other"), &name), None);
    }

    #[test]
    fn aliases_are_lookups_not_errors() {
        let mut ns = Namespace::new("urn:test", 1, 1000);
        ns.add_alias("Motor", NodeId::numeric(1, 7));
        assert_eq!(ns.resolve_alias("Motor"), Some(&NodeId::numeric(1, 7)));
        assert_eq!(ns.resolve_alias("Nope"), None);
    }

    #[test]
    fn same_named_type_takes_over_after_unregister() {
        let mut ns = Namespace::new("urn:test", 1, 1000);
        let first = NodeId::numeric(1, 10);
        let second = NodeId::numeric(1, 11);
        for (id, slot) in [(&first, 0), (&second, 1)] {
            ns.index_type(NodeClass::ObjectType, "MotorType", id);
            ns.register(id.clone(), NodeIndex(slot));
        }
        assert_eq!(ns.type_by_name(NodeClass::ObjectType, "MotorType"), Some(&first));

        ns.unregister(&first);
        assert_eq!(ns.type_by_name(NodeClass::ObjectType, "MotorType"), Some(&second));
        ns.unregister(&second);
        assert_eq!(ns.type_by_name(NodeClass::ObjectType, "MotorType"), None);
    }
}
