// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural mutation: node creation and deletion, reference add/remove,
//! and the bulk-load mode that defers back-references.
use tracing::{debug, instrument, warn};

use crate::address_space::AddressSpace;
use crate::error::AddressSpaceError;
use crate::ident::{LocalizedText, NodeClass, NodeId, QualifiedName};
use crate::model_change::ModelChangeVerb;
use crate::node::{
    DataTypeAttributes, MethodAttributes, ModellingRule, Node, NodeBody, NodeIndex,
    ObjectAttributes, ObjectTypeAttributes, ReferenceTypeAttributes, VariableAttributes,
    VariableTypeAttributes, ViewAttributes,
};
use crate::reference::{Reference, ReferenceSpec};
use crate::standard::{data_types, object_types, reference_types, variable_types};
use crate::value::Variant;

/// Hierarchical link from a new node up to its parent.
///
/// Stored on the new node as an inverse reference of `reference_type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentLink {
    /// Hierarchical reference type, e.g. `HasComponent`.
    pub reference_type: NodeId,
    /// The parent node.
    pub parent: NodeId,
}

impl ParentLink {
    /// `parent --HasComponent--> node`.
    #[must_use]
    pub const fn component_of(parent: NodeId) -> Self {
        Self {
            reference_type: reference_types::HAS_COMPONENT,
            parent,
        }
    }

    /// `parent --HasProperty--> node`.
    #[must_use]
    pub const fn property_of(parent: NodeId) -> Self {
        Self {
            reference_type: reference_types::HAS_PROPERTY,
            parent,
        }
    }

    /// `parent --Organizes--> node`.
    #[must_use]
    pub const fn organized_by(parent: NodeId) -> Self {
        Self {
            reference_type: reference_types::ORGANIZES,
            parent,
        }
    }
}

/// Description of a node to create with [`AddressSpace::add_node`].
#[derive(Clone, Debug)]
pub struct NewNode {
    /// Explicit id; allocated when absent.
    pub node_id: Option<NodeId>,
    /// Browse name.
    pub browse_name: QualifiedName,
    /// Display name; defaults to the browse name.
    pub display_name: Option<LocalizedText>,
    /// Description.
    pub description: Option<LocalizedText>,
    /// Class-specific attributes.
    pub body: NodeBody,
    /// Link to the parent.
    pub parent: Option<ParentLink>,
    /// Type definition of objects and variables; defaulted by class.
    pub type_definition: Option<NodeId>,
    /// Supertype of type nodes; defaulted by class.
    pub subtype_of: Option<NodeId>,
    /// Modelling rule for instance declarations.
    pub modelling_rule: Option<ModellingRule>,
    /// Node this one is an event source of.
    pub event_source_of: Option<NodeId>,
    /// Node this one is a notifier of.
    pub notifier_of: Option<NodeId>,
    /// Additional references declared by the new node.
    pub references: Vec<ReferenceSpec>,
    /// Create a `NodeVersion` property tracking model changes.
    pub node_version: bool,
}

impl NewNode {
    /// Node with the given name and body and no links.
    pub fn new(browse_name: QualifiedName, body: NodeBody) -> Self {
        Self {
            node_id: None,
            browse_name,
            display_name: None,
            description: None,
            body,
            parent: None,
            type_definition: None,
            subtype_of: None,
            modelling_rule: None,
            event_source_of: None,
            notifier_of: None,
            references: Vec::new(),
            node_version: false,
        }
    }

    /// Object.
    pub fn object(browse_name: QualifiedName) -> Self {
        Self::new(browse_name, NodeBody::Object(ObjectAttributes::default()))
    }

    /// Scalar variable of `data_type`.
    pub fn variable(browse_name: QualifiedName, data_type: NodeId) -> Self {
        Self::new(browse_name, NodeBody::Variable(VariableAttributes::new(data_type)))
    }

    /// Scalar property of `data_type`, typed `PropertyType`.
    pub fn property(browse_name: QualifiedName, data_type: NodeId) -> Self {
        Self::variable(browse_name, data_type).with_type_definition(variable_types::PROPERTY_TYPE)
    }

    /// Method.
    pub fn method(browse_name: QualifiedName) -> Self {
        Self::new(browse_name, NodeBody::Method(MethodAttributes::default()))
    }

    /// Concrete object type.
    pub fn object_type(browse_name: QualifiedName) -> Self {
        Self::new(browse_name, NodeBody::ObjectType(ObjectTypeAttributes::default()))
    }

    /// Concrete variable type of `data_type`.
    pub fn variable_type(browse_name: QualifiedName, data_type: NodeId) -> Self {
        Self::new(
            browse_name,
            NodeBody::VariableType(VariableTypeAttributes::new(data_type)),
        )
    }

    /// Reference type with an optional inverse name.
    pub fn reference_type(browse_name: QualifiedName, inverse_name: Option<&str>) -> Self {
        Self::new(
            browse_name,
            NodeBody::ReferenceType(ReferenceTypeAttributes {
                is_abstract: false,
                symmetric: inverse_name.is_none(),
                inverse_name: inverse_name.map(LocalizedText::new),
            }),
        )
    }

    /// Concrete data type.
    pub fn data_type(browse_name: QualifiedName) -> Self {
        Self::new(browse_name, NodeBody::DataType(DataTypeAttributes::default()))
    }

    /// View.
    pub fn view(browse_name: QualifiedName) -> Self {
        Self::new(browse_name, NodeBody::View(ViewAttributes::default()))
    }

    /// Sets the node id.
    pub fn with_node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, text: impl Into<String>) -> Self {
        self.display_name = Some(LocalizedText::new(text));
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(LocalizedText::new(text));
        self
    }

    /// Sets the parent link.
    pub fn with_parent(mut self, parent: ParentLink) -> Self {
        self.parent = Some(parent);
        self
    }

    /// `parent --HasComponent--> self`.
    pub fn component_of(self, parent: NodeId) -> Self {
        self.with_parent(ParentLink::component_of(parent))
    }

    /// `parent --HasProperty--> self`.
    pub fn property_of(self, parent: NodeId) -> Self {
        self.with_parent(ParentLink::property_of(parent))
    }

    /// `parent --Organizes--> self`.
    pub fn organized_by(self, parent: NodeId) -> Self {
        self.with_parent(ParentLink::organized_by(parent))
    }

    /// Sets the type definition.
    pub fn with_type_definition(mut self, type_definition: NodeId) -> Self {
        self.type_definition = Some(type_definition);
        self
    }

    /// Sets the supertype.
    pub fn subtype_of(mut self, supertype: NodeId) -> Self {
        self.subtype_of = Some(supertype);
        self
    }

    /// Sets the modelling rule.
    pub fn with_modelling_rule(mut self, rule: ModellingRule) -> Self {
        self.modelling_rule = Some(rule);
        self
    }

    /// Marks a type node abstract.
    pub fn abstract_type(mut self) -> Self {
        match &mut self.body {
            NodeBody::ObjectType(attrs) => attrs.is_abstract = true,
            NodeBody::VariableType(attrs) => attrs.is_abstract = true,
            NodeBody::ReferenceType(attrs) => attrs.is_abstract = true,
            NodeBody::DataType(attrs) => attrs.is_abstract = true,
            _ => {}
        }
        self
    }

    /// Sets the value of a variable or the default value of a variable type.
    pub fn with_value(mut self, value: impl Into<Variant>) -> Self {
        match &mut self.body {
            NodeBody::Variable(attrs) => attrs.value = value.into(),
            NodeBody::VariableType(attrs) => attrs.value = value.into(),
            _ => {}
        }
        self
    }

    /// Sets the value rank of a variable or variable type.
    pub fn with_value_rank(mut self, value_rank: i32) -> Self {
        match &mut self.body {
            NodeBody::Variable(attrs) => attrs.value_rank = value_rank,
            NodeBody::VariableType(attrs) => attrs.value_rank = value_rank,
            _ => {}
        }
        self
    }

    /// Sets the event notifier bits of an object or view.
    pub fn with_event_notifier(mut self, bits: u8) -> Self {
        match &mut self.body {
            NodeBody::Object(attrs) => attrs.event_notifier = bits,
            NodeBody::View(attrs) => attrs.event_notifier = bits,
            _ => {}
        }
        self
    }

    /// `node --HasEventSource--> self`.
    pub fn event_source_of(mut self, node: NodeId) -> Self {
        self.event_source_of = Some(node);
        self
    }

    /// `node --HasNotifier--> self`.
    pub fn notifier_of(mut self, node: NodeId) -> Self {
        self.notifier_of = Some(node);
        self
    }

    /// Adds a reference declared by the new node.
    pub fn with_reference(mut self, reference: ReferenceSpec) -> Self {
        self.references.push(reference);
        self
    }

    /// Requests a `NodeVersion` property.
    pub fn with_node_version(mut self) -> Self {
        self.node_version = true;
        self
    }

    fn default_supertype(&self) -> Option<NodeId> {
        match self.body.node_class() {
            NodeClass::ObjectType => Some(object_types::BASE_OBJECT_TYPE),
            NodeClass::VariableType => Some(variable_types::BASE_VARIABLE_TYPE),
            NodeClass::DataType => Some(data_types::BASE_DATA_TYPE),
            NodeClass::ReferenceType => Some(reference_types::NON_HIERARCHICAL_REFERENCES),
            _ => None,
        }
    }
}

impl AddressSpace {
    /// Creates a node in `namespace` and declares its references.
    ///
    /// Fails before any mutation when the namespace is unknown, the id is
    /// taken or belongs to another namespace, the parent is missing, or the
    /// parent already has a hierarchical child with the same browse name.
    #[instrument(level = "debug", skip(self, draft), fields(browse_name = %draft.browse_name))]
    pub fn add_node(&mut self, namespace: u16, draft: NewNode) -> Result<NodeId, AddressSpaceError> {
        if self.disposed {
            return Err(AddressSpaceError::Disposed);
        }
        self.namespace(namespace)?;
        let node_version = draft.node_version;
        if let Some(parent) = &draft.parent {
            if !self.contains(&parent.parent) {
                return Err(AddressSpaceError::UnknownNode(parent.parent.clone()));
            }
            if self
                .child_by_name(&parent.parent, &draft.browse_name.name)
                .is_some()
            {
                return Err(AddressSpaceError::DuplicateBrowseName {
                    parent: parent.parent.clone(),
                    browse_name: draft.browse_name,
                });
            }
        }
        let node_id = match draft.node_id.clone() {
            Some(id) => {
                if id.namespace != namespace {
                    return Err(AddressSpaceError::NamespaceMismatch {
                        node_id: id,
                        namespace,
                    });
                }
                if self.contains(&id) {
                    return Err(AddressSpaceError::DuplicateNodeId(id));
                }
                id
            }
            None => self.allocate_child_id(
                namespace,
                draft.parent.as_ref().map(|link| &link.parent),
                &draft.browse_name,
            )?,
        };

        let mut declared = Vec::new();
        if let Some(link) = &draft.parent {
            declared.push(Reference::inverse(
                link.reference_type.clone(),
                link.parent.clone(),
            ));
        }
        if let Some(type_definition) = draft
            .type_definition
            .clone()
            .or_else(|| draft.body.default_type_definition())
        {
            declared.push(Reference::forward(
                reference_types::HAS_TYPE_DEFINITION,
                type_definition,
            ));
        }
        if let Some(supertype) = draft.subtype_of.clone().or_else(|| draft.default_supertype()) {
            declared.push(Reference::inverse(reference_types::HAS_SUBTYPE, supertype));
        }
        if let Some(rule) = draft.modelling_rule {
            declared.push(Reference::forward(
                reference_types::HAS_MODELLING_RULE,
                rule.node_id(),
            ));
        }
        if let Some(source) = &draft.event_source_of {
            declared.push(Reference::inverse(
                reference_types::HAS_EVENT_SOURCE,
                source.clone(),
            ));
        }
        if let Some(notifier) = &draft.notifier_of {
            declared.push(Reference::inverse(
                reference_types::HAS_NOTIFIER,
                notifier.clone(),
            ));
        }
        let mut extra = Vec::with_capacity(draft.references.len());
        for spec in draft.references {
            extra.push(self.normalize_reference(spec)?);
        }

        let node = Node::new(
            node_id.clone(),
            draft.browse_name,
            draft.display_name,
            draft.description,
            draft.body,
        );
        self.insert_node(node)?;

        self.begin_model_change();
        let outcome = self.declare_all(&node_id, declared.into_iter().chain(extra));
        if outcome.is_ok() {
            let type_definition = self.type_definition_of(&node_id);
            self.record_change(&node_id, type_definition, ModelChangeVerb::NODE_ADDED);
        }
        let outcome = outcome.and_then(|()| {
            if node_version {
                self.ensure_node_version(&node_id)?;
            }
            Ok(())
        });
        if let Err(err) = outcome {
            self.purge_node(&node_id);
            self.end_model_change();
            return Err(err);
        }
        self.end_model_change();
        debug!(node = %node_id, "node added");
        Ok(node_id)
    }

    fn declare_all(
        &mut self,
        node_id: &NodeId,
        references: impl Iterator<Item = Reference>,
    ) -> Result<(), AddressSpaceError> {
        for reference in references {
            self.attach_reference(node_id, reference)?;
        }
        Ok(())
    }

    /// Adds a `NodeVersion` property to `node` if it has none.
    pub fn ensure_node_version(&mut self, node: &NodeId) -> Result<NodeId, AddressSpaceError> {
        if let Some(existing) = self.child_by_name(node, "NodeVersion") {
            return Ok(existing.node_id().clone());
        }
        let namespace = node.namespace;
        self.add_node(
            namespace,
            NewNode::property(QualifiedName::new(0, "NodeVersion"), data_types::STRING)
                .property_of(node.clone())
                .with_value("0"),
        )
    }

    pub(crate) fn allocate_child_id(
        &mut self,
        namespace: u16,
        parent: Option<&NodeId>,
        browse_name: &QualifiedName,
    ) -> Result<NodeId, AddressSpaceError> {
        let derive = self.config.derive_child_string_ids;
        let ns = self.namespace_mut(namespace)?;
        if derive {
            if let Some(id) = parent.and_then(|parent| ns.derive_child_id(parent, browse_name)) {
                return Ok(id);
            }
        }
        Ok(ns.allocate_numeric())
    }

    /// Places a node in the arena and its namespace without declaring references.
    pub(crate) fn insert_node(&mut self, node: Node) -> Result<NodeIndex, AddressSpaceError> {
        let node_id = node.node_id().clone();
        if self.contains(&node_id) {
            return Err(AddressSpaceError::DuplicateNodeId(node_id));
        }
        let class = node.node_class();
        let name = node.browse_name().name.clone();
        let inverse_name = node
            .as_reference_type()
            .and_then(|attrs| attrs.inverse_name.as_ref())
            .map(|text| text.text.clone());
        let slot = u32::try_from(self.arena.len())
            .map(NodeIndex)
            .map_err(|_| AddressSpaceError::ArenaExhausted)?;
        let namespace = self.namespace_mut(node_id.namespace)?;
        if class.is_type() {
            namespace.index_type(class, &name, &node_id);
        }
        if let Some(inverse_name) = inverse_name {
            namespace.index_inverse_name(&inverse_name, &node_id);
        }
        namespace.register(node_id, slot);
        self.arena.push(Some(node));
        Ok(slot)
    }

    /// Adds a reference declared by `source` and mirrors it on the target.
    pub fn add_reference(&mut self, source: &NodeId, spec: ReferenceSpec) -> Result<Reference, AddressSpaceError> {
        let reference = self.normalize_reference(spec)?;
        self.attach_reference(source, reference.clone())?;
        Ok(reference)
    }

    /// Removes an edge from `source` and its mirror from the target.
    ///
    /// Returns `Ok(false)` when the edge does not exist.
    pub fn remove_reference(&mut self, source: &NodeId, spec: ReferenceSpec) -> Result<bool, AddressSpaceError> {
        let reference = self.normalize_reference(spec)?;
        Ok(self.detach_reference(source, &reference))
    }

    pub(crate) fn attach_reference(
        &mut self,
        source: &NodeId,
        reference: Reference,
    ) -> Result<(), AddressSpaceError> {
        let slot = self
            .node_index(source)
            .ok_or_else(|| AddressSpaceError::UnknownNode(source.clone()))?;
        let Some(node) = self.node_at_mut(slot) else {
            return Err(AddressSpaceError::UnknownNode(source.clone()));
        };
        if node.references.contains(&reference) {
            return Err(AddressSpaceError::DuplicateReference {
                node: source.clone(),
                reference,
            });
        }
        if node.back_references.contains(&reference) {
            return Ok(());
        }
        node.references.insert(reference.clone());
        node.cache.invalidate();

        if self.suspended {
            return Ok(());
        }
        self.install_back_reference(source, &reference);
        if reference.reference_type == reference_types::HAS_SUBTYPE {
            self.invalidate_all_caches();
        }
        // Both ends go out in one event.
        self.begin_model_change();
        self.record_change(source, None, ModelChangeVerb::REFERENCE_ADDED);
        if self.contains(&reference.target) {
            self.record_change(&reference.target, None, ModelChangeVerb::REFERENCE_ADDED);
        }
        self.end_model_change();
        Ok(())
    }

    /// Installs the mirror of `reference` (declared by `source`) on its target.
    pub(crate) fn install_back_reference(&mut self, source: &NodeId, reference: &Reference) {
        let Some(slot) = self.node_index(&reference.target) else {
            return;
        };
        let mirror = reference.mirror(source);
        let Some(target) = self.node_at_mut(slot) else {
            return;
        };
        if target.references.contains(&mirror) {
            return;
        }
        if target.back_references.insert(mirror) {
            target.cache.invalidate();
        }
    }

    pub(crate) fn detach_reference(&mut self, source: &NodeId, reference: &Reference) -> bool {
        let Some(node) = self.node_mut(source) else {
            return false;
        };
        let removed = node.references.remove(reference) || node.back_references.remove(reference);
        if !removed {
            return false;
        }
        node.cache.invalidate();

        let mirror = reference.mirror(source);
        let target_known = if let Some(target) = self.node_mut(&reference.target) {
            if !target.references.remove(&mirror) {
                target.back_references.remove(&mirror);
            }
            target.cache.invalidate();
            true
        } else {
            false
        };
        if reference.reference_type == reference_types::HAS_SUBTYPE {
            self.invalidate_all_caches();
        }
        self.begin_model_change();
        self.record_change(source, None, ModelChangeVerb::REFERENCE_DELETED);
        if target_known {
            self.record_change(&reference.target, None, ModelChangeVerb::REFERENCE_DELETED);
        }
        self.end_model_change();
        true
    }

    /// Deletes a node, its Aggregates members (recursively) and every edge touching them.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<(), AddressSpaceError> {
        if !self.contains(node_id) {
            return Err(AddressSpaceError::UnknownNode(node_id.clone()));
        }
        self.begin_model_change();
        let mut pending = vec![node_id.clone()];
        let mut order = Vec::new();
        while let Some(current) = pending.pop() {
            if order.contains(&current) || !self.contains(&current) {
                continue;
            }
            pending.extend(
                self.aggregates_of(&current)
                    .into_iter()
                    .map(|reference| reference.target),
            );
            order.push(current);
        }
        for id in order.iter().rev() {
            let type_definition = self.type_definition_of(id);
            let peers = self.purge_node(id);
            self.record_change(id, type_definition, ModelChangeVerb::NODE_DELETED);
            for peer in peers {
                self.record_change(&peer, None, ModelChangeVerb::REFERENCE_DELETED);
            }
        }
        self.end_model_change();
        Ok(())
    }

    /// Unlinks and drops a node without recording model changes.
    /// Returns the surviving peers whose indices were touched.
    pub(crate) fn purge_node(&mut self, node_id: &NodeId) -> Vec<NodeId> {
        let Some(slot) = self.node_index(node_id) else {
            return Vec::new();
        };
        let Some(node) = self.arena.get_mut(slot.0 as usize).and_then(Option::take) else {
            return Vec::new();
        };
        let mut peers = Vec::new();
        let mut retyped = false;
        for reference in node.references.iter().chain(node.back_references.iter()) {
            retyped |= reference.reference_type == reference_types::HAS_SUBTYPE;
            let mirror = reference.mirror(node_id);
            if let Some(peer) = self.node_mut(&reference.target) {
                let removed = peer.references.remove(&mirror) | peer.back_references.remove(&mirror);
                peer.cache.invalidate();
                if removed && !peers.contains(&reference.target) {
                    peers.push(reference.target.clone());
                }
            }
        }
        if let Ok(namespace) = self.namespace_mut(node_id.namespace) {
            namespace.unregister(node_id);
        }
        self.hooks.remove(node_id);
        if retyped {
            self.invalidate_all_caches();
        }
        peers
    }

    /// Stops mirroring new references until [`AddressSpace::resume_back_references`].
    ///
    /// Used while streaming a model in, when targets may not exist yet.
    /// Model changes are not tracked and hierarchy caches are not filled.
    pub fn suspend_back_references(&mut self) {
        debug!("back-reference propagation suspended");
        self.suspended = true;
    }

    /// Ends bulk-load mode: validates every reference type and installs every
    /// missing back-reference.
    #[instrument(level = "debug", skip(self))]
    pub fn resume_back_references(&mut self) -> Result<(), AddressSpaceError> {
        self.suspended = false;
        let declared: Vec<(NodeId, Vec<Reference>)> = self
            .nodes()
            .map(|node| (node.node_id().clone(), node.references.to_vec()))
            .collect();
        for (_, references) in &declared {
            for reference in references {
                let valid = self
                    .find_node(&reference.reference_type)
                    .is_some_and(|node| node.node_class() == NodeClass::ReferenceType);
                if !valid {
                    return Err(AddressSpaceError::UnknownReferenceType(
                        reference.reference_type.to_string(),
                    ));
                }
            }
        }
        let mut dangling = 0_usize;
        for (source, references) in &declared {
            for reference in references {
                if self.contains(&reference.target) {
                    self.install_back_reference(source, reference);
                } else {
                    dangling += 1;
                }
            }
        }
        if dangling > 0 {
            warn!(dangling, "references still point at missing nodes after load");
        }
        self.invalidate_all_caches();
        Ok(())
    }

    /// Changes the data type of a variable or variable type.
    pub fn set_data_type(&mut self, node_id: &NodeId, data_type: NodeId) -> Result<(), AddressSpaceError> {
        let resolved = self
            .find_node(&data_type)
            .is_some_and(|node| node.node_class() == NodeClass::DataType);
        if !resolved {
            return Err(AddressSpaceError::UnresolvedDataType(data_type));
        }
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| AddressSpaceError::UnknownNode(node_id.clone()))?;
        match &mut node.body {
            NodeBody::Variable(attrs) => attrs.data_type = data_type,
            NodeBody::VariableType(attrs) => attrs.data_type = data_type,
            _ => return Err(AddressSpaceError::NotAVariable(node_id.clone())),
        }
        node.cache.invalidate();
        self.record_change(node_id, None, ModelChangeVerb::DATA_TYPE_CHANGED);
        Ok(())
    }

    pub(crate) fn invalidate_all_caches(&mut self) {
        for node in self.arena.iter_mut().flatten() {
            node.cache.invalidate();
        }
    }
}
