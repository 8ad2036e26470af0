// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The address space facade: node arena, namespace table and name resolution.
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::AddressSpaceConfig;
use crate::error::AddressSpaceError;
use crate::event::{EventSink, EventSubscription};
use crate::factory::{DefinitionFactory, ExtensionObjectFactory};
use crate::ident::{NodeClass, NodeId};
use crate::instantiate::InstantiateHook;
use crate::model_change::ModelChangeTracker;
use crate::namespace::Namespace;
use crate::node::{Node, NodeIndex};
use crate::shutdown::ShutdownTask;
use crate::standard::{self, object_types, STANDARD_NAMESPACE_URI};
use crate::value::Variant;

/// In-memory typed node graph partitioned into namespaces.
///
/// Nodes live in an arena addressed by stable [`NodeIndex`] slots; each
/// namespace maps the ids it owns to slots. Namespace 0 is the standard
/// namespace, namespace 1 the application's own namespace.
///
/// The address space is single-threaded. Derived caches use interior
/// mutability, so the type is neither `Sync` nor `Send`.
pub struct AddressSpace {
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) arena: Vec<Option<Node>>,
    pub(crate) config: AddressSpaceConfig,
    pub(crate) suspended: bool,
    pub(crate) changes: ModelChangeTracker,
    pub(crate) sinks: Vec<(EventSubscription, Box<dyn EventSink>)>,
    pub(crate) next_subscription: u64,
    pub(crate) factory: Rc<dyn ExtensionObjectFactory>,
    pub(crate) hooks: FxHashMap<NodeId, Vec<InstantiateHook>>,
    pub(crate) shutdown_tasks: Vec<ShutdownTask>,
    pub(crate) disposed: bool,
}

impl fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressSpace")
            .field("namespaces", &self.namespace_uris())
            .field("nodes", &self.node_count())
            .field("suspended", &self.suspended)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl AddressSpace {
    /// Address space with the standard model and default settings.
    pub fn new() -> Result<Self, AddressSpaceError> {
        Self::with_config(AddressSpaceConfig::default())
    }

    /// Address space with the standard model (unless disabled) and the own
    /// namespace registered at index 1.
    pub fn with_config(config: AddressSpaceConfig) -> Result<Self, AddressSpaceError> {
        let load_standard = config.load_standard_nodes;
        let mut space = Self::bare(config);
        if load_standard {
            standard::bootstrap(&mut space)?;
        }
        let uri = space.config.own_namespace_uri.clone();
        space.register_namespace(&uri)?;
        info!(
            nodes = space.node_count(),
            namespaces = space.namespaces.len(),
            "address space ready"
        );
        Ok(space)
    }

    /// Address space with only namespace 0 registered and no nodes.
    pub fn bare(config: AddressSpaceConfig) -> Self {
        Self {
            namespaces: vec![Namespace::new(STANDARD_NAMESPACE_URI, 0, 1)],
            arena: Vec::new(),
            config,
            suspended: false,
            changes: ModelChangeTracker::default(),
            sinks: Vec::new(),
            next_subscription: 0,
            factory: Rc::new(DefinitionFactory),
            hooks: FxHashMap::default(),
            shutdown_tasks: Vec::new(),
            disposed: false,
        }
    }

    /// Active settings.
    #[must_use]
    pub const fn config(&self) -> &AddressSpaceConfig {
        &self.config
    }

    /// Replaces the factory used to build default structure values.
    pub fn set_extension_object_factory(&mut self, factory: impl ExtensionObjectFactory + 'static) {
        self.factory = Rc::new(factory);
    }

    // ── Namespaces ──────────────────────────────────────────────────────

    /// Registers `uri` and returns its index. Registering a known URI returns
    /// the existing index.
    pub fn register_namespace(&mut self, uri: &str) -> Result<u16, AddressSpaceError> {
        if let Some(index) = self.namespace_index(uri) {
            return Ok(index);
        }
        let index =
            u16::try_from(self.namespaces.len()).map_err(|_| AddressSpaceError::TooManyNamespaces)?;
        self.namespaces
            .push(Namespace::new(uri, index, self.config.first_numeric_id));
        debug!(uri, index, "namespace registered");
        self.refresh_namespace_array();
        Ok(index)
    }

    /// Namespace at `index`.
    pub fn namespace(&self, index: u16) -> Result<&Namespace, AddressSpaceError> {
        self.namespaces
            .get(usize::from(index))
            .ok_or(AddressSpaceError::InvalidNamespaceIndex(index))
    }

    /// Mutable namespace at `index`.
    pub fn namespace_mut(&mut self, index: u16) -> Result<&mut Namespace, AddressSpaceError> {
        self.namespaces
            .get_mut(usize::from(index))
            .ok_or(AddressSpaceError::InvalidNamespaceIndex(index))
    }

    /// Namespace registered under `uri`.
    #[must_use]
    pub fn namespace_by_uri(&self, uri: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.uri() == uri)
    }

    /// Index of the namespace registered under `uri`.
    #[must_use]
    pub fn namespace_index(&self, uri: &str) -> Option<u16> {
        self.namespace_by_uri(uri).map(Namespace::index)
    }

    /// Namespace URIs in index order.
    #[must_use]
    pub fn namespace_uris(&self) -> Vec<String> {
        self.namespaces.iter().map(|ns| ns.uri().to_owned()).collect()
    }

    /// Index of the application's own namespace.
    #[must_use]
    pub fn own_namespace_index(&self) -> u16 {
        self.namespace_index(&self.config.own_namespace_uri)
            .unwrap_or(0)
    }

    /// Alias lookup within one namespace. Unknown aliases are `Ok(None)`.
    pub fn resolve_alias(&self, namespace: u16, name: &str) -> Result<Option<NodeId>, AddressSpaceError> {
        Ok(self.namespace(namespace)?.resolve_alias(name).cloned())
    }

    /// Allocates a fresh numeric node id in `namespace`.
    pub fn allocate_node_id(&mut self, namespace: u16) -> Result<NodeId, AddressSpaceError> {
        Ok(self.namespace_mut(namespace)?.allocate_numeric())
    }

    fn refresh_namespace_array(&mut self) {
        let uris = self
            .namespaces
            .iter()
            .map(|ns| Variant::String(ns.uri().to_owned()))
            .collect();
        if let Some(node) = self.node_mut(&standard::objects::NAMESPACE_ARRAY) {
            // Only fails for non-variables; the standard node is a variable.
            let _ = node.set_value(Variant::Array(uris));
        }
    }

    // ── Node lookup ─────────────────────────────────────────────────────

    /// Node with the given id.
    #[must_use]
    pub fn find_node(&self, id: &NodeId) -> Option<&Node> {
        self.node_at(self.node_index(id)?)
    }

    /// Mutable node with the given id, for attribute changes.
    ///
    /// References cannot be changed through `&mut Node`; use
    /// [`AddressSpace::add_reference`] and friends.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let slot = self.node_index(id)?;
        self.node_at_mut(slot)
    }

    /// True when a node with this id exists.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_index(id).is_some()
    }

    /// Arena slot of a node.
    #[must_use]
    pub fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.namespaces.get(usize::from(id.namespace))?.slot(id)
    }

    /// Node stored in an arena slot.
    #[must_use]
    pub fn node_at(&self, index: NodeIndex) -> Option<&Node> {
        self.arena.get(index.0 as usize)?.as_ref()
    }

    pub(crate) fn node_at_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.arena.get_mut(index.0 as usize)?.as_mut()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.namespaces.iter().map(Namespace::node_count).sum()
    }

    /// Every live node in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.arena.iter().flatten()
    }

    pub(crate) const fn is_suspended(&self) -> bool {
        self.suspended
    }

    // ── Name resolution ─────────────────────────────────────────────────

    /// Resolves text to a node id: an alias of any namespace first, then the
    /// node-id text form.
    #[must_use]
    pub fn resolve_node_id(&self, text: &str) -> Option<NodeId> {
        let text = text.trim();
        self.namespaces
            .iter()
            .find_map(|ns| ns.resolve_alias(text).cloned())
            .or_else(|| text.parse().ok())
    }

    /// Object type by node id text, alias, `n:Name` or bare browse name.
    #[must_use]
    pub fn find_object_type(&self, name: &str) -> Option<&Node> {
        self.find_type(NodeClass::ObjectType, name)
    }

    /// Variable type by node id text, alias, `n:Name` or bare browse name.
    #[must_use]
    pub fn find_variable_type(&self, name: &str) -> Option<&Node> {
        self.find_type(NodeClass::VariableType, name)
    }

    /// Data type by node id text, alias, `n:Name` or bare browse name.
    #[must_use]
    pub fn find_data_type(&self, name: &str) -> Option<&Node> {
        self.find_type(NodeClass::DataType, name)
    }

    /// Reference type by node id text, alias, `n:Name` or bare browse name.
    #[must_use]
    pub fn find_reference_type(&self, name: &str) -> Option<&Node> {
        self.find_type(NodeClass::ReferenceType, name)
    }

    /// Reference type whose inverse name is `name` (`n:`-qualification allowed).
    #[must_use]
    pub fn find_reference_type_by_inverse_name(&self, name: &str) -> Option<&Node> {
        let (namespace, qualified) = Self::split_qualified(name);
        let id = match namespace {
            Some(index) => self
                .namespaces
                .get(usize::from(index))?
                .reference_type_by_inverse_name(&qualified.name),
            None => self
                .namespaces
                .iter()
                .find_map(|ns| ns.reference_type_by_inverse_name(&qualified.name)),
        }?;
        self.find_node(id)
    }

    /// Object type that derives from `BaseEventType`.
    #[must_use]
    pub fn find_event_type(&self, name: &str) -> Option<&Node> {
        self.find_object_type(name).filter(|node| {
            self.is_subtype_of(node.node_id(), &object_types::BASE_EVENT_TYPE)
        })
    }

    fn find_type(&self, class: NodeClass, name: &str) -> Option<&Node> {
        if let Some(id) = self.resolve_node_id(name) {
            if let Some(node) = self.find_node(&id).filter(|node| node.node_class() == class) {
                return Some(node);
            }
        }
        let (namespace, qualified) = Self::split_qualified(name);
        let id = match namespace {
            Some(index) => self
                .namespaces
                .get(usize::from(index))?
                .type_by_name(class, &qualified.name),
            None => self
                .namespaces
                .iter()
                .find_map(|ns| ns.type_by_name(class, &qualified.name)),
        }?;
        self.find_node(id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn full_namespace_table_is_an_error() {
        let mut space = AddressSpace::bare(AddressSpaceConfig::default());
        for index in 1..=u16::MAX {
            space
                .namespaces
                .push(Namespace::new(format!("urn:ns:{index}"), index, 1));
        }
        assert_eq!(
            space.register_namespace("urn:ns:one-too-many"),
            Err(AddressSpaceError::TooManyNamespaces)
        );
        assert_eq!(space.register_namespace("urn:ns:7").unwrap(), 7);
        assert_eq!(space.namespaces.len(), usize::from(u16::MAX) + 1);
    }
}
