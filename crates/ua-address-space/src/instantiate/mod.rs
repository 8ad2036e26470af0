// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Instantiation: materializing an instance tree from a type template.
//!
//! The call runs in three phases:
//! 1. pre-flight checks that touch nothing,
//! 2. cloning of the member tree, repair passes, value binding and hooks,
//! 3. commit, or rollback of every node created by the call.
mod optionals;
mod registry;
mod repair;

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, instrument, warn};

use crate::address_space::AddressSpace;
use crate::error::AddressSpaceError;
use crate::ident::{LocalizedText, NodeClass, NodeId, QualifiedName};
use crate::mutation::{NewNode, ParentLink};
use crate::node::{MethodAttributes, ModellingRule, NodeBody, ObjectAttributes, VariableAttributes};
use crate::standard::{data_types, object_types, variable_types};
use crate::value::{ExtensionObject, Variant};

use optionals::OptionalsFilter;
use registry::CloneRegistry;

/// Callback run on a freshly instantiated node.
pub type InstantiateHook = Rc<dyn Fn(&mut AddressSpace, &NodeId) -> Result<(), AddressSpaceError>>;

/// Parameters of [`AddressSpace::instantiate`].
#[derive(Clone, Debug, PartialEq)]
pub struct InstantiateOptions {
    /// Browse name of the instance.
    pub browse_name: QualifiedName,
    /// Explicit id; allocated (or derived from the parent) when absent.
    pub node_id: Option<NodeId>,
    /// Namespace of the created nodes; defaults to the id's namespace, then
    /// the own namespace.
    pub namespace: Option<u16>,
    /// Display name; defaults to the browse name.
    pub display_name: Option<LocalizedText>,
    /// Description.
    pub description: Option<LocalizedText>,
    /// Link to the parent. Only one parent link can be given.
    pub parent: Option<ParentLink>,
    /// Node the instance is an event source of.
    pub event_source_of: Option<NodeId>,
    /// Node the instance is a notifier of.
    pub notifier_of: Option<NodeId>,
    /// Data type of a variable instance; defaults to the type's.
    pub data_type: Option<NodeId>,
    /// Value rank of a variable instance; defaults to the type's.
    pub value_rank: Option<i32>,
    /// Array dimensions of a variable instance.
    pub array_dimensions: Option<Vec<u32>>,
    /// Initial value of a variable instance; defaults to the type's.
    pub value: Option<Variant>,
    /// Optional members to clone, as dotted browse-name paths.
    pub optionals: Vec<String>,
    /// Modelling rule of the instance. When set the instance is an instance
    /// declaration and its members keep their rules too.
    pub modelling_rule: Option<ModellingRule>,
    /// Value bound to a structured variable instance instead of the factory default.
    pub extension_object: Option<ExtensionObject>,
    /// Type level where the supertype walk stops (exclusive).
    pub stop_type: Option<NodeId>,
}

impl InstantiateOptions {
    /// Options with only a browse name.
    pub fn new(browse_name: QualifiedName) -> Self {
        Self {
            browse_name,
            node_id: None,
            namespace: None,
            display_name: None,
            description: None,
            parent: None,
            event_source_of: None,
            notifier_of: None,
            data_type: None,
            value_rank: None,
            array_dimensions: None,
            value: None,
            optionals: Vec::new(),
            modelling_rule: None,
            extension_object: None,
            stop_type: None,
        }
    }

    /// Sets the node id.
    pub fn with_node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Sets the namespace of the created nodes.
    pub fn in_namespace(mut self, namespace: u16) -> Self {
        self.namespace = Some(namespace);
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

    /// `parent --HasComponent--> instance`.
    pub fn component_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(ParentLink::component_of(parent));
        self
    }

    /// `parent --Organizes--> instance`.
    pub fn organized_by(mut self, parent: NodeId) -> Self {
        self.parent = Some(ParentLink::organized_by(parent));
        self
    }

    /// `parent --HasProperty--> instance`.
    pub fn property_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(ParentLink::property_of(parent));
        self
    }

    /// `node --HasEventSource--> instance`.
    pub fn event_source_of(mut self, node: NodeId) -> Self {
        self.event_source_of = Some(node);
        self
    }

    /// `node --HasNotifier--> instance`.
    pub fn notifier_of(mut self, node: NodeId) -> Self {
        self.notifier_of = Some(node);
        self
    }

    /// Overrides the data type of a variable instance.
    pub fn with_data_type(mut self, data_type: NodeId) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Overrides the value rank of a variable instance.
    pub fn with_value_rank(mut self, value_rank: i32) -> Self {
        self.value_rank = Some(value_rank);
        self
    }

    /// Sets the array dimensions of a variable instance.
    pub fn with_array_dimensions(mut self, dimensions: Vec<u32>) -> Self {
        self.array_dimensions = Some(dimensions);
        self
    }

    /// Sets the initial value of a variable instance.
    pub fn with_value(mut self, value: impl Into<Variant>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Requests optional members by dotted path.
    pub fn with_optionals<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optionals.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Sets the modelling rule of the instance.
    pub fn with_modelling_rule(mut self, rule: ModellingRule) -> Self {
        self.modelling_rule = Some(rule);
        self
    }

    /// Binds a structure value to a variable instance.
    pub fn with_extension_object(mut self, value: ExtensionObject) -> Self {
        self.extension_object = Some(value);
        self
    }

    /// Stops the supertype walk at `stop_type`.
    pub fn with_stop_type(mut self, stop_type: NodeId) -> Self {
        self.stop_type = Some(stop_type);
        self
    }
}

/// Result of the pre-flight checks.
struct Plan {
    namespace: u16,
    chain: Vec<NodeId>,
    root: NewNode,
}

/// State shared by every recursion level of one call.
struct CloneContext {
    namespace: u16,
    copy_rules: bool,
    registry: CloneRegistry,
}

impl AddressSpace {
    /// Registers `hook` to run after every instantiation of `type_id` or of
    /// one of its subtypes. Hooks of base types run first.
    pub fn on_instantiate<F>(&mut self, type_id: NodeId, hook: F)
    where
        F: Fn(&mut Self, &NodeId) -> Result<(), AddressSpaceError> + 'static,
    {
        self.hooks.entry(type_id).or_default().push(Rc::new(hook));
    }

    /// Creates an instance of an object type or variable type.
    ///
    /// Mandatory members of every type level from `type_id` up to the stop
    /// type are cloned, plus the Optional members named in
    /// [`InstantiateOptions::optionals`]; a member re-declared by a more
    /// derived level replaces the base declaration. The call is atomic: on
    /// error every node it created is removed again.
    #[instrument(skip(self, options), fields(browse_name = %options.browse_name))]
    pub fn instantiate(
        &mut self,
        type_id: &NodeId,
        options: InstantiateOptions,
    ) -> Result<NodeId, AddressSpaceError> {
        if self.disposed {
            return Err(AddressSpaceError::Disposed);
        }
        let plan = self.preflight(type_id, &options)?;
        let mut context = CloneContext {
            namespace: plan.namespace,
            copy_rules: options.modelling_rule.is_some(),
            registry: CloneRegistry::default(),
        };

        self.begin_model_change();
        let checkpoint = self.change_checkpoint();
        let arena_mark = self.arena.len();
        let outcome = self.build_instance(type_id, plan, &options, &mut context);
        match outcome {
            Ok(root) => {
                self.end_model_change();
                info!(
                    instance = %root,
                    type_id = %type_id,
                    nodes = context.registry.created_nodes().len(),
                    "instantiated"
                );
                Ok(root)
            }
            Err(err) => {
                self.rollback(arena_mark);
                self.restore_changes(checkpoint);
                self.end_model_change();
                warn!(type_id = %type_id, error = %err, "instantiation rolled back");
                Err(err)
            }
        }
    }

    fn preflight(
        &self,
        type_id: &NodeId,
        options: &InstantiateOptions,
    ) -> Result<Plan, AddressSpaceError> {
        let type_node = self
            .find_node(type_id)
            .ok_or_else(|| AddressSpaceError::UnknownNode(type_id.clone()))?;
        let class = type_node.node_class();
        if !matches!(class, NodeClass::ObjectType | NodeClass::VariableType) {
            return Err(AddressSpaceError::NotInstantiable(type_id.clone()));
        }
        if type_node.is_abstract() {
            return Err(AddressSpaceError::AbstractType(type_id.clone()));
        }
        let stop = options.stop_type.clone().unwrap_or(match class {
            NodeClass::ObjectType => object_types::BASE_OBJECT_TYPE,
            _ => variable_types::BASE_VARIABLE_TYPE,
        });
        let chain = self.type_levels(type_id, &stop)?;

        let namespace = options
            .node_id
            .as_ref()
            .map(|id| id.namespace)
            .or(options.namespace)
            .unwrap_or_else(|| self.own_namespace_index());
        self.namespace(namespace)?;
        if let Some(id) = &options.node_id {
            if id.namespace != namespace {
                return Err(AddressSpaceError::NamespaceMismatch {
                    node_id: id.clone(),
                    namespace,
                });
            }
            if self.contains(id) {
                return Err(AddressSpaceError::DuplicateNodeId(id.clone()));
            }
        }
        if let Some(link) = &options.parent {
            if !self.contains(&link.parent) {
                return Err(AddressSpaceError::UnknownNode(link.parent.clone()));
            }
            if self
                .child_by_name(&link.parent, &options.browse_name.name)
                .is_some()
            {
                return Err(AddressSpaceError::DuplicateBrowseName {
                    parent: link.parent.clone(),
                    browse_name: options.browse_name.clone(),
                });
            }
        }
        for target in [&options.event_source_of, &options.notifier_of]
            .into_iter()
            .flatten()
        {
            if !self.contains(target) {
                return Err(AddressSpaceError::UnknownNode(target.clone()));
            }
        }

        let body = match type_node.body() {
            NodeBody::VariableType(attrs) => {
                let data_type = options
                    .data_type
                    .clone()
                    .unwrap_or_else(|| attrs.data_type.clone());
                let resolved = self
                    .find_node(&data_type)
                    .is_some_and(|node| node.node_class() == NodeClass::DataType);
                if !resolved {
                    return Err(AddressSpaceError::UnresolvedDataType(data_type));
                }
                NodeBody::Variable(VariableAttributes {
                    value_rank: options.value_rank.unwrap_or(attrs.value_rank),
                    array_dimensions: options
                        .array_dimensions
                        .clone()
                        .or_else(|| attrs.array_dimensions.clone()),
                    value: options.value.clone().unwrap_or_else(|| attrs.value.clone()),
                    ..VariableAttributes::new(data_type)
                })
            }
            _ => NodeBody::Object(ObjectAttributes::default()),
        };

        let mut root = NewNode::new(options.browse_name.clone(), body)
            .with_type_definition(type_id.clone());
        root.node_id = options.node_id.clone();
        root.display_name = options.display_name.clone();
        root.description = options.description.clone();
        root.parent = options.parent.clone();
        root.modelling_rule = options.modelling_rule;
        root.event_source_of = options.event_source_of.clone();
        root.notifier_of = options.notifier_of.clone();
        Ok(Plan {
            namespace,
            chain,
            root,
        })
    }

    /// `type_id` and its supertypes, most derived first, up to `stop` (exclusive).
    fn type_levels(&self, type_id: &NodeId, stop: &NodeId) -> Result<Vec<NodeId>, AddressSpaceError> {
        let mut levels = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = type_id.clone();
        while current != *stop && seen.insert(current.clone()) {
            levels.push(current.clone());
            let Some(supertype) = self.supertype_of(&current) else {
                break;
            };
            if !self.contains(&supertype) {
                return Err(AddressSpaceError::MissingSupertype {
                    type_id: current,
                    supertype,
                });
            }
            current = supertype;
        }
        Ok(levels)
    }

    fn build_instance(
        &mut self,
        type_id: &NodeId,
        plan: Plan,
        options: &InstantiateOptions,
        context: &mut CloneContext,
    ) -> Result<NodeId, AddressSpaceError> {
        let root = self.add_node(plan.namespace, plan.root)?;
        context.registry.created(root.clone());
        for level in &plan.chain {
            context.registry.shadow(level.clone(), root.clone());
        }

        let filter = OptionalsFilter::parse(&options.optionals);
        self.clone_members(&plan.chain, &root, &filter, context, 1)?;

        self.repair_functional_groups(&context.registry)?;
        self.repair_cross_references(&context.registry)?;
        self.bind_extension_objects(&root, options.extension_object.as_ref(), &context.registry)?;
        self.prime_child_cache(&root);

        let hooks: Vec<InstantiateHook> = plan
            .chain
            .iter()
            .rev()
            .filter_map(|level| self.hooks.get(level))
            .flatten()
            .cloned()
            .collect();
        for hook in hooks {
            (*hook)(self, &root)?;
        }
        debug!(type_id = %type_id, levels = plan.chain.len(), "instance built");
        Ok(root)
    }

    /// Clones the kept members of every owner in `owners` (most derived
    /// first) under `clone`.
    fn clone_members(
        &mut self,
        owners: &[NodeId],
        clone: &NodeId,
        filter: &OptionalsFilter,
        context: &mut CloneContext,
        depth: usize,
    ) -> Result<(), AddressSpaceError> {
        for owner in owners {
            for reference in self.aggregates_of(owner) {
                let Some(member) = self.find_node(&reference.target) else {
                    warn!(owner = %owner, member = %reference.target, "dangling member skipped");
                    continue;
                };
                let name = member.browse_name().name.clone();
                let rule = self.modelling_rule_of(&reference.target);
                if !filter.should_keep(rule, &name) {
                    continue;
                }
                if let Some(existing) = self.child_by_name(clone, &name) {
                    let existing = existing.node_id().clone();
                    debug!(member = %reference.target, clone = %existing, "shadowed by a derived declaration");
                    context.registry.shadow(reference.target.clone(), existing);
                    continue;
                }
                let link = ParentLink {
                    reference_type: reference.reference_type.clone(),
                    parent: clone.clone(),
                };
                self.clone_declaration(&reference.target, link, &filter.nested(&name), context, depth)?;
            }
        }
        Ok(())
    }

    fn clone_declaration(
        &mut self,
        original: &NodeId,
        link: ParentLink,
        filter: &OptionalsFilter,
        context: &mut CloneContext,
        depth: usize,
    ) -> Result<(), AddressSpaceError> {
        let limit = self.config.max_instantiation_depth;
        if depth > limit {
            return Err(AddressSpaceError::InstantiationTooDeep(limit));
        }
        let Some(node) = self.find_node(original) else {
            return Err(AddressSpaceError::UnknownNode(original.clone()));
        };
        let body = match node.body() {
            NodeBody::Method(attrs) => NodeBody::Method(MethodAttributes {
                declaration: Some(original.clone()),
                ..attrs.clone()
            }),
            body @ (NodeBody::Object(_) | NodeBody::Variable(_)) => body.clone(),
            _ => {
                warn!(member = %original, class = %node.node_class(), "member class cannot be cloned");
                return Ok(());
            }
        };
        let mut draft = NewNode::new(node.browse_name().clone(), body);
        draft.display_name = node.display_name().first().cloned();
        draft.description = node.description().first().cloned();
        draft.parent = Some(link);
        let type_definition = self.type_definition_of(original);
        draft.type_definition.clone_from(&type_definition);
        if context.copy_rules {
            draft.modelling_rule = self.modelling_rule_of(original);
        }

        let clone = self.add_node(context.namespace, draft)?;
        context.registry.record(original.clone(), clone.clone());

        let mut owners = vec![original.clone()];
        if let Some(type_definition) = type_definition {
            let stop = match self.find_node(&type_definition).map(crate::node::Node::node_class) {
                Some(NodeClass::ObjectType) => Some(object_types::BASE_OBJECT_TYPE),
                Some(NodeClass::VariableType) => Some(variable_types::BASE_VARIABLE_TYPE),
                _ => None,
            };
            if let Some(stop) = stop {
                owners.extend(self.type_levels(&type_definition, &stop)?);
            }
        }
        self.clone_members(&owners, &clone, filter, context, depth + 1)
    }

    /// Writes structure values into structured variables created by the call
    /// and their same-named field variables.
    fn bind_extension_objects(
        &mut self,
        root: &NodeId,
        supplied: Option<&ExtensionObject>,
        registry: &CloneRegistry,
    ) -> Result<(), AddressSpaceError> {
        let factory = Rc::clone(&self.factory);
        for node_id in registry.created_nodes() {
            let Some(variable) = self.find_node(node_id).and_then(|node| node.as_variable()) else {
                continue;
            };
            if !self.is_subtype_of(&variable.data_type, &data_types::STRUCTURE) {
                continue;
            }
            let value = match supplied {
                Some(value) if node_id == root => value.clone(),
                _ if !variable.value.is_empty() => continue,
                _ => match factory.construct(self, &variable.data_type) {
                    Some(value) => value,
                    None => {
                        debug!(variable = %node_id, "no default structure value");
                        continue;
                    }
                },
            };
            for (field, field_value) in &value.fields {
                let Some(child) = self
                    .child_by_name(node_id, field)
                    .filter(|child| child.node_class() == NodeClass::Variable)
                    .map(|child| child.node_id().clone())
                else {
                    continue;
                };
                if let Some(child) = self.node_mut(&child) {
                    child.set_value(field_value.clone())?;
                }
            }
            if let Some(node) = self.node_mut(node_id) {
                node.set_value(Variant::from(value))?;
            }
        }
        Ok(())
    }

    /// Removes every node created by a failed call, hook-created ones included.
    ///
    /// Slots are only ever appended, so the nodes created by the call are
    /// exactly those at or past `arena_mark`. Nodes that existed before keep
    /// their slot and only lose the edges to the removed nodes.
    fn rollback(&mut self, arena_mark: usize) {
        let doomed: Vec<NodeId> = self
            .arena
            .get(arena_mark..)
            .unwrap_or_default()
            .iter()
            .flatten()
            .map(|node| node.node_id().clone())
            .collect();
        for id in doomed.iter().rev() {
            self.purge_node(id);
        }
        debug!(removed = doomed.len(), "instantiation rollback complete");
    }
}
