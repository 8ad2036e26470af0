// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node arena entries: attributes, reference indices and derived caches.
//!
//! A node's class is fixed at construction through its [`NodeBody`] variant.
//! References are held in two indices:
//! - the declared index (edges this node added itself), and
//! - the back index (mirrors installed by the node at the other end).
//!
//! Caches are filled lazily by [`AddressSpace`](crate::AddressSpace) queries
//! and dropped whenever either index of the node changes.
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::access::{AccessRestrictions, RolePermission, SessionContext};
use crate::error::AddressSpaceError;
use crate::ident::{LocalizedText, NodeClass, NodeId, QualifiedName};
use crate::reference::{Reference, ReferenceIndex};
use crate::standard::{modelling_rules, variable_types};
use crate::value::{BuiltinType, DataTypeDefinition, Variant};

/// Stable arena slot of a node. Never reused while the address space lives.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct NodeIndex(pub(crate) u32);

impl NodeIndex {
    /// Position in the arena.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Modelling rule attached to an instance declaration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ModellingRule {
    /// Always instantiated.
    Mandatory,
    /// Instantiated when requested by name.
    Optional,
    /// Placeholder for zero or more caller-created members.
    OptionalPlaceholder,
    /// Placeholder for one or more caller-created members.
    MandatoryPlaceholder,
    /// Array element exposure; never instantiated.
    ExposesItsArray,
}

impl ModellingRule {
    /// Node id of the rule object in namespace 0.
    #[must_use]
    pub const fn node_id(self) -> NodeId {
        match self {
            Self::Mandatory => modelling_rules::MANDATORY,
            Self::Optional => modelling_rules::OPTIONAL,
            Self::OptionalPlaceholder => modelling_rules::OPTIONAL_PLACEHOLDER,
            Self::MandatoryPlaceholder => modelling_rules::MANDATORY_PLACEHOLDER,
            Self::ExposesItsArray => modelling_rules::EXPOSES_ITS_ARRAY,
        }
    }

    /// Rule identified by a rule-object node id.
    #[must_use]
    pub fn from_node_id(id: &NodeId) -> Option<Self> {
        [
            Self::Mandatory,
            Self::Optional,
            Self::OptionalPlaceholder,
            Self::MandatoryPlaceholder,
            Self::ExposesItsArray,
        ]
        .into_iter()
        .find(|rule| rule.node_id() == *id)
    }
}

/// Access level bits of a variable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct AccessLevel(pub u8);

impl AccessLevel {
    /// Value can be read.
    pub const CURRENT_READ: Self = Self(0x01);
    /// Value can be written.
    pub const CURRENT_WRITE: Self = Self(0x02);
    /// Read and write.
    pub const READ_WRITE: Self = Self(0x03);

    /// True when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        Self::CURRENT_READ
    }
}

/// Object attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectAttributes {
    /// Event notifier bits (bit 0: subscribe to events).
    pub event_notifier: u8,
}

/// Variable attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableAttributes {
    /// Data type of the value.
    pub data_type: NodeId,
    /// `-2` any, `-1` scalar, `0` one or more dimensions, `n` exactly `n`.
    pub value_rank: i32,
    /// Length of each dimension, when fixed.
    pub array_dimensions: Option<Vec<u32>>,
    /// Current value.
    pub value: Variant,
    /// Access level bits.
    pub access_level: AccessLevel,
    /// Fastest supported sampling interval in milliseconds.
    pub minimum_sampling_interval: f64,
    /// History is being collected.
    pub historizing: bool,
}

impl VariableAttributes {
    /// Scalar variable of `data_type` with an empty value.
    #[must_use]
    pub fn new(data_type: NodeId) -> Self {
        Self {
            data_type,
            value_rank: -1,
            array_dimensions: None,
            value: Variant::Empty,
            access_level: AccessLevel::default(),
            minimum_sampling_interval: 0.0,
            historizing: false,
        }
    }
}

/// Method attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodAttributes {
    /// Method can be called.
    pub executable: bool,
    /// Method can be called by the current user.
    pub user_executable: bool,
    /// Instance declaration this method was cloned from.
    pub declaration: Option<NodeId>,
}

impl Default for MethodAttributes {
    fn default() -> Self {
        Self {
            executable: true,
            user_executable: true,
            declaration: None,
        }
    }
}

/// Object type attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectTypeAttributes {
    /// Cannot be instantiated directly.
    pub is_abstract: bool,
}

/// Variable type attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableTypeAttributes {
    /// Cannot be instantiated directly.
    pub is_abstract: bool,
    /// Default data type of instances.
    pub data_type: NodeId,
    /// Default value rank of instances.
    pub value_rank: i32,
    /// Default array dimensions of instances.
    pub array_dimensions: Option<Vec<u32>>,
    /// Default value of instances.
    pub value: Variant,
}

impl VariableTypeAttributes {
    /// Concrete variable type of `data_type`, any rank.
    #[must_use]
    pub const fn new(data_type: NodeId) -> Self {
        Self {
            is_abstract: false,
            data_type,
            value_rank: -2,
            array_dimensions: None,
            value: Variant::Empty,
        }
    }
}

/// Reference type attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceTypeAttributes {
    /// Cannot be used on an edge directly.
    pub is_abstract: bool,
    /// The edge reads the same in both directions.
    pub symmetric: bool,
    /// Name of the inverse direction.
    pub inverse_name: Option<LocalizedText>,
}

/// Data type attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTypeAttributes {
    /// Cannot be used as a variable's data type directly.
    pub is_abstract: bool,
    /// Structure or enumeration layout.
    pub definition: Option<DataTypeDefinition>,
}

/// View attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewAttributes {
    /// The view's hierarchy has no loops.
    pub contains_no_loops: bool,
    /// Event notifier bits.
    pub event_notifier: u8,
}

/// Class-specific attributes. The variant is the node class.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeBody {
    /// [`NodeClass::Object`].
    Object(ObjectAttributes),
    /// [`NodeClass::Variable`].
    Variable(VariableAttributes),
    /// [`NodeClass::Method`].
    Method(MethodAttributes),
    /// [`NodeClass::ObjectType`].
    ObjectType(ObjectTypeAttributes),
    /// [`NodeClass::VariableType`].
    VariableType(VariableTypeAttributes),
    /// [`NodeClass::ReferenceType`].
    ReferenceType(ReferenceTypeAttributes),
    /// [`NodeClass::DataType`].
    DataType(DataTypeAttributes),
    /// [`NodeClass::View`].
    View(ViewAttributes),
}

impl NodeBody {
    /// Node class of this body.
    #[must_use]
    pub const fn node_class(&self) -> NodeClass {
        match self {
            Self::Object(_) => NodeClass::Object,
            Self::Variable(_) => NodeClass::Variable,
            Self::Method(_) => NodeClass::Method,
            Self::ObjectType(_) => NodeClass::ObjectType,
            Self::VariableType(_) => NodeClass::VariableType,
            Self::ReferenceType(_) => NodeClass::ReferenceType,
            Self::DataType(_) => NodeClass::DataType,
            Self::View(_) => NodeClass::View,
        }
    }

    /// Abstract flag for type bodies; false otherwise.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        match self {
            Self::ObjectType(attrs) => attrs.is_abstract,
            Self::VariableType(attrs) => attrs.is_abstract,
            Self::ReferenceType(attrs) => attrs.is_abstract,
            Self::DataType(attrs) => attrs.is_abstract,
            _ => false,
        }
    }

    /// Default body of a property variable.
    #[must_use]
    pub fn property(data_type: NodeId) -> Self {
        Self::Variable(VariableAttributes::new(data_type))
    }

    pub(crate) fn default_type_definition(&self) -> Option<NodeId> {
        match self {
            Self::Object(_) => Some(crate::standard::object_types::BASE_OBJECT_TYPE),
            Self::Variable(_) => Some(variable_types::BASE_DATA_VARIABLE_TYPE),
            _ => None,
        }
    }
}

/// Per-node visibility predicate consulted by browse.
#[derive(Clone)]
pub(crate) struct VisibilityPredicate(pub(crate) Rc<dyn Fn(&SessionContext) -> bool>);

impl fmt::Debug for VisibilityPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VisibilityPredicate(..)")
    }
}

/// Lazily derived lookups. Dropped as a whole on any reference mutation.
#[derive(Debug, Default)]
pub(crate) struct NodeCache {
    pub(crate) children: OnceCell<Vec<(QualifiedName, NodeId)>>,
    pub(crate) parent: OnceCell<Option<NodeId>>,
    pub(crate) type_definition: OnceCell<Option<NodeId>>,
    pub(crate) basic_kind: OnceCell<BuiltinType>,
    pub(crate) subtype_of: RefCell<FxHashMap<NodeId, bool>>,
}

impl NodeCache {
    pub(crate) fn invalidate(&mut self) {
        *self = Self::default();
    }
}

/// A node of the address space.
#[derive(Debug)]
pub struct Node {
    pub(crate) node_id: NodeId,
    pub(crate) browse_name: QualifiedName,
    pub(crate) display_name: Vec<LocalizedText>,
    pub(crate) description: Vec<LocalizedText>,
    pub(crate) body: NodeBody,
    pub(crate) references: ReferenceIndex,
    pub(crate) back_references: ReferenceIndex,
    pub(crate) access_restrictions: AccessRestrictions,
    pub(crate) role_permissions: Option<Vec<RolePermission>>,
    pub(crate) visibility: Option<VisibilityPredicate>,
    pub(crate) cache: NodeCache,
}

impl Node {
    pub(crate) fn new(
        node_id: NodeId,
        browse_name: QualifiedName,
        display_name: Option<LocalizedText>,
        description: Option<LocalizedText>,
        body: NodeBody,
    ) -> Self {
        let display_name =
            display_name.unwrap_or_else(|| LocalizedText::new(browse_name.name.clone()));
        Self {
            node_id,
            browse_name,
            display_name: vec![display_name],
            description: description.into_iter().collect(),
            body,
            references: ReferenceIndex::default(),
            back_references: ReferenceIndex::default(),
            access_restrictions: AccessRestrictions::NONE,
            role_permissions: None,
            visibility: None,
            cache: NodeCache::default(),
        }
    }

    /// Identity of the node.
    #[must_use]
    pub const fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Browse name.
    #[must_use]
    pub const fn browse_name(&self) -> &QualifiedName {
        &self.browse_name
    }

    /// Display names, one per locale.
    #[must_use]
    pub fn display_name(&self) -> &[LocalizedText] {
        &self.display_name
    }

    /// Descriptions, one per locale.
    #[must_use]
    pub fn description(&self) -> &[LocalizedText] {
        &self.description
    }

    /// Node class, fixed at construction.
    #[must_use]
    pub const fn node_class(&self) -> NodeClass {
        self.body.node_class()
    }

    /// Class-specific attributes.
    #[must_use]
    pub const fn body(&self) -> &NodeBody {
        &self.body
    }

    /// True for abstract type nodes.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.body.is_abstract()
    }

    /// Variable attributes, for variables.
    #[must_use]
    pub const fn as_variable(&self) -> Option<&VariableAttributes> {
        match &self.body {
            NodeBody::Variable(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Variable type attributes, for variable types.
    #[must_use]
    pub const fn as_variable_type(&self) -> Option<&VariableTypeAttributes> {
        match &self.body {
            NodeBody::VariableType(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Reference type attributes, for reference types.
    #[must_use]
    pub const fn as_reference_type(&self) -> Option<&ReferenceTypeAttributes> {
        match &self.body {
            NodeBody::ReferenceType(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Data type attributes, for data types.
    #[must_use]
    pub const fn as_data_type(&self) -> Option<&DataTypeAttributes> {
        match &self.body {
            NodeBody::DataType(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Data type of a variable or variable type.
    #[must_use]
    pub const fn data_type(&self) -> Option<&NodeId> {
        match &self.body {
            NodeBody::Variable(attrs) => Some(&attrs.data_type),
            NodeBody::VariableType(attrs) => Some(&attrs.data_type),
            _ => None,
        }
    }

    /// Current value of a variable, default value of a variable type.
    #[must_use]
    pub const fn value(&self) -> Option<&Variant> {
        match &self.body {
            NodeBody::Variable(attrs) => Some(&attrs.value),
            NodeBody::VariableType(attrs) => Some(&attrs.value),
            _ => None,
        }
    }

    /// Event notifier bits of objects and views.
    #[must_use]
    pub const fn event_notifier(&self) -> Option<u8> {
        match &self.body {
            NodeBody::Object(attrs) => Some(attrs.event_notifier),
            NodeBody::View(attrs) => Some(attrs.event_notifier),
            _ => None,
        }
    }

    /// References this node declared, in insertion order.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    /// Mirrors installed by other nodes, in insertion order.
    pub fn back_references(&self) -> impl Iterator<Item = &Reference> {
        self.back_references.iter()
    }

    /// Declared references followed by back-references not declared here.
    pub fn all_references(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter().chain(
            self.back_references
                .iter()
                .filter(|reference| !self.references.contains(reference)),
        )
    }

    /// True when the edge is held by either index.
    #[must_use]
    pub fn has_reference(&self, reference: &Reference) -> bool {
        self.references.contains(reference) || self.back_references.contains(reference)
    }

    /// References of exactly `reference_type` in the given direction.
    #[must_use]
    pub fn find_references(&self, reference_type: &NodeId, is_forward: bool) -> Vec<&Reference> {
        self.all_references()
            .filter(|reference| {
                reference.is_forward == is_forward && reference.reference_type == *reference_type
            })
            .collect()
    }

    /// Total number of edges held by both indices.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.len() + self.back_references.len()
    }

    /// Access restrictions of the node.
    #[must_use]
    pub const fn access_restrictions(&self) -> AccessRestrictions {
        self.access_restrictions
    }

    /// Role permissions; `None` means unrestricted.
    #[must_use]
    pub fn role_permissions(&self) -> Option<&[RolePermission]> {
        self.role_permissions.as_deref()
    }

    /// Evaluates the visibility predicate, if any.
    #[must_use]
    pub fn is_visible_to(&self, context: &SessionContext) -> bool {
        self.visibility
            .as_ref()
            .is_none_or(|predicate| (predicate.0)(context))
    }

    /// Replaces the display names with a single entry.
    pub fn set_display_name(&mut self, text: LocalizedText) {
        self.display_name = vec![text];
    }

    /// Replaces the descriptions with a single entry.
    pub fn set_description(&mut self, text: LocalizedText) {
        self.description = vec![text];
    }

    /// Writes the value of a variable or the default value of a variable type.
    pub fn set_value(&mut self, value: Variant) -> Result<(), AddressSpaceError> {
        match &mut self.body {
            NodeBody::Variable(attrs) => attrs.value = value,
            NodeBody::VariableType(attrs) => attrs.value = value,
            _ => return Err(AddressSpaceError::NotAVariable(self.node_id.clone())),
        }
        Ok(())
    }

    /// Sets the access restriction bits.
    pub fn set_access_restrictions(&mut self, restrictions: AccessRestrictions) {
        self.access_restrictions = restrictions;
    }

    /// Sets or clears the role permissions.
    pub fn set_role_permissions(&mut self, permissions: Option<Vec<RolePermission>>) {
        self.role_permissions = permissions;
    }

    /// Installs a predicate deciding whether a session may see this node in browse results.
    pub fn set_visibility(&mut self, predicate: impl Fn(&SessionContext) -> bool + 'static) {
        self.visibility = Some(VisibilityPredicate(Rc::new(predicate)));
    }

    /// Removes the visibility predicate.
    pub fn clear_visibility(&mut self) {
        self.visibility = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new(
            NodeId::numeric(1, 10),
            QualifiedName::new(1, "Pump"),
            None,
            None,
            NodeBody::Object(ObjectAttributes::default()),
        )
    }

    #[test]
    fn display_name_defaults_to_browse_name() {
        let node = sample();
        assert_eq!(node.display_name()[0].text, "Pump");
        assert!(node.description().is_empty());
        assert_eq!(node.node_class(), NodeClass::Object);
    }

    #[test]
    fn all_references_skips_back_entries_already_declared() {
        let mut node = sample();
        let shared = Reference::forward(NodeId::numeric(0, 47), NodeId::numeric(1, 11));
        node.references.insert(shared.clone());
        node.back_references.insert(shared.clone());
        node.back_references
            .insert(Reference::inverse(NodeId::numeric(0, 35), NodeId::numeric(0, 85)));
        assert_eq!(node.all_references().count(), 2);
        assert_eq!(node.reference_count(), 3);
    }

    #[test]
    fn set_value_rejects_objects() {
        let mut node = sample();
        assert!(matches!(
            node.set_value(Variant::Int32(1)),
            Err(AddressSpaceError::NotAVariable(_))
        ));
    }

    #[test]
    fn modelling_rule_ids_round_trip() {
        for rule in [
            ModellingRule::Mandatory,
            ModellingRule::Optional,
            ModellingRule::OptionalPlaceholder,
            ModellingRule::MandatoryPlaceholder,
            ModellingRule::ExposesItsArray,
        ] {
            assert_eq!(ModellingRule::from_node_id(&rule.node_id()), Some(rule));
        }
    }
}
