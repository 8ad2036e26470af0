// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Namespace 0: well-known node ids and the loader for the standard model.
//!
//! Only the part of the standard model that the engine itself relies on is
//! loaded: the reference type tree, the builtin data types, the base variable
//! and object types, modelling rules, the event types used for model-change
//! notification, the root folders and the `Server` object.
use tracing::debug;

use crate::address_space::AddressSpace;
use crate::error::AddressSpaceError;
use crate::ident::{LocalizedText, NodeId, QualifiedName};
use crate::node::{
    DataTypeAttributes, ModellingRule, Node, NodeBody, ObjectAttributes, ObjectTypeAttributes,
    ReferenceTypeAttributes, VariableAttributes, VariableTypeAttributes,
};
use crate::reference::Reference;
use crate::value::{DataTypeDefinition, StructureField, Variant};

/// URI of namespace 0.
pub const STANDARD_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

const fn ns0(id: u32) -> NodeId {
    NodeId::numeric(0, id)
}

/// Standard reference types.
pub mod reference_types {
    use super::ns0;
    use crate::ident::NodeId;

    /// Abstract root of every reference type.
    pub const REFERENCES: NodeId = ns0(31);
    /// Abstract root of non-hierarchical reference types.
    pub const NON_HIERARCHICAL_REFERENCES: NodeId = ns0(32);
    /// Abstract root of hierarchical reference types.
    pub const HIERARCHICAL_REFERENCES: NodeId = ns0(33);
    /// Abstract parent/child relation.
    pub const HAS_CHILD: NodeId = ns0(34);
    /// Folder organization.
    pub const ORGANIZES: NodeId = ns0(35);
    /// Event propagation from a source to a notifier.
    pub const HAS_EVENT_SOURCE: NodeId = ns0(36);
    /// Instance declaration to modelling rule.
    pub const HAS_MODELLING_RULE: NodeId = ns0(37);
    /// Data type to encoding.
    pub const HAS_ENCODING: NodeId = ns0(38);
    /// Encoding to description.
    pub const HAS_DESCRIPTION: NodeId = ns0(39);
    /// Instance to its type.
    pub const HAS_TYPE_DEFINITION: NodeId = ns0(40);
    /// Type to the events it generates.
    pub const GENERATES_EVENT: NodeId = ns0(41);
    /// Abstract ownership of members.
    pub const AGGREGATES: NodeId = ns0(44);
    /// Supertype to subtype.
    pub const HAS_SUBTYPE: NodeId = ns0(45);
    /// Owner to property.
    pub const HAS_PROPERTY: NodeId = ns0(46);
    /// Owner to component.
    pub const HAS_COMPONENT: NodeId = ns0(47);
    /// Notifier to notifier.
    pub const HAS_NOTIFIER: NodeId = ns0(48);
    /// Ordered components.
    pub const HAS_ORDERED_COMPONENT: NodeId = ns0(49);
    /// Transition to source state.
    pub const FROM_STATE: NodeId = ns0(51);
    /// Transition to target state.
    pub const TO_STATE: NodeId = ns0(52);
    /// Transition to the method causing it.
    pub const HAS_CAUSE: NodeId = ns0(53);
    /// Transition to the event it causes.
    pub const HAS_EFFECT: NodeId = ns0(54);
    /// State machine to nested state machine.
    pub const HAS_SUB_STATE_MACHINE: NodeId = ns0(117);
    /// Type to the events it always generates.
    pub const ALWAYS_GENERATES_EVENT: NodeId = ns0(3065);
}

/// Standard data types.
pub mod data_types {
    use super::ns0;
    use crate::ident::NodeId;

    /// Boolean.
    pub const BOOLEAN: NodeId = ns0(1);
    /// SByte.
    pub const SBYTE: NodeId = ns0(2);
    /// Byte.
    pub const BYTE: NodeId = ns0(3);
    /// Int16.
    pub const INT16: NodeId = ns0(4);
    /// UInt16.
    pub const UINT16: NodeId = ns0(5);
    /// Int32.
    pub const INT32: NodeId = ns0(6);
    /// UInt32.
    pub const UINT32: NodeId = ns0(7);
    /// Int64.
    pub const INT64: NodeId = ns0(8);
    /// UInt64.
    pub const UINT64: NodeId = ns0(9);
    /// Float.
    pub const FLOAT: NodeId = ns0(10);
    /// Double.
    pub const DOUBLE: NodeId = ns0(11);
    /// String.
    pub const STRING: NodeId = ns0(12);
    /// DateTime.
    pub const DATE_TIME: NodeId = ns0(13);
    /// Guid.
    pub const GUID: NodeId = ns0(14);
    /// ByteString.
    pub const BYTE_STRING: NodeId = ns0(15);
    /// XmlElement.
    pub const XML_ELEMENT: NodeId = ns0(16);
    /// NodeId.
    pub const NODE_ID: NodeId = ns0(17);
    /// ExpandedNodeId.
    pub const EXPANDED_NODE_ID: NodeId = ns0(18);
    /// StatusCode.
    pub const STATUS_CODE: NodeId = ns0(19);
    /// QualifiedName.
    pub const QUALIFIED_NAME: NodeId = ns0(20);
    /// LocalizedText.
    pub const LOCALIZED_TEXT: NodeId = ns0(21);
    /// Abstract root of structures.
    pub const STRUCTURE: NodeId = ns0(22);
    /// DataValue.
    pub const DATA_VALUE: NodeId = ns0(23);
    /// Abstract root of every data type.
    pub const BASE_DATA_TYPE: NodeId = ns0(24);
    /// DiagnosticInfo.
    pub const DIAGNOSTIC_INFO: NodeId = ns0(25);
    /// Abstract root of numbers.
    pub const NUMBER: NodeId = ns0(26);
    /// Abstract root of signed integers.
    pub const INTEGER: NodeId = ns0(27);
    /// Abstract root of unsigned integers.
    pub const UINTEGER: NodeId = ns0(28);
    /// Abstract root of enumerations.
    pub const ENUMERATION: NodeId = ns0(29);
    /// Image, a ByteString.
    pub const IMAGE: NodeId = ns0(30);
    /// Duration in milliseconds, a Double.
    pub const DURATION: NodeId = ns0(290);
    /// UtcTime, a DateTime.
    pub const UTC_TIME: NodeId = ns0(294);
    /// LocaleId, a String.
    pub const LOCALE_ID: NodeId = ns0(295);
    /// Method argument description.
    pub const ARGUMENT: NodeId = ns0(296);
    /// One entry of a model-change event.
    pub const MODEL_CHANGE_STRUCTURE_DATA_TYPE: NodeId = ns0(877);
}

/// Standard variable types.
pub mod variable_types {
    use super::ns0;
    use crate::ident::NodeId;

    /// Abstract root of variable types.
    pub const BASE_VARIABLE_TYPE: NodeId = ns0(62);
    /// Default type of data variables.
    pub const BASE_DATA_VARIABLE_TYPE: NodeId = ns0(63);
    /// Type of properties.
    pub const PROPERTY_TYPE: NodeId = ns0(68);
}

/// Standard object types.
pub mod object_types {
    use super::ns0;
    use crate::ident::NodeId;

    /// Root of object types.
    pub const BASE_OBJECT_TYPE: NodeId = ns0(58);
    /// Folders.
    pub const FOLDER_TYPE: NodeId = ns0(61);
    /// Modelling rule objects.
    pub const MODELLING_RULE_TYPE: NodeId = ns0(77);
    /// Server object type.
    pub const SERVER_TYPE: NodeId = ns0(2004);
    /// Root of event types.
    pub const BASE_EVENT_TYPE: NodeId = ns0(2041);
    /// Abstract model-change event.
    pub const BASE_MODEL_CHANGE_EVENT_TYPE: NodeId = ns0(2132);
    /// Model-change event carrying the list of changes.
    pub const GENERAL_MODEL_CHANGE_EVENT_TYPE: NodeId = ns0(2133);
}

/// Modelling rule objects.
pub mod modelling_rules {
    use super::ns0;
    use crate::ident::NodeId;

    /// `Mandatory`.
    pub const MANDATORY: NodeId = ns0(78);
    /// `Optional`.
    pub const OPTIONAL: NodeId = ns0(80);
    /// `ExposesItsArray`.
    pub const EXPOSES_ITS_ARRAY: NodeId = ns0(83);
    /// `OptionalPlaceholder`.
    pub const OPTIONAL_PLACEHOLDER: NodeId = ns0(11508);
    /// `MandatoryPlaceholder`.
    pub const MANDATORY_PLACEHOLDER: NodeId = ns0(11510);
}

/// Well-known objects and variables.
pub mod objects {
    use super::ns0;
    use crate::ident::NodeId;

    /// Root folder.
    pub const ROOT: NodeId = ns0(84);
    /// Objects folder.
    pub const OBJECTS: NodeId = ns0(85);
    /// Types folder.
    pub const TYPES: NodeId = ns0(86);
    /// Views folder.
    pub const VIEWS: NodeId = ns0(87);
    /// Object types folder.
    pub const OBJECT_TYPES: NodeId = ns0(88);
    /// Variable types folder.
    pub const VARIABLE_TYPES: NodeId = ns0(89);
    /// Data types folder.
    pub const DATA_TYPES: NodeId = ns0(90);
    /// Reference types folder.
    pub const REFERENCE_TYPES: NodeId = ns0(91);
    /// The server object; model-change events are raised here.
    pub const SERVER: NodeId = ns0(2253);
    /// Namespace URIs in index order.
    pub const NAMESPACE_ARRAY: NodeId = ns0(2255);
}

/// Well-known roles.
pub mod roles {
    use super::ns0;
    use crate::ident::NodeId;

    /// Anonymous.
    pub const ANONYMOUS: NodeId = ns0(15644);
    /// AuthenticatedUser.
    pub const AUTHENTICATED_USER: NodeId = ns0(15656);
    /// Observer.
    pub const OBSERVER: NodeId = ns0(15668);
    /// Operator.
    pub const OPERATOR: NodeId = ns0(15680);
    /// Engineer.
    pub const ENGINEER: NodeId = ns0(16036);
    /// Supervisor.
    pub const SUPERVISOR: NodeId = ns0(15692);
    /// ConfigureAdmin.
    pub const CONFIGURE_ADMIN: NodeId = ns0(15716);
    /// SecurityAdmin.
    pub const SECURITY_ADMIN: NodeId = ns0(15704);
}

use data_types as dt;
use object_types as ot;
use reference_types as rt;
use variable_types as vt;

// (id, browse name, inverse name, supertype, abstract)
const REFERENCE_TYPES: &[(u32, &str, Option<&str>, Option<u32>, bool)] = &[
    (31, "References", None, None, true),
    (32, "NonHierarchicalReferences", None, Some(31), true),
    (33, "HierarchicalReferences", Some("InverseHierarchicalReferences"), Some(31), true),
    (34, "HasChild", Some("ChildOf"), Some(33), true),
    (35, "Organizes", Some("OrganizedBy"), Some(33), false),
    (36, "HasEventSource", Some("EventSourceOf"), Some(33), false),
    (37, "HasModellingRule", Some("ModellingRuleOf"), Some(32), false),
    (38, "HasEncoding", Some("EncodingOf"), Some(32), false),
    (39, "HasDescription", Some("DescriptionOf"), Some(32), false),
    (40, "HasTypeDefinition", Some("TypeDefinitionOf"), Some(32), false),
    (41, "GeneratesEvent", Some("GeneratedBy"), Some(32), false),
    (44, "Aggregates", Some("AggregatedBy"), Some(34), true),
    (45, "HasSubtype", Some("SubtypeOf"), Some(34), false),
    (46, "HasProperty", Some("PropertyOf"), Some(44), false),
    (47, "HasComponent", Some("ComponentOf"), Some(44), false),
    (48, "HasNotifier", Some("NotifierOf"), Some(36), false),
    (49, "HasOrderedComponent", Some("OrderedComponentOf"), Some(47), false),
    (51, "FromState", Some("ToTransition"), Some(32), false),
    (52, "ToState", Some("FromTransition"), Some(32), false),
    (53, "HasCause", Some("MayBeCausedBy"), Some(32), false),
    (54, "HasEffect", Some("MayBeEffectedBy"), Some(32), false),
    (117, "HasSubStateMachine", Some("SubStateMachineOf"), Some(32), false),
    (3065, "AlwaysGeneratesEvent", Some("AlwaysGeneratedBy"), Some(41), false),
];

// (id, browse name, supertype, abstract)
const DATA_TYPES: &[(u32, &str, Option<u32>, bool)] = &[
    (24, "BaseDataType", None, true),
    (1, "Boolean", Some(24), false),
    (26, "Number", Some(24), true),
    (27, "Integer", Some(26), true),
    (28, "UInteger", Some(26), true),
    (2, "SByte", Some(27), false),
    (4, "Int16", Some(27), false),
    (6, "Int32", Some(27), false),
    (8, "Int64", Some(27), false),
    (3, "Byte", Some(28), false),
    (5, "UInt16", Some(28), false),
    (7, "UInt32", Some(28), false),
    (9, "UInt64", Some(28), false),
    (10, "Float", Some(26), false),
    (11, "Double", Some(26), false),
    (12, "String", Some(24), false),
    (13, "DateTime", Some(24), false),
    (14, "Guid", Some(24), false),
    (15, "ByteString", Some(24), false),
    (16, "XmlElement", Some(24), false),
    (17, "NodeId", Some(24), false),
    (18, "ExpandedNodeId", Some(24), false),
    (19, "StatusCode", Some(24), false),
    (20, "QualifiedName", Some(24), false),
    (21, "LocalizedText", Some(24), false),
    (22, "Structure", Some(24), true),
    (23, "DataValue", Some(24), false),
    (25, "DiagnosticInfo", Some(24), false),
    (29, "Enumeration", Some(24), true),
    (30, "Image", Some(15), false),
    (290, "Duration", Some(11), false),
    (294, "UtcTime", Some(13), false),
    (295, "LocaleId", Some(12), false),
    (296, "Argument", Some(22), false),
    (877, "ModelChangeStructureDataType", Some(22), false),
];

// (id, browse name, data type, value rank)
const BASE_EVENT_FIELDS: &[(u32, &str, u32, i32)] = &[
    (2042, "EventId", 15, -1),
    (2043, "EventType", 17, -1),
    (2044, "SourceNode", 17, -1),
    (2045, "SourceName", 12, -1),
    (2046, "Time", 294, -1),
    (2047, "ReceiveTime", 294, -1),
    (2050, "Message", 21, -1),
    (2051, "Severity", 5, -1),
];

/// Loads the standard model into `space`.
///
/// Nodes are inserted with back-reference propagation suspended and mirrored
/// in one pass at the end. Calling this on a space that already holds
/// namespace-0 nodes fails with [`AddressSpaceError::DuplicateNodeId`].
pub fn bootstrap(space: &mut AddressSpace) -> Result<(), AddressSpaceError> {
    space.suspend_back_references();
    let loaded = load(space);
    let resumed = space.resume_back_references();
    loaded?;
    resumed?;
    debug!(nodes = space.node_count(), "standard model loaded");
    Ok(())
}

fn load(space: &mut AddressSpace) -> Result<(), AddressSpaceError> {
    for &(id, name, inverse, supertype, is_abstract) in REFERENCE_TYPES {
        let attrs = ReferenceTypeAttributes {
            is_abstract,
            symmetric: inverse.is_none(),
            inverse_name: inverse.map(LocalizedText::new),
        };
        let mut references = Vec::new();
        if let Some(supertype) = supertype {
            references.push(Reference::inverse(rt::HAS_SUBTYPE, ns0(supertype)));
        }
        insert(space, ns0(id), name, NodeBody::ReferenceType(attrs), references)?;
        space.namespace_mut(0)?.add_alias(name, ns0(id));
    }

    for &(id, name, supertype, is_abstract) in DATA_TYPES {
        let definition = match id {
            296 => Some(DataTypeDefinition::Structure(vec![
                StructureField::new("Name", dt::STRING),
                StructureField::new("DataType", dt::NODE_ID),
                StructureField::new("ValueRank", dt::INT32),
                StructureField {
                    value_rank: 1,
                    ..StructureField::new("ArrayDimensions", dt::UINT32)
                },
                StructureField::new("Description", dt::LOCALIZED_TEXT),
            ])),
            877 => Some(DataTypeDefinition::Structure(vec![
                StructureField::new("Affected", dt::NODE_ID),
                StructureField::new("AffectedType", dt::NODE_ID),
                StructureField::new("Verb", dt::BYTE),
            ])),
            _ => None,
        };
        let references = supertype
            .map(|supertype| vec![Reference::inverse(rt::HAS_SUBTYPE, ns0(supertype))])
            .unwrap_or_default();
        let body = NodeBody::DataType(DataTypeAttributes {
            is_abstract,
            definition,
        });
        insert(space, ns0(id), name, body, references)?;
        space.namespace_mut(0)?.add_alias(name, ns0(id));
    }

    variable_type(space, vt::BASE_VARIABLE_TYPE, "BaseVariableType", None, true)?;
    variable_type(
        space,
        vt::BASE_DATA_VARIABLE_TYPE,
        "BaseDataVariableType",
        Some(vt::BASE_VARIABLE_TYPE),
        false,
    )?;
    variable_type(space, vt::PROPERTY_TYPE, "PropertyType", Some(vt::BASE_VARIABLE_TYPE), false)?;

    object_type(space, ot::BASE_OBJECT_TYPE, "BaseObjectType", None, false)?;
    object_type(space, ot::FOLDER_TYPE, "FolderType", Some(ot::BASE_OBJECT_TYPE), false)?;
    object_type(
        space,
        ot::MODELLING_RULE_TYPE,
        "ModellingRuleType",
        Some(ot::BASE_OBJECT_TYPE),
        false,
    )?;
    object_type(space, ot::SERVER_TYPE, "ServerType", Some(ot::BASE_OBJECT_TYPE), false)?;
    object_type(space, ot::BASE_EVENT_TYPE, "BaseEventType", Some(ot::BASE_OBJECT_TYPE), true)?;
    object_type(
        space,
        ot::BASE_MODEL_CHANGE_EVENT_TYPE,
        "BaseModelChangeEventType",
        Some(ot::BASE_EVENT_TYPE),
        true,
    )?;
    object_type(
        space,
        ot::GENERAL_MODEL_CHANGE_EVENT_TYPE,
        "GeneralModelChangeEventType",
        Some(ot::BASE_MODEL_CHANGE_EVENT_TYPE),
        false,
    )?;

    for (rule, name) in [
        (ModellingRule::Mandatory, "Mandatory"),
        (ModellingRule::Optional, "Optional"),
        (ModellingRule::ExposesItsArray, "ExposesItsArray"),
        (ModellingRule::OptionalPlaceholder, "OptionalPlaceholder"),
        (ModellingRule::MandatoryPlaceholder, "MandatoryPlaceholder"),
    ] {
        insert(
            space,
            rule.node_id(),
            name,
            NodeBody::Object(ObjectAttributes::default()),
            vec![Reference::forward(rt::HAS_TYPE_DEFINITION, ot::MODELLING_RULE_TYPE)],
        )?;
    }

    for &(id, name, data_type, value_rank) in BASE_EVENT_FIELDS {
        let owner = ot::BASE_EVENT_TYPE;
        property(space, ns0(id), name, owner, ns0(data_type), value_rank, Variant::Empty)?;
        mandatory(space, &ns0(id))?;
    }
    property(
        space,
        ns0(2134),
        "Changes",
        ot::GENERAL_MODEL_CHANGE_EVENT_TYPE,
        dt::MODEL_CHANGE_STRUCTURE_DATA_TYPE,
        1,
        Variant::Empty,
    )?;
    mandatory(space, &ns0(2134))?;

    folder(space, objects::ROOT, "Root", None)?;
    folder(space, objects::OBJECTS, "Objects", Some(objects::ROOT))?;
    folder(space, objects::TYPES, "Types", Some(objects::ROOT))?;
    folder(space, objects::VIEWS, "Views", Some(objects::ROOT))?;
    folder(space, objects::OBJECT_TYPES, "ObjectTypes", Some(objects::TYPES))?;
    folder(space, objects::VARIABLE_TYPES, "VariableTypes", Some(objects::TYPES))?;
    folder(space, objects::DATA_TYPES, "DataTypes", Some(objects::TYPES))?;
    folder(space, objects::REFERENCE_TYPES, "ReferenceTypes", Some(objects::TYPES))?;
    for (folder, root) in [
        (objects::OBJECT_TYPES, ot::BASE_OBJECT_TYPE),
        (objects::VARIABLE_TYPES, vt::BASE_VARIABLE_TYPE),
        (objects::DATA_TYPES, dt::BASE_DATA_TYPE),
        (objects::REFERENCE_TYPES, rt::REFERENCES),
    ] {
        space.attach_reference(&folder, Reference::forward(rt::ORGANIZES, root))?;
    }

    insert(
        space,
        objects::SERVER,
        "Server",
        NodeBody::Object(ObjectAttributes { event_notifier: 1 }),
        vec![
            Reference::inverse(rt::ORGANIZES, objects::OBJECTS),
            Reference::forward(rt::HAS_TYPE_DEFINITION, ot::SERVER_TYPE),
        ],
    )?;
    let uris = Variant::Array(vec![Variant::String(STANDARD_NAMESPACE_URI.to_owned())]);
    property(space, objects::NAMESPACE_ARRAY, "NamespaceArray", objects::SERVER, dt::STRING, 1, uris)?;
    Ok(())
}

fn insert(
    space: &mut AddressSpace,
    id: NodeId,
    name: &str,
    body: NodeBody,
    references: Vec<Reference>,
) -> Result<(), AddressSpaceError> {
    space.insert_node(Node::new(id.clone(), QualifiedName::new(0, name), None, None, body))?;
    for reference in references {
        space.attach_reference(&id, reference)?;
    }
    Ok(())
}

fn mandatory(space: &mut AddressSpace, id: &NodeId) -> Result<(), AddressSpaceError> {
    let rule = Reference::forward(rt::HAS_MODELLING_RULE, ModellingRule::Mandatory.node_id());
    space.attach_reference(id, rule)
}

fn supertype_link(supertype: Option<NodeId>) -> Vec<Reference> {
    supertype
        .map(|supertype| vec![Reference::inverse(rt::HAS_SUBTYPE, supertype)])
        .unwrap_or_default()
}

fn object_type(
    space: &mut AddressSpace,
    id: NodeId,
    name: &str,
    supertype: Option<NodeId>,
    is_abstract: bool,
) -> Result<(), AddressSpaceError> {
    let body = NodeBody::ObjectType(ObjectTypeAttributes { is_abstract });
    insert(space, id, name, body, supertype_link(supertype))
}

fn variable_type(
    space: &mut AddressSpace,
    id: NodeId,
    name: &str,
    supertype: Option<NodeId>,
    is_abstract: bool,
) -> Result<(), AddressSpaceError> {
    let body = NodeBody::VariableType(VariableTypeAttributes {
        is_abstract,
        ..VariableTypeAttributes::new(dt::BASE_DATA_TYPE)
    });
    insert(space, id, name, body, supertype_link(supertype))
}

fn property(
    space: &mut AddressSpace,
    id: NodeId,
    name: &str,
    owner: NodeId,
    data_type: NodeId,
    value_rank: i32,
    value: Variant,
) -> Result<(), AddressSpaceError> {
    let body = NodeBody::Variable(VariableAttributes {
        value_rank,
        value,
        ..VariableAttributes::new(data_type)
    });
    insert(
        space,
        id,
        name,
        body,
        vec![
            Reference::inverse(rt::HAS_PROPERTY, owner),
            Reference::forward(rt::HAS_TYPE_DEFINITION, vt::PROPERTY_TYPE),
        ],
    )
}

fn folder(
    space: &mut AddressSpace,
    id: NodeId,
    name: &str,
    parent: Option<NodeId>,
) -> Result<(), AddressSpaceError> {
    let mut references = vec![Reference::forward(rt::HAS_TYPE_DEFINITION, ot::FOLDER_TYPE)];
    if let Some(parent) = parent {
        references.insert(0, Reference::inverse(rt::ORGANIZES, parent));
    }
    insert(space, id, name, NodeBody::Object(ObjectAttributes::default()), references)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::AddressSpaceConfig;

    fn loaded() -> AddressSpace {
        let mut space = AddressSpace::bare(AddressSpaceConfig::default());
        bootstrap(&mut space).unwrap();
        space
    }

    #[test]
    fn reference_tree_is_connected() {
        let space = loaded();
        assert!(space.is_subtype_of(&rt::HAS_ORDERED_COMPONENT, &rt::AGGREGATES));
        assert!(space.is_subtype_of(&rt::HAS_NOTIFIER, &rt::HAS_EVENT_SOURCE));
        assert!(!space.is_subtype_of(&rt::HAS_TYPE_DEFINITION, &rt::HIERARCHICAL_REFERENCES));
    }

    #[test]
    fn mirrors_are_installed_after_load() {
        let space = loaded();
        assert_eq!(space.subtypes_of(&rt::AGGREGATES), vec![rt::HAS_PROPERTY, rt::HAS_COMPONENT]);
        let folder = space.child_by_name(&objects::ROOT, "Objects").unwrap();
        assert_eq!(folder.node_id(), &objects::OBJECTS);
    }

    #[test]
    fn aliases_cover_builtin_types() {
        let space = loaded();
        assert_eq!(space.resolve_alias(0, "Double").unwrap(), Some(dt::DOUBLE));
        assert_eq!(space.resolve_alias(0, "HasComponent").unwrap(), Some(rt::HAS_COMPONENT));
    }

    #[test]
    fn loading_twice_is_rejected() {
        let mut space = loaded();
        assert!(matches!(
            bootstrap(&mut space),
            Err(AddressSpaceError::DuplicateNodeId(_))
        ));
    }
}
