// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural errors: the model is inconsistent and the operation was aborted.
use thiserror::Error;

use crate::ident::{NodeId, QualifiedName};
use crate::reference::Reference;

/// Error returned by mutating and type-resolving operations.
///
/// Lookups never produce this; they return `Option`. Browse and path
/// resolution report status codes instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressSpaceError {
    /// No namespace is registered at this index.
    #[error("namespace index {0} is not registered")]
    InvalidNamespaceIndex(u16),
    /// The node does not exist.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    /// The node id is already assigned.
    #[error("node id {0} is already in use")]
    DuplicateNodeId(NodeId),
    /// The node id's namespace differs from the namespace it is created in.
    #[error("node id {node_id} does not belong to namespace {namespace}")]
    NamespaceMismatch {
        /// Requested id.
        node_id: NodeId,
        /// Namespace the node was created in.
        namespace: u16,
    },
    /// The reference type cannot be resolved to a reference type node.
    #[error("reference type {0} cannot be resolved")]
    UnknownReferenceType(String),
    /// The node already declares this reference.
    #[error("reference {reference} already exists on {node}")]
    DuplicateReference {
        /// Node declaring the reference.
        node: NodeId,
        /// The duplicated edge.
        reference: Reference,
    },
    /// A child with this browse name already exists under the parent.
    #[error("a child named {browse_name} already exists under {parent}")]
    DuplicateBrowseName {
        /// Parent node.
        parent: NodeId,
        /// Colliding browse name.
        browse_name: QualifiedName,
    },
    /// Only object types and variable types can be instantiated.
    #[error("{0} is not an object type or a variable type")]
    NotInstantiable(NodeId),
    /// Abstract types cannot be instantiated.
    #[error("type {0} is abstract")]
    AbstractType(NodeId),
    /// A type names a supertype that does not exist.
    #[error("supertype {supertype} of {type_id} is not defined")]
    MissingSupertype {
        /// Type whose chain is broken.
        type_id: NodeId,
        /// Missing supertype.
        supertype: NodeId,
    },
    /// The data type does not exist, is not a data type, or has no builtin ancestor.
    #[error("data type {0} cannot be resolved")]
    UnresolvedDataType(NodeId),
    /// Instantiation nested deeper than the configured limit.
    #[error("instantiation exceeded the nesting limit of {0}")]
    InstantiationTooDeep(usize),
    /// The node is not a variable or variable type.
    #[error("{0} is not a variable")]
    NotAVariable(NodeId),
    /// The node is not a subtype of the base event type.
    #[error("{0} is not an event type")]
    NotAnEventType(NodeId),
    /// A Mandatory event field was not supplied.
    #[error("event type {event_type} requires field {field}")]
    MissingEventField {
        /// Event type being constructed.
        event_type: NodeId,
        /// Dotted path of the missing field.
        field: String,
    },
    /// A post-instantiation hook rejected the instance.
    #[error("instantiate hook failed: {0}")]
    HookFailed(String),
    /// Every namespace index is taken.
    #[error("namespace table is full")]
    TooManyNamespaces,
    /// Every node slot is taken.
    #[error("node arena is full")]
    ArenaExhausted,
    /// The address space was disposed.
    #[error("address space has been disposed")]
    Disposed,
}
