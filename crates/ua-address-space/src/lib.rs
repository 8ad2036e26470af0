// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! ua-address-space: an in-memory OPC UA style address space.
//!
//! Nodes live in an arena owned by [`AddressSpace`] and are addressed by
//! [`NodeId`] through per-namespace tables. References are stored on both
//! endpoints so inverse navigation costs the same as forward navigation.
//! On top of that graph sit the type hierarchy, object-type instantiation,
//! model-change events and the browse services.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::future_not_send
)]
// `AddressSpace` is single-threaded (`Rc` hooks, cell-backed caches), so its
// shutdown future is not `Send`.

mod access;
mod address_space;
mod browse;
mod browse_path;
mod config;
mod error;
mod event;
mod factory;
mod hierarchy;
mod ident;
mod instantiate;
mod model_change;
mod mutation;
mod namespace;
mod navigation;
mod node;
mod reference;
mod relative_path;
mod shutdown;
/// Well-known ids of the standard namespace and its bootstrap.
pub mod standard;
mod status;
mod value;

/// Role-based access checks applied by browse.
pub use access::{
    AccessRestrictions, MessageSecurityMode, PermissionType, RolePermission, SessionContext,
};
/// The address space facade.
pub use address_space::AddressSpace;
/// Browse requests and results.
pub use browse::{BrowseDescription, BrowseResult, BrowseResultMask, ReferenceDescription};
/// Browse-path resolution.
pub use browse_path::{BrowsePath, BrowsePathResult, BrowsePathTarget, REMAINING_PATH_COMPLETE};
/// Tunables loaded through a config store.
pub use config::AddressSpaceConfig;
/// Error type of fallible address space operations.
pub use error::AddressSpaceError;
/// Event construction and delivery.
pub use event::{EventData, EventSink, EventSubscription, RaisedEvent};
/// Default values for structured data types.
pub use factory::{DefinitionFactory, ExtensionObjectFactory};
/// Node identity and naming.
pub use ident::{Identifier, IdentifierKind, LocalizedText, NodeClass, NodeId, NodeIdParseError, QualifiedName};
/// Object-type instantiation.
pub use instantiate::{InstantiateHook, InstantiateOptions};
/// Model-change bookkeeping.
pub use model_change::{ModelChangeRecord, ModelChangeVerb};
/// Drafts for new nodes.
pub use mutation::{NewNode, ParentLink};
/// Per-namespace node tables.
pub use namespace::Namespace;
/// Nodes and their class-specific attributes.
pub use node::{
    AccessLevel, DataTypeAttributes, MethodAttributes, ModellingRule, Node, NodeBody, NodeIndex,
    ObjectAttributes, ObjectTypeAttributes, ReferenceTypeAttributes, VariableAttributes,
    VariableTypeAttributes, ViewAttributes,
};
/// References and reference declarations.
pub use reference::{BrowseDirection, Reference, ReferenceSpec, ReferenceTypeRef};
/// Relative paths and their text form.
pub use relative_path::{RelativePath, RelativePathElement, RelativePathError};
/// Asynchronous teardown.
pub use shutdown::{ShutdownError, ShutdownTask};
/// Service-level result codes.
pub use status::StatusCode;
/// Attribute values.
pub use value::{BuiltinType, DataTypeDefinition, EnumField, ExtensionObject, StructureField, Variant};
