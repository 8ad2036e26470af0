// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Browse: filtering a node's references into reference descriptions.
use tracing::trace;

use crate::access::SessionContext;
use crate::address_space::AddressSpace;
use crate::ident::{LocalizedText, NodeClass, NodeId, QualifiedName};
use crate::node::Node;
use crate::reference::{BrowseDirection, Reference};
use crate::status::StatusCode;

/// Which fields of a [`ReferenceDescription`] are filled in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct BrowseResultMask(pub u32);

impl BrowseResultMask {
    /// Nothing beyond the target id.
    pub const NONE: Self = Self(0);
    /// Reference type id.
    pub const REFERENCE_TYPE_ID: Self = Self(1);
    /// Direction.
    pub const IS_FORWARD: Self = Self(2);
    /// Target node class.
    pub const NODE_CLASS: Self = Self(4);
    /// Target browse name.
    pub const BROWSE_NAME: Self = Self(8);
    /// Target display name.
    pub const DISPLAY_NAME: Self = Self(16);
    /// Target type definition.
    pub const TYPE_DEFINITION: Self = Self(32);
    /// Every field.
    pub const ALL: Self = Self(63);

    /// True when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for BrowseResultMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// What to browse and how to filter it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BrowseDescription {
    /// Starting node.
    pub node_id: NodeId,
    /// Direction filter.
    pub browse_direction: BrowseDirection,
    /// Reference type filter; `None` or the null id matches every type.
    pub reference_type_id: Option<NodeId>,
    /// Also match subtypes of the reference type.
    pub include_subtypes: bool,
    /// Node-class bit mask of targets; `0` matches every class.
    pub node_class_mask: u32,
    /// Fields to return.
    pub result_mask: BrowseResultMask,
}

impl BrowseDescription {
    /// Forward browse of every reference of `node_id`.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            browse_direction: BrowseDirection::Forward,
            reference_type_id: None,
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BrowseResultMask::ALL,
        }
    }

    /// Sets the direction filter.
    pub fn with_direction(mut self, direction: BrowseDirection) -> Self {
        self.browse_direction = direction;
        self
    }

    /// Sets the reference type filter.
    pub fn with_reference_type(mut self, reference_type: NodeId, include_subtypes: bool) -> Self {
        self.reference_type_id = Some(reference_type);
        self.include_subtypes = include_subtypes;
        self
    }

    /// Sets the node-class mask.
    pub fn with_node_class_mask(mut self, mask: u32) -> Self {
        self.node_class_mask = mask;
        self
    }

    /// Sets the result mask.
    pub fn with_result_mask(mut self, mask: BrowseResultMask) -> Self {
        self.result_mask = mask;
        self
    }
}

/// One surviving reference, projected through the result mask.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReferenceDescription {
    /// Target node.
    pub node_id: NodeId,
    /// Reference type.
    pub reference_type_id: Option<NodeId>,
    /// Direction.
    pub is_forward: Option<bool>,
    /// Target class.
    pub node_class: Option<NodeClass>,
    /// Target browse name.
    pub browse_name: Option<QualifiedName>,
    /// Target display name.
    pub display_name: Option<LocalizedText>,
    /// Target type definition.
    pub type_definition: Option<NodeId>,
}

/// Outcome of [`AddressSpace::browse_single_node`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BrowseResult {
    /// `Good` or the reason the browse was rejected.
    pub status_code: StatusCode,
    /// Matching references.
    pub references: Vec<ReferenceDescription>,
}

impl BrowseResult {
    const fn failed(status_code: StatusCode) -> Self {
        Self {
            status_code,
            references: Vec::new(),
        }
    }
}

impl AddressSpace {
    /// Filters the references of `node` and projects the survivors.
    ///
    /// Filters apply in order: reference type, direction, target node class,
    /// target visibility predicate, caller access policy.
    #[must_use]
    pub fn browse_node(
        &self,
        node: &Node,
        description: &BrowseDescription,
        context: &SessionContext,
    ) -> Vec<ReferenceDescription> {
        let type_filter = description
            .reference_type_id
            .as_ref()
            .filter(|id| !id.is_null());
        node.all_references()
            .filter(|reference| match type_filter {
                None => true,
                Some(wanted) if description.include_subtypes => {
                    self.is_subtype_of(&reference.reference_type, wanted)
                }
                Some(wanted) => reference.reference_type == *wanted,
            })
            .filter(|reference| description.browse_direction.matches(reference.is_forward))
            .filter(|reference| {
                if description.node_class_mask == 0 {
                    return true;
                }
                self.find_node(&reference.target)
                    .is_some_and(|target| target.node_class().mask() & description.node_class_mask != 0)
            })
            .filter(|reference| {
                self.find_node(&reference.target)
                    .is_none_or(|target| target.is_visible_to(context))
            })
            .filter(|reference| {
                self.find_node(&reference.target)
                    .is_none_or(|target| !context.is_browse_access_restricted(target))
            })
            .map(|reference| self.describe(reference, description.result_mask))
            .collect()
    }

    fn describe(&self, reference: &Reference, mask: BrowseResultMask) -> ReferenceDescription {
        let target = self.find_node(&reference.target);
        ReferenceDescription {
            node_id: reference.target.clone(),
            reference_type_id: mask
                .contains(BrowseResultMask::REFERENCE_TYPE_ID)
                .then(|| reference.reference_type.clone()),
            is_forward: mask
                .contains(BrowseResultMask::IS_FORWARD)
                .then_some(reference.is_forward),
            node_class: target
                .filter(|_| mask.contains(BrowseResultMask::NODE_CLASS))
                .map(Node::node_class),
            browse_name: target
                .filter(|_| mask.contains(BrowseResultMask::BROWSE_NAME))
                .map(|node| node.browse_name().clone()),
            display_name: target
                .filter(|_| mask.contains(BrowseResultMask::DISPLAY_NAME))
                .and_then(|node| node.display_name().first().cloned()),
            type_definition: if mask.contains(BrowseResultMask::TYPE_DEFINITION) {
                self.type_definition_of(&reference.target)
            } else {
                None
            },
        }
    }

    /// Browses the node named by `description`, reporting bad requests as
    /// status codes.
    #[must_use]
    pub fn browse_single_node(
        &self,
        description: &BrowseDescription,
        context: &SessionContext,
    ) -> BrowseResult {
        if description.browse_direction == BrowseDirection::Invalid {
            return BrowseResult::failed(StatusCode::BAD_BROWSE_DIRECTION_INVALID);
        }
        if let Some(reference_type) = description
            .reference_type_id
            .as_ref()
            .filter(|id| !id.is_null())
        {
            let valid = self
                .find_node(reference_type)
                .is_some_and(|node| node.node_class() == NodeClass::ReferenceType);
            if !valid {
                return BrowseResult::failed(StatusCode::BAD_REFERENCE_TYPE_ID_INVALID);
            }
        }
        if description.node_id.is_null() {
            return BrowseResult::failed(StatusCode::BAD_NODE_ID_INVALID);
        }
        let Some(node) = self.find_node(&description.node_id) else {
            return BrowseResult::failed(StatusCode::BAD_NODE_ID_UNKNOWN);
        };
        let references = self.browse_node(node, description, context);
        trace!(node = %description.node_id, count = references.len(), "browsed");
        BrowseResult {
            status_code: StatusCode::GOOD,
            references,
        }
    }
}
