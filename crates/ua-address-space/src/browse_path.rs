// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolving relative paths to target nodes.
use tracing::debug;

use crate::access::SessionContext;
use crate::address_space::AddressSpace;
use crate::browse::{BrowseDescription, BrowseResultMask};
use crate::ident::NodeId;
use crate::reference::BrowseDirection;
use crate::relative_path::{RelativePath, RelativePathElement, RelativePathError};
use crate::status::StatusCode;

/// `remaining_path_index` of a target reached by the whole path.
pub const REMAINING_PATH_COMPLETE: u32 = u32::MAX;

/// A starting node and the path to follow from it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BrowsePath {
    /// Where the walk starts.
    pub starting_node: NodeId,
    /// Hops to follow.
    pub relative_path: RelativePath,
}

impl BrowsePath {
    /// Pairs a starting node with a path.
    pub fn new(starting_node: NodeId, relative_path: impl Into<RelativePath>) -> Self {
        Self {
            starting_node,
            relative_path: relative_path.into(),
        }
    }
}

/// A node reached by a browse path.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BrowsePathTarget {
    /// The node reached.
    pub target_id: NodeId,
    /// Index of the first element not followed, or [`REMAINING_PATH_COMPLETE`].
    pub remaining_path_index: u32,
}

/// Outcome of [`AddressSpace::browse_path`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BrowsePathResult {
    /// `Good` or the reason the path did not resolve.
    pub status_code: StatusCode,
    /// Distinct targets in discovery order.
    pub targets: Vec<BrowsePathTarget>,
}

impl BrowsePathResult {
    const fn failed(status_code: StatusCode) -> Self {
        Self {
            status_code,
            targets: Vec::new(),
        }
    }
}

impl AddressSpace {
    /// Follows `path` from its starting node depth first.
    #[must_use]
    pub fn browse_path(&self, path: &BrowsePath) -> BrowsePathResult {
        if !self.contains(&path.starting_node) {
            return BrowsePathResult::failed(StatusCode::BAD_NODE_ID_UNKNOWN);
        }
        let elements = &path.relative_path.elements;
        if elements.is_empty() {
            return BrowsePathResult::failed(StatusCode::BAD_NOTHING_TO_DO);
        }
        if elements.iter().any(|element| element.target_name.is_empty()) {
            return BrowsePathResult::failed(StatusCode::BAD_BROWSE_NAME_INVALID);
        }

        let mut found = Vec::new();
        self.walk_path(&path.starting_node, elements, &mut found);
        if found.is_empty() {
            debug!(start = %path.starting_node, hops = elements.len(), "browse path matched nothing");
            return BrowsePathResult::failed(StatusCode::BAD_NO_MATCH);
        }
        BrowsePathResult {
            status_code: StatusCode::GOOD,
            targets: found
                .into_iter()
                .map(|target_id| BrowsePathTarget {
                    target_id,
                    remaining_path_index: REMAINING_PATH_COMPLETE,
                })
                .collect(),
        }
    }

    fn walk_path(&self, node: &NodeId, elements: &[RelativePathElement], found: &mut Vec<NodeId>) {
        let Some((element, rest)) = elements.split_first() else {
            if !found.contains(node) {
                found.push(node.clone());
            }
            return;
        };
        for next in self.browse_node_by_target_name(node, element, rest.is_empty()) {
            self.walk_path(&next, rest, found);
        }
    }

    /// Targets of one path hop from `node`.
    ///
    /// On the last hop an empty target name matches every target. When a type
    /// node has no match of its own, the hop is retried on its supertypes so
    /// inherited instance declarations resolve.
    #[must_use]
    pub fn browse_node_by_target_name(
        &self,
        node: &NodeId,
        element: &RelativePathElement,
        is_last: bool,
    ) -> Vec<NodeId> {
        let direction = if element.is_inverse {
            BrowseDirection::Inverse
        } else {
            BrowseDirection::Forward
        };
        let mut description = BrowseDescription::new(node.clone())
            .with_direction(direction)
            .with_result_mask(BrowseResultMask::BROWSE_NAME);
        description.reference_type_id.clone_from(&element.reference_type_id);
        description.include_subtypes = element.include_subtypes;
        let match_all = is_last && element.target_name.is_empty();
        let context = SessionContext::system();

        let mut current = node.clone();
        let mut visited = vec![current.clone()];
        loop {
            let Some(entry) = self.find_node(&current) else {
                return Vec::new();
            };
            description.node_id = current.clone();
            let mut targets = Vec::new();
            for candidate in self.browse_node(entry, &description, &context) {
                let matches = match_all
                    || candidate.browse_name.as_ref() == Some(&element.target_name);
                if matches && !targets.contains(&candidate.node_id) {
                    targets.push(candidate.node_id);
                }
            }
            if !targets.is_empty() || !entry.node_class().is_type() {
                return targets;
            }
            match self.supertype_of(&current) {
                Some(supertype) if !visited.contains(&supertype) => {
                    visited.push(supertype.clone());
                    current = supertype;
                }
                _ => return targets,
            }
        }
    }

    /// Parses `text` and resolves it from `start`.
    pub fn translate_browse_path(
        &self,
        start: &NodeId,
        text: &str,
    ) -> Result<BrowsePathResult, RelativePathError> {
        let relative_path = self.parse_relative_path(text)?;
        Ok(self.browse_path(&BrowsePath::new(start.clone(), relative_path)))
    }
}
