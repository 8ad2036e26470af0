// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passes run after the member tree is cloned to restore the edges that
//! tree cloning does not copy.
use tracing::debug;

use crate::address_space::AddressSpace;
use crate::error::AddressSpaceError;
use crate::ident::{NodeClass, NodeId};
use crate::reference::{BrowseDirection, Reference};
use crate::standard::reference_types;

use super::registry::CloneRegistry;

/// Browse name of the functional-group object type.
pub(crate) const FUNCTIONAL_GROUP_TYPE: &str = "FunctionalGroupType";

impl AddressSpace {
    /// Re-creates `Organizes` edges from cloned functional groups to the
    /// clones of the members their originals organize.
    pub(crate) fn repair_functional_groups(
        &mut self,
        registry: &CloneRegistry,
    ) -> Result<(), AddressSpaceError> {
        let Some(group_type) = self
            .nodes()
            .find(|node| {
                node.node_class() == NodeClass::ObjectType
                    && node.browse_name().name == FUNCTIONAL_GROUP_TYPE
            })
            .map(|node| node.node_id().clone())
        else {
            return Ok(());
        };

        let mut missing = Vec::new();
        for (original, clone) in registry.pairs() {
            let is_group = self
                .type_definition_of(clone)
                .is_some_and(|type_id| self.is_subtype_of(&type_id, &group_type));
            if !is_group {
                continue;
            }
            for reference in self.find_references_ex(
                original,
                &reference_types::ORGANIZES,
                BrowseDirection::Forward,
            ) {
                let Some(target) = registry.clone_of(&reference.target) else {
                    continue;
                };
                let edge = Reference::forward(reference.reference_type, target.clone());
                let present = self
                    .find_node(clone)
                    .is_some_and(|node| node.has_reference(&edge));
                if !present && !missing.contains(&(clone.clone(), edge.clone())) {
                    missing.push((clone.clone(), edge));
                }
            }
        }
        for (clone, edge) in missing {
            debug!(group = %clone, member = %edge.target, "functional group link restored");
            self.attach_reference(&clone, edge)?;
        }
        Ok(())
    }

    /// Re-creates non-hierarchical and event-source edges between cloned
    /// members. Type and modelling-rule links are left alone.
    pub(crate) fn repair_cross_references(
        &mut self,
        registry: &CloneRegistry,
    ) -> Result<(), AddressSpaceError> {
        let mut missing: Vec<(NodeId, Reference)> = Vec::new();
        for (original, clone) in registry.pairs() {
            let Some(node) = self.find_node(original) else {
                continue;
            };
            for reference in node.all_references() {
                if reference.reference_type == reference_types::HAS_TYPE_DEFINITION
                    || reference.reference_type == reference_types::HAS_MODELLING_RULE
                {
                    continue;
                }
                let relevant = self.is_subtype_of(
                    &reference.reference_type,
                    &reference_types::NON_HIERARCHICAL_REFERENCES,
                ) || self
                    .is_subtype_of(&reference.reference_type, &reference_types::HAS_EVENT_SOURCE);
                if !relevant {
                    continue;
                }
                let Some(target) = registry.clone_of(&reference.target) else {
                    continue;
                };
                if target == clone {
                    continue;
                }
                let edge = Reference::new(
                    reference.reference_type.clone(),
                    reference.is_forward,
                    target.clone(),
                );
                let mirror = edge.mirror(clone);
                let present = self
                    .find_node(clone)
                    .is_some_and(|node| node.has_reference(&edge))
                    || missing.iter().any(|(source, pending)| {
                        (source == clone && *pending == edge)
                            || (source == target && *pending == mirror)
                    });
                if !present {
                    missing.push((clone.clone(), edge));
                }
            }
        }
        for (clone, edge) in missing {
            debug!(node = %clone, reference = %edge, "cross reference restored");
            self.attach_reference(&clone, edge)?;
        }
        Ok(())
    }
}
