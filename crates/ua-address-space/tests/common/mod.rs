// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::panic)]

use ua_address_space::standard::objects;
use ua_address_space::{AddressSpace, InstantiateOptions, NodeId, QualifiedName, Variant};
use ua_dry_tests::SampleModel;

/// Instantiates `type_id` as `name` under `Objects` in the own namespace.
pub fn instance_under_objects(space: &mut AddressSpace, type_id: &NodeId, name: &str) -> NodeId {
    let ns = space.own_namespace_index();
    space
        .instantiate(
            type_id,
            InstantiateOptions::new(QualifiedName::new(ns, name)).organized_by(objects::OBJECTS),
        )
        .unwrap()
}

/// Instance with an explicit string id so member ids are predictable.
pub fn named_instance(
    space: &mut AddressSpace,
    model: &SampleModel,
    type_id: &NodeId,
    name: &str,
    optionals: &[&str],
) -> NodeId {
    space
        .instantiate(
            type_id,
            InstantiateOptions::new(model.name(name))
                .with_node_id(NodeId::string(model.namespace, name))
                .organized_by(objects::OBJECTS)
                .with_optionals(optionals.iter().copied()),
        )
        .unwrap()
}

/// Browse names of the hierarchical children of `node`, sorted.
pub fn child_names(space: &AddressSpace, node: &NodeId) -> Vec<String> {
    let mut names: Vec<String> = space
        .children(node)
        .into_iter()
        .map(|(name, _)| name.name)
        .collect();
    names.sort();
    names
}

/// Child of `parent` by browse name.
pub fn child(space: &AddressSpace, parent: &NodeId, name: &str) -> NodeId {
    space
        .child_by_name(parent, name)
        .map(|node| node.node_id().clone())
        .unwrap_or_else(|| panic!("{parent} has no child {name}"))
}

/// True when `source` has a forward reference of exactly `reference_type` to `target`.
pub fn has_forward(space: &AddressSpace, source: &NodeId, reference_type: &NodeId, target: &NodeId) -> bool {
    space
        .find_node(source)
        .unwrap()
        .find_references(reference_type, true)
        .iter()
        .any(|reference| reference.target == *target)
}

/// Every edge declared anywhere has its mirror on the other end.
pub fn assert_references_mirrored(space: &AddressSpace) {
    for node in space.nodes() {
        for reference in node.all_references() {
            let Some(target) = space.find_node(&reference.target) else {
                continue;
            };
            let mirror = reference.mirror(node.node_id());
            assert!(
                target.has_reference(&mirror),
                "{} -> {reference} has no mirror on the target",
                node.node_id()
            );
        }
    }
}

/// Current `NodeVersion` of `node`, if it has one.
pub fn node_version(space: &AddressSpace, node: &NodeId) -> Option<String> {
    space
        .child_by_name(node, "NodeVersion")
        .and_then(|version| version.value())
        .and_then(Variant::as_str)
        .map(str::to_owned)
}
