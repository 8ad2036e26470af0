// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node deletion.
//!
//! Deleting a node removes its Aggregates subtree and every edge touching
//! any removed node; nodes merely organized by it survive.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use ua_address_space::standard::{object_types, objects, reference_types};
use ua_address_space::{AddressSpaceError, InstantiateOptions, NodeId};
use ua_dry_tests::sample_space;

// =============================================================================
// Subtree removal
// =============================================================================

#[test]
fn deleting_an_instance_removes_its_members() {
    let (mut space, model) = sample_space().unwrap();
    let before = space.node_count();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let range = common::child(&space, &pump, "Range");
    let low = common::child(&space, &range, "Low");
    assert!(space.node_count() > before);

    space.delete_node(&pump).unwrap();
    assert_eq!(space.node_count(), before);
    for gone in [&pump, &range, &low] {
        assert!(!space.contains(gone), "{gone} survived");
    }
    assert!(space.child_by_name(&objects::OBJECTS, "Pump1").is_none());
    common::assert_references_mirrored(&space);
}

#[test]
fn organized_nodes_survive_their_folder() {
    let (mut space, model) = sample_space().unwrap();
    let ns = space.own_namespace_index();
    let folder = space
        .instantiate(
            &object_types::FOLDER_TYPE,
            InstantiateOptions::new(ua_address_space::QualifiedName::new(ns, "Area"))
                .with_node_id(NodeId::string(ns, "Area"))
                .organized_by(objects::OBJECTS),
        )
        .unwrap();
    let device = space
        .instantiate(
            &model.device_type,
            InstantiateOptions::new(model.name("Dev")).organized_by(folder.clone()),
        )
        .unwrap();

    space.delete_node(&folder).unwrap();
    assert!(!space.contains(&folder));
    assert!(space.contains(&device));
    assert!(space
        .find_node(&device)
        .unwrap()
        .find_references(&reference_types::ORGANIZES, false)
        .is_empty());
}

#[test]
fn deleting_a_cross_reference_target_drops_the_edge() {
    let (mut space, model) = sample_space().unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let flow = common::child(&space, &pump, "FlowRate");
    let range = common::child(&space, &pump, "Range");

    space.delete_node(&range).unwrap();
    assert!(space
        .find_node(&flow)
        .unwrap()
        .find_references(&model.measured_by, true)
        .is_empty());
    assert!(space.child_by_name(&pump, "Range").is_none());
    common::assert_references_mirrored(&space);
}

#[test]
fn deleting_a_type_updates_the_hierarchy() {
    let (mut space, model) = sample_space().unwrap();
    assert!(space.is_subtype_of(&model.pump_type, &model.device_type));
    space.delete_node(&model.device_type).unwrap();
    assert_eq!(space.supertype_of(&model.pump_type), None);
    assert!(!space.is_subtype_of(&model.pump_type, &model.device_type));
    assert!(space.find_object_type("DeviceType").is_none());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unknown_nodes_cannot_be_deleted() {
    let (mut space, model) = sample_space().unwrap();
    let missing = NodeId::string(model.namespace, "Ghost");
    assert_eq!(
        space.delete_node(&missing).unwrap_err(),
        AddressSpaceError::UnknownNode(missing)
    );
}
