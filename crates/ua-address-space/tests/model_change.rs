// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Model-change coalescing, events and node versions.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::panic)]

mod common;

use ua_address_space::standard::{data_types, object_types, objects, reference_types};
use ua_address_space::{
    AddressSpace, ModelChangeVerb, NewNode, NodeId, QualifiedName, RaisedEvent, ReferenceSpec,
    Variant,
};
use ua_dry_tests::{AddressSpaceTestBuilder, RecordingSink};

fn space_with_sink() -> (AddressSpace, RecordingSink) {
    let (space, _model, events) = AddressSpaceTestBuilder::new().build().unwrap();
    (space, events)
}

/// `(affected, verb)` pairs carried by a model-change event.
fn changes(event: &RaisedEvent) -> Vec<(NodeId, u8)> {
    let Some(Variant::Array(items)) = event.data.field("Changes") else {
        panic!("event has no Changes field: {event:?}");
    };
    items
        .iter()
        .map(|item| {
            let structure = item.as_extension_object().unwrap();
            let affected = structure.field("Affected").and_then(Variant::as_node_id).unwrap().clone();
            let Some(Variant::Byte(verb)) = structure.field("Verb") else {
                panic!("change without verb");
            };
            (affected, *verb)
        })
        .collect()
}

fn verb_of(event: &RaisedEvent, node: &NodeId) -> Option<ModelChangeVerb> {
    changes(event)
        .into_iter()
        .find(|(affected, _)| affected == node)
        .map(|(_, verb)| ModelChangeVerb(verb))
}

fn add_folder(space: &mut AddressSpace, name: &str, parent: NodeId) -> NodeId {
    let ns = space.own_namespace_index();
    space
        .add_node(
            ns,
            NewNode::object(QualifiedName::new(ns, name))
                .organized_by(parent)
                .with_type_definition(object_types::FOLDER_TYPE),
        )
        .unwrap()
}

#[test]
fn single_mutation_raises_one_event_on_the_server() {
    let (mut space, events) = space_with_sink();
    let folder = add_folder(&mut space, "Plant", objects::OBJECTS);

    let raised = events.of_type(&object_types::GENERAL_MODEL_CHANGE_EVENT_TYPE);
    assert_eq!(raised.len(), 1);
    let event = &raised[0];
    assert_eq!(event.source, objects::SERVER);
    assert_eq!(
        event.data.field("SourceNode"),
        Some(&Variant::NodeId(objects::SERVER))
    );

    let verb = verb_of(event, &folder).unwrap();
    assert!(verb.contains(ModelChangeVerb::NODE_ADDED));
    assert!(verb.contains(ModelChangeVerb::REFERENCE_ADDED));
    let parent = verb_of(event, &objects::OBJECTS).unwrap();
    assert_eq!(parent, ModelChangeVerb::REFERENCE_ADDED);
}

#[test]
fn records_coalesce_per_node_inside_a_transaction() {
    let (mut space, events) = space_with_sink();
    space.model_change_transaction(|space| {
        let line = add_folder(space, "Line", objects::OBJECTS);
        add_folder(space, "Cell1", line.clone());
        add_folder(space, "Cell2", line);
        assert!(!space.pending_model_changes().is_empty());
    });

    assert_eq!(events.len(), 1);
    let event = &events.events()[0];
    let all = changes(event);
    let mut affected: Vec<&NodeId> = all.iter().map(|(id, _)| id).collect();
    let before = affected.len();
    affected.sort();
    affected.dedup();
    assert_eq!(affected.len(), before, "one record per node");
    assert!(space.pending_model_changes().is_empty());
}

#[test]
fn nested_transactions_flush_at_the_outermost_end() {
    let (mut space, events) = space_with_sink();
    space.begin_model_change();
    space.begin_model_change();
    add_folder(&mut space, "A", objects::OBJECTS);
    space.end_model_change();
    assert!(events.is_empty());
    add_folder(&mut space, "B", objects::OBJECTS);
    space.end_model_change();
    assert_eq!(events.len(), 1);

    // Unbalanced end is ignored.
    space.end_model_change();
    assert_eq!(events.len(), 1);
}

#[test]
fn deletion_and_retyping_carry_their_verbs() {
    let (mut space, events) = space_with_sink();
    let ns = space.own_namespace_index();
    let level = space
        .add_node(
            ns,
            NewNode::variable(QualifiedName::new(ns, "Level"), data_types::DOUBLE)
                .organized_by(objects::OBJECTS),
        )
        .unwrap();
    events.clear();

    space.set_data_type(&level, data_types::FLOAT).unwrap();
    let event = events.events().pop().unwrap();
    assert_eq!(verb_of(&event, &level), Some(ModelChangeVerb::DATA_TYPE_CHANGED));

    events.clear();
    space.delete_node(&level).unwrap();
    let event = events.events().pop().unwrap();
    assert!(verb_of(&event, &level).unwrap().contains(ModelChangeVerb::NODE_DELETED));
    assert_eq!(
        verb_of(&event, &objects::OBJECTS),
        Some(ModelChangeVerb::REFERENCE_DELETED)
    );
}

#[test]
fn instantiation_is_announced_once() {
    let (mut space, model, events) = AddressSpaceTestBuilder::new()
        .with_sample_model()
        .build()
        .unwrap();
    let model = model.unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);

    assert_eq!(events.len(), 1);
    let event = &events.events()[0];
    assert!(verb_of(event, &pump).unwrap().contains(ModelChangeVerb::NODE_ADDED));
    let range = common::child(&space, &pump, "Range");
    assert!(verb_of(event, &range).is_some());
}

#[test]
fn tracking_can_be_disabled() {
    let (mut space, _model, events) = AddressSpaceTestBuilder::new()
        .without_model_change_tracking()
        .build()
        .unwrap();
    add_folder(&mut space, "Quiet", objects::OBJECTS);
    assert!(events.is_empty());
    assert!(space.pending_model_changes().is_empty());
}

#[test]
fn node_version_bumps_when_references_change() {
    let (mut space, _events) = space_with_sink();
    let ns = space.own_namespace_index();
    let tank = space
        .add_node(
            ns,
            NewNode::object(QualifiedName::new(ns, "Tank"))
                .organized_by(objects::OBJECTS)
                .with_node_version(),
        )
        .unwrap();
    assert_eq!(common::node_version(&space, &tank).as_deref(), Some("0"));

    add_folder(&mut space, "Inlet", tank.clone());
    assert_eq!(common::node_version(&space, &tank).as_deref(), Some("1"));

    // Several edits in one transaction bump once.
    space.model_change_transaction(|space| {
        add_folder(space, "Outlet", tank.clone());
        space
            .add_reference(
                &tank,
                ReferenceSpec::new(reference_types::HAS_EVENT_SOURCE, objects::SERVER).inverse(),
            )
            .unwrap();
    });
    assert_eq!(common::node_version(&space, &tank).as_deref(), Some("2"));
}

#[test]
fn standalone_reference_edits_announce_both_ends_together() {
    let (mut space, events) = space_with_sink();
    let a = add_folder(&mut space, "A", objects::OBJECTS);
    let b = add_folder(&mut space, "B", objects::OBJECTS);
    events.clear();

    let spec = ReferenceSpec::new(reference_types::ORGANIZES, b.clone());
    space.add_reference(&a, spec.clone()).unwrap();
    let raised = events.of_type(&object_types::GENERAL_MODEL_CHANGE_EVENT_TYPE);
    assert_eq!(raised.len(), 1);
    assert_eq!(verb_of(&raised[0], &a), Some(ModelChangeVerb::REFERENCE_ADDED));
    assert_eq!(verb_of(&raised[0], &b), Some(ModelChangeVerb::REFERENCE_ADDED));

    events.clear();
    assert!(space.remove_reference(&a, spec.clone()).unwrap());
    let raised = events.of_type(&object_types::GENERAL_MODEL_CHANGE_EVENT_TYPE);
    assert_eq!(raised.len(), 1);
    assert_eq!(verb_of(&raised[0], &a), Some(ModelChangeVerb::REFERENCE_DELETED));
    assert_eq!(verb_of(&raised[0], &b), Some(ModelChangeVerb::REFERENCE_DELETED));

    events.clear();
    assert!(!space.remove_reference(&a, spec).unwrap());
    assert!(events.is_empty());
}
