// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event raising, notifier propagation, subscriptions, shutdown and disposal.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::FutureExt;
use ua_address_space::standard::{data_types, object_types, objects};
use ua_address_space::{
    AddressSpace, AddressSpaceError, LocalizedText, ModellingRule, NewNode, NodeId, QualifiedName,
    ShutdownError, Variant,
};
use ua_dry_tests::{AddressSpaceTestBuilder, RecordingSink};

/// `AlarmEventType` with a Mandatory `Limit` and an Optional `Note`.
fn alarm_type(space: &mut AddressSpace) -> NodeId {
    let ns = space.own_namespace_index();
    let alarm = space
        .add_node(
            ns,
            NewNode::object_type(QualifiedName::new(ns, "AlarmEventType"))
                .subtype_of(object_types::BASE_EVENT_TYPE),
        )
        .unwrap();
    for (name, rule) in [("Limit", ModellingRule::Mandatory), ("Note", ModellingRule::Optional)] {
        space
            .add_node(
                ns,
                NewNode::property(QualifiedName::new(ns, name), data_types::DOUBLE)
                    .property_of(alarm.clone())
                    .with_modelling_rule(rule),
            )
            .unwrap();
    }
    alarm
}

fn base_fields() -> BTreeMap<String, Variant> {
    BTreeMap::from([
        ("Message".to_owned(), Variant::LocalizedText(LocalizedText::new("over limit"))),
        ("Severity".to_owned(), Variant::UInt16(700)),
    ])
}

fn quiet_space() -> (AddressSpace, RecordingSink) {
    let (space, _model, events) = AddressSpaceTestBuilder::new()
        .without_model_change_tracking()
        .build()
        .unwrap();
    (space, events)
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn standard_fields_are_filled_in() {
    let (mut space, events) = quiet_space();
    let alarm = alarm_type(&mut space);
    let mut fields = base_fields();
    fields.insert("Limit".to_owned(), Variant::Double(90.0));

    let event = space.raise_event(&objects::SERVER, &alarm, fields).unwrap();
    assert_eq!(event.data.field("EventType"), Some(&Variant::NodeId(alarm.clone())));
    assert_eq!(event.data.field("SourceName"), Some(&Variant::from("Server")));
    assert!(matches!(event.data.field("EventId"), Some(Variant::ByteString(id)) if id.len() == 16));
    assert!(event.data.field("Time").is_some());
    assert_eq!(events.of_type(&alarm), [event]);
}

#[test]
fn missing_mandatory_fields_are_rejected() {
    let (mut space, events) = quiet_space();
    let alarm = alarm_type(&mut space);

    let err = space
        .raise_event(&objects::SERVER, &alarm, base_fields())
        .unwrap_err();
    assert_eq!(
        err,
        AddressSpaceError::MissingEventField {
            event_type: alarm,
            field: "Limit".to_owned(),
        }
    );

    let err = space
        .construct_event_data(&object_types::FOLDER_TYPE, base_fields())
        .unwrap_err();
    assert_eq!(err, AddressSpaceError::NotAnEventType(object_types::FOLDER_TYPE));
    assert!(events.is_empty());
}

#[test]
fn events_propagate_to_notifiers() {
    let (mut space, events) = quiet_space();
    let ns = space.own_namespace_index();
    let area = space
        .add_node(
            ns,
            NewNode::object(QualifiedName::new(ns, "Area"))
                .organized_by(objects::OBJECTS)
                .with_event_notifier(1)
                .notifier_of(objects::SERVER),
        )
        .unwrap();
    let pump = space
        .add_node(
            ns,
            NewNode::object(QualifiedName::new(ns, "Pump"))
                .organized_by(area.clone())
                .event_source_of(area.clone()),
        )
        .unwrap();

    assert_eq!(space.event_notifiers(&pump), [pump.clone(), area, objects::SERVER]);
    let raised = space
        .raise_event(&pump, &object_types::BASE_EVENT_TYPE, base_fields())
        .unwrap();
    assert_eq!(raised.notifiers.len(), 3);
    assert_eq!(events.len(), 1);
}

#[test]
fn unsubscribed_sinks_stop_receiving() {
    let (mut space, events) = quiet_space();
    let counted = Rc::new(RefCell::new(0_usize));
    let counter = Rc::clone(&counted);
    let subscription = space.subscribe_events(move |_: &ua_address_space::RaisedEvent| {
        *counter.borrow_mut() += 1;
    });

    space
        .raise_event(&objects::SERVER, &object_types::BASE_EVENT_TYPE, base_fields())
        .unwrap();
    assert!(space.unsubscribe_events(subscription));
    assert!(!space.unsubscribe_events(subscription));
    space
        .raise_event(&objects::SERVER, &object_types::BASE_EVENT_TYPE, base_fields())
        .unwrap();

    assert_eq!(*counted.borrow(), 1);
    assert_eq!(events.len(), 2);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn shutdown_runs_tasks_in_order_then_disposes() {
    let (mut space, _events) = quiet_space();
    let order = Rc::new(RefCell::new(Vec::new()));
    for step in ["flush", "close"] {
        let order = Rc::clone(&order);
        space.register_shutdown_task(move || {
            async move {
                order.borrow_mut().push(step);
                Ok(())
            }
            .boxed_local()
        });
    }
    assert_eq!(space.pending_shutdown_tasks(), 2);

    space.shutdown().await.unwrap();
    assert_eq!(*order.borrow(), ["flush", "close"]);
    assert!(space.is_disposed());
    assert_eq!(space.node_count(), 0);
    assert_eq!(space.shutdown().await, Err(ShutdownError::AlreadyDisposed));
}

#[tokio::test]
async fn failing_task_stops_shutdown() {
    let (mut space, _events) = quiet_space();
    let ran = Rc::new(RefCell::new(false));
    space.register_shutdown_task(|| async { Err::<(), _>(ShutdownError::task("disk full")) }.boxed_local());
    let flag = Rc::clone(&ran);
    space.register_shutdown_task(move || {
        async move {
            *flag.borrow_mut() = true;
            Ok(())
        }
        .boxed_local()
    });

    let err = space.shutdown().await.unwrap_err();
    assert_eq!(err, ShutdownError::Task("disk full".to_owned()));
    assert!(!*ran.borrow());
    assert!(!space.is_disposed());
    assert_eq!(space.pending_shutdown_tasks(), 0);
}

#[test]
fn disposed_space_rejects_mutation() {
    let (mut space, _events) = quiet_space();
    space.dispose();
    space.dispose();
    assert!(space.is_disposed());
    assert_eq!(
        space
            .add_node(1, NewNode::object(QualifiedName::new(1, "Late")))
            .unwrap_err(),
        AddressSpaceError::Disposed
    );
    assert_eq!(
        space
            .raise_event(&objects::SERVER, &object_types::BASE_EVENT_TYPE, base_fields())
            .unwrap_err(),
        AddressSpaceError::Disposed
    );
    assert!(space.find_node(&objects::ROOT).is_none());
}
