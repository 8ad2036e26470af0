// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Browse filtering, projection and access control.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use ua_address_space::standard::{objects, reference_types, roles};
use ua_address_space::{
    AccessRestrictions, BrowseDescription, BrowseDirection, BrowseResultMask, MessageSecurityMode,
    NodeClass, NodeId, PermissionType, RolePermission, SessionContext, StatusCode,
};
use ua_dry_tests::sample_space;

fn targets(space: &ua_address_space::AddressSpace, description: &BrowseDescription, context: &SessionContext) -> Vec<NodeId> {
    let result = space.browse_single_node(description, context);
    assert_eq!(result.status_code, StatusCode::GOOD);
    result.references.into_iter().map(|reference| reference.node_id).collect()
}

#[test]
fn reference_type_filter_honors_subtypes() {
    let (mut space, model) = sample_space().unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let system = SessionContext::system();

    let aggregates = BrowseDescription::new(pump.clone())
        .with_reference_type(reference_types::AGGREGATES, true);
    assert_eq!(targets(&space, &aggregates, &system).len(), 6);

    let properties = BrowseDescription::new(pump.clone())
        .with_reference_type(reference_types::HAS_PROPERTY, false);
    let found = targets(&space, &properties, &system);
    assert_eq!(found.len(), 2);

    let exact_aggregates = BrowseDescription::new(pump)
        .with_reference_type(reference_types::AGGREGATES, false);
    assert!(targets(&space, &exact_aggregates, &system).is_empty());
}

#[test]
fn direction_and_class_filters_combine() {
    let (mut space, model) = sample_space().unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let system = SessionContext::system();

    let inverse = BrowseDescription::new(pump.clone()).with_direction(BrowseDirection::Inverse);
    assert_eq!(targets(&space, &inverse, &system), [objects::OBJECTS]);

    let methods = BrowseDescription::new(pump.clone()).with_node_class_mask(NodeClass::Method.mask());
    let found = targets(&space, &methods, &system);
    assert_eq!(found, [common::child(&space, &pump, "Reset")]);

    let both = BrowseDescription::new(pump).with_direction(BrowseDirection::Both);
    // Six members, the type definition and the organizing folder.
    assert_eq!(targets(&space, &both, &system).len(), 8);
}

#[test]
fn result_mask_limits_projected_fields() {
    let (space, _model) = sample_space().unwrap();
    let description = BrowseDescription::new(objects::OBJECTS)
        .with_reference_type(reference_types::ORGANIZES, false)
        .with_result_mask(BrowseResultMask::BROWSE_NAME);
    let result = space.browse_single_node(&description, &SessionContext::system());
    let server = result
        .references
        .iter()
        .find(|reference| reference.node_id == objects::SERVER)
        .unwrap();
    assert_eq!(server.browse_name.as_ref().map(|name| name.name.as_str()), Some("Server"));
    assert_eq!(server.reference_type_id, None);
    assert_eq!(server.is_forward, None);
    assert_eq!(server.node_class, None);
    assert_eq!(server.type_definition, None);

    let full = space.browse_single_node(
        &description.clone().with_result_mask(BrowseResultMask::ALL),
        &SessionContext::system(),
    );
    let server = full
        .references
        .iter()
        .find(|reference| reference.node_id == objects::SERVER)
        .unwrap();
    assert_eq!(server.is_forward, Some(true));
    assert_eq!(server.node_class, Some(NodeClass::Object));
    assert_eq!(
        server.type_definition,
        Some(ua_address_space::standard::object_types::SERVER_TYPE)
    );
}

#[test]
fn bad_requests_report_status_codes() {
    let (space, model) = sample_space().unwrap();
    let system = SessionContext::system();

    let invalid_direction = BrowseDescription::new(objects::OBJECTS)
        .with_direction(BrowseDirection::from_raw(7));
    assert_eq!(
        space.browse_single_node(&invalid_direction, &system).status_code,
        StatusCode::BAD_BROWSE_DIRECTION_INVALID
    );

    let not_a_reference_type = BrowseDescription::new(objects::OBJECTS)
        .with_reference_type(model.device_type.clone(), true);
    assert_eq!(
        space.browse_single_node(&not_a_reference_type, &system).status_code,
        StatusCode::BAD_REFERENCE_TYPE_ID_INVALID
    );

    let null = BrowseDescription::new(NodeId::NULL);
    assert_eq!(
        space.browse_single_node(&null, &system).status_code,
        StatusCode::BAD_NODE_ID_INVALID
    );

    let unknown = BrowseDescription::new(NodeId::numeric(1, 424_242));
    let result = space.browse_single_node(&unknown, &system);
    assert_eq!(result.status_code, StatusCode::BAD_NODE_ID_UNKNOWN);
    assert!(result.references.is_empty());
}

#[test]
fn null_reference_type_matches_everything() {
    let (space, _model) = sample_space().unwrap();
    let system = SessionContext::system();
    let all = targets(&space, &BrowseDescription::new(objects::OBJECTS), &system);
    let null = targets(
        &space,
        &BrowseDescription::new(objects::OBJECTS).with_reference_type(NodeId::NULL, true),
        &system,
    );
    assert_eq!(all, null);
}

#[test]
fn visibility_predicate_hides_targets() {
    let (mut space, model) = sample_space().unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let serial = common::child(&space, &pump, "SerialNumber");
    space
        .node_mut(&serial)
        .unwrap()
        .set_visibility(|context| context.roles.contains(&roles::ENGINEER));

    let description = BrowseDescription::new(pump);
    let operator = SessionContext::with_roles(vec![roles::OPERATOR]);
    let engineer = SessionContext::with_roles(vec![roles::ENGINEER]);
    assert!(!targets(&space, &description, &operator).contains(&serial));
    assert!(targets(&space, &description, &engineer).contains(&serial));
}

#[test]
fn access_restrictions_apply_to_browse_when_flagged() {
    let (mut space, model) = sample_space().unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let mode = common::child(&space, &pump, "Mode");
    space.node_mut(&mode).unwrap().set_access_restrictions(
        AccessRestrictions::ENCRYPTION_REQUIRED.union(AccessRestrictions::APPLY_RESTRICTIONS_TO_BROWSE),
    );

    let description = BrowseDescription::new(pump);
    let plain = SessionContext::with_roles(vec![roles::OPERATOR]);
    let signed = plain.clone().secured(MessageSecurityMode::Sign);
    let encrypted = plain.clone().secured(MessageSecurityMode::SignAndEncrypt);
    assert!(!targets(&space, &description, &plain).contains(&mode));
    assert!(!targets(&space, &description, &signed).contains(&mode));
    assert!(targets(&space, &description, &encrypted).contains(&mode));
    assert!(targets(&space, &description, &SessionContext::system()).contains(&mode));
}

#[test]
fn role_permissions_gate_browse() {
    let (mut space, model) = sample_space().unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let reset = common::child(&space, &pump, "Reset");
    space.node_mut(&reset).unwrap().set_role_permissions(Some(vec![RolePermission {
        role_id: roles::ENGINEER,
        permissions: PermissionType::BROWSE.union(PermissionType::CALL),
    }]));

    let description = BrowseDescription::new(pump);
    let observer = SessionContext::with_roles(vec![roles::OBSERVER]);
    let engineer = SessionContext::with_roles(vec![roles::ENGINEER]);
    assert!(!targets(&space, &description, &observer).contains(&reset));
    assert!(targets(&space, &description, &engineer).contains(&reset));
}

#[test]
fn aggregates_browse_returns_exactly_the_cloned_members() {
    let (mut space, model) = sample_space().unwrap();
    let pump = common::named_instance(&mut space, &model, &model.pump_type, "Pump1", &[]);
    let names = ["FlowRate", "Manufacturer", "Mode", "Range", "Reset", "SerialNumber"];
    let mut expected: Vec<NodeId> = names
        .iter()
        .map(|name| NodeId::string(model.namespace, format!("Pump1-{name}")))
        .collect();
    expected.sort();

    let description = BrowseDescription::new(pump.clone())
        .with_reference_type(reference_types::AGGREGATES, true)
        .with_direction(BrowseDirection::Forward);
    let browse = |space: &ua_address_space::AddressSpace| {
        let node = space.find_node(&pump).unwrap();
        let mut found: Vec<NodeId> = space
            .browse_node(node, &description, &SessionContext::system())
            .into_iter()
            .map(|reference| reference.node_id)
            .collect();
        found.sort();
        found
    };

    let first = browse(&space);
    assert_eq!(first, expected);
    let mut deduped = first.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), first.len());
    for member in &first {
        assert_eq!(space.parent_of(member).as_ref(), Some(&pump));
    }
    assert_eq!(browse(&space), first);
}
