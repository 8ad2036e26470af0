// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type hierarchy queries against random type trees.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use ua_address_space::standard::{data_types, object_types, reference_types};
use ua_address_space::{
    AddressSpace, AddressSpaceError, BuiltinType, NewNode, NodeId, QualifiedName, ReferenceSpec,
};
use ua_dry_tests::sample_space;

/// Builds object types `T0..Tn`; `T0` derives from `BaseObjectType`, `Ti`
/// from `T{parents[i-1]}`.
fn build_tree(parents: &[usize]) -> (AddressSpace, Vec<NodeId>) {
    let mut space = AddressSpace::new().unwrap();
    let ns = space.own_namespace_index();
    let mut ids = vec![space
        .add_node(ns, NewNode::object_type(QualifiedName::new(ns, "T0")))
        .unwrap()];
    for (offset, parent) in parents.iter().enumerate() {
        let name = format!("T{}", offset + 1);
        let id = space
            .add_node(
                ns,
                NewNode::object_type(QualifiedName::new(ns, name)).subtype_of(ids[*parent].clone()),
            )
            .unwrap();
        ids.push(id);
    }
    (space, ids)
}

fn ancestors(parents: &[usize], mut index: usize) -> Vec<usize> {
    let mut out = vec![index];
    while index > 0 {
        index = parents[index - 1];
        out.push(index);
    }
    out
}

/// Parent vectors where entry `i` names an earlier type.
fn parent_vectors() -> impl Strategy<Value = Vec<usize>> {
    (1_usize..12).prop_flat_map(|len| {
        (0..len)
            .map(|i| (0..=i).boxed())
            .collect::<Vec<_>>()
    })
}

#[test]
fn proptest_seed_pinned_subtype_queries() {
    // Pinned so failures reproduce across machines; override with PROPTEST_SEED.
    const SEED_BYTES: [u8; 32] = [
        0x75, 0x61, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0,
    ];
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::with_cases(64), rng);

    runner
        .run(&parent_vectors(), |parents| {
            let (space, ids) = build_tree(&parents);
            for (i, candidate) in ids.iter().enumerate() {
                let expected = ancestors(&parents, i);
                for (j, base) in ids.iter().enumerate() {
                    prop_assert_eq!(
                        space.is_subtype_of(candidate, base),
                        expected.contains(&j),
                        "T{} <: T{}",
                        i,
                        j
                    );
                }
                prop_assert!(space.is_subtype_of(candidate, &object_types::BASE_OBJECT_TYPE));
                let chain = space.supertype_chain(candidate);
                prop_assert_eq!(chain.first(), Some(candidate));
                prop_assert_eq!(chain.last(), Some(&object_types::BASE_OBJECT_TYPE));
                prop_assert_eq!(chain.len(), expected.len() + 1);
            }
            Ok(())
        })
        .unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn detaching_a_subtype_edge_invalidates_cached_answers(parents in parent_vectors()) {
        let (mut space, ids) = build_tree(&parents);
        let leaf = ids.len() - 1;
        // Warm the caches.
        prop_assert!(space.is_subtype_of(&ids[leaf], &ids[0]));

        let parent = ancestors(&parents, leaf).get(1).copied();
        if let Some(parent) = parent {
            let removed = space
                .remove_reference(
                    &ids[parent],
                    ReferenceSpec::new(reference_types::HAS_SUBTYPE, ids[leaf].clone()),
                )
                .unwrap();
            prop_assert!(removed);
            prop_assert!(!space.is_subtype_of(&ids[leaf], &ids[parent]));
            prop_assert!(!space.is_subtype_of(&ids[leaf], &ids[0]));
            prop_assert_eq!(space.supertype_of(&ids[leaf]), None);
        }
    }
}

#[test]
fn subtypes_are_listed_directly_only() {
    let (space, ids) = build_tree(&[0, 0, 1]);
    let mut direct = space.subtypes_of(&ids[0]);
    direct.sort();
    let mut expected = vec![ids[1].clone(), ids[2].clone()];
    expected.sort();
    assert_eq!(direct, expected);
    assert_eq!(space.subtypes_of(&ids[3]), Vec::<NodeId>::new());
}

#[test]
fn basic_encoding_walks_to_the_builtin() {
    let (space, model) = sample_space().unwrap();
    assert_eq!(space.basic_encoding_kind(&data_types::DOUBLE).unwrap(), BuiltinType::Double);
    assert_eq!(space.basic_encoding_kind(&data_types::DURATION).unwrap(), BuiltinType::Double);
    assert_eq!(space.basic_encoding_kind(&model.mode_enum).unwrap(), BuiltinType::Int32);
    assert_eq!(
        space.basic_encoding_kind(&model.range_type).unwrap(),
        BuiltinType::ExtensionObject
    );
    assert_eq!(
        space.basic_encoding_kind(&model.device_type),
        Err(AddressSpaceError::UnresolvedDataType(model.device_type.clone()))
    );
}

#[test]
fn reference_type_hierarchy_is_standard() {
    let space = AddressSpace::new().unwrap();
    assert!(space.is_subtype_of(&reference_types::HAS_PROPERTY, &reference_types::AGGREGATES));
    assert!(space.is_subtype_of(
        &reference_types::ORGANIZES,
        &reference_types::HIERARCHICAL_REFERENCES
    ));
    assert!(!space.is_subtype_of(&reference_types::ORGANIZES, &reference_types::HAS_CHILD));
    assert!(space.is_subtype_of(
        &reference_types::HAS_TYPE_DEFINITION,
        &reference_types::NON_HIERARCHICAL_REFERENCES
    ));
}
