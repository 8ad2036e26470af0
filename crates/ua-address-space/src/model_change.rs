// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Model-change transactions.
//!
//! Structural mutations are queued as [`ModelChangeRecord`]s while a
//! transaction is open, one record per affected node with the verbs of all
//! its changes combined. When the outermost transaction closes the queue is
//! flushed: the `NodeVersion` of every affected node is bumped once and one
//! `GeneralModelChangeEventType` event is raised on the `Server` object.
//! A mutation outside any transaction is flushed on its own.
use std::collections::BTreeMap;

use tracing::{debug, error};

use crate::address_space::AddressSpace;
use crate::ident::{LocalizedText, NodeId};
use crate::standard::{data_types, object_types, objects};
use crate::value::{ExtensionObject, Variant};

/// Bit set describing what happened to an affected node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct ModelChangeVerb(pub u8);

impl ModelChangeVerb {
    /// The node was created.
    pub const NODE_ADDED: Self = Self(1);
    /// The node was deleted.
    pub const NODE_DELETED: Self = Self(2);
    /// A reference of the node was added.
    pub const REFERENCE_ADDED: Self = Self(4);
    /// A reference of the node was removed.
    pub const REFERENCE_DELETED: Self = Self(8);
    /// The data type of a variable changed.
    pub const DATA_TYPE_CHANGED: Self = Self(16);

    /// True when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// One queued change.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModelChangeRecord {
    /// The node that changed.
    pub affected: NodeId,
    /// Its type definition, when known.
    pub affected_type: Option<NodeId>,
    /// What happened.
    pub verb: ModelChangeVerb,
}

impl ModelChangeRecord {
    /// The record as a `ModelChangeStructureDataType` value.
    #[must_use]
    pub fn to_extension_object(&self) -> ExtensionObject {
        ExtensionObject::new(data_types::MODEL_CHANGE_STRUCTURE_DATA_TYPE)
            .with_field("Affected", Variant::NodeId(self.affected.clone()))
            .with_field(
                "AffectedType",
                Variant::NodeId(self.affected_type.clone().unwrap_or(NodeId::NULL)),
            )
            .with_field("Verb", Variant::Byte(self.verb.0))
    }
}

#[derive(Debug, Default)]
pub(crate) struct ModelChangeTracker {
    depth: usize,
    pending: Vec<ModelChangeRecord>,
}

impl AddressSpace {
    /// Opens a (possibly nested) model-change transaction.
    pub fn begin_model_change(&mut self) {
        self.changes.depth += 1;
    }

    /// Closes a transaction; closing the outermost one flushes the queue.
    pub fn end_model_change(&mut self) {
        if self.changes.depth == 0 {
            debug!("end_model_change without a matching begin");
            return;
        }
        self.changes.depth -= 1;
        if self.changes.depth == 0 {
            self.flush_model_changes();
        }
    }

    /// Runs `f` inside a transaction. The transaction closes even when `f`
    /// returns an error.
    pub fn model_change_transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.begin_model_change();
        let out = f(self);
        self.end_model_change();
        out
    }

    /// Changes queued by the open transaction.
    #[must_use]
    pub fn pending_model_changes(&self) -> &[ModelChangeRecord] {
        &self.changes.pending
    }

    pub(crate) fn record_change(
        &mut self,
        affected: &NodeId,
        affected_type: Option<NodeId>,
        verb: ModelChangeVerb,
    ) {
        if self.suspended || !self.config.track_model_changes {
            return;
        }
        match self
            .changes
            .pending
            .iter_mut()
            .find(|record| record.affected == *affected)
        {
            Some(record) => {
                record.verb = ModelChangeVerb(record.verb.0 | verb.0);
                if record.affected_type.is_none() {
                    record.affected_type = affected_type;
                }
            }
            None => self.changes.pending.push(ModelChangeRecord {
                affected: affected.clone(),
                affected_type,
                verb,
            }),
        }
        if self.changes.depth == 0 {
            self.flush_model_changes();
        }
    }

    /// Snapshot of the queue, for [`AddressSpace::restore_changes`].
    pub(crate) fn change_checkpoint(&self) -> Vec<ModelChangeRecord> {
        self.changes.pending.clone()
    }

    pub(crate) fn restore_changes(&mut self, checkpoint: Vec<ModelChangeRecord>) {
        self.changes.pending = checkpoint;
    }

    fn flush_model_changes(&mut self) {
        let records = std::mem::take(&mut self.changes.pending);
        if records.is_empty() {
            return;
        }
        for record in &records {
            if !record.verb.contains(ModelChangeVerb::NODE_ADDED) {
                self.bump_node_version(&record.affected);
            }
        }

        if !self.contains(&objects::SERVER)
            || !self.contains(&object_types::GENERAL_MODEL_CHANGE_EVENT_TYPE)
        {
            debug!(changes = records.len(), "no server object; model change not announced");
            return;
        }
        let changes = records
            .iter()
            .map(|record| Variant::from(record.to_extension_object()))
            .collect();
        let fields = BTreeMap::from([
            ("Changes".to_owned(), Variant::Array(changes)),
            (
                "Message".to_owned(),
                Variant::LocalizedText(LocalizedText::new("model changed")),
            ),
            ("Severity".to_owned(), Variant::UInt16(1)),
        ]);
        if let Err(err) = self.raise_event(
            &objects::SERVER,
            &object_types::GENERAL_MODEL_CHANGE_EVENT_TYPE,
            fields,
        ) {
            error!(error = %err, "model change event could not be raised");
        }
    }

    fn bump_node_version(&mut self, node: &NodeId) {
        let Some(version) = self
            .child_by_name(node, "NodeVersion")
            .map(|child| child.node_id().clone())
        else {
            return;
        };
        let Some(entry) = self.node_mut(&version) else {
            return;
        };
        let next = entry
            .value()
            .and_then(Variant::as_str)
            .and_then(|text| text.parse::<u64>().ok())
            .map_or(1, |current| current.saturating_add(1));
        let _ = entry.set_value(Variant::String(next.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_bits_are_distinct() {
        let all = [
            ModelChangeVerb::NODE_ADDED,
            ModelChangeVerb::NODE_DELETED,
            ModelChangeVerb::REFERENCE_ADDED,
            ModelChangeVerb::REFERENCE_DELETED,
            ModelChangeVerb::DATA_TYPE_CHANGED,
        ];
        let combined = all.iter().fold(0_u8, |acc, verb| acc | verb.0);
        assert_eq!(combined, 31);
        assert!(ModelChangeVerb(5).contains(ModelChangeVerb::REFERENCE_ADDED));
    }

    #[test]
    fn record_encodes_null_type_when_unknown() {
        let record = ModelChangeRecord {
            affected: NodeId::numeric(1, 7),
            affected_type: None,
            verb: ModelChangeVerb::REFERENCE_ADDED,
        };
        let value = record.to_extension_object();
        assert_eq!(value.field("AffectedType"), Some(&Variant::NodeId(NodeId::NULL)));
        assert_eq!(value.field("Verb"), Some(&Variant::Byte(4)));
    }
}
