// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structured events: schema-checked field sets delivered to subscribers.
use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use rustc_hash::FxHashSet;
use tracing::{instrument, trace, warn};
use uuid::Uuid;

use crate::address_space::AddressSpace;
use crate::error::AddressSpaceError;
use crate::ident::{NodeClass, NodeId};
use crate::node::ModellingRule;
use crate::reference::BrowseDirection;
use crate::standard::{object_types, reference_types};
use crate::value::Variant;

/// Field values of one event, keyed by dotted browse-name path.
#[derive(Clone, Debug, PartialEq)]
pub struct EventData {
    /// Event type node.
    pub event_type: NodeId,
    /// Field values.
    pub fields: BTreeMap<String, Variant>,
}

impl EventData {
    /// Value of a field, e.g. `"Severity"` or `"Changes"`.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Variant> {
        self.fields.get(path)
    }
}

/// An event as delivered to sinks.
#[derive(Clone, Debug, PartialEq)]
pub struct RaisedEvent {
    /// Node the event originated from.
    pub source: NodeId,
    /// The source followed by every notifier the event propagates to.
    pub notifiers: Vec<NodeId>,
    /// Event fields.
    pub data: EventData,
}

/// Receives raised events.
pub trait EventSink {
    /// Called once per raised event.
    fn on_event(&mut self, event: &RaisedEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&RaisedEvent),
{
    fn on_event(&mut self, event: &RaisedEvent) {
        self(event);
    }
}

/// Handle returned by [`AddressSpace::subscribe_events`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EventSubscription(pub(crate) u64);

impl fmt::Display for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription#{}", self.0)
    }
}

struct SchemaField {
    path: String,
    mandatory: bool,
}

impl AddressSpace {
    /// Checks `fields` against the schema of `event_type`.
    ///
    /// The schema is the union of the Variable members (nested members as
    /// dotted paths) of every type from `event_type` up to `BaseEventType`.
    /// A missing Mandatory field is an error; fields outside the schema are
    /// kept and logged.
    pub fn construct_event_data(
        &self,
        event_type: &NodeId,
        fields: BTreeMap<String, Variant>,
    ) -> Result<EventData, AddressSpaceError> {
        let is_event_type = self
            .find_node(event_type)
            .is_some_and(|node| node.node_class() == NodeClass::ObjectType)
            && self.is_subtype_of(event_type, &object_types::BASE_EVENT_TYPE);
        if !is_event_type {
            return Err(AddressSpaceError::NotAnEventType(event_type.clone()));
        }
        let schema = self.event_schema(event_type);
        for field in &schema {
            if field.mandatory && !fields.contains_key(&field.path) {
                return Err(AddressSpaceError::MissingEventField {
                    event_type: event_type.clone(),
                    field: field.path.clone(),
                });
            }
        }
        for name in fields.keys() {
            if !schema.iter().any(|field| field.path == *name) {
                warn!(event_type = %event_type, field = %name, "field is not declared by the event type");
            }
        }
        Ok(EventData {
            event_type: event_type.clone(),
            fields,
        })
    }

    fn event_schema(&self, event_type: &NodeId) -> Vec<SchemaField> {
        let mut schema: Vec<SchemaField> = Vec::new();
        for level in self.supertype_chain(event_type) {
            self.collect_event_fields(&level, "", true, &mut schema, 0);
            if level == object_types::BASE_EVENT_TYPE {
                break;
            }
        }
        schema
    }

    fn collect_event_fields(
        &self,
        owner: &NodeId,
        prefix: &str,
        mandatory: bool,
        schema: &mut Vec<SchemaField>,
        depth: usize,
    ) {
        if depth > self.config.max_instantiation_depth {
            return;
        }
        for reference in self.aggregates_of(owner) {
            let Some(member) = self.find_node(&reference.target) else {
                continue;
            };
            if member.node_class() != NodeClass::Variable {
                continue;
            }
            let path = format!("{prefix}{}", member.browse_name().name);
            let required = mandatory
                && self.modelling_rule_of(&reference.target) == Some(ModellingRule::Mandatory);
            if !schema.iter().any(|field| field.path == path) {
                schema.push(SchemaField {
                    path: path.clone(),
                    mandatory: required,
                });
            }
            self.collect_event_fields(&reference.target, &format!("{path}."), required, schema, depth + 1);
        }
    }

    /// The source followed by every node reachable over inverse
    /// `HasEventSource`-class references, breadth first.
    #[must_use]
    pub fn event_notifiers(&self, source: &NodeId) -> Vec<NodeId> {
        let mut chain = vec![source.clone()];
        let mut seen: FxHashSet<NodeId> = chain.iter().cloned().collect();
        let mut cursor = 0;
        while let Some(current) = chain.get(cursor).cloned() {
            cursor += 1;
            for reference in self.find_references_ex(
                &current,
                &reference_types::HAS_EVENT_SOURCE,
                BrowseDirection::Inverse,
            ) {
                if seen.insert(reference.target.clone()) {
                    chain.push(reference.target);
                }
            }
        }
        chain
    }

    /// Raises an event of `event_type` on `source` and delivers it to every sink.
    ///
    /// `EventId`, `EventType`, `SourceNode`, `SourceName`, `Time` and
    /// `ReceiveTime` are filled in when absent.
    #[instrument(level = "debug", skip(self, fields))]
    pub fn raise_event(
        &mut self,
        source: &NodeId,
        event_type: &NodeId,
        mut fields: BTreeMap<String, Variant>,
    ) -> Result<RaisedEvent, AddressSpaceError> {
        if self.disposed {
            return Err(AddressSpaceError::Disposed);
        }
        let source_name = self
            .find_node(source)
            .map(|node| node.browse_name().name.clone())
            .ok_or_else(|| AddressSpaceError::UnknownNode(source.clone()))?;
        let now = Utc::now();
        let defaults = [
            ("EventId", Variant::ByteString(Uuid::new_v4().as_bytes().to_vec())),
            ("EventType", Variant::NodeId(event_type.clone())),
            ("SourceNode", Variant::NodeId(source.clone())),
            ("SourceName", Variant::String(source_name)),
            ("Time", Variant::DateTime(now)),
            ("ReceiveTime", Variant::DateTime(now)),
        ];
        for (name, value) in defaults {
            fields.entry(name.to_owned()).or_insert(value);
        }
        let data = self.construct_event_data(event_type, fields)?;
        let event = RaisedEvent {
            source: source.clone(),
            notifiers: self.event_notifiers(source),
            data,
        };
        for (subscription, sink) in &mut self.sinks {
            trace!(%subscription, "delivering event");
            sink.on_event(&event);
        }
        Ok(event)
    }

    /// Registers a sink for every event raised from now on.
    pub fn subscribe_events(&mut self, sink: impl EventSink + 'static) -> EventSubscription {
        let subscription = EventSubscription(self.next_subscription);
        self.next_subscription += 1;
        self.sinks.push((subscription, Box::new(sink)));
        subscription
    }

    /// Removes a sink. Returns false when the handle is unknown.
    pub fn unsubscribe_events(&mut self, subscription: EventSubscription) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(handle, _)| *handle != subscription);
        self.sinks.len() != before
    }
}
