// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event sink that records every delivery.

use std::cell::RefCell;
use std::rc::Rc;

use ua_address_space::{EventSink, NodeId, RaisedEvent};

/// Records raised events. Clones share the recording, so keep one clone and
/// subscribe the other.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<RaisedEvent>>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far.
    pub fn events(&self) -> Vec<RaisedEvent> {
        self.events.borrow().clone()
    }

    /// Number of events received.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// True when nothing was received.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Events whose type is `event_type`.
    pub fn of_type(&self, event_type: &NodeId) -> Vec<RaisedEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.data.event_type == *event_type)
            .cloned()
            .collect()
    }

    /// Forget everything received so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for RecordingSink {
    fn on_event(&mut self, event: &RaisedEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
