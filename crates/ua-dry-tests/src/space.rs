// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Address space builder utilities for tests.

use ua_address_space::{AddressSpace, AddressSpaceConfig, AddressSpaceError};

use crate::events::RecordingSink;
use crate::model::{load_sample_model, SampleModel};

/// Builder for test address spaces.
///
/// # Example
///
/// ```
/// use ua_dry_tests::AddressSpaceTestBuilder;
///
/// let (space, model, _events) = AddressSpaceTestBuilder::new()
///     .with_sample_model()
///     .build()
///     .unwrap();
/// let model = model.unwrap();
/// assert!(space.contains(&model.pump_type));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AddressSpaceTestBuilder {
    config: AddressSpaceConfig,
    sample_model: bool,
}

impl AddressSpaceTestBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of the defaults.
    pub fn with_config(mut self, config: AddressSpaceConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the sample type model.
    pub fn with_sample_model(mut self) -> Self {
        self.sample_model = true;
        self
    }

    /// Do not queue model changes.
    pub fn without_model_change_tracking(mut self) -> Self {
        self.config.track_model_changes = false;
        self
    }

    /// Limit instantiation nesting.
    pub fn with_max_instantiation_depth(mut self, depth: usize) -> Self {
        self.config.max_instantiation_depth = depth;
        self
    }

    /// Build the space. The returned sink is subscribed after the model is
    /// loaded, so it only sees events raised by the test itself.
    pub fn build(
        self,
    ) -> Result<(AddressSpace, Option<SampleModel>, RecordingSink), AddressSpaceError> {
        let mut space = AddressSpace::with_config(self.config)?;
        let model = if self.sample_model {
            Some(load_sample_model(&mut space)?)
        } else {
            None
        };
        let sink = RecordingSink::new();
        space.subscribe_events(sink.clone());
        Ok((space, model, sink))
    }
}

/// Shorthand for a default space with the sample model loaded.
pub fn sample_space() -> Result<(AddressSpace, SampleModel), AddressSpaceError> {
    let mut space = AddressSpace::new()?;
    let model = load_sample_model(&mut space)?;
    Ok((space, model))
}
