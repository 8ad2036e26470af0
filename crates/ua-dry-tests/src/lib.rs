// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for the address-space crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`model`] - A small device/pump/controller type model
//! - [`space`] - Address space builder with the model preloaded
//! - [`events`] - Event sink that records what it receives

pub mod config;
pub mod events;
pub mod model;
pub mod space;

pub use config::InMemoryConfigStore;
pub use events::RecordingSink;
pub use model::{load_sample_model, SampleModel, SAMPLE_NAMESPACE_URI};
pub use space::{sample_space, AddressSpaceTestBuilder};
