// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Configuration storage for address-space tools.
//! The port lives in [`config`]; [`fs`] stores blobs as JSON files.

pub mod config;
pub mod fs;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use fs::FsConfigStore;
