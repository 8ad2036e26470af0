// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tunables of an [`AddressSpace`](crate::AddressSpace), loadable through a config store.
use serde::{Deserialize, Serialize};

/// Address space settings.
///
/// Serialized as JSON under [`AddressSpaceConfig::KEY`]. Missing fields take
/// their defaults so older files keep loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressSpaceConfig {
    /// URI registered at namespace index 1 for nodes created by this application.
    pub own_namespace_uri: String,
    /// Load the standard namespace-0 model on construction.
    pub load_standard_nodes: bool,
    /// First value tried by numeric id allocation in non-standard namespaces.
    pub first_numeric_id: u32,
    /// Children of string-identified parents get `s=<parent>-<BrowseName>` ids.
    pub derive_child_string_ids: bool,
    /// Queue model changes and raise model-change events.
    pub track_model_changes: bool,
    /// Nesting limit of instantiation.
    pub max_instantiation_depth: usize,
}

impl AddressSpaceConfig {
    /// Config store key.
    pub const KEY: &'static str = "address-space";
}

impl Default for AddressSpaceConfig {
    fn default() -> Self {
        Self {
            own_namespace_uri: "urn:ua-address-space:application".to_owned(),
            load_standard_nodes: true,
            first_numeric_id: 1000,
            derive_child_string_ids: true,
            track_model_changes: true,
            max_instantiation_depth: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AddressSpaceConfig =
            serde_json::from_str(r#"{"first_numeric_id": 5000}"#).unwrap();
        assert_eq!(cfg.first_numeric_id, 5000);
        assert!(cfg.track_model_changes);
        assert_eq!(cfg.own_namespace_uri, AddressSpaceConfig::default().own_namespace_uri);
    }
}
