// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-call filter deciding which instance declarations are cloned.
use std::collections::BTreeMap;

use crate::node::ModellingRule;

/// Tree of requested optional members, built from dotted paths.
///
/// `["Config", "Config.Limit"]` keeps the Optional `Config` member and the
/// Optional `Limit` member inside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct OptionalsFilter {
    requested: BTreeMap<String, OptionalsFilter>,
}

impl OptionalsFilter {
    pub(crate) fn parse<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = Self::default();
        for path in paths {
            let mut cursor = &mut root;
            for segment in path.as_ref().split('.').filter(|segment| !segment.is_empty()) {
                cursor = cursor.requested.entry(segment.to_owned()).or_default();
            }
        }
        root
    }

    /// Mandatory members are always kept, Optional ones when requested.
    /// Placeholders and members without a rule are never cloned.
    pub(crate) fn should_keep(&self, rule: Option<ModellingRule>, name: &str) -> bool {
        match rule {
            Some(ModellingRule::Mandatory) => true,
            Some(ModellingRule::Optional) => self.requested.contains_key(name),
            _ => false,
        }
    }

    /// Filter applying to the members of the member called `name`.
    pub(crate) fn nested(&self, name: &str) -> Self {
        self.requested.get(name).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_select_inner_optionals() {
        let filter = OptionalsFilter::parse(["Config.Limit", "Diagnostics"]);
        assert!(filter.should_keep(Some(ModellingRule::Optional), "Config"));
        assert!(filter.should_keep(Some(ModellingRule::Optional), "Diagnostics"));
        assert!(!filter.should_keep(Some(ModellingRule::Optional), "Limit"));
        let inner = filter.nested("Config");
        assert!(inner.should_keep(Some(ModellingRule::Optional), "Limit"));
        assert!(!inner.should_keep(Some(ModellingRule::Optional), "Threshold"));
    }

    #[test]
    fn placeholders_and_ruleless_members_are_dropped() {
        let filter = OptionalsFilter::parse(["Channel", "Note"]);
        assert!(!filter.should_keep(Some(ModellingRule::OptionalPlaceholder), "Channel"));
        assert!(!filter.should_keep(Some(ModellingRule::MandatoryPlaceholder), "Channel"));
        assert!(!filter.should_keep(None, "Note"));
        assert!(filter.should_keep(Some(ModellingRule::Mandatory), "Anything"));
    }
}
