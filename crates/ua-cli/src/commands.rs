// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command implementations. Each returns the text to print.

use std::fmt::Write as _;

use anyhow::{anyhow, bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use tracing::debug;
use ua_address_space::standard::objects;
use ua_address_space::{
    AddressSpace, AddressSpaceConfig, BrowseDescription, InstantiateOptions, NodeId,
    QualifiedName, SessionContext, REMAINING_PATH_COMPLETE,
};
use ua_config::{ConfigService, ConfigStore};

use crate::cli::{Command, ConfigAction};

/// Runs `command` against a space configured from `store`.
pub fn run<S>(store: S, command: Command) -> Result<String>
where
    S: ConfigStore,
{
    let service = ConfigService::new(store);
    let config: AddressSpaceConfig = service
        .load_or_default(AddressSpaceConfig::KEY)
        .context("loading address-space config")?;

    if let Command::Config { action } = command {
        return config_command(&service, config, action);
    }

    let mut space = AddressSpace::with_config(config).context("building address space")?;
    match command {
        Command::Browse {
            node,
            direction,
            reference_type,
            no_subtypes,
            class_mask,
        } => {
            let node = resolve_node(&space, &node)?;
            let mut description = BrowseDescription::new(node)
                .with_direction(direction.into())
                .with_node_class_mask(class_mask);
            if let Some(name) = reference_type {
                let reference_type = space
                    .find_reference_type(&name)
                    .map(|node| node.node_id().clone())
                    .ok_or_else(|| anyhow!("unknown reference type {name:?}"))?;
                description = description.with_reference_type(reference_type, !no_subtypes);
            }
            browse(&space, &description)
        }
        Command::Translate { start, path } => {
            let start = resolve_node(&space, &start)?;
            translate(&space, &start, &path)
        }
        Command::Tree { node, depth } => {
            let root = match node {
                Some(text) => resolve_node(&space, &text)?,
                None => objects::ROOT,
            };
            Ok(tree(&space, &root, depth))
        }
        Command::Instantiate {
            type_name,
            name,
            parent,
            optionals,
        } => {
            let type_id = space
                .find_object_type(&type_name)
                .or_else(|| space.find_variable_type(&type_name))
                .map(|node| node.node_id().clone())
                .ok_or_else(|| anyhow!("unknown object or variable type {type_name:?}"))?;
            let parent = match parent {
                Some(text) => resolve_node(&space, &text)?,
                None => objects::OBJECTS,
            };
            let namespace = space.own_namespace_index();
            let options = InstantiateOptions::new(QualifiedName::new(namespace, name))
                .organized_by(parent)
                .with_optionals(optionals);
            let instance = space
                .instantiate(&type_id, options)
                .with_context(|| format!("instantiating {type_name}"))?;
            Ok(tree(&space, &instance, usize::MAX))
        }
        Command::Config { .. } => Err(anyhow!("config handled above")),
    }
}

fn config_command<S: ConfigStore>(
    service: &ConfigService<S>,
    config: AddressSpaceConfig,
    action: ConfigAction,
) -> Result<String> {
    match action {
        ConfigAction::Show => Ok(serde_json::to_string_pretty(&config)?),
        ConfigAction::Init => {
            let stored: Option<AddressSpaceConfig> = service.load(AddressSpaceConfig::KEY)?;
            if stored.is_some() {
                return Ok("config already present; left unchanged".to_owned());
            }
            service
                .save(AddressSpaceConfig::KEY, &config)
                .context("writing default config")?;
            Ok("default config written".to_owned())
        }
    }
}

/// Accepts a node id, an alias, or a relative path from `Root`.
fn resolve_node(space: &AddressSpace, text: &str) -> Result<NodeId> {
    if text.starts_with(['/', '.', '<']) {
        let result = space
            .translate_browse_path(&objects::ROOT, text)
            .with_context(|| format!("parsing path {text:?}"))?;
        if result.status_code.is_bad() {
            bail!("{text}: {}", result.status_code);
        }
        return result
            .targets
            .into_iter()
            .next()
            .map(|target| target.target_id)
            .ok_or_else(|| anyhow!("{text}: no target"));
    }
    let id = space
        .resolve_node_id(text)
        .ok_or_else(|| anyhow!("{text:?} is neither a node id, an alias nor a path"))?;
    if !space.contains(&id) {
        bail!("unknown node {id}");
    }
    Ok(id)
}

fn browse(space: &AddressSpace, description: &BrowseDescription) -> Result<String> {
    let result = space.browse_single_node(description, &SessionContext::system());
    if result.status_code.is_bad() {
        bail!("browse failed: {}", result.status_code);
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Reference", "Dir", "Target", "BrowseName", "Class", "TypeDefinition"]);
    for reference in &result.references {
        let reference_name = reference
            .reference_type_id
            .as_ref()
            .map_or_else(String::new, |id| display_name(space, id));
        table.add_row(vec![
            reference_name,
            match reference.is_forward {
                Some(true) => "->".to_owned(),
                Some(false) => "<-".to_owned(),
                None => String::new(),
            },
            reference.node_id.to_string(),
            reference
                .browse_name
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            reference
                .node_class
                .map(|class| class.to_string())
                .unwrap_or_default(),
            reference
                .type_definition
                .as_ref()
                .map(|id| display_name(space, id))
                .unwrap_or_default(),
        ]);
    }
    debug!(count = result.references.len(), "browse rendered");
    Ok(table.to_string())
}

fn translate(space: &AddressSpace, start: &NodeId, path: &str) -> Result<String> {
    let result = space
        .translate_browse_path(start, path)
        .with_context(|| format!("parsing path {path:?}"))?;
    if result.status_code.is_bad() {
        bail!("{path}: {}", result.status_code);
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Target", "BrowseName", "Remaining"]);
    for target in &result.targets {
        let remaining = if target.remaining_path_index == REMAINING_PATH_COMPLETE {
            "-".to_owned()
        } else {
            target.remaining_path_index.to_string()
        };
        table.add_row(vec![
            target.target_id.to_string(),
            display_name(space, &target.target_id),
            remaining,
        ]);
    }
    Ok(table.to_string())
}

fn display_name(space: &AddressSpace, id: &NodeId) -> String {
    space
        .find_node(id)
        .map_or_else(|| id.to_string(), |node| node.browse_name().name.clone())
}

fn tree(space: &AddressSpace, root: &NodeId, depth: usize) -> String {
    let mut out = String::new();
    let mut path = Vec::new();
    tree_into(space, root, 0, depth, &mut path, &mut out);
    out
}

fn tree_into(
    space: &AddressSpace,
    node: &NodeId,
    level: usize,
    depth: usize,
    path: &mut Vec<NodeId>,
    out: &mut String,
) {
    let Some(entry) = space.find_node(node) else {
        return;
    };
    let type_definition = space
        .type_definition_of(node)
        .map(|id| format!(" : {}", display_name(space, &id)))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{:indent$}{} [{}] {}{}",
        "",
        entry.browse_name(),
        entry.node_class(),
        node,
        type_definition,
        indent = level * 2
    );
    if level >= depth || path.contains(node) {
        return;
    }
    path.push(node.clone());
    for (_, child) in space.children(node) {
        tree_into(space, &child, level + 1, depth, path, out);
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn paths_and_ids_resolve_to_the_same_node() {
        let space = AddressSpace::new().unwrap();
        assert_eq!(resolve_node(&space, "/Objects/Server").unwrap(), objects::SERVER);
        assert_eq!(resolve_node(&space, "i=2253").unwrap(), objects::SERVER);
        assert!(resolve_node(&space, "ns=1;i=999999").is_err());
        assert!(resolve_node(&space, "/Nowhere").is_err());
    }

    #[test]
    fn tree_stops_at_depth() {
        let space = AddressSpace::new().unwrap();
        let text = tree(&space, &objects::ROOT, 1);
        assert!(text.starts_with("Root [Object]"));
        assert!(text.contains("  Objects [Object]"));
        assert!(!text.contains("    Server"));
    }
}
