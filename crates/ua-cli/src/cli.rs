// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface of `ua-inspect`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ua_address_space::BrowseDirection;

/// Inspect an in-memory address space built from the standard model.
#[derive(Parser, Debug)]
#[command(name = "ua-inspect", author, version, about)]
pub struct Cli {
    /// Directory holding `address-space.json` (defaults to the user config dir).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the references of a node.
    Browse {
        /// Node id (`ns=1;i=5`), alias, or relative path from Root (`/Objects/Server`).
        node: String,
        /// Which references to follow.
        #[arg(long, value_enum, default_value_t = Direction::Forward)]
        direction: Direction,
        /// Only references of this type (name or id).
        #[arg(long)]
        reference_type: Option<String>,
        /// Match the reference type exactly, not its subtypes.
        #[arg(long)]
        no_subtypes: bool,
        /// Node-class bit mask of targets (0 = all).
        #[arg(long, default_value_t = 0)]
        class_mask: u32,
    },
    /// Resolve a relative path.
    Translate {
        /// Starting node.
        start: String,
        /// Relative path text, e.g. `/Objects.Server`.
        path: String,
    },
    /// Print the hierarchy below a node.
    Tree {
        /// Root of the listing; defaults to `Root`.
        node: Option<String>,
        /// Levels to descend.
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },
    /// Instantiate an object or variable type and print the result.
    Instantiate {
        /// Type name or id, e.g. `FolderType`.
        type_name: String,
        /// Browse name of the instance.
        name: String,
        /// Parent node; the instance is organized by it. Defaults to `Objects`.
        #[arg(long)]
        parent: Option<String>,
        /// Optional members to include (dotted paths, repeatable).
        #[arg(long = "optional")]
        optionals: Vec<String>,
    },
    /// Show or initialize the stored configuration.
    Config {
        /// What to do.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON.
    Show,
    /// Write the default configuration if none is stored.
    Init,
}

/// Browse direction flag.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward references.
    Forward,
    /// Inverse references.
    Inverse,
    /// Both directions.
    Both,
}

impl From<Direction> for BrowseDirection {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Forward => Self::Forward,
            Direction::Inverse => Self::Inverse,
            Direction::Both => Self::Both,
        }
    }
}
