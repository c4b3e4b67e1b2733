//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--store <path>`: Store root (overrides the config file)
//! - `--config <path>`: Config file to load
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// whawty-groups - manage a filesystem-resident user and group store
#[derive(Parser, Debug)]
#[command(name = "whawty-groups")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store root directory
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Config file to load instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the store layout in an empty directory
    #[command(
        name = "init",
        long_about = "Create the store layout in an existing, empty directory.\n\n\
            Creates the users, groups and staging directories. Fails if the \
            directory does not exist, is not a directory, or is not empty.",
        after_help = "\
EXAMPLES:
    mkdir /var/lib/whawty/groups
    whawty-groups --store /var/lib/whawty/groups init"
    )]
    Init,

    /// Check that the store has the expected layout
    Check,

    /// Scan every record and report inconsistencies
    #[command(
        name = "verify",
        long_about = "Scan every record and report inconsistencies.\n\n\
            Reports members that no longer exist, group cycles, unreadable \
            records and stray entries. Never modifies the store. Exits with \
            status 1 if any issue was found."
    )]
    Verify {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove leftovers of interrupted writes from the staging area
    Gc {
        /// Only remove entries older than this many seconds
        #[arg(long, value_name = "SECS")]
        max_age: Option<u64>,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage groups and their members
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    whawty-groups completion bash >> ~/.bashrc

    # Fish
    whawty-groups completion fish > ~/.config/fish/completions/whawty-groups.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// `user` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserAction {
    /// Create a user
    Add {
        /// User name
        name: String,
    },
    /// Remove a user and all its group memberships
    Remove {
        /// User name
        name: String,
    },
    /// Show a user and the groups it belongs to
    Show {
        /// User name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all users
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// `group` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum GroupAction {
    /// Create an empty group
    Add {
        /// Group name
        name: String,
    },
    /// Remove a group and all memberships naming it
    Remove {
        /// Group name
        name: String,
    },
    /// Show a group, its members and the groups it belongs to
    Show {
        /// Group name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all groups
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a user to a group
    AddUser {
        /// Group name
        group: String,
        /// User name
        user: String,
    },
    /// Remove a user from a group
    RemoveUser {
        /// Group name
        group: String,
        /// User name
        user: String,
    },
    /// Nest a group inside another group
    AddGroup {
        /// Containing group
        group: String,
        /// Group to nest
        subgroup: String,
    },
    /// Remove a nested group from a group
    RemoveGroup {
        /// Containing group
        group: String,
        /// Nested group
        subgroup: String,
    },
    /// List the members of a group
    Members {
        /// Group name
        group: String,
        /// List all users reachable through nested groups
        #[arg(long)]
        effective: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
