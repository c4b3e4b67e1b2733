//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the store (checking its layout, except for `init`)
//! 2. Calls one or more [`crate::Store`] operations
//! 3. Formats and displays output
//!
//! Handlers do NOT touch the store directory directly.

mod completion;
mod group;
mod init;
mod member;
mod user;
mod verify;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use group::{add as group_add, list as group_list, remove as group_remove, show as group_show};
pub use init::{check, init};
pub use member::{add_group, add_user, members, remove_group, remove_user};
pub use user::{add as user_add, list as user_list, remove as user_remove, show as user_show};
pub use verify::{gc, verify};

use crate::cli::args::{Command, GroupAction, UserAction};
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init => init::init(ctx),
        Command::Check => init::check(ctx),
        Command::Verify { json } => verify::verify(ctx, json),
        Command::Gc { max_age } => verify::gc(ctx, max_age),
        Command::User { action } => match action {
            UserAction::Add { name } => user::add(ctx, &name),
            UserAction::Remove { name } => user::remove(ctx, &name),
            UserAction::Show { name, json } => user::show(ctx, &name, json),
            UserAction::List { json } => user::list(ctx, json),
        },
        Command::Group { action } => match action {
            GroupAction::Add { name } => group::add(ctx, &name),
            GroupAction::Remove { name } => group::remove(ctx, &name),
            GroupAction::Show { name, json } => group::show(ctx, &name, json),
            GroupAction::List { json } => group::list(ctx, json),
            GroupAction::AddUser { group, user } => member::add_user(ctx, &group, &user),
            GroupAction::RemoveUser { group, user } => member::remove_user(ctx, &group, &user),
            GroupAction::AddGroup { group, subgroup } => member::add_group(ctx, &group, &subgroup),
            GroupAction::RemoveGroup { group, subgroup } => {
                member::remove_group(ctx, &group, &subgroup)
            }
            GroupAction::Members {
                group,
                effective,
                json,
            } => member::members(ctx, &group, effective, json),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
