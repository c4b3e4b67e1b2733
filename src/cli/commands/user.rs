//! user commands - Create, remove and inspect users

use serde::Serialize;

use crate::cli::Context;
use crate::core::types::{EntityKind, EntityName, UtcTimestamp};
use crate::ui::output;
use anyhow::Result;

#[derive(Serialize)]
struct UserView {
    name: EntityName,
    changed: UtcTimestamp,
    groups: Vec<EntityName>,
    effective_groups: Vec<EntityName>,
}

pub fn add(ctx: &Context, name: &str) -> Result<()> {
    ctx.open_store()?.add_user(name)?;
    output::print(format!("Added user {}", name), ctx.verbosity);
    Ok(())
}

/// Remove a user; removing an absent user only warns.
pub fn remove(ctx: &Context, name: &str) -> Result<()> {
    if ctx.open_store()?.remove_user(name)? {
        output::print(format!("Removed user {}", name), ctx.verbosity);
    } else {
        output::warn(format!("user {} does not exist", name), ctx.verbosity);
    }
    Ok(())
}

pub fn show(ctx: &Context, name: &str, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let info = store.user_info(name)?;
    let view = UserView {
        groups: store.memberships(name, EntityKind::User)?,
        effective_groups: store.effective_memberships(name, EntityKind::User)?,
        name: info.name,
        changed: info.changed,
    };

    if json {
        output::json(&view)?;
    } else {
        println!("user:    {}", view.name);
        println!("changed: {}", view.changed);
        if view.groups.is_empty() {
            println!("groups:  (none)");
        } else {
            println!("groups:");
            println!("{}", output::format_list(&view.groups, "  "));
        }
        if view.effective_groups.len() > view.groups.len() {
            println!("effective groups:");
            println!("{}", output::format_list(&view.effective_groups, "  "));
        }
    }
    Ok(())
}

pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let users = ctx.open_store()?.users()?;
    if json {
        output::json(&users)?;
    } else {
        output::list(&users);
    }
    Ok(())
}
