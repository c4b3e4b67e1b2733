//! group commands - Create, remove and inspect groups

use serde::Serialize;

use crate::cli::Context;
use crate::core::types::{EntityKind, EntityName, Member, UtcTimestamp};
use crate::ui::output;
use anyhow::Result;

#[derive(Serialize)]
struct GroupView {
    name: EntityName,
    changed: UtcTimestamp,
    members: Vec<Member>,
    member_of: Vec<EntityName>,
    effective_member_of: Vec<EntityName>,
}

pub fn add(ctx: &Context, name: &str) -> Result<()> {
    ctx.open_store()?.add_group(name)?;
    output::print(format!("Added group {}", name), ctx.verbosity);
    Ok(())
}

/// Remove a group; removing an absent group only warns.
pub fn remove(ctx: &Context, name: &str) -> Result<()> {
    if ctx.open_store()?.remove_group(name)? {
        output::print(format!("Removed group {}", name), ctx.verbosity);
    } else {
        output::warn(format!("group {} does not exist", name), ctx.verbosity);
    }
    Ok(())
}

pub fn show(ctx: &Context, name: &str, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let info = store.group_info(name)?;
    let view = GroupView {
        member_of: store.memberships(name, EntityKind::Group)?,
        effective_member_of: store.effective_memberships(name, EntityKind::Group)?,
        name: info.name,
        changed: info.changed,
        members: info.members,
    };

    if json {
        output::json(&view)?;
        return Ok(());
    }

    println!("group:     {}", view.name);
    println!("changed:   {}", view.changed);
    if view.members.is_empty() {
        println!("members:   (none)");
    } else {
        println!("members:");
        println!("{}", output::format_list(&view.members, "  "));
    }
    if !view.member_of.is_empty() {
        println!("member of:");
        println!("{}", output::format_list(&view.member_of, "  "));
    }
    if view.effective_member_of.len() > view.member_of.len() {
        println!("effective member of:");
        println!("{}", output::format_list(&view.effective_member_of, "  "));
    }
    Ok(())
}

pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let groups = ctx.open_store()?.groups()?;
    if json {
        output::json(&groups)?;
    } else {
        output::list(&groups);
    }
    Ok(())
}
