//! member commands - Edit and list group membership

use crate::cli::Context;
use crate::ui::output;
use anyhow::Result;

pub fn add_user(ctx: &Context, group: &str, user: &str) -> Result<()> {
    let added = ctx.open_store()?.add_user_member(group, user)?;
    report(ctx, added, format!("Added user {} to group {}", user, group));
    Ok(())
}

pub fn remove_user(ctx: &Context, group: &str, user: &str) -> Result<()> {
    let removed = ctx.open_store()?.remove_user_member(group, user)?;
    report(ctx, removed, format!("Removed user {} from group {}", user, group));
    Ok(())
}

pub fn add_group(ctx: &Context, group: &str, subgroup: &str) -> Result<()> {
    let added = ctx.open_store()?.add_group_member(group, subgroup)?;
    report(ctx, added, format!("Added group {} to group {}", subgroup, group));
    Ok(())
}

pub fn remove_group(ctx: &Context, group: &str, subgroup: &str) -> Result<()> {
    let removed = ctx.open_store()?.remove_group_member(group, subgroup)?;
    report(ctx, removed, format!("Removed group {} from group {}", subgroup, group));
    Ok(())
}

/// List direct members, or with `effective` all users reachable through
/// nested groups.
pub fn members(ctx: &Context, group: &str, effective: bool, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    if effective {
        let users = store.effective_users(group)?;
        if json {
            output::json(&users)?;
        } else {
            output::list(&users);
        }
    } else {
        let members: Vec<_> = store.members(group)?.iter().cloned().collect();
        if json {
            output::json(&members)?;
        } else {
            output::list(&members);
        }
    }
    Ok(())
}

fn report(ctx: &Context, changed: bool, message: String) {
    if changed {
        output::print(message, ctx.verbosity);
    } else {
        output::print("Nothing to do", ctx.verbosity);
    }
}
