//! verify and gc commands - Consistency scan and staging cleanup

use std::time::Duration;

use crate::cli::Context;
use crate::ui::output;
use anyhow::{bail, Result};

/// Scan the store and report issues; fails if any were found.
pub fn verify(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let report = store.verify()?;

    if json {
        output::json(&report)?;
    } else {
        for issue in &report.issues {
            println!("{}", issue);
        }
        output::print(
            format!(
                "{} users, {} groups, {} memberships checked",
                report.users, report.groups, report.edges
            ),
            ctx.verbosity,
        );
    }

    if !report.is_ok() {
        bail!("verification found {} issue(s)", report.issues.len());
    }
    Ok(())
}

/// Remove staging leftovers older than `max_age` seconds (or the configured age).
pub fn gc(ctx: &Context, max_age: Option<u64>) -> Result<()> {
    if max_age == Some(0) {
        bail!("--max-age must be greater than zero");
    }
    let max_age = max_age.map(Duration::from_secs).unwrap_or(ctx.gc_max_age);

    let store = ctx.open_store()?;
    let removed = store.collect_garbage(max_age)?;
    output::print(format!("Removed {} stale staging entries", removed), ctx.verbosity);
    Ok(())
}
