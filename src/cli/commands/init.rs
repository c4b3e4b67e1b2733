//! init and check commands - Create and validate the store layout

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Create the store layout in the configured (empty) directory.
pub fn init(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    store
        .init()
        .with_context(|| format!("cannot initialize store '{}'", store.root().display()))?;
    output::print(
        format!("Initialized store at {}", store.root().display()),
        ctx.verbosity,
    );
    Ok(())
}

/// Check the layout of the configured store.
pub fn check(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    output::print(format!("Store at {} is OK", store.root().display()), ctx.verbosity);
    Ok(())
}
