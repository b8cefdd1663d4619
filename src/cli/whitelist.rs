//! Whitelist command - print the effective author whitelist

use crate::cli::context::CommandContext;
use crate::cli::style::Stylize;
use anstream::println;
use submit_queue::error::Result;

/// Run the whitelist command
pub async fn run_whitelist(ctx: &mut CommandContext) -> Result<()> {
    let whitelist = ctx.whitelist.refresh(ctx.platform.as_ref()).await;

    if whitelist.is_empty() {
        println!("{}", "Whitelist is empty.".muted());
        return Ok(());
    }

    println!(
        "{}",
        format!("{} whitelisted author(s):", whitelist.len()).emphasis()
    );
    for login in whitelist.iter() {
        println!("  {}", login.accent());
    }
    Ok(())
}
