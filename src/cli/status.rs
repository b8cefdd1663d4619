//! Status command - show the aggregated commit status of one PR

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use submit_queue::error::Result;
use submit_queue::poll::{validate_status, wait_for_pending};
use submit_queue::queue::gates::required_contexts;
use submit_queue::status::{aggregate, fetch_commit_statuses};
use submit_queue::types::StatusVerdict;

/// Options for the status command
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOptions {
    /// Wait until the status turns pending before evaluating
    pub wait_for_pending: bool,
    /// Keep polling while the status is pending
    pub wait: bool,
}

/// Run the status command
pub async fn run_status(ctx: &CommandContext, pr_number: u64, options: StatusOptions) -> Result<()> {
    let platform = ctx.platform.as_ref();
    let poll = ctx.poll_options();

    let pr = platform.get_pr(pr_number).await?;
    let required = required_contexts(&ctx.config.filter, &pr.labels);

    println!("{} {}", format!("PR #{pr_number}").emphasis(), pr.title);
    if !required.is_empty() {
        println!("  Required contexts: {}", required.join(", ").accent());
    }

    if options.wait_for_pending {
        println!("{}", "Waiting for status to turn pending...".muted());
        wait_for_pending(platform, pr_number, &poll).await?;
    }

    let reports = fetch_commit_statuses(platform, pr_number).await?;
    for report in &reports {
        let sha: String = report.sha.chars().take(12).collect();
        println!("  {} {}", sha.muted(), report.state);
    }
    let verdict = aggregate(&reports, &required);
    println!("  Verdict: {}", styled(verdict));

    if options.wait && verdict == StatusVerdict::Pending {
        println!("{}", "Waiting for pending status to settle...".muted());
        let ok = validate_status(platform, pr_number, &required, true, &poll).await?;
        if ok {
            println!("{} Status is success", check());
        } else {
            println!("{} Status settled without success", cross());
        }
    }
    Ok(())
}

fn styled(verdict: StatusVerdict) -> String {
    match verdict {
        StatusVerdict::Success => verdict.success(),
        StatusVerdict::Pending => verdict.warn(),
        StatusVerdict::Error | StatusVerdict::Failure => verdict.error(),
        StatusVerdict::Incomplete => verdict.muted(),
    }
}
