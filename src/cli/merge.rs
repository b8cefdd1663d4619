//! Merge command - merge every PR that passes the gates

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use async_trait::async_trait;
use dialoguer::Confirm;
use submit_queue::error::{Error, Result};
use submit_queue::platform::PlatformService;
use submit_queue::queue::{CandidateAction, for_each_candidate};
use submit_queue::types::{MergeMethod, PrIssue, PullRequestDetails};

/// Options for the merge command
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Prompt before each merge
    pub confirm: bool,
}

/// Squash-merges ready candidates
struct MergeAction {
    confirm: bool,
    dry_run: bool,
    merged: Vec<u64>,
}

#[async_trait]
impl CandidateAction for MergeAction {
    async fn run(
        &mut self,
        platform: &dyn PlatformService,
        pr: &PullRequestDetails,
        _issue: &PrIssue,
    ) -> Result<()> {
        let label = format!("#{}", pr.number).accent();

        if self.dry_run {
            println!("  {} {label} {}", "Would merge".success(), pr.title);
            return Ok(());
        }

        if self.confirm {
            let prompt = format!("Merge PR #{}: {}?", pr.number, pr.title);
            let proceed = Confirm::new()
                .with_prompt(prompt)
                .default(true)
                .interact()
                .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?;
            if !proceed {
                println!("  {} {label}", "Skipped".muted());
                return Ok(());
            }
        }

        let result = platform.merge_pr(pr.number, MergeMethod::Squash).await?;
        if !result.merged {
            return Err(Error::Action {
                pr: pr.number,
                message: result
                    .message
                    .unwrap_or_else(|| "merge was not performed".to_string()),
            });
        }

        println!("  {} Merged {label} {}", check(), pr.title);
        self.merged.push(pr.number);
        Ok(())
    }
}

/// Run the merge command
pub async fn run_merge(ctx: &mut CommandContext, options: MergeOptions) -> Result<()> {
    let dry_run = ctx.config.filter.dry_run;
    if dry_run {
        println!("{}", "Dry run: no changes will be made.".muted());
    }

    let mut action = MergeAction {
        confirm: options.confirm,
        dry_run,
        merged: Vec::new(),
    };
    let pipeline = ctx.pipeline_options();
    let report = for_each_candidate(
        ctx.platform.as_ref(),
        &ctx.config.filter,
        &mut ctx.whitelist,
        &mut action,
        &pipeline,
    )
    .await?;

    println!();
    if report.acted().is_empty() {
        println!("{}", "No PRs are ready to merge.".muted());
    } else if !dry_run {
        let merged: Vec<String> = action.merged.iter().map(|n| format!("#{n}")).collect();
        println!(
            "{} Merged: {}",
            check(),
            if merged.is_empty() {
                "none".to_string()
            } else {
                merged.join(", ").accent()
            }
        );
    }
    Ok(())
}
