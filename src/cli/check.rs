//! Check command - report which PRs are ready to merge, without merging
//!
//! Gate side effects (override marker, stale-approval comment) still apply
//! unless `--dry-run` is set.

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use async_trait::async_trait;
use serde::Serialize;
use submit_queue::error::{Error, Result};
use submit_queue::platform::PlatformService;
use submit_queue::queue::{CandidateAction, CandidateOutcome, PassReport, for_each_candidate};
use submit_queue::types::{PrIssue, PullRequestDetails};

/// Records ready candidates without touching them
#[derive(Debug, Default)]
struct RecordReady {
    titles: Vec<(u64, String)>,
}

#[async_trait]
impl CandidateAction for RecordReady {
    async fn run(
        &mut self,
        _platform: &dyn PlatformService,
        pr: &PullRequestDetails,
        _issue: &PrIssue,
    ) -> Result<()> {
        self.titles.push((pr.number, pr.title.clone()));
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonCandidate {
    number: u64,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_reason: Option<String>,
}

/// Run the check command
pub async fn run_check(ctx: &mut CommandContext, json: bool) -> Result<()> {
    let mut action = RecordReady::default();
    let options = ctx.pipeline_options();
    let report = for_each_candidate(
        ctx.platform.as_ref(),
        &ctx.config.filter,
        &mut ctx.whitelist,
        &mut action,
        &options,
    )
    .await?;

    if json {
        print_json(&report, &action)
    } else {
        print_report(&report, &action);
        Ok(())
    }
}

fn title_of(action: &RecordReady, number: u64) -> Option<String> {
    action
        .titles
        .iter()
        .find(|(n, _)| *n == number)
        .map(|(_, t)| t.clone())
}

fn print_json(report: &PassReport, action: &RecordReady) -> Result<()> {
    let candidates: Vec<JsonCandidate> = report
        .candidates
        .iter()
        .map(|c| match &c.outcome {
            CandidateOutcome::Acted => JsonCandidate {
                number: c.number,
                ready: true,
                title: title_of(action, c.number),
                skip_reason: None,
            },
            CandidateOutcome::Skipped(reason) => JsonCandidate {
                number: c.number,
                ready: false,
                title: None,
                skip_reason: Some(reason.to_string()),
            },
        })
        .collect();

    let out = serde_json::to_string_pretty(&candidates)
        .map_err(|e| Error::Internal(format!("failed to serialize report: {e}")))?;
    println!("{out}");
    Ok(())
}

fn print_report(report: &PassReport, action: &RecordReady) {
    if report.candidates.is_empty() {
        println!("{}", "No candidate PRs found.".muted());
        return;
    }

    println!(
        "{}",
        format!("Evaluated {} candidate(s):", report.candidates.len()).emphasis()
    );
    println!();
    for candidate in &report.candidates {
        let number = format!("#{}", candidate.number).accent();
        match &candidate.outcome {
            CandidateOutcome::Acted => {
                let title = title_of(action, candidate.number).unwrap_or_default();
                println!("  {} {number} {title}", check());
            }
            CandidateOutcome::Skipped(reason) => {
                println!("  {} {number} {}", cross(), reason.to_string().muted());
            }
        }
    }

    let ready = report.acted().len();
    println!();
    if ready == 0 {
        println!("{}", "No PRs are ready to merge.".muted());
    } else {
        println!("{} {ready} PR(s) ready", check());
    }
}
