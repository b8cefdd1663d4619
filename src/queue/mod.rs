//! Candidate evaluation for the merge queue
//!
//! Two-part pattern:
//! 1. Gates - pure decisions over fetched data (`gates`)
//! 2. Pipeline - fetching, applying side effects, running the action (`pipeline`)

pub mod gates;
mod pipeline;

pub use gates::{GateOutcome, SideEffect, SkipReason};
pub use pipeline::{
    CandidateAction, CandidateOutcome, CandidateReport, PassReport, PipelineOptions,
    fetch_candidates, for_each_candidate, run_pipeline,
};
