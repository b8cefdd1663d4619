//! submit-queue - merge-readiness evaluation for pull requests
//!
//! Runs a batch pass over open pull requests, applying a fixed sequence of
//! policy gates (labels, author whitelist, approval staleness, mergeability,
//! commit status) and invoking a caller-supplied action on the survivors.

pub mod approval;
pub mod auth;
pub mod config;
pub mod error;
pub mod platform;
pub mod poll;
pub mod queue;
pub mod status;
pub mod types;
pub mod whitelist;
