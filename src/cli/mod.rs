//! CLI command implementations

pub mod check;
pub mod context;
pub mod merge;
pub mod status;
pub mod style;
pub mod whitelist;

pub use check::run_check;
pub use context::{CommandContext, GlobalOptions};
pub use merge::{MergeOptions, run_merge};
pub use status::{StatusOptions, run_status};
pub use whitelist::run_whitelist;
