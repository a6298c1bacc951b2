//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod finalize;
pub mod models;
pub mod normalize;
pub mod recover;

// Re-export main command functions
pub use finalize::execute_finalize;
pub use models::{FinalizeArgs, NormalizeArgs, RecoverArgs};
pub use normalize::execute_normalize;
pub use recover::execute_recover;
