//! Stable exit codes for grower CLI commands.

/// Command succeeded and a decision was made.
pub const OK: i32 = 0;
/// Invalid input/config, oracle failure under the abort policy, or other errors.
pub const INVALID: i32 = 1;
/// The search root ended without children, so there is nothing to commit.
pub const NO_DECISION: i32 = 2;
