//! Grow a text artifact with Monte Carlo tree search over oracle proposals.
//!
//! A generation oracle proposes continuations of the artifact and an
//! evaluation oracle scores the result. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic tree logic (node arena, UCT selection,
//!   backpropagation, final choice). No I/O, fully testable in isolation.
//! - **[`io`]**: Oracle seams, external command plumbing, prompts and config.
//!
//! Orchestration modules ([`search`], [`grow`]) drive the core through the
//! oracle traits to implement the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod grow;
pub mod io;
pub mod logging;
pub mod search;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
