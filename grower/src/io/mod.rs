//! I/O helpers: configuration, oracle processes and prompt rendering.

pub mod config;
pub mod oracle;
pub mod process;
pub mod prompt;
