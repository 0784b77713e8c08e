//! Deterministic, pure search logic.
//!
//! Core modules never talk to oracles or the filesystem. They operate on an
//! in-memory [`node::Tree`] and return deterministic outputs suitable for tests.

pub mod backprop;
pub mod decision;
pub mod invariants;
pub mod node;
pub mod selector;
