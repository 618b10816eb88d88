//! Document editing engine.
//!
//! # Responsibility
//! - Define the closed operation set (`Action`).
//! - Apply operations as pure state transitions (`Engine::apply`).
//!
//! # Invariants
//! - One operation at a time; no I/O and no shared mutable state.
//! - Every transition preserves order/map consistency.

pub mod action;
pub mod reducer;

pub use action::Action;
pub use reducer::{Engine, EngineConfig, EngineError, EngineResult, MERGE_SEPARATOR};
