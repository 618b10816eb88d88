//! Notebook document model.
//!
//! # Responsibility
//! - Define the cell and document values the engine transforms.
//! - Keep ordering (`cell_order`) separate from storage (`cell_map`).
//!
//! # Invariants
//! - Every cell is identified by a stable `CellId`.
//! - Order and map always describe the same id set.

pub mod cell;
pub mod document;
