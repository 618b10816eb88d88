//! Cell identifier sources.
//!
//! # Responsibility
//! - Supply fresh identifiers to insertion and load paths.
//!
//! # Invariants
//! - Generators are expected to never repeat an id; callers still guard
//!   against collisions with live cells.

use crate::model::cell::CellId;
use uuid::Uuid;

/// Producer of fresh cell identifiers.
pub trait CellIdGenerator {
    fn next_id(&mut self) -> CellId;
}

/// Default generator backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCellIds;

impl CellIdGenerator for UuidCellIds {
    fn next_id(&mut self) -> CellId {
        Uuid::new_v4()
    }
}

impl<F> CellIdGenerator for F
where
    F: FnMut() -> CellId,
{
    fn next_id(&mut self) -> CellId {
        self()
    }
}
