//! Notebook document aggregate.
//!
//! # Responsibility
//! - Own the ordered cell collection and document-level metadata.
//! - Provide by-id primitives that the engine composes into operations.
//!
//! # Invariants
//! - Every id in `cell_order` has exactly one entry in `cell_map`, and
//!   every `cell_map` key appears exactly once in `cell_order`.
//! - `cell_order` is authoritative for ordering; `cell_map` has none.
//! - Unknown ids passed to primitives are no-ops, never panics.

use crate::model::cell::{Cell, CellId, Output};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Reserved metadata key holding kernel language details.
pub const LANGUAGE_INFO_KEY: &str = "language_info";

/// Structural violations detected by `Document::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Same id appears more than once in `cell_order`.
    DuplicateCellId(CellId),
    /// Id listed in `cell_order` has no `cell_map` entry.
    MissingCell(CellId),
    /// `cell_map` entry is not referenced by `cell_order`.
    OrphanCell(CellId),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCellId(id) => write!(f, "cell id listed more than once: {id}"),
            Self::MissingCell(id) => write!(f, "cell order references missing cell: {id}"),
            Self::OrphanCell(id) => write!(f, "cell is not referenced by cell order: {id}"),
        }
    }
}

impl Error for DocumentError {}

/// Ordered cell collection plus metadata.
///
/// Cells sit behind `Arc` so cloned documents share every cell that is
/// not subsequently edited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    #[serde(rename = "cellOrder")]
    cell_order: Vec<CellId>,
    #[serde(rename = "cellMap")]
    cell_map: HashMap<CellId, Arc<Cell>>,
    metadata: Map<String, Value>,
}

/// Unvalidated wire mirror of `Document`.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(rename = "cellOrder", default)]
    cell_order: Vec<CellId>,
    #[serde(rename = "cellMap", default)]
    cell_map: HashMap<CellId, Arc<Cell>>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl TryFrom<RawDocument> for Document {
    type Error = DocumentError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let document = Self {
            cell_order: raw.cell_order,
            cell_map: raw.cell_map,
            metadata: raw.metadata,
        };
        document.validate()?;
        Ok(document)
    }
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from already-identified cells in display order.
    ///
    /// # Errors
    /// - Returns `DuplicateCellId` when an id repeats.
    pub fn from_cells<I>(cells: I, metadata: Map<String, Value>) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = (CellId, Cell)>,
    {
        let mut document = Self {
            metadata,
            ..Self::default()
        };
        for (id, cell) in cells {
            if document.cell_map.contains_key(&id) {
                return Err(DocumentError::DuplicateCellId(id));
            }
            document.cell_order.push(id);
            document.cell_map.insert(id, Arc::new(cell));
        }
        Ok(document)
    }

    /// Assembles a document from its parts, validating the order/map pairing.
    pub fn from_parts(
        cell_order: Vec<CellId>,
        cell_map: HashMap<CellId, Cell>,
        metadata: Map<String, Value>,
    ) -> Result<Self, DocumentError> {
        let document = Self {
            cell_order,
            cell_map: cell_map
                .into_iter()
                .map(|(id, cell)| (id, Arc::new(cell)))
                .collect(),
            metadata,
        };
        document.validate()?;
        Ok(document)
    }

    /// Checks that `cell_order` and `cell_map` describe the same id set.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::with_capacity(self.cell_order.len());
        for id in &self.cell_order {
            if !seen.insert(*id) {
                return Err(DocumentError::DuplicateCellId(*id));
            }
            if !self.cell_map.contains_key(id) {
                return Err(DocumentError::MissingCell(*id));
            }
        }
        if let Some(orphan) = self.cell_map.keys().find(|id| !seen.contains(*id)) {
            return Err(DocumentError::OrphanCell(*orphan));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cell_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_order.is_empty()
    }

    /// Ids in display order.
    pub fn cell_ids(&self) -> &[CellId] {
        self.cell_order.as_slice()
    }

    pub fn first_cell_id(&self) -> Option<CellId> {
        self.cell_order.first().copied()
    }

    pub fn cell_id_at(&self, index: usize) -> Option<CellId> {
        self.cell_order.get(index).copied()
    }

    /// Display position of `id`, if present.
    pub fn position(&self, id: CellId) -> Option<usize> {
        self.cell_order.iter().position(|candidate| *candidate == id)
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cell_map.contains_key(&id)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cell_map.get(&id).map(Arc::as_ref)
    }

    /// Iterates `(id, cell)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.cell_order
            .iter()
            .filter_map(|id| self.cell_map.get(id).map(|cell| (*id, cell.as_ref())))
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn metadata_field(&self, field: &str) -> Option<&Value> {
        self.metadata.get(field)
    }

    pub fn language_info(&self) -> Option<&Value> {
        self.metadata_field(LANGUAGE_INFO_KEY)
    }

    /// Inserts `cell` under `id` at `index`, clamped to `0..=len`.
    ///
    /// Returns `false` without changes when `id` is already live.
    pub fn insert_cell_at(&mut self, index: usize, id: CellId, cell: Cell) -> bool {
        if self.cell_map.contains_key(&id) {
            return false;
        }
        let index = index.min(self.cell_order.len());
        self.cell_order.insert(index, id);
        self.cell_map.insert(id, Arc::new(cell));
        true
    }

    /// Removes `id` from both order and map. Absent ids are a no-op.
    pub fn remove_cell(&mut self, id: CellId) -> Option<Cell> {
        let removed = self.cell_map.remove(&id)?;
        self.cell_order.retain(|candidate| *candidate != id);
        Some(Arc::unwrap_or_clone(removed))
    }

    /// Moves the id at `from` so it ends up at `to` in the shortened order.
    pub(crate) fn relocate(&mut self, from: usize, to: usize) {
        if from >= self.cell_order.len() {
            return;
        }
        let id = self.cell_order.remove(from);
        let to = to.min(self.cell_order.len());
        self.cell_order.insert(to, id);
    }

    /// Replaces source text. Returns whether a cell was updated.
    pub fn update_source(&mut self, id: CellId, source: impl Into<String>) -> bool {
        match self.cell_mut(id) {
            Some(cell) => {
                cell.set_source(source);
                true
            }
            None => false,
        }
    }

    /// Replaces outputs on a code cell. Returns whether a cell was updated.
    pub fn update_outputs(&mut self, id: CellId, outputs: Vec<Output>) -> bool {
        if !self.is_code_cell(id) {
            return false;
        }
        self.cell_mut(id)
            .map(|cell| cell.set_outputs(outputs))
            .unwrap_or(false)
    }

    /// Stamps execution count on a code cell. Returns whether a cell was updated.
    pub fn update_execution_count(&mut self, id: CellId, count: Option<u32>) -> bool {
        if !self.is_code_cell(id) {
            return false;
        }
        self.cell_mut(id)
            .map(|cell| cell.set_execution_count(count))
            .unwrap_or(false)
    }

    /// Replaces the whole value stored at `field`.
    pub fn set_metadata_field(&mut self, field: impl Into<String>, value: Value) {
        self.metadata.insert(field.into(), value);
    }

    fn is_code_cell(&self, id: CellId) -> bool {
        matches!(self.cell(id), Some(Cell::Code(_)))
    }

    fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cell_map.get_mut(&id).map(Arc::make_mut)
    }

    #[cfg(test)]
    pub(crate) fn push_raw_order_entry(&mut self, id: CellId) {
        self.cell_order.push(id);
    }
}
