//! Editing session state.
//!
//! # Responsibility
//! - Wrap the document with UI-facing fields that are never persisted.
//! - Hold per-cell side tables keyed by id (pagers, statuses).
//!
//! # Invariants
//! - Side tables reference cells by id only; they never own cells.
//! - `focused_cell` is either a live id or `None` after engine operations,
//!   except after `FocusCell`, which stores whatever id it is given.

use crate::model::cell::CellId;
use crate::model::document::{Document, DocumentError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Transient inspection/help output attached to one cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pager {
    /// Mime bundle to render.
    pub data: Map<String, Value>,
    /// Line offset the pager opens at.
    #[serde(default)]
    pub start: usize,
}

/// Execution/lint status shown next to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Idle,
    Queued,
    Busy,
    Error,
}

/// Opaque handle to the host notification collaborator.
///
/// Stored and handed back verbatim; equality is pointer identity.
#[derive(Clone)]
pub struct NotificationHandle(Arc<dyn Any + Send + Sync>);

impl NotificationHandle {
    pub fn new<T: Any + Send + Sync>(system: T) -> Self {
        Self(Arc::new(system))
    }

    /// Borrows the underlying collaborator when the caller knows its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for NotificationHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for NotificationHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("NotificationHandle(..)")
    }
}

/// Violations reported by `SessionState::check_consistency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionConsistencyError {
    Document(DocumentError),
    /// Focus points at an id not in the document.
    DanglingFocus(CellId),
    /// Pager entry outlived its cell.
    StalePager(CellId),
    /// Status entry outlived its cell.
    StaleStatus(CellId),
}

impl Display for SessionConsistencyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(err) => write!(f, "{err}"),
            Self::DanglingFocus(id) => write!(f, "focused cell is not in document: {id}"),
            Self::StalePager(id) => write!(f, "pager entry for removed cell: {id}"),
            Self::StaleStatus(id) => write!(f, "status entry for removed cell: {id}"),
        }
    }
}

impl Error for SessionConsistencyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentError> for SessionConsistencyError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

/// Document plus session-only fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub document: Document,
    pub focused_cell: Option<CellId>,
    pub cell_pagers: HashMap<CellId, Vec<Pager>>,
    pub cell_statuses: HashMap<CellId, CellStatus>,
    pub notification_system: Option<NotificationHandle>,
}

impl SessionState {
    /// Starts a session on `document`, focused on its first cell.
    pub fn new(document: Document) -> Self {
        let focused_cell = document.first_cell_id();
        Self {
            document,
            focused_cell,
            ..Self::default()
        }
    }

    /// Drops every side-table entry keyed by `id`.
    pub(crate) fn purge_cell(&mut self, id: CellId) {
        self.cell_pagers.remove(&id);
        self.cell_statuses.remove(&id);
    }

    /// Reports the first structural violation, if any.
    pub fn check_consistency(&self) -> Result<(), SessionConsistencyError> {
        self.document.validate()?;
        if let Some(id) = self.focused_cell {
            if !self.document.contains(id) {
                return Err(SessionConsistencyError::DanglingFocus(id));
            }
        }
        if let Some(id) = self
            .cell_pagers
            .keys()
            .find(|id| !self.document.contains(**id))
        {
            return Err(SessionConsistencyError::StalePager(*id));
        }
        if let Some(id) = self
            .cell_statuses
            .keys()
            .find(|id| !self.document.contains(**id))
        {
            return Err(SessionConsistencyError::StaleStatus(*id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CellStatus, NotificationHandle, SessionConsistencyError, SessionState};
    use crate::model::cell::Cell;
    use crate::model::document::Document;
    use serde_json::Map;
    use uuid::Uuid;

    #[test]
    fn new_focuses_first_cell() {
        let first = Uuid::new_v4();
        let document = Document::from_cells(
            [(first, Cell::empty_code()), (Uuid::new_v4(), Cell::empty_code())],
            Map::new(),
        )
        .unwrap();
        assert_eq!(SessionState::new(document).focused_cell, Some(first));
        assert_eq!(SessionState::new(Document::new()).focused_cell, None);
    }

    #[test]
    fn consistency_flags_stale_side_tables() {
        let mut state = SessionState::new(Document::new());
        let ghost = Uuid::new_v4();
        state.cell_statuses.insert(ghost, CellStatus::Busy);
        assert_eq!(
            state.check_consistency(),
            Err(SessionConsistencyError::StaleStatus(ghost))
        );

        state.purge_cell(ghost);
        state.focused_cell = Some(ghost);
        assert_eq!(
            state.check_consistency(),
            Err(SessionConsistencyError::DanglingFocus(ghost))
        );
    }

    #[test]
    fn notification_handles_compare_by_identity() {
        let handle = NotificationHandle::new("toaster".to_string());
        let same = handle.clone();
        let other = NotificationHandle::new("toaster".to_string());
        assert_eq!(handle, same);
        assert_ne!(handle, other);
        assert_eq!(
            handle.downcast_ref::<String>().map(String::as_str),
            Some("toaster")
        );
    }
}
