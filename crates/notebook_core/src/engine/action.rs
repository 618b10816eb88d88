//! Closed set of document editing operations.

use crate::model::cell::{CellId, CellType, Output};
use crate::model::document::Document;
use crate::session::{CellStatus, NotificationHandle, Pager};
use serde_json::Value;

/// One state transition request handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replaces the whole document and focuses its first cell.
    SetDocument(Document),
    /// Sets focus without checking that `id` exists.
    FocusCell { id: CellId },
    /// Moves focus to the successor of `id`, optionally creating one at the end.
    FocusNextCell { id: CellId, create_if_at_end: bool },
    /// Moves focus to the predecessor of `id`, clamped to the first cell.
    FocusPreviousCell { id: CellId },
    UpdateExecutionCount { id: CellId, count: Option<u32> },
    /// Places `id` directly above or below `destination_id`.
    MoveCell {
        id: CellId,
        destination_id: CellId,
        above: bool,
    },
    RemoveCell { id: CellId },
    /// Inserts a fresh cell after `id`, pre-filled with `source`.
    NewCellAfter {
        id: CellId,
        cell_type: CellType,
        source: String,
    },
    NewCellBefore { id: CellId, cell_type: CellType },
    NewCellAppend { cell_type: CellType },
    /// Fuses `id` with its successor, separated by a blank line.
    MergeCellAfter { id: CellId },
    UpdateSource { id: CellId, source: String },
    UpdateOutputs { id: CellId, outputs: Vec<Output> },
    UpdateCellPagers { id: CellId, pagers: Vec<Pager> },
    UpdateCellStatus { id: CellId, status: CellStatus },
    SetLanguageInfo(Value),
    OverwriteMetadataField { field: String, value: Value },
    StartedUploading,
    DoneUploading,
    SetNotificationSystem(NotificationHandle),
}

impl Action {
    /// Stable snake_case name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetDocument(_) => "set_document",
            Self::FocusCell { .. } => "focus_cell",
            Self::FocusNextCell { .. } => "focus_next_cell",
            Self::FocusPreviousCell { .. } => "focus_previous_cell",
            Self::UpdateExecutionCount { .. } => "update_execution_count",
            Self::MoveCell { .. } => "move_cell",
            Self::RemoveCell { .. } => "remove_cell",
            Self::NewCellAfter { .. } => "new_cell_after",
            Self::NewCellBefore { .. } => "new_cell_before",
            Self::NewCellAppend { .. } => "new_cell_append",
            Self::MergeCellAfter { .. } => "merge_cell_after",
            Self::UpdateSource { .. } => "update_source",
            Self::UpdateOutputs { .. } => "update_outputs",
            Self::UpdateCellPagers { .. } => "update_cell_pagers",
            Self::UpdateCellStatus { .. } => "update_cell_status",
            Self::SetLanguageInfo(_) => "set_language_info",
            Self::OverwriteMetadataField { .. } => "overwrite_metadata_field",
            Self::StartedUploading => "started_uploading",
            Self::DoneUploading => "done_uploading",
            Self::SetNotificationSystem(_) => "set_notification_system",
        }
    }
}
