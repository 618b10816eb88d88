//! Document engine: applies one `Action` to a session state.
//!
//! # Responsibility
//! - Turn `(state, action)` into a new state without touching the input.
//! - Keep cell order, cell content, focus and side tables consistent.
//!
//! # Invariants
//! - Unknown ids are defined no-ops, never errors or panics.
//! - Only `SetDocument` with a structurally invalid document fails, plus
//!   an id generator that keeps colliding with live cells.
//! - Removing a cell (directly or by merge) purges its pager/status entries.

use crate::engine::action::Action;
use crate::ids::{CellIdGenerator, UuidCellIds};
use crate::model::cell::{Cell, CellId, CellType};
use crate::model::document::{DocumentError, LANGUAGE_INFO_KEY};
use crate::session::SessionState;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound on redraws when a generated id is already live.
const MAX_ID_ATTEMPTS: usize = 16;

/// Separator placed between sources when two cells are merged.
pub const MERGE_SEPARATOR: &str = "\n\n";

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `SetDocument` received a document whose order and map disagree.
    InvalidDocument(DocumentError),
    /// Id generator returned only ids that are already live.
    IdGeneratorExhausted { attempts: usize },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDocument(err) => write!(f, "invalid document: {err}"),
            Self::IdGeneratorExhausted { attempts } => write!(
                f,
                "id generator produced only live cell ids after {attempts} attempts"
            ),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDocument(err) => Some(err),
            Self::IdGeneratorExhausted { .. } => None,
        }
    }
}

impl From<DocumentError> for EngineError {
    fn from(value: DocumentError) -> Self {
        Self::InvalidDocument(value)
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Type of the cell created when focus runs past the last cell.
    pub default_cell_type: CellType,
}

/// Result of one handler, used for logging only.
enum Outcome {
    Applied,
    Skipped(&'static str),
}

/// Deterministic reducer over `SessionState`.
pub struct Engine<G: CellIdGenerator = UuidCellIds> {
    ids: G,
    config: EngineConfig,
}

impl Default for Engine<UuidCellIds> {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine<UuidCellIds> {
    /// Creates an engine drawing random v4 ids.
    pub fn new() -> Self {
        Self::with_generator(UuidCellIds)
    }
}

impl<G: CellIdGenerator> Engine<G> {
    /// Creates an engine drawing ids from `ids`.
    pub fn with_generator(ids: G) -> Self {
        Self {
            ids,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Id source shared with load paths so all ids come from one generator.
    pub(crate) fn ids_mut(&mut self) -> &mut G {
        &mut self.ids
    }

    /// Applies `action` to `state` and returns the resulting state.
    ///
    /// `state` is never modified; on error no new state is produced.
    ///
    /// # Errors
    /// - `InvalidDocument` when `SetDocument` carries an inconsistent document.
    /// - `IdGeneratorExhausted` when no fresh id could be drawn for an insert.
    pub fn apply(&mut self, state: &SessionState, action: Action) -> EngineResult<SessionState> {
        let name = action.name();
        let mut next = state.clone();
        match self.reduce(&mut next, action) {
            Ok(Outcome::Applied) => {
                debug!("event=reduce module=engine action={name} status=ok");
                Ok(next)
            }
            Ok(Outcome::Skipped(reason)) => {
                debug!("event=reduce module=engine action={name} status=noop reason={reason}");
                Ok(state.clone())
            }
            Err(err) => {
                warn!("event=reduce module=engine action={name} status=error error={err}");
                Err(err)
            }
        }
    }

    fn reduce(&mut self, state: &mut SessionState, action: Action) -> EngineResult<Outcome> {
        match action {
            Action::SetDocument(document) => {
                document.validate()?;
                state.focused_cell = document.first_cell_id();
                state.cell_pagers.retain(|id, _| document.contains(*id));
                state.cell_statuses.retain(|id, _| document.contains(*id));
                state.document = document;
                Ok(Outcome::Applied)
            }
            Action::FocusCell { id } => {
                state.focused_cell = Some(id);
                Ok(Outcome::Applied)
            }
            Action::FocusNextCell {
                id,
                create_if_at_end,
            } => self.focus_next(state, id, create_if_at_end),
            Action::FocusPreviousCell { id } => {
                let index = state
                    .document
                    .position(id)
                    .map_or(0, |index| index.saturating_sub(1));
                state.focused_cell = state.document.cell_id_at(index);
                Ok(Outcome::Applied)
            }
            Action::UpdateExecutionCount { id, count } => {
                Ok(applied_if(state.document.update_execution_count(id, count)))
            }
            Action::MoveCell {
                id,
                destination_id,
                above,
            } => Ok(move_cell(state, id, destination_id, above)),
            Action::RemoveCell { id } => {
                if state.document.remove_cell(id).is_none() {
                    return Ok(Outcome::Skipped("cell_not_found"));
                }
                state.purge_cell(id);
                if state.focused_cell == Some(id) {
                    state.focused_cell = None;
                }
                Ok(Outcome::Applied)
            }
            Action::NewCellAfter {
                id,
                cell_type,
                source,
            } => match state.document.position(id) {
                Some(index) => {
                    let cell = Cell::empty(cell_type).with_source(source);
                    self.insert_fresh(state, index + 1, cell)
                }
                None => Ok(Outcome::Skipped("anchor_not_found")),
            },
            Action::NewCellBefore { id, cell_type } => match state.document.position(id) {
                Some(index) => self.insert_fresh(state, index, Cell::empty(cell_type)),
                None => Ok(Outcome::Skipped("anchor_not_found")),
            },
            Action::NewCellAppend { cell_type } => {
                let index = state.document.len();
                self.insert_fresh(state, index, Cell::empty(cell_type))
            }
            Action::MergeCellAfter { id } => Ok(merge_with_next(state, id)),
            Action::UpdateSource { id, source } => {
                Ok(applied_if(state.document.update_source(id, source)))
            }
            Action::UpdateOutputs { id, outputs } => {
                Ok(applied_if(state.document.update_outputs(id, outputs)))
            }
            Action::UpdateCellPagers { id, pagers } => {
                if !state.document.contains(id) {
                    return Ok(Outcome::Skipped("cell_not_found"));
                }
                state.cell_pagers.insert(id, pagers);
                Ok(Outcome::Applied)
            }
            Action::UpdateCellStatus { id, status } => {
                if !state.document.contains(id) {
                    return Ok(Outcome::Skipped("cell_not_found"));
                }
                state.cell_statuses.insert(id, status);
                Ok(Outcome::Applied)
            }
            Action::SetLanguageInfo(info) => {
                state.document.set_metadata_field(LANGUAGE_INFO_KEY, info);
                Ok(Outcome::Applied)
            }
            Action::OverwriteMetadataField { field, value } => {
                state.document.set_metadata_field(field, value);
                Ok(Outcome::Applied)
            }
            Action::StartedUploading | Action::DoneUploading => {
                Ok(Outcome::Skipped("passthrough"))
            }
            Action::SetNotificationSystem(handle) => {
                state.notification_system = Some(handle);
                Ok(Outcome::Applied)
            }
        }
    }

    fn focus_next(
        &mut self,
        state: &mut SessionState,
        id: CellId,
        create_if_at_end: bool,
    ) -> EngineResult<Outcome> {
        // Absent ids behave like position -1, so the successor is index 0.
        let next_index = state.document.position(id).map_or(0, |index| index + 1);
        if let Some(next_id) = state.document.cell_id_at(next_index) {
            state.focused_cell = Some(next_id);
            return Ok(Outcome::Applied);
        }
        if !create_if_at_end {
            return Ok(Outcome::Skipped("at_last_cell"));
        }

        let cell = Cell::empty(self.config.default_cell_type);
        let new_id = self.fresh_id(state)?;
        state.document.insert_cell_at(next_index, new_id, cell);
        state.focused_cell = Some(new_id);
        Ok(Outcome::Applied)
    }

    fn insert_fresh(
        &mut self,
        state: &mut SessionState,
        index: usize,
        cell: Cell,
    ) -> EngineResult<Outcome> {
        let new_id = self.fresh_id(state)?;
        state.document.insert_cell_at(index, new_id, cell);
        Ok(Outcome::Applied)
    }

    fn fresh_id(&mut self, state: &SessionState) -> EngineResult<CellId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id();
            if !state.document.contains(candidate) {
                return Ok(candidate);
            }
        }
        Err(EngineError::IdGeneratorExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

fn applied_if(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Skipped("cell_not_found_or_not_code")
    }
}

/// Removes `id` from the order and reinserts it next to `destination_id`.
///
/// The target index is computed on the original order; removal shifts
/// everything after the old slot down by one, so a forward move lands
/// one slot earlier in the shortened order.
fn move_cell(state: &mut SessionState, id: CellId, destination_id: CellId, above: bool) -> Outcome {
    let Some(old_index) = state.document.position(id) else {
        return Outcome::Skipped("cell_not_found");
    };
    let Some(destination_index) = state.document.position(destination_id) else {
        return Outcome::Skipped("destination_not_found");
    };

    let new_index = destination_index + usize::from(!above);
    if old_index == new_index {
        return Outcome::Skipped("same_position");
    }
    let target = if old_index < new_index {
        new_index - 1
    } else {
        new_index
    };
    state.document.relocate(old_index, target);
    Outcome::Applied
}

fn merge_with_next(state: &mut SessionState, id: CellId) -> Outcome {
    let Some(index) = state.document.position(id) else {
        return Outcome::Skipped("cell_not_found");
    };
    let Some(next_id) = state.document.cell_id_at(index + 1) else {
        return Outcome::Skipped("at_last_cell");
    };

    let merged = match (state.document.cell(id), state.document.cell(next_id)) {
        (Some(cell), Some(next)) => {
            format!("{}{MERGE_SEPARATOR}{}", cell.source(), next.source())
        }
        _ => return Outcome::Skipped("cell_not_found"),
    };

    state.document.update_source(id, merged);
    state.document.remove_cell(next_id);
    state.purge_cell(next_id);
    if state.focused_cell == Some(next_id) {
        state.focused_cell = Some(id);
    }
    Outcome::Applied
}

#[cfg(test)]
mod tests {
    use super::{Engine, EngineError};
    use crate::engine::action::Action;
    use crate::model::cell::Cell;
    use crate::model::document::{Document, DocumentError};
    use crate::session::SessionState;
    use serde_json::Map;
    use uuid::Uuid;

    #[test]
    fn set_document_rejects_inconsistent_document() {
        let mut document = Document::new();
        let ghost = Uuid::new_v4();
        document.push_raw_order_entry(ghost);

        let mut engine = Engine::new();
        let state = SessionState::default();
        let err = engine
            .apply(&state, Action::SetDocument(document))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidDocument(DocumentError::MissingCell(ghost)));
    }

    #[test]
    fn colliding_generator_is_reported() {
        let live = Uuid::from_u128(7);
        let document = Document::from_cells([(live, Cell::empty_code())], Map::new()).unwrap();
        let state = SessionState::new(document);

        let mut engine = Engine::with_generator(move || live);
        let err = engine
            .apply(
                &state,
                Action::NewCellAppend {
                    cell_type: Default::default(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::IdGeneratorExhausted { attempts: 16 }));
    }
}
