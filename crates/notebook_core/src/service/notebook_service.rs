//! Notebook session use-case service.
//!
//! # Responsibility
//! - Own the live `SessionState` and feed actions to the engine in order.
//! - Provide file open/save entry points through the document codec.
//!
//! # Invariants
//! - The held state is replaced only when the engine succeeds.
//! - Actions are applied strictly one at a time (`&mut self`).

use crate::codec::{self, CodecError};
use crate::engine::{Action, Engine, EngineConfig, EngineError};
use crate::ids::{CellIdGenerator, UuidCellIds};
use crate::model::cell::CellId;
use crate::model::document::Document;
use crate::session::SessionState;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Service error for notebook session use-cases.
#[derive(Debug)]
pub enum NotebookServiceError {
    Engine(EngineError),
    Codec(CodecError),
}

impl Display for NotebookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotebookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Codec(err) => Some(err),
        }
    }
}

impl From<EngineError> for NotebookServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<CodecError> for NotebookServiceError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Sequential dispatcher over one editing session.
pub struct NotebookService<G: CellIdGenerator = UuidCellIds> {
    engine: Engine<G>,
    state: SessionState,
}

impl Default for NotebookService<UuidCellIds> {
    fn default() -> Self {
        Self::new()
    }
}

impl NotebookService<UuidCellIds> {
    /// Creates a service over an empty session with random ids.
    pub fn new() -> Self {
        Self::with_engine(Engine::new())
    }
}

impl<G: CellIdGenerator> NotebookService<G> {
    pub fn with_engine(engine: Engine<G>) -> Self {
        Self {
            engine,
            state: SessionState::default(),
        }
    }

    /// Creates a service with a custom id source and engine config.
    pub fn with_generator(ids: G, config: EngineConfig) -> Self {
        Self::with_engine(Engine::with_generator(ids).with_config(config))
    }

    /// Applies one action and returns the new state.
    ///
    /// On error the previously held state stays in place.
    pub fn dispatch(&mut self, action: Action) -> Result<&SessionState, NotebookServiceError> {
        self.state = self.engine.apply(&self.state, action)?;
        Ok(&self.state)
    }

    /// Loads `document` as the session document.
    pub fn set_document(&mut self, document: Document) -> Result<&SessionState, NotebookServiceError> {
        self.dispatch(Action::SetDocument(document))
    }

    /// Loads a notebook file and makes it the session document.
    pub fn open_notebook(&mut self, path: &Path) -> Result<&SessionState, NotebookServiceError> {
        let document = codec::load_notebook(path, self.engine.ids_mut())?;
        info!(
            "event=notebook_open module=service status=ok cells={}",
            document.len()
        );
        self.set_document(document)
    }

    /// Persists the session document to `path`.
    pub fn save_notebook(&self, path: &Path) -> Result<(), NotebookServiceError> {
        codec::save_notebook(path, &self.state.document)?;
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn focused_cell(&self) -> Option<CellId> {
        self.state.focused_cell
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }
}
