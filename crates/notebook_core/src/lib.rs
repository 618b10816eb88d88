//! Core document engine for the notebook editor.
//! This crate is the single source of truth for cell ordering invariants.

pub mod codec;
pub mod engine;
pub mod ids;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;

pub use codec::{
    load_notebook, notebook_from_str, notebook_from_value, notebook_to_string, notebook_to_value,
    save_notebook, CodecError, CodecResult,
};
pub use engine::{Action, Engine, EngineConfig, EngineError, EngineResult, MERGE_SEPARATOR};
pub use ids::{CellIdGenerator, UuidCellIds};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::cell::{Cell, CellId, CellType, CodeCell, MarkdownCell, Output};
pub use model::document::{Document, DocumentError, LANGUAGE_INFO_KEY};
pub use service::notebook_service::{NotebookService, NotebookServiceError};
pub use session::{CellStatus, NotificationHandle, Pager, SessionConsistencyError, SessionState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
