//! nbformat v4 document codec.
//!
//! # Responsibility
//! - Convert between the on-disk notebook file and `Document`.
//! - Assign fresh cell ids on load; the file format carries order only.
//!
//! # Invariants
//! - Only major version 4 is accepted.
//! - Writing never mutates the document; cells are emitted in display order.

use crate::ids::CellIdGenerator;
use crate::model::cell::{Cell, CellType};
use crate::model::document::{Document, DocumentError};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Major format version read and written by this codec.
pub const NBFORMAT_MAJOR: u64 = 4;
/// Minor format version stamped on written files.
pub const NBFORMAT_MINOR: u64 = 4;

pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from notebook load/persist.
#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// File declares a major version other than 4 (`0` when missing).
    UnsupportedFormat { major: u64 },
    /// Cell at `index` has a type other than code or markdown.
    UnsupportedCellType { index: usize, cell_type: String },
    Document(DocumentError),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid notebook json: {err}"),
            Self::UnsupportedFormat { major } => write!(
                f,
                "unsupported nbformat major version {major}; expected {NBFORMAT_MAJOR}"
            ),
            Self::UnsupportedCellType { index, cell_type } => write!(
                f,
                "unsupported cell type `{cell_type}` at cell {index}; expected code or markdown"
            ),
            Self::Document(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::UnsupportedFormat { .. } => None,
            Self::UnsupportedCellType { .. } => None,
            Self::Document(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<DocumentError> for CodecError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

#[derive(Deserialize)]
struct NotebookFile {
    #[serde(default)]
    cells: Vec<Cell>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Serialize)]
struct NotebookFileRef<'a> {
    cells: Vec<&'a Cell>,
    metadata: &'a Map<String, Value>,
    nbformat: u64,
    nbformat_minor: u64,
}

/// Reads a notebook from a parsed JSON value.
pub fn notebook_from_value<G: CellIdGenerator>(value: Value, ids: &mut G) -> CodecResult<Document> {
    let major = value.get("nbformat").and_then(Value::as_u64).unwrap_or(0);
    if major != NBFORMAT_MAJOR {
        return Err(CodecError::UnsupportedFormat { major });
    }
    ensure_supported_cell_types(&value)?;

    let file: NotebookFile = serde_json::from_value(value)?;
    let document = Document::from_cells(
        file.cells.into_iter().map(|cell| (ids.next_id(), cell)),
        file.metadata,
    )?;
    Ok(document)
}

/// Rejects raw (or unknown) cells up front with a precise error instead of
/// the generic unknown-variant failure from the tagged cell enum.
fn ensure_supported_cell_types(value: &Value) -> CodecResult<()> {
    let Some(cells) = value.get("cells").and_then(Value::as_array) else {
        return Ok(());
    };
    let supported = [CellType::Code.as_str(), CellType::Markdown.as_str()];
    for (index, cell) in cells.iter().enumerate() {
        match cell.get("cell_type").and_then(Value::as_str) {
            Some(kind) if supported.contains(&kind) => {}
            Some(kind) => {
                return Err(CodecError::UnsupportedCellType {
                    index,
                    cell_type: kind.to_string(),
                })
            }
            None => {}
        }
    }
    Ok(())
}

/// Reads a notebook from JSON text.
pub fn notebook_from_str<G: CellIdGenerator>(json: &str, ids: &mut G) -> CodecResult<Document> {
    let value: Value = serde_json::from_str(json)?;
    notebook_from_value(value, ids)
}

/// Renders `document` as an nbformat v4 JSON value.
pub fn notebook_to_value(document: &Document) -> CodecResult<Value> {
    let file = NotebookFileRef {
        cells: document.iter().map(|(_, cell)| cell).collect(),
        metadata: document.metadata(),
        nbformat: NBFORMAT_MAJOR,
        nbformat_minor: NBFORMAT_MINOR,
    };
    Ok(serde_json::to_value(file)?)
}

/// Renders `document` as pretty-printed nbformat v4 JSON text.
pub fn notebook_to_string(document: &Document) -> CodecResult<String> {
    let value = notebook_to_value(document)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Loads a notebook file from disk.
pub fn load_notebook<G: CellIdGenerator>(path: &Path, ids: &mut G) -> CodecResult<Document> {
    let text = std::fs::read_to_string(path)?;
    let document = notebook_from_str(text.as_str(), ids)?;
    info!(
        "event=notebook_load module=codec status=ok cells={}",
        document.len()
    );
    Ok(document)
}

/// Writes a notebook file to disk, replacing any existing file.
pub fn save_notebook(path: &Path, document: &Document) -> CodecResult<()> {
    let mut text = notebook_to_string(document)?;
    text.push('\n');
    std::fs::write(path, text)?;
    info!(
        "event=notebook_save module=codec status=ok cells={}",
        document.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{notebook_from_value, notebook_to_value, CodecError};
    use crate::ids::UuidCellIds;
    use crate::model::cell::CellType;
    use serde_json::json;

    #[test]
    fn reads_cells_in_file_order() {
        let value = json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": { "kernelspec": { "name": "python3" } },
            "cells": [
                { "cell_type": "markdown", "source": ["# Title\n", "intro"], "metadata": {} },
                { "cell_type": "code", "source": "1 + 1", "execution_count": 1,
                  "outputs": [], "metadata": {} }
            ]
        });

        let document = notebook_from_value(value, &mut UuidCellIds).unwrap();
        let cells: Vec<_> = document.iter().map(|(_, cell)| cell).collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].cell_type(), CellType::Markdown);
        assert_eq!(cells[0].source(), "# Title\nintro");
        assert_eq!(cells[1].execution_count(), Some(1));
        assert_eq!(document.metadata()["kernelspec"]["name"], "python3");
    }

    #[test]
    fn rejects_other_major_versions() {
        let err = notebook_from_value(json!({ "nbformat": 3, "worksheets": [] }), &mut UuidCellIds)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat { major: 3 }));

        let err = notebook_from_value(json!({ "cells": [] }), &mut UuidCellIds).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat { major: 0 }));
    }

    #[test]
    fn raw_cells_are_reported_with_their_position() {
        let value = json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [
                { "cell_type": "markdown", "source": "intro", "metadata": {} },
                { "cell_type": "raw", "source": "\\begin{x}", "metadata": {} }
            ]
        });

        let err = notebook_from_value(value, &mut UuidCellIds).unwrap_err();
        match err {
            CodecError::UnsupportedCellType { index, cell_type } => {
                assert_eq!(index, 1);
                assert_eq!(cell_type, "raw");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn writes_version_stamp() {
        let value = json!({ "nbformat": 4, "nbformat_minor": 2, "metadata": {}, "cells": [] });
        let document = notebook_from_value(value, &mut UuidCellIds).unwrap();
        let written = notebook_to_value(&document).unwrap();
        assert_eq!(written["nbformat"], 4);
        assert_eq!(written["nbformat_minor"], 4);
        assert_eq!(written["cells"], json!([]));
    }
}
