//! Cell domain model.
//!
//! # Responsibility
//! - Define the canonical cell value stored inside a `Document`.
//! - Provide the empty-cell factory used by every insertion path.
//!
//! # Invariants
//! - A cell's type is fixed at creation; no mutator changes it.
//! - Outputs and execution count exist only on code cells.
//! - Identity lives in the owning document's map key, never in the cell.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Formatter;
use uuid::Uuid;

/// Stable identifier for one cell within a document.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CellId = Uuid;

/// Cell content category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// Executable source with outputs.
    #[default]
    Code,
    /// Rendered prose.
    Markdown,
}

impl CellType {
    /// Stable wire/log name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
        }
    }
}

/// One output record produced by executing a code cell.
///
/// Shapes follow nbformat v4 `output_type` variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    /// Text written to `stdout`/`stderr`.
    Stream {
        name: String,
        #[serde(deserialize_with = "deserialize_multiline")]
        text: String,
    },
    /// Rich display payload keyed by mime type.
    DisplayData {
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    /// Value of the last expression of an execution.
    ExecuteResult {
        execution_count: Option<u32>,
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    /// Raised exception.
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

/// Code cell payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeCell {
    #[serde(default, deserialize_with = "deserialize_multiline")]
    pub source: String,
    #[serde(default)]
    pub outputs: Vec<Output>,
    /// Stamped by kernel completion events; `None` until first run.
    #[serde(default)]
    pub execution_count: Option<u32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Markdown cell payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkdownCell {
    #[serde(default, deserialize_with = "deserialize_multiline")]
    pub source: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Inline files referenced as `attachment:<name>` from the source.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attachments: Map<String, Value>,
}

/// Canonical cell value, tagged by `cell_type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum Cell {
    Code(CodeCell),
    Markdown(MarkdownCell),
}

impl Cell {
    /// Creates the canonical empty cell for `cell_type`.
    ///
    /// # Invariants
    /// - Source is empty, outputs are empty, execution count is absent.
    pub fn empty(cell_type: CellType) -> Self {
        match cell_type {
            CellType::Code => Self::empty_code(),
            CellType::Markdown => Self::empty_markdown(),
        }
    }

    pub fn empty_code() -> Self {
        Self::Code(CodeCell::default())
    }

    pub fn empty_markdown() -> Self {
        Self::Markdown(MarkdownCell::default())
    }

    /// Consumes the cell and returns it with `source` replaced.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.set_source(source);
        self
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Self::Code(_) => CellType::Code,
            Self::Markdown(_) => CellType::Markdown,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Code(cell) => cell.source.as_str(),
            Self::Markdown(cell) => cell.source.as_str(),
        }
    }

    /// Replaces the full source text.
    pub fn set_source(&mut self, source: impl Into<String>) {
        match self {
            Self::Code(cell) => cell.source = source.into(),
            Self::Markdown(cell) => cell.source = source.into(),
        }
    }

    /// Returns outputs; markdown cells have none.
    pub fn outputs(&self) -> &[Output] {
        match self {
            Self::Code(cell) => cell.outputs.as_slice(),
            Self::Markdown(_) => &[],
        }
    }

    /// Replaces the output sequence.
    ///
    /// Returns `false` and leaves the cell untouched for markdown cells.
    pub fn set_outputs(&mut self, outputs: Vec<Output>) -> bool {
        match self {
            Self::Code(cell) => {
                cell.outputs = outputs;
                true
            }
            Self::Markdown(_) => false,
        }
    }

    pub fn execution_count(&self) -> Option<u32> {
        match self {
            Self::Code(cell) => cell.execution_count,
            Self::Markdown(_) => None,
        }
    }

    /// Stamps the execution count.
    ///
    /// Returns `false` and leaves the cell untouched for markdown cells.
    pub fn set_execution_count(&mut self, count: Option<u32>) -> bool {
        match self {
            Self::Code(cell) => {
                cell.execution_count = count;
                true
            }
            Self::Markdown(_) => false,
        }
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        match self {
            Self::Code(cell) => &cell.metadata,
            Self::Markdown(cell) => &cell.metadata,
        }
    }
}

/// Accepts nbformat multiline text: either one string or an array of
/// string fragments that are concatenated verbatim.
fn deserialize_multiline<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct MultilineVisitor;

    impl<'de> Visitor<'de> for MultilineVisitor {
        type Value = String;

        fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("a string or an array of strings")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<String, A::Error> {
            let mut joined = String::new();
            while let Some(fragment) = seq.next_element::<String>()? {
                joined.push_str(fragment.as_str());
            }
            Ok(joined)
        }
    }

    deserializer.deserialize_any(MultilineVisitor)
}
