//! CLI smoke and inspection entry point.
//!
//! # Responsibility
//! - Verify `notebook_core` linkage with a deterministic probe.
//! - Print a one-line-per-cell outline of a notebook file when given a path.

use notebook_core::{CellType, NotebookService};
use std::path::Path;
use std::process::ExitCode;

const PREVIEW_CHARS: usize = 48;

fn main() -> ExitCode {
    println!("notebook_core ping={}", notebook_core::ping());
    println!("notebook_core version={}", notebook_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let mut service = NotebookService::new();
    if let Err(err) = service.open_notebook(Path::new(path.as_str())) {
        eprintln!("failed to open `{path}`: {err}");
        return ExitCode::FAILURE;
    }

    let document = service.document();
    println!("cells={}", document.len());
    for (index, (_, cell)) in document.iter().enumerate() {
        let marker = match cell.cell_type() {
            CellType::Code => match cell.execution_count() {
                Some(count) => format!("[{count}]"),
                None => "[ ]".to_string(),
            },
            CellType::Markdown => CellType::Markdown.as_str().to_string(),
        };
        println!("{index:>4} {marker:>6} {}", preview(cell.source()));
    }
    ExitCode::SUCCESS
}

fn preview(source: &str) -> String {
    let first_line = source.lines().next().unwrap_or_default();
    let mut shown = first_line.chars().take(PREVIEW_CHARS).collect::<String>();
    if first_line.chars().count() > PREVIEW_CHARS || source.lines().nth(1).is_some() {
        shown.push_str("...");
    }
    shown
}
