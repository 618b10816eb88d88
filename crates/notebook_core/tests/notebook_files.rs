use notebook_core::{
    load_notebook, notebook_from_str, notebook_from_value, notebook_to_value, save_notebook, Action,
    Cell, CellType, CodecError, EngineConfig, NotebookService, NotebookServiceError, UuidCellIds,
};
use serde_json::json;
use uuid::Uuid;

const SAMPLE: &str = r##"{
  "nbformat": 4,
  "nbformat_minor": 5,
  "metadata": {
    "kernelspec": { "name": "python3", "display_name": "Python 3" },
    "language_info": { "name": "python" }
  },
  "cells": [
    { "cell_type": "markdown", "id": "intro", "metadata": {}, "source": ["# Demo\n", "text"] },
    {
      "cell_type": "code",
      "id": "calc",
      "metadata": {},
      "execution_count": 1,
      "source": "1 + 1",
      "outputs": [
        { "output_type": "execute_result", "execution_count": 1,
          "data": { "text/plain": "2" }, "metadata": {} }
      ]
    },
    {
      "cell_type": "code",
      "id": "boom",
      "metadata": {},
      "execution_count": 2,
      "source": "1 / 0",
      "outputs": [
        { "output_type": "error", "ename": "ZeroDivisionError",
          "evalue": "division by zero", "traceback": [] }
      ]
    }
  ]
}"##;

fn sequential_ids() -> impl FnMut() -> Uuid {
    let mut next = 0u128;
    move || {
        next += 1;
        Uuid::from_u128(next)
    }
}

#[test]
fn loaded_notebook_gets_fresh_ids_in_file_order() {
    let document = notebook_from_str(SAMPLE, &mut sequential_ids()).unwrap();

    assert_eq!(
        document.cell_ids(),
        &[Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)]
    );
    let first = document.cell(Uuid::from_u128(1)).unwrap();
    assert_eq!(first.cell_type(), CellType::Markdown);
    assert_eq!(first.source(), "# Demo\ntext");
    assert_eq!(document.language_info(), Some(&json!({ "name": "python" })));
}

#[test]
fn save_then_load_preserves_cells_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.ipynb");

    let original = notebook_from_str(SAMPLE, &mut UuidCellIds).unwrap();
    save_notebook(&path, &original).unwrap();
    let reloaded = load_notebook(&path, &mut UuidCellIds).unwrap();

    let original_cells: Vec<_> = original.iter().map(|(_, cell)| cell.clone()).collect();
    let reloaded_cells: Vec<_> = reloaded.iter().map(|(_, cell)| cell.clone()).collect();
    assert_eq!(reloaded_cells, original_cells);
    assert_eq!(reloaded.metadata(), original.metadata());

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["nbformat"], 4);
    assert_eq!(written["cells"][2]["outputs"][0]["ename"], "ZeroDivisionError");
}

#[test]
fn markdown_attachments_survive_load_and_save() {
    let value = json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {},
        "cells": [{
            "cell_type": "markdown",
            "metadata": {},
            "source": "![x](attachment:a.png)",
            "attachments": { "a.png": { "image/png": "iVBOR" } }
        }]
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attached.ipynb");

    let document = notebook_from_value(value, &mut UuidCellIds).unwrap();
    save_notebook(&path, &document).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written["cells"][0]["attachments"],
        json!({ "a.png": { "image/png": "iVBOR" } })
    );
    let reloaded = load_notebook(&path, &mut UuidCellIds).unwrap();
    let (_, cell) = reloaded.iter().next().unwrap();
    match cell {
        Cell::Markdown(markdown) => {
            assert_eq!(markdown.attachments["a.png"]["image/png"], "iVBOR");
        }
        other => panic!("expected markdown cell, got {other:?}"),
    }
}

#[test]
fn markdown_without_attachments_omits_the_key() {
    let document = notebook_from_str(SAMPLE, &mut UuidCellIds).unwrap();
    let written = notebook_to_value(&document).unwrap();
    assert!(written["cells"][0].get("attachments").is_none());
}

#[test]
fn malformed_files_are_reported() {
    let err = notebook_from_str("{ not json", &mut UuidCellIds).unwrap_err();
    assert!(matches!(err, CodecError::Json(_)));

    let err = notebook_from_str(
        r#"{ "nbformat": 4, "cells": [{ "cell_type": "widget", "source": "" }] }"#,
        &mut UuidCellIds,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CodecError::UnsupportedCellType { index: 0, ref cell_type } if cell_type == "widget"
    ));

    let dir = tempfile::tempdir().unwrap();
    let err = load_notebook(&dir.path().join("missing.ipynb"), &mut UuidCellIds).unwrap_err();
    assert!(matches!(err, CodecError::Io(_)));
}

#[test]
fn service_opens_edits_and_saves_notebook() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("in.ipynb");
    let target_path = dir.path().join("out.ipynb");
    std::fs::write(&source_path, SAMPLE).unwrap();

    let mut service = NotebookService::with_generator(sequential_ids(), EngineConfig::default());
    service.open_notebook(&source_path).unwrap();
    assert_eq!(service.focused_cell(), Some(Uuid::from_u128(1)));

    service
        .dispatch(Action::MergeCellAfter {
            id: Uuid::from_u128(2),
        })
        .unwrap();
    service
        .dispatch(Action::FocusNextCell {
            id: Uuid::from_u128(2),
            create_if_at_end: true,
        })
        .unwrap();
    assert_eq!(service.focused_cell(), Some(Uuid::from_u128(4)));
    service.save_notebook(&target_path).unwrap();

    let saved = load_notebook(&target_path, &mut UuidCellIds).unwrap();
    let sources: Vec<_> = saved.iter().map(|(_, cell)| cell.source().to_string()).collect();
    assert_eq!(sources, vec!["# Demo\ntext", "1 + 1\n\n1 / 0", ""]);

    let state = service.into_state();
    assert_eq!(state.focused_cell, Some(Uuid::from_u128(4)));
    assert_eq!(state.document.len(), 3);
    state.check_consistency().unwrap();
}

#[test]
fn service_keeps_previous_state_when_open_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = NotebookService::new();
    service
        .dispatch(Action::NewCellAppend {
            cell_type: CellType::Code,
        })
        .unwrap();
    let before = service.state().clone();

    let err = service
        .open_notebook(&dir.path().join("missing.ipynb"))
        .unwrap_err();

    assert!(matches!(err, NotebookServiceError::Codec(CodecError::Io(_))));
    assert_eq!(service.state(), &before);
}
