use crate::common::{export, ids, index, parent, text};
use larkdoc_babel::blocks::{Align, Block, BlockKind, TableProperty};
use larkdoc_babel::common::table::{paginate, reassemble, TABLE_ROW_LIMIT};
use larkdoc_babel::formats::markdown::{
    cell_plain_text, import_markdown, table_plain_text, ImportOutput,
};
use larkdoc_babel::ConvertOptions;
use proptest::prelude::*;

fn table_markdown(body_rows: usize) -> String {
    let mut md = String::from("| id | name |\n| --- | --- |\n");
    for i in 0..body_rows {
        md.push_str(&format!("| {i} | row {i} |\n"));
    }
    md
}

fn import(md: &str) -> ImportOutput {
    import_markdown(md, &ConvertOptions::default())
}

fn property<'a>(output: &'a ImportOutput, id: &str) -> &'a TableProperty {
    match &output.index.get(id).expect("table block").kind {
        BlockKind::Table(Some(property)) => property,
        other => panic!("expected table, got {other:?}"),
    }
}

#[test]
fn test_small_table_imports_as_one_block() {
    let output = import(&table_markdown(2));
    assert_eq!(output.roots.len(), 1);
    let table = property(&output, &output.roots[0]);
    assert_eq!(table.row_size, 3);
    assert_eq!(table.column_size, 2);
    assert!(table.header_row);
    assert_eq!(table.cells.len(), 6);

    let cell = output.index.get(&table.cells[3]).expect("cell");
    assert_eq!(cell.kind, BlockKind::TableCell);
    assert_eq!(cell.children.len(), 1);
    assert_eq!(cell_plain_text(&output.index, &table.cells[3]), "row 0");

    assert_eq!(
        output.tables[0].rows,
        vec![
            vec!["id".to_string(), "name".to_string()],
            vec!["0".to_string(), "row 0".to_string()],
            vec!["1".to_string(), "row 1".to_string()],
        ]
    );
}

#[test]
fn test_long_table_is_split_with_repeated_header() {
    let output = import(&table_markdown(20));
    assert_eq!(output.roots.len(), 3);
    assert_eq!(output.tables.len(), 3);

    let sizes: Vec<usize> = output
        .roots
        .iter()
        .map(|id| property(&output, id).row_size)
        .collect();
    assert_eq!(sizes, vec![10, 10, 3]);

    for grid in &output.tables {
        assert_eq!(grid.rows[0], vec!["id".to_string(), "name".to_string()]);
    }
    assert_eq!(output.tables[1].rows[1][0], "9");
    assert_eq!(output.tables[2].rows[2][1], "row 19");
}

#[test]
fn test_ragged_rows_are_padded() {
    let output = import("| a | b | c |\n| - | - | - |\n| 1 |\n| 1 | 2 | 3 |\n");
    let table = property(&output, &output.roots[0]);
    assert_eq!(table.cells.len(), 9);
    assert_eq!(output.tables[0].rows[1], vec!["1", "", ""]);
}

#[test]
fn test_table_export() {
    let md = "| Left | Center | Right |\n| :--- | :---: | ---: |\n| l | c | r |\n";
    let output = import(md);
    let exported = larkdoc_babel::formats::markdown::export_markdown(
        &output.index,
        &output.roots,
        &ConvertOptions::default(),
        &larkdoc_babel::MentionCache::new(),
    )
    .markdown;
    assert_eq!(
        exported,
        "| Left | Center | Right |\n| :--- | :----: | ----: |\n| l    | c      | r     |\n"
    );
}

#[test]
fn test_alignment_is_imported_per_column() {
    let output = import("| a | b |\n| :-: | -: |\n| 1 | 2 |\n");
    let table = property(&output, &output.roots[0]);
    let align = |cell: &str| {
        let cell = output.index.get(cell).expect("cell");
        let text = output.index.get(&cell.children[0]).expect("text");
        text.kind.text().and_then(|t| t.style.align)
    };
    assert_eq!(align(&table.cells[2]), Some(Align::Center));
    assert_eq!(align(&table.cells[3]), Some(Align::Right));
}

#[test]
fn test_pipes_in_cells_are_escaped() {
    let output = import("| a |\n| - |\n| x \\| y |\n");
    assert_eq!(output.tables[0].rows[1][0], "x | y");
    let md = larkdoc_babel::formats::markdown::export_markdown(
        &output.index,
        &output.roots,
        &ConvertOptions::default(),
        &larkdoc_babel::MentionCache::new(),
    )
    .markdown;
    assert!(md.contains("x \\| y"));
}

#[test]
fn test_inconsistent_geometry_renders_complete_rows() {
    let cells = ["h1", "h2", "h3", "a", "b", "c", "orphan"];
    let mut blocks: Vec<Block> = cells.iter().map(|id| text(id, id)).collect();
    blocks.push(Block::new(
        "t",
        BlockKind::Table(Some(TableProperty {
            cells: ids(&cells),
            row_size: 5,
            column_size: 3,
            header_row: true,
        })),
    ));
    let blocks = index(blocks);

    assert_eq!(
        export(&blocks, &["t"]),
        "| h1  | h2  | h3  |\n| --- | --- | --- |\n| a   | b   | c   |\n"
    );
    assert_eq!(table_plain_text(&blocks, "t").len(), 2);
}

#[test]
fn test_gaps_and_missing_cells_render_empty() {
    let blocks = index(vec![
        Block::new(
            "t",
            BlockKind::Table(Some(TableProperty {
                cells: vec!["h".to_string(), String::new(), "gone".to_string(), "c".to_string()],
                row_size: 2,
                column_size: 2,
                header_row: true,
            })),
        ),
        text("h", "head"),
        parent("c", BlockKind::TableCell, &[]),
    ]);
    assert_eq!(
        table_plain_text(&blocks, "t"),
        vec![
            vec!["head".to_string(), String::new()],
            vec![String::new(), String::new()],
        ]
    );
    assert_eq!(cell_plain_text(&blocks, "gone"), "");
    assert_eq!(cell_plain_text(&blocks, "c"), "");
}

#[test]
fn test_zero_columns_render_nothing() {
    let blocks = index(vec![Block::new(
        "t",
        BlockKind::Table(Some(TableProperty {
            cells: ids(&["a"]),
            row_size: 1,
            column_size: 0,
            header_row: false,
        })),
    )]);
    assert_eq!(export(&blocks, &["t"]), "");
}

proptest! {
    #[test]
    fn prop_import_splits_into_ceil_rows_over_limit(rows in 1usize..60) {
        let output = import(&table_markdown(rows));
        let expected = rows.div_ceil(TABLE_ROW_LIMIT);
        prop_assert_eq!(output.roots.len(), expected);
        prop_assert_eq!(output.tables.len(), expected);
        for (i, grid) in output.tables.iter().enumerate() {
            let body = (rows - i * TABLE_ROW_LIMIT).min(TABLE_ROW_LIMIT);
            prop_assert_eq!(grid.rows.len(), body + 1);
        }
    }

    #[test]
    fn prop_paginate_preserves_rows(
        rows in prop::collection::vec(prop::collection::vec(0u8..10, 0..6), 0..40),
        columns in 1usize..6,
    ) {
        let segments = paginate(&rows, columns, TABLE_ROW_LIMIT);
        prop_assert_eq!(segments.len(), rows.len().div_ceil(TABLE_ROW_LIMIT).max(1));
        let flattened: Vec<Vec<u8>> = segments.into_iter().flat_map(|s| s.rows).collect();
        prop_assert_eq!(flattened.len(), rows.len());
        for (out, original) in flattened.iter().zip(&rows) {
            prop_assert_eq!(out.len(), columns);
            let kept = original.len().min(columns);
            prop_assert_eq!(&out[..kept], &original[..kept]);
        }
    }

    #[test]
    fn prop_reassemble_never_panics(
        cell_count in 0usize..50,
        row_count in 0usize..20,
        columns in 0usize..7,
    ) {
        let cells: Vec<String> = (0..cell_count).map(|i| format!("c{i}")).collect();
        let grid = reassemble(&cells, row_count, columns);
        let expected = if columns == 0 { 0 } else { cell_count / columns };
        prop_assert_eq!(grid.len(), expected);
        prop_assert!(grid.iter().all(|row| row.len() == columns));
    }
}
