//! Table conversion.
//!
//! A table's width is fixed by its first row (colspans expanded); every
//! other row is padded or truncated to that width. Cell content is
//! flattened to rich text, and images found in cells are hoisted to image
//! blocks following the table.

use super::classify::{classify, is_table_like, is_table_row, BlockDecision};
use super::context::{ConversionContext, ExtractionContext};
use super::converter::{collect_images, image_block};
use super::order::{sort_by_key_order, OrderIndex};
use crate::constants::{MAX_RICH_TEXT_ITEMS, MAX_TABLE_ROWS};
use crate::dom::ElementNode;
use crate::model::Block;
use crate::rich_text::build_rich_text;
use crate::types::RichTextSpan;

const CELL_ROLES: &[&str] = &["cell", "gridcell", "columnheader", "rowheader"];

/// Columns a single cell may span; larger values are treated as typos.
const MAX_COLSPAN: usize = 50;

/// One source row, before width normalization.
struct SourceRow<'n> {
    cells: Vec<&'n ElementNode>,
    in_head: bool,
}

impl SourceRow<'_> {
    fn all_header_cells(&self) -> bool {
        !self.cells.is_empty()
            && self
                .cells
                .iter()
                .all(|cell| cell.tag == "th" || cell.attr("role") == Some("columnheader"))
    }
}

/// Converts a table element into one or more table blocks followed by the
/// images hoisted out of its cells.
pub(super) fn convert_table(
    table: &ElementNode,
    ctx: &ConversionContext,
    ectx: &mut ExtractionContext<'_>,
    order: &OrderIndex,
) -> Vec<Block> {
    let mut rows = Vec::new();
    collect_rows(table, false, &mut rows);
    build(rows, ctx, ectx, order)
}

/// A `<tr>` found outside any table becomes a table of its own.
pub(super) fn convert_orphan_row(
    row: &ElementNode,
    ctx: &ConversionContext,
    ectx: &mut ExtractionContext<'_>,
    order: &OrderIndex,
) -> Vec<Block> {
    ectx.diagnostics
        .warn_block("table_row", "Table row outside a table; wrapped in a single-row table");
    let rows = vec![SourceRow {
        cells: row_cells(row),
        in_head: false,
    }];
    build(rows, ctx, ectx, order)
}

fn collect_rows<'n>(element: &'n ElementNode, in_head: bool, rows: &mut Vec<SourceRow<'n>>) {
    for child in element.child_elements() {
        if is_table_row(child) {
            rows.push(SourceRow {
                cells: row_cells(child),
                in_head,
            });
        } else if is_table_like(child) {
            // nested tables belong to a cell, never to this table's rows
            continue;
        } else {
            collect_rows(child, in_head || child.tag == "thead", rows);
        }
    }
}

fn row_cells(row: &ElementNode) -> Vec<&ElementNode> {
    row.child_elements()
        .filter(|cell| {
            cell.tag == "td"
                || cell.tag == "th"
                || cell.attr("role").is_some_and(|role| CELL_ROLES.contains(&role))
        })
        .collect()
}

fn colspan(cell: &ElementNode) -> usize {
    cell.attr("colspan")
        .and_then(|span| span.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_COLSPAN)
}

fn build(
    rows: Vec<SourceRow<'_>>,
    ctx: &ConversionContext,
    ectx: &mut ExtractionContext<'_>,
    order: &OrderIndex,
) -> Vec<Block> {
    let Some(first) = rows.first() else {
        ectx.diagnostics.info("Skipping table without rows");
        return Vec::new();
    };
    let width: usize = first.cells.iter().map(|cell| colspan(cell)).sum();
    if width == 0 {
        ectx.diagnostics
            .warn_block("table", "Skipping table whose first row has no cells");
        return Vec::new();
    }
    let has_column_header = first.in_head || first.all_header_cells();

    let cell_ctx = ctx.entering_table_cell();
    let mut images: Vec<&ElementNode> = Vec::new();
    let mut built_rows = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let mut cells: Vec<Vec<RichTextSpan>> = Vec::with_capacity(width);
        for cell in &row.cells {
            cells.push(cell_text(cell, &cell_ctx, ectx));
            cells.extend((1..colspan(cell)).map(|_| Vec::new()));
            collect_images(&cell.children, &mut images);
        }

        if cells.len() != width {
            ectx.diagnostics.warn_block(
                "table",
                format!(
                    "Row {} has {} cells but the table has {} columns; {}",
                    index + 1,
                    cells.len(),
                    width,
                    if cells.len() < width { "padded" } else { "truncated" }
                ),
            );
            cells.resize_with(width, Vec::new);
        }
        built_rows.push(Block::table_row(cells));
    }

    let mut blocks = split_rows(built_rows, width, has_column_header);

    sort_by_key_order(&mut images, order, |img| img.key);
    let config = ectx.config;
    for img in images {
        if let Some(block) =
            image_block(img, Vec::new(), config.base_url.as_ref(), &mut ectx.diagnostics)
        {
            blocks.push(block);
        }
    }
    blocks
}

/// Splits rows into tables of at most `MAX_TABLE_ROWS` rows, repeating the
/// header row at the top of every continuation.
fn split_rows(rows: Vec<Block>, width: usize, has_column_header: bool) -> Vec<Block> {
    if rows.len() <= MAX_TABLE_ROWS {
        return vec![Block::table(width, has_column_header, rows)];
    }

    let mut rows = rows.into_iter();
    let header = if has_column_header { rows.next() } else { None };
    let per_table = if header.is_some() {
        MAX_TABLE_ROWS - 1
    } else {
        MAX_TABLE_ROWS
    };

    let body: Vec<Block> = rows.collect();
    body.chunks(per_table)
        .map(|chunk| {
            let mut table_rows = Vec::with_capacity(chunk.len() + 1);
            table_rows.extend(header.clone());
            table_rows.extend_from_slice(chunk);
            Block::table(width, has_column_header, table_rows)
        })
        .collect()
}

fn cell_text(
    cell: &ElementNode,
    cell_ctx: &ConversionContext,
    ectx: &mut ExtractionContext<'_>,
) -> Vec<RichTextSpan> {
    if let Some(nested) = cell.find_descendant(&is_table_like) {
        if classify(nested, cell_ctx) == BlockDecision::Transparent {
            ectx.diagnostics.warn_block(
                "table",
                format!("Nested table flattened into cell text ({})", cell_ctx.location()),
            );
        }
    }

    let inline = ectx.inline().flattening();
    let mut spans = build_rich_text(cell, &inline);
    if spans.len() > MAX_RICH_TEXT_ITEMS {
        ectx.diagnostics.warn_block(
            "table_row",
            format!(
                "Cell has {} rich text runs; keeping the first {}",
                spans.len(),
                MAX_RICH_TEXT_ITEMS
            ),
        );
        spans.truncate(MAX_RICH_TEXT_ITEMS);
    }
    spans
}
