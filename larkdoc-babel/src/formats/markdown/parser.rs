//! Markdown parsing (Markdown → Block import)
//!
//! Converts CommonMark/GFM Markdown into a block forest.
//! Pipeline: Markdown string → Comrak AST → blocks inserted into a [`BlockIndex`]
//!
//! Block ids are assigned from a per-import counter (`blk1`, `blk2`, ...), so the
//! same input always yields the same forest.

use crate::blocks::{
    Align, Block, BlockId, BlockIndex, BlockKind, BlockStyle, Callout, CalloutColor, ImagePayload,
    ImageSource, TableProperty, TextBody, TextElement,
};
use crate::common::links::classify_image_source;
use crate::common::style::{plain_text, split_lines, InlineComposer, StyleContext};
use crate::common::table::{normalize_row, paginate, TABLE_ROW_LIMIT};
use crate::common::MAX_DEPTH;
use crate::error::ConvertError;
use crate::options::ConvertOptions;
use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{parse_document, Arena, ComrakOptions};
use once_cell::sync::Lazy;
use regex::Regex;

/// `[!TYPE]` at the start of a blockquote's first line.
static ADMONITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[!([A-Za-z][A-Za-z0-9_-]*)\]").expect("admonition pattern is valid")
});

/// Result of importing one Markdown document.
#[derive(Debug, Clone, Default)]
pub struct ImportOutput {
    /// Top-level blocks in document order.
    pub roots: Vec<BlockId>,
    pub index: BlockIndex,
    /// Raw cell text of every emitted table block, in emission order. The
    /// first row of each grid is the header.
    pub tables: Vec<RawTable>,
}

/// Plain-text grid of one table block, for spreadsheet consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

/// Parse Markdown text into a block forest.
pub fn import_markdown(source: &str, options: &ConvertOptions) -> ImportOutput {
    let arena = Arena::new();
    let comrak_options = default_comrak_options();
    let root = parse_document(&arena, source, &comrak_options);

    let mut importer = Importer::new(options);
    let mut roots = Vec::new();
    for child in root.children() {
        roots.extend(importer.import_block(child, 0));
    }

    tracing::debug!(
        roots = roots.len(),
        blocks = importer.index.len(),
        tables = importer.tables.len(),
        "imported markdown"
    );
    ImportOutput {
        roots,
        index: importer.index,
        tables: importer.tables,
    }
}

/// Parse Markdown bytes, which must be valid UTF-8.
pub fn import_markdown_bytes(
    bytes: &[u8],
    options: &ConvertOptions,
) -> Result<ImportOutput, ConvertError> {
    let source = std::str::from_utf8(bytes)?;
    Ok(import_markdown(source, options))
}

pub(crate) fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.math_dollars = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    options
}

#[derive(Debug, Clone, Default)]
struct CellContent {
    elements: Vec<TextElement>,
    raw: String,
}

struct Importer<'o> {
    options: &'o ConvertOptions,
    index: BlockIndex,
    tables: Vec<RawTable>,
    next_id: usize,
    truncated: bool,
}

impl<'o> Importer<'o> {
    fn new(options: &'o ConvertOptions) -> Self {
        Self {
            options,
            index: BlockIndex::new(),
            tables: Vec::new(),
            next_id: 0,
            truncated: false,
        }
    }

    fn allocate_id(&mut self) -> BlockId {
        self.next_id += 1;
        format!("blk{}", self.next_id)
    }

    fn push(&mut self, id: BlockId, kind: BlockKind, children: Vec<BlockId>) -> BlockId {
        self.index
            .insert(Block::new(id.clone(), kind).with_children(children));
        id
    }

    fn push_new(&mut self, kind: BlockKind, children: Vec<BlockId>) -> BlockId {
        let id = self.allocate_id();
        self.push(id, kind, children)
    }

    fn depth_exceeded(&mut self, depth: usize) -> bool {
        if depth < MAX_DEPTH {
            return false;
        }
        if !self.truncated {
            tracing::warn!(depth, "markdown nesting too deep, truncating");
            self.truncated = true;
        }
        true
    }

    fn compose<'a>(&self, nodes: &[&'a AstNode<'a>]) -> Vec<TextElement> {
        InlineComposer::compose(self.options, nodes)
    }

    /// Import one block-level node. Most nodes produce one block, tables may
    /// produce several and unsupported nodes none.
    fn import_block<'a>(&mut self, node: &'a AstNode<'a>, depth: usize) -> Vec<BlockId> {
        if self.depth_exceeded(depth) {
            return Vec::new();
        }
        let children: Vec<&'a AstNode<'a>> = node.children().collect();
        let value = node.data.borrow().value.clone();

        match value {
            NodeValue::Heading(heading) => {
                let text = TextBody::new(self.compose(&children));
                vec![self.push_new(BlockKind::heading(heading.level, text), Vec::new())]
            }
            NodeValue::Paragraph => vec![self.import_paragraph(&children)],
            NodeValue::List(list) => {
                let ordered = list.list_type == ListType::Ordered;
                // Only a list that does not count from 1 carries its start.
                let start = (ordered && list.start != 1).then_some(list.start);
                children
                    .iter()
                    .copied()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        let sequence = if i == 0 { start } else { None };
                        self.import_item(item, ordered, sequence, depth + 1)
                    })
                    .collect()
            }
            NodeValue::BlockQuote => vec![self.import_blockquote(&children, depth)],
            NodeValue::CodeBlock(code) => {
                let literal = code.literal.strip_suffix('\n').unwrap_or(&code.literal);
                let language = code
                    .info
                    .split_whitespace()
                    .next()
                    .map(str::to_string);
                let body = if literal.is_empty() {
                    TextBody::default()
                } else {
                    TextBody::plain(literal)
                };
                let body = body.with_style(BlockStyle {
                    language,
                    ..BlockStyle::default()
                });
                vec![self.push_new(BlockKind::Code(Some(body)), Vec::new())]
            }
            NodeValue::ThematicBreak => vec![self.push_new(BlockKind::Divider, Vec::new())],
            NodeValue::HtmlBlock(html) => {
                let body = TextBody::plain(html.literal.trim_end());
                vec![self.push_new(BlockKind::Text(Some(body)), Vec::new())]
            }
            NodeValue::Table(table) => {
                let alignments: Vec<Option<Align>> =
                    table.alignments.iter().map(|a| cell_align(*a)).collect();
                self.import_table(&children, &alignments)
            }
            NodeValue::FrontMatter(_) => Vec::new(),
            other => {
                tracing::trace!(node = ?other, "skipping unsupported markdown block");
                Vec::new()
            }
        }
    }

    fn import_paragraph<'a>(&mut self, inlines: &[&'a AstNode<'a>]) -> BlockId {
        let content: Vec<&'a AstNode<'a>> = inlines
            .iter()
            .copied()
            .filter(|node| !is_blank_inline(node))
            .collect();

        if let [only] = content.as_slice() {
            let value = only.data.borrow().value.clone();
            match value {
                NodeValue::Image(link) => {
                    let alt_nodes: Vec<&'a AstNode<'a>> = only.children().collect();
                    return self.import_image(&link.url, plain_text(&alt_nodes));
                }
                NodeValue::Math(math) if math.display_math => {
                    let body = TextBody::plain(math.literal.trim());
                    return self.push_new(BlockKind::Equation(Some(body)), Vec::new());
                }
                _ => {}
            }
        }

        let body = TextBody::new(self.compose(inlines));
        self.push_new(BlockKind::Text(Some(body)), Vec::new())
    }

    fn import_image(&mut self, url: &str, alt: String) -> BlockId {
        let payload = match classify_image_source(url, &self.options.uri_scheme) {
            ImageSource::Media(token) => ImagePayload {
                token: Some(token),
                ..ImagePayload::default()
            },
            source => ImagePayload {
                source: Some(source),
                ..ImagePayload::default()
            },
        };

        let mut children = Vec::new();
        if !alt.is_empty() {
            children.push(self.push_new(BlockKind::Text(Some(TextBody::plain(alt))), Vec::new()));
        }
        self.push_new(BlockKind::Image(Some(payload)), children)
    }

    fn import_item<'a>(
        &mut self,
        item: &'a AstNode<'a>,
        ordered: bool,
        sequence: Option<usize>,
        depth: usize,
    ) -> Option<BlockId> {
        if self.depth_exceeded(depth) {
            return None;
        }
        let checkbox = match item.data.borrow().value {
            NodeValue::Item(_) => None,
            NodeValue::TaskItem(symbol) => Some(symbol.is_some_and(|c| !c.is_whitespace())),
            _ => return None,
        };

        let id = self.allocate_id();
        let mut text = None;
        let mut children = Vec::new();
        for child in item.children() {
            let is_paragraph = matches!(child.data.borrow().value, NodeValue::Paragraph);
            if is_paragraph && text.is_none() && children.is_empty() {
                let inlines: Vec<&'a AstNode<'a>> = child.children().collect();
                text = Some(TextBody::new(self.compose(&inlines)));
            } else {
                children.extend(self.import_block(child, depth + 1));
            }
        }
        let mut text = text.unwrap_or_default();

        let kind = match checkbox {
            Some(done) => {
                text.style.done = done;
                BlockKind::Todo(Some(text))
            }
            None if ordered => {
                text.style.sequence = sequence;
                BlockKind::Ordered(Some(text))
            }
            None => BlockKind::Bullet(Some(text)),
        };
        Some(self.push(id, kind, children))
    }

    fn import_blockquote<'a>(&mut self, children: &[&'a AstNode<'a>], depth: usize) -> BlockId {
        if let Some((first, rest)) = children.split_first() {
            if matches!(first.data.borrow().value, NodeValue::Paragraph) {
                let inlines: Vec<&'a AstNode<'a>> = first.children().collect();
                if let Some(marker) = detect_admonition(&inlines) {
                    return self.import_callout(marker, rest, depth);
                }
            }
        }

        let id = self.allocate_id();
        let mut quoted = Vec::new();
        for child in children {
            if matches!(child.data.borrow().value, NodeValue::Paragraph) {
                let inlines: Vec<&'a AstNode<'a>> = child.children().collect();
                for line in split_lines(&inlines) {
                    let body = TextBody::new(self.compose(&line));
                    if !body.is_empty() {
                        quoted.push(self.push_new(BlockKind::Quote(Some(body)), Vec::new()));
                    }
                }
            } else {
                quoted.extend(self.import_quoted_block(child, depth + 1));
            }
        }
        self.push(id, BlockKind::QuoteContainer, quoted)
    }

    fn import_callout<'a>(
        &mut self,
        marker: Admonition<'a>,
        rest: &[&'a AstNode<'a>],
        depth: usize,
    ) -> BlockId {
        let id = self.allocate_id();
        let callout = Callout {
            background: CalloutColor::from_admonition(&marker.keyword),
            emoji: None,
        };

        let mut children = Vec::new();
        let mut composer = InlineComposer::new(self.options);
        let remainder = marker.remainder.trim_start();
        let mut tail = marker.tail.as_slice();
        if remainder.is_empty() {
            while let Some((first, after)) = tail.split_first() {
                if !is_blank_inline(first) {
                    break;
                }
                tail = after;
            }
        }
        composer.push_text(remainder, &StyleContext::default());
        composer.push_nodes(tail, &StyleContext::default());
        let body = TextBody::new(composer.finish());
        if !body.is_empty() {
            children.push(self.push_new(BlockKind::Text(Some(body)), Vec::new()));
        }

        for child in rest {
            children.extend(self.import_quoted_block(child, depth + 1));
        }
        tracing::trace!(keyword = %marker.keyword, "imported callout");
        self.push(id, BlockKind::Callout(Some(callout)), children)
    }

    /// Blocks nested in a quote or callout. Thematic breaks have no place
    /// there and are dropped.
    fn import_quoted_block<'a>(&mut self, node: &'a AstNode<'a>, depth: usize) -> Vec<BlockId> {
        if matches!(node.data.borrow().value, NodeValue::ThematicBreak) {
            return Vec::new();
        }
        self.import_block(node, depth)
    }

    fn import_table<'a>(
        &mut self,
        rows: &[&'a AstNode<'a>],
        alignments: &[Option<Align>],
    ) -> Vec<BlockId> {
        let mut header: Option<Vec<CellContent>> = None;
        let mut body: Vec<Vec<CellContent>> = Vec::new();
        for row in rows {
            let is_header = match row.data.borrow().value {
                NodeValue::TableRow(is_header) => is_header,
                _ => continue,
            };
            let cells: Vec<CellContent> = row
                .children()
                .map(|cell| {
                    let inlines: Vec<&'a AstNode<'a>> = cell.children().collect();
                    CellContent {
                        elements: self.compose(&inlines),
                        raw: plain_text(&inlines),
                    }
                })
                .collect();
            if is_header && header.is_none() {
                header = Some(cells);
            } else {
                body.push(cells);
            }
        }

        let header = header.unwrap_or_default();
        let column_count = header.len().max(body.iter().map(Vec::len).max().unwrap_or(0));
        if column_count == 0 {
            return Vec::new();
        }
        let header = normalize_row(&header, column_count);

        let segments = paginate(&body, column_count, TABLE_ROW_LIMIT);
        if segments.len() > 1 {
            tracing::debug!(
                rows = body.len(),
                tables = segments.len(),
                "splitting long table"
            );
        }

        segments
            .into_iter()
            .map(|segment| {
                let mut grid = Vec::with_capacity(segment.rows.len() + 1);
                grid.push(header.clone());
                grid.extend(segment.rows);
                self.emit_table(grid, column_count, alignments)
            })
            .collect()
    }

    fn emit_table(
        &mut self,
        grid: Vec<Vec<CellContent>>,
        column_count: usize,
        alignments: &[Option<Align>],
    ) -> BlockId {
        let id = self.allocate_id();
        let row_count = grid.len();
        let mut cells = Vec::with_capacity(row_count * column_count);
        let mut raw = RawTable::default();

        for row in grid {
            let mut raw_row = Vec::with_capacity(row.len());
            for (column, cell) in row.into_iter().enumerate() {
                let style = BlockStyle {
                    align: alignments.get(column).copied().flatten(),
                    ..BlockStyle::default()
                };
                let body = TextBody::new(cell.elements).with_style(style);
                let text = self.push_new(BlockKind::Text(Some(body)), Vec::new());
                cells.push(self.push_new(BlockKind::TableCell, vec![text]));
                raw_row.push(cell.raw);
            }
            raw.rows.push(raw_row);
        }
        self.tables.push(raw);

        let property = TableProperty {
            cells: cells.clone(),
            row_size: row_count,
            column_size: column_count,
            header_row: true,
        };
        self.push(id, BlockKind::Table(Some(property)), cells)
    }
}

/// A recognised `[!TYPE]` marker and the inline content following it.
struct Admonition<'a> {
    keyword: String,
    /// Text of the element that closed the marker, after the `]`.
    remainder: String,
    tail: Vec<&'a AstNode<'a>>,
}

/// Look for `[!TYPE]` at the start of a paragraph. The parser may split the
/// marker over several text nodes, so leading text nodes are merged until a
/// `]` shows up.
fn detect_admonition<'a>(inlines: &[&'a AstNode<'a>]) -> Option<Admonition<'a>> {
    let mut merged = String::new();
    for (i, node) in inlines.iter().enumerate() {
        match &node.data.borrow().value {
            NodeValue::Text(text) => merged.push_str(text),
            _ => return None,
        }

        let head = merged.trim_start();
        if !head.is_empty() && !head.starts_with('[') {
            return None;
        }
        if !head.contains(']') {
            continue;
        }

        let captures = ADMONITION.captures(&merged)?;
        let whole = captures.get(0)?;
        return Some(Admonition {
            keyword: captures.get(1)?.as_str().to_string(),
            remainder: merged[whole.end()..].to_string(),
            tail: inlines[i + 1..].to_vec(),
        });
    }
    None
}

fn cell_align(alignment: TableAlignment) -> Option<Align> {
    match alignment {
        TableAlignment::Left => Some(Align::Left),
        TableAlignment::Center => Some(Align::Center),
        TableAlignment::Right => Some(Align::Right),
        TableAlignment::None => None,
    }
}

fn is_blank_inline(node: &AstNode<'_>) -> bool {
    match &node.data.borrow().value {
        NodeValue::SoftBreak | NodeValue::LineBreak => true,
        NodeValue::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}
