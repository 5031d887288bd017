//! Markdown serialization (Block → Markdown export)
//!
//! Walks a block forest from its roots and renders GFM Markdown directly, one
//! block kind at a time. Sibling blocks are separated by a blank line, except
//! consecutive items of one list kind, which stay in one tight list.
//!
//! User mentions are rendered from a [`MentionCache`] that the caller has
//! filled beforehand (see [`crate::Converter::export_markdown`]); this module
//! never calls a resolver itself.

use crate::blocks::{
    Align, Block, BlockId, BlockIndex, BlockKind, DocTarget, ImagePayload, ImageSource,
    IsvPayload, StyleFlags, TableProperty, TextBody, TextElement, TextRun,
};
use crate::common::links::{doc_reference_uri, encode_link_url, internal_uri};
use crate::common::table::reassemble;
use crate::common::MAX_DEPTH;
use crate::mentions::MentionCache;
use crate::options::ConvertOptions;
use std::collections::HashSet;

/// Rendered Markdown plus the image tokens it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutput {
    pub markdown: String,
    /// Tokens of every image block rendered, in first-seen order. A download
    /// collaborator fetches these when `download_images` is set.
    pub image_tokens: Vec<String>,
}

/// Render the blocks reachable from `roots` as Markdown.
pub fn export_markdown(
    index: &BlockIndex,
    roots: &[BlockId],
    options: &ConvertOptions,
    mentions: &MentionCache,
) -> ExportOutput {
    let mut exporter = Exporter {
        index,
        options,
        mentions,
        image_tokens: Vec::new(),
        rendered: HashSet::new(),
        truncated: false,
    };
    let body = exporter.render_siblings(roots, 0, Frame::Plain);
    tracing::debug!(
        roots = roots.len(),
        bytes = body.len(),
        images = exporter.image_tokens.len(),
        "exported markdown"
    );

    let markdown = if body.is_empty() {
        body
    } else {
        format!("{body}\n")
    };
    ExportOutput {
        markdown,
        image_tokens: exporter.image_tokens,
    }
}

/// Plain text of one table cell, for spreadsheet consumers.
///
/// Cells without children yield their own text (usually none); a missing id
/// yields an empty string.
pub fn cell_plain_text(index: &BlockIndex, cell_id: &str) -> String {
    index
        .get(cell_id)
        .map(|cell| block_plain_text(index, cell))
        .unwrap_or_default()
}

/// Plain-text grid of a table block. Non-table blocks give an empty grid.
pub fn table_plain_text(index: &BlockIndex, table_id: &str) -> Vec<Vec<String>> {
    let Some(BlockKind::Table(Some(property))) = index.get(table_id).map(|b| &b.kind) else {
        return Vec::new();
    };
    reassemble(&property.cells, property.row_size, property.column_size)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|id| id.map(|id| cell_plain_text(index, id)).unwrap_or_default())
                .collect()
        })
        .collect()
}

fn block_plain_text(index: &BlockIndex, block: &Block) -> String {
    let mut lines = Vec::new();
    let mut seen = HashSet::new();
    collect_block_text(index, block, 0, &mut seen, &mut lines);
    lines.join("\n")
}

fn collect_block_text<'a>(
    index: &'a BlockIndex,
    block: &'a Block,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    lines: &mut Vec<String>,
) {
    if depth >= MAX_DEPTH || !seen.insert(block.id.as_str()) {
        return;
    }
    if block.children.is_empty() {
        let text = block.kind.text().map(TextBody::plain_text).unwrap_or_default();
        if !text.is_empty() {
            lines.push(text);
        }
        return;
    }
    for child in index.children_of(block) {
        collect_block_text(index, child, depth + 1, seen, lines);
    }
}

/// What encloses a sibling list. Inside a quote container, quote leaves are
/// bare lines of the enclosing `>` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Plain,
    Quoted,
}

/// Siblings sharing a line group are joined by a single newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineGroup {
    BulletItem,
    OrderedItem,
    QuoteLine,
}

fn line_group(kind: &BlockKind, frame: Frame) -> Option<LineGroup> {
    match (kind, frame) {
        (BlockKind::Bullet(_) | BlockKind::Todo(_), _) => Some(LineGroup::BulletItem),
        (BlockKind::Ordered(_), _) => Some(LineGroup::OrderedItem),
        (BlockKind::Quote(_), Frame::Quoted) => Some(LineGroup::QuoteLine),
        _ => None,
    }
}

struct Exporter<'x> {
    index: &'x BlockIndex,
    options: &'x ConvertOptions,
    mentions: &'x MentionCache,
    image_tokens: Vec<String>,
    /// Ids already rendered in this export. A block listed under several
    /// parents, or twice under one, is rendered at its first occurrence only.
    rendered: HashSet<&'x str>,
    truncated: bool,
}

impl<'x> Exporter<'x> {
    fn depth_exceeded(&mut self, depth: usize) -> bool {
        if depth < MAX_DEPTH {
            return false;
        }
        if !self.truncated {
            tracing::warn!(depth, "block nesting too deep, truncating");
            self.truncated = true;
        }
        true
    }

    fn render_siblings(&mut self, ids: &[BlockId], depth: usize, frame: Frame) -> String {
        let index = self.index;
        let mut out = String::new();
        let mut previous_group = None;
        let mut ordinal = 0usize;

        for id in ids {
            let Some(block) = index.get(id) else {
                tracing::trace!(%id, "skipping missing block");
                continue;
            };
            if self.depth_exceeded(depth) {
                break;
            }
            if !self.rendered.insert(block.id.as_str()) {
                tracing::trace!(%id, "skipping block already rendered");
                continue;
            }
            ordinal = match &block.kind {
                BlockKind::Ordered(text) => text
                    .as_ref()
                    .and_then(|t| t.style.sequence)
                    .unwrap_or(ordinal + 1),
                _ => 0,
            };

            let rendered = match (&block.kind, frame) {
                (BlockKind::Quote(text), Frame::Quoted) if block.children.is_empty() => {
                    self.render_optional_text(text.as_ref())
                }
                _ => self.render_block(block, depth, ordinal),
            };
            if rendered.is_empty() {
                continue;
            }
            let group = line_group(&block.kind, frame);
            if !out.is_empty() {
                let tight = group.is_some() && group == previous_group;
                out.push_str(if tight { "\n" } else { "\n\n" });
            }
            out.push_str(&rendered);
            previous_group = group;
        }
        out
    }

    fn render_children(&mut self, block: &Block, depth: usize) -> String {
        self.render_siblings(&block.children, depth + 1, Frame::Plain)
    }

    fn render_block(&mut self, block: &Block, depth: usize, ordinal: usize) -> String {
        if self.depth_exceeded(depth) {
            return String::new();
        }

        match &block.kind {
            BlockKind::Page(title) => {
                let title = single_line(&self.render_optional_text(title.as_ref()));
                let heading = if title.trim().is_empty() {
                    String::new()
                } else {
                    format!("# {title}")
                };
                let body = self.render_children(block, depth);
                join_nonempty(&[heading, body])
            }
            BlockKind::Text(text) => {
                let text = self.render_optional_text(text.as_ref());
                let body = self.render_children(block, depth);
                join_nonempty(&[text, body])
            }
            BlockKind::Heading { level, text } => {
                let text = single_line(&self.render_optional_text(text.as_ref()));
                let marks = "#".repeat(usize::from((*level).clamp(1, 6)));
                format!("{marks} {text}").trim_end().to_string()
            }
            BlockKind::Bullet(text) => self.render_list_item("- ", 2, text.as_ref(), block, depth),
            BlockKind::Ordered(text) => {
                let marker = format!("{ordinal}. ");
                let width = marker.len();
                self.render_list_item(&marker, width, text.as_ref(), block, depth)
            }
            BlockKind::Todo(text) => {
                let done = text.as_ref().map_or(false, |t| t.style.done);
                let marker = if done { "- [x] " } else { "- [ ] " };
                self.render_list_item(marker, 2, text.as_ref(), block, depth)
            }
            BlockKind::Code(text) => render_code(text.as_ref()),
            BlockKind::Quote(text) => {
                let text = self.render_optional_text(text.as_ref());
                let body = self.render_children(block, depth);
                quote_lines(&join_nonempty(&[text, body]))
            }
            BlockKind::Equation(text) => {
                let content = text.as_ref().map(TextBody::plain_text).unwrap_or_default();
                let content = content.trim();
                if content.is_empty() {
                    String::new()
                } else {
                    format!("$${content}$$")
                }
            }
            BlockKind::Divider => "---".to_string(),
            BlockKind::QuoteContainer => {
                quote_lines(&self.render_siblings(&block.children, depth + 1, Frame::Quoted))
            }
            BlockKind::Callout(callout) => {
                let keyword = callout
                    .as_ref()
                    .map_or("NOTE", |c| c.background.admonition());
                let body = self.render_children(block, depth);
                if body.is_empty() {
                    format!("> [!{keyword}]")
                } else {
                    format!("> [!{keyword}]\n{}", quote_lines(&body))
                }
            }
            BlockKind::Grid { .. } => self.render_grid(block, depth),
            BlockKind::GridColumn { .. }
            | BlockKind::TableCell
            | BlockKind::View
            | BlockKind::Okr
            | BlockKind::OkrObjective
            | BlockKind::OkrKeyResult
            | BlockKind::OkrProgress
            | BlockKind::Agenda
            | BlockKind::AgendaItem
            | BlockKind::AgendaItemTitle
            | BlockKind::AgendaItemContent
            | BlockKind::SyncSource
            | BlockKind::SyncReference(_) => self.render_children(block, depth),
            BlockKind::LinkPreview(url) => {
                let link = url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .map(|u| format!("[{u}]({})", encode_link_url(u)))
                    .unwrap_or_default();
                let body = self.render_children(block, depth);
                join_nonempty(&[link, body])
            }
            BlockKind::Table(property) => match property {
                Some(property) => self.render_table(property, depth),
                None => String::new(),
            },
            BlockKind::Image(payload) => self.render_image(payload.as_ref(), block),
            BlockKind::File(file) => match file {
                Some(file) if !file.token.is_empty() => {
                    let name = if file.name.is_empty() { "File" } else { file.name.as_str() };
                    let uri = internal_uri(&self.options.uri_scheme, "file", &file.token);
                    format!("[{name}]({uri})")
                }
                _ => "[File]".to_string(),
            },
            BlockKind::Bitable(token) => self.placeholder("Bitable", "bitable", token.as_deref()),
            BlockKind::Sheet(token) => self.placeholder("Sheet", "sheet", token.as_deref()),
            BlockKind::Board(token) => self.placeholder("Board", "board", token.as_deref()),
            BlockKind::MindNote(token) => {
                self.placeholder("MindNote", "mindnote", token.as_deref())
            }
            BlockKind::ChatCard(chat) => self.placeholder("Chat", "chat", chat.as_deref()),
            BlockKind::Task(task) => self.placeholder("Task", "task", task.as_deref()),
            BlockKind::JiraIssue(key) => self.placeholder("Jira", "jira", key.as_deref()),
            BlockKind::Iframe(url) => match url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => format!("[Iframe]({})", encode_link_url(url)),
                None => "[Iframe]".to_string(),
            },
            BlockKind::Diagram(diagram) => {
                let label = diagram.map_or("Unknown", |d| d.label());
                format!("[Diagram: {label}]")
            }
            BlockKind::Isv(isv) => match isv {
                Some(IsvPayload {
                    component_type_id,
                    component_id,
                }) => format!("[ISV {component_type_id}: {component_id}]"),
                None => "[ISV]".to_string(),
            },
            BlockKind::AddOns(_)
            | BlockKind::WikiCatalog
            | BlockKind::WikiCatalogV2
            | BlockKind::AiTemplate => String::new(),
            BlockKind::Unknown(code) => {
                tracing::trace!(code, id = %block.id, "skipping unknown block kind");
                String::new()
            }
        }
    }

    fn render_list_item(
        &mut self,
        marker: &str,
        indent: usize,
        text: Option<&TextBody>,
        block: &Block,
        depth: usize,
    ) -> String {
        let text = self.render_optional_text(text);
        let mut out = format!("{marker}{}", indent_continuation(&text, indent));
        let nested = self.render_children(block, depth);
        if !nested.is_empty() {
            out = out.trim_end().to_string();
            out.push('\n');
            out.push_str(&indent_lines(&nested, indent));
        }
        out.trim_end().to_string()
    }

    fn render_grid(&mut self, grid: &Block, depth: usize) -> String {
        let index = self.index;
        let mut columns = Vec::new();
        for column in grid.children.iter().filter_map(|id| index.get(id)) {
            if !matches!(column.kind, BlockKind::GridColumn { .. }) {
                tracing::trace!(id = %column.id, "ignoring non-column child of grid");
                continue;
            }
            if self.depth_exceeded(depth + 1) {
                break;
            }
            if !self.rendered.insert(column.id.as_str()) {
                tracing::trace!(id = %column.id, "skipping grid column already rendered");
                continue;
            }
            columns.push(self.render_children(column, depth + 1));
        }
        join_nonempty(&columns)
    }

    fn render_table(&mut self, property: &TableProperty, depth: usize) -> String {
        let grid = reassemble(&property.cells, property.row_size, property.column_size);
        let Some(header) = grid.first() else {
            return String::new();
        };

        let alignments: Vec<Option<Align>> = header
            .iter()
            .map(|id| id.and_then(|id| self.cell_alignment(id)))
            .collect();
        let rows: Vec<Vec<String>> = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|id| id.map(|id| self.render_cell(id, depth + 1)).unwrap_or_default())
                    .collect()
            })
            .collect();

        let mut widths = vec![3usize; property.column_size];
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut lines = Vec::with_capacity(rows.len() + 1);
        for (i, row) in rows.iter().enumerate() {
            lines.push(table_row(row, &widths));
            if i == 0 {
                lines.push(table_separator(&widths, &alignments));
            }
        }
        lines.join("\n")
    }

    fn render_cell(&mut self, id: &str, depth: usize) -> String {
        let index = self.index;
        let Some(cell) = index.get(id) else {
            return String::new();
        };
        if self.depth_exceeded(depth) {
            return String::new();
        }
        let content = if cell.children.is_empty() {
            self.render_block(cell, depth, 0)
        } else {
            self.render_children(cell, depth)
        };
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("<br>")
            .replace('|', "\\|")
    }

    fn cell_alignment(&self, id: &str) -> Option<Align> {
        let cell = self.index.get(id)?;
        cell.kind
            .text()
            .or_else(|| {
                self.index
                    .children_of(cell)
                    .find_map(|child| child.kind.text())
            })
            .and_then(|text| text.style.align)
    }

    fn render_image(&mut self, payload: Option<&ImagePayload>, block: &Block) -> String {
        let alt = block_plain_text(self.index, block).replace('\n', " ");
        let token = payload
            .and_then(|p| p.token.as_deref())
            .filter(|t| !t.is_empty());

        match (token, payload.and_then(|p| p.source.as_ref())) {
            (Some(token), _) => {
                if !self.image_tokens.iter().any(|t| t == token) {
                    self.image_tokens.push(token.to_string());
                }
                let target = if self.options.download_images {
                    format!(
                        "{}/{token}.png",
                        self.options.image_dir.trim_end_matches('/')
                    )
                } else {
                    token.to_string()
                };
                format!("![{alt}]({target})")
            }
            (None, Some(ImageSource::Remote(url))) => {
                format!("![{alt}]({})", encode_link_url(url))
            }
            (None, Some(ImageSource::Local(path))) => format!("![{alt}]({path})"),
            (None, Some(ImageSource::Media(token))) => {
                let uri = internal_uri(&self.options.uri_scheme, "media", token);
                format!("![{alt}]({uri})")
            }
            (None, None) => "![image]()".to_string(),
        }
    }

    fn placeholder(&self, label: &str, kind: &str, token: Option<&str>) -> String {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                let uri = internal_uri(&self.options.uri_scheme, kind, token);
                format!("[{label}]({uri})")
            }
            None => format!("[{label}]"),
        }
    }

    fn render_optional_text(&self, text: Option<&TextBody>) -> String {
        text.map(|t| self.render_text(t)).unwrap_or_default()
    }

    fn render_text(&self, text: &TextBody) -> String {
        text.elements
            .iter()
            .map(|element| self.render_element(element))
            .collect()
    }

    fn render_element(&self, element: &TextElement) -> String {
        match element {
            TextElement::Run(run) => render_run(run),
            TextElement::MentionUser { user_id } => {
                self.mentions.render(user_id, self.options.expand_mentions)
            }
            TextElement::MentionDoc { title, target } => {
                let url = match target {
                    DocTarget::Url(url) if !url.is_empty() => url.clone(),
                    DocTarget::Token(token) if !token.is_empty() => {
                        doc_reference_uri(&self.options.uri_scheme, token)
                    }
                    _ => doc_reference_uri(&self.options.uri_scheme, &self.options.document_id),
                };
                let url = encode_link_url(&url);
                let title = if title.is_empty() { url.as_str() } else { title };
                format!("[{title}]({url})")
            }
            TextElement::Equation { content } => format!("${}$", content.trim()),
            TextElement::LineBreak => "<br>".to_string(),
            TextElement::AutoLink { url, style } => {
                let bare = url.strip_prefix("mailto:").unwrap_or(url);
                apply_style(format!("<{bare}>"), *style)
            }
            TextElement::ImageRef { alt, url, style } => {
                apply_style(format!("![{alt}]({})", encode_link_url(url)), *style)
            }
            TextElement::PendingImage { alt, path } => format!("![{alt}]({path})"),
        }
    }
}

/// Styled run with surrounding whitespace kept outside the markers, since
/// `** x**` is not emphasis.
fn render_run(run: &TextRun) -> String {
    let content = run.content.as_str();
    let core = content.trim();
    if core.is_empty() {
        return content.to_string();
    }
    let lead = &content[..content.len() - content.trim_start().len()];
    let trail = &content[content.trim_end().len()..];

    let core = if run.style.inline_code {
        code_span(core)
    } else {
        core.to_string()
    };
    let mut styled = apply_style(core, run.style);
    if let Some(url) = &run.link {
        styled = format!("[{styled}]({})", encode_link_url(url));
    }
    format!("{lead}{styled}{trail}")
}

fn apply_style(mut inner: String, style: StyleFlags) -> String {
    if style.strikethrough {
        inner = format!("~~{inner}~~");
    }
    if style.italic {
        inner = format!("*{inner}*");
    }
    if style.bold {
        inner = format!("**{inner}**");
    }
    if style.underline {
        inner = format!("<u>{inner}</u>");
    }
    inner
}

fn code_span(code: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(code) + 1);
    if code.starts_with('`') || code.ends_with('`') {
        format!("{ticks} {code} {ticks}")
    } else {
        format!("{ticks}{code}{ticks}")
    }
}

fn render_code(text: Option<&TextBody>) -> String {
    let content = text.map(TextBody::plain_text).unwrap_or_default();
    let language = text
        .and_then(|t| t.style.language.as_deref())
        .unwrap_or_default();
    let fence = "`".repeat((longest_backtick_run(&content) + 1).max(3));
    format!("{fence}{language}\n{content}\n{fence}")
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

fn table_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, &width) in cells.iter().zip(widths) {
        line.push_str(&format!(" {cell:width$} |"));
    }
    line
}

fn table_separator(widths: &[usize], alignments: &[Option<Align>]) -> String {
    let mut line = String::from("|");
    for (i, width) in widths.iter().enumerate() {
        let dashes = "-".repeat(width.saturating_sub(2));
        let cell = match alignments.get(i).copied().flatten() {
            Some(Align::Left) => format!(" :{dashes}- |"),
            Some(Align::Right) => format!(" -{dashes}: |"),
            Some(Align::Center) => format!(" :{dashes}: |"),
            None => format!(" -{dashes}- |"),
        };
        line.push_str(&cell);
    }
    line
}

fn join_nonempty(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// ATX headings end at the line end, so soft breaks become spaces.
fn single_line(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent_lines(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indent every line but the first, for text following a list marker.
fn indent_continuation(text: &str, width: usize) -> String {
    match text.split_once('\n') {
        Some((first, rest)) => format!("{first}\n{}", indent_lines(rest, width)),
        None => text.to_string(),
    }
}
