//! Helpers for building block forests by hand.

use larkdoc_babel::blocks::{Block, BlockIndex, BlockKind, TextBody, TextElement, TextRun};
use larkdoc_babel::ConvertOptions;

pub fn text(id: &str, content: &str) -> Block {
    Block::new(id, BlockKind::Text(Some(TextBody::plain(content))))
}

pub fn text_with(id: &str, elements: Vec<TextElement>) -> Block {
    Block::new(id, BlockKind::Text(Some(TextBody::new(elements))))
}

pub fn run(content: &str) -> TextElement {
    TextElement::Run(TextRun::plain(content))
}

pub fn parent(id: &str, kind: BlockKind, children: &[&str]) -> Block {
    Block::new(id, kind).with_children(children.iter().map(|c| c.to_string()).collect())
}

pub fn index(blocks: Vec<Block>) -> BlockIndex {
    blocks.into_iter().collect()
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

/// Export with default options and an empty mention cache.
pub fn export(index: &BlockIndex, roots: &[&str]) -> String {
    export_with(index, roots, &ConvertOptions::default())
}

pub fn export_with(index: &BlockIndex, roots: &[&str], options: &ConvertOptions) -> String {
    larkdoc_babel::formats::markdown::export_markdown(
        index,
        &ids(roots),
        options,
        &larkdoc_babel::MentionCache::new(),
    )
    .markdown
}

/// Markdown → blocks → Markdown with default options.
pub fn round_trip(md: &str) -> String {
    let options = ConvertOptions::default();
    let imported = larkdoc_babel::formats::markdown::import_markdown(md, &options);
    larkdoc_babel::formats::markdown::export_markdown(
        &imported.index,
        &imported.roots,
        &options,
        &larkdoc_babel::MentionCache::new(),
    )
    .markdown
}
