//! Inline style composition over the comrak inline AST.
//!
//! The composer walks inline nodes carrying an immutable [`StyleContext`].
//! Every emphasis-like node hands its children an extended copy of the context,
//! so a leaf run ends up with the union of all enclosing styles no matter in
//! which order they were nested.
//!
//! Underline has no Markdown syntax. It is recognised structurally: an
//! `HtmlInline("<u>")` sibling, the nodes after it, and the matching
//! `HtmlInline("</u>")` sibling form a span whose descendants are underlined.

use super::links::{classify_image_source, parse_internal_uri};
use super::MAX_DEPTH;
use crate::blocks::{DocTarget, ImageSource, StyleFlags, TextElement, TextRun};
use crate::options::ConvertOptions;
use comrak::nodes::{AstNode, NodeValue};

/// Style inherited from enclosing inline nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleContext {
    pub flags: StyleFlags,
    pub link: Option<String>,
}

impl StyleContext {
    pub fn bold(&self) -> Self {
        Self {
            flags: self.flags.with_bold(),
            link: self.link.clone(),
        }
    }

    pub fn italic(&self) -> Self {
        Self {
            flags: self.flags.with_italic(),
            link: self.link.clone(),
        }
    }

    pub fn strikethrough(&self) -> Self {
        Self {
            flags: self.flags.with_strikethrough(),
            link: self.link.clone(),
        }
    }

    pub fn underline(&self) -> Self {
        Self {
            flags: self.flags.with_underline(),
            link: self.link.clone(),
        }
    }

    pub fn inline_code(&self) -> Self {
        Self {
            flags: self.flags.with_inline_code(),
            link: self.link.clone(),
        }
    }

    /// The innermost link wins; an enclosing link never overrides it.
    pub fn linked(&self, url: &str) -> Self {
        Self {
            flags: self.flags,
            link: Some(url.to_string()),
        }
    }
}

/// Accumulates [`TextElement`]s for one text-bearing block.
pub struct InlineComposer<'o> {
    options: &'o ConvertOptions,
    elements: Vec<TextElement>,
}

impl<'o> InlineComposer<'o> {
    pub fn new(options: &'o ConvertOptions) -> Self {
        Self {
            options,
            elements: Vec::new(),
        }
    }

    /// Compose a whole sibling list with an empty context.
    pub fn compose<'a>(options: &'o ConvertOptions, nodes: &[&'a AstNode<'a>]) -> Vec<TextElement> {
        let mut composer = Self::new(options);
        composer.push_nodes(nodes, &StyleContext::default());
        composer.finish()
    }

    /// Append literal text, merging with the previous run when it has the
    /// same style and link.
    pub fn push_text(&mut self, text: &str, ctx: &StyleContext) {
        if text.is_empty() {
            return;
        }
        if let Some(TextElement::Run(last)) = self.elements.last_mut() {
            if last.style == ctx.flags && last.link == ctx.link {
                last.content.push_str(text);
                return;
            }
        }
        self.elements.push(TextElement::Run(TextRun {
            content: text.to_string(),
            style: ctx.flags,
            link: ctx.link.clone(),
        }));
    }

    pub fn push_nodes<'a>(&mut self, nodes: &[&'a AstNode<'a>], ctx: &StyleContext) {
        self.walk_siblings(nodes, ctx, 0);
    }

    pub fn finish(self) -> Vec<TextElement> {
        self.elements
    }

    fn walk_siblings<'a>(&mut self, nodes: &[&'a AstNode<'a>], ctx: &StyleContext, depth: usize) {
        let mut i = 0;
        while i < nodes.len() {
            let node = nodes[i];
            if is_underline_open(node) {
                match find_underline_close(nodes, i) {
                    Some(close) => {
                        self.walk_siblings(&nodes[i + 1..close], &ctx.underline(), depth + 1);
                        i = close + 1;
                    }
                    // An unmatched tag is dropped, the rest keeps its style.
                    None => i += 1,
                }
                continue;
            }
            self.walk_node(node, ctx, depth);
            i += 1;
        }
    }

    fn walk_node<'a>(&mut self, node: &'a AstNode<'a>, ctx: &StyleContext, depth: usize) {
        if depth >= MAX_DEPTH {
            tracing::warn!(depth, "inline nesting too deep, truncating");
            return;
        }
        let children: Vec<&'a AstNode<'a>> = node.children().collect();

        match &node.data.borrow().value {
            NodeValue::Text(text) => self.push_text(text, ctx),
            NodeValue::Code(code) => self.push_text(&code.literal, &ctx.inline_code()),
            NodeValue::Emph => self.walk_siblings(&children, &ctx.italic(), depth + 1),
            NodeValue::Strong => self.walk_siblings(&children, &ctx.bold(), depth + 1),
            NodeValue::Strikethrough => {
                self.walk_siblings(&children, &ctx.strikethrough(), depth + 1)
            }
            NodeValue::Link(link) => {
                let text = plain_text(&children);
                if let Some(token) = parse_internal_uri(&link.url, &self.options.uri_scheme, "doc")
                {
                    self.elements.push(TextElement::MentionDoc {
                        title: text,
                        target: DocTarget::Token(token.to_string()),
                    });
                } else if is_autolink(&link.url, &text) {
                    self.elements.push(TextElement::AutoLink {
                        url: link.url.clone(),
                        style: ctx.flags,
                    });
                } else {
                    self.walk_siblings(&children, &ctx.linked(&link.url), depth + 1);
                }
            }
            NodeValue::Image(link) => {
                let alt = plain_text(&children);
                self.push_image(alt, &link.url, ctx);
            }
            NodeValue::Math(math) => self.elements.push(TextElement::Equation {
                content: math.literal.clone(),
            }),
            NodeValue::SoftBreak => self.push_text("\n", ctx),
            NodeValue::LineBreak => self.elements.push(TextElement::LineBreak),
            NodeValue::HtmlInline(html) => {
                if is_line_break_tag(html) {
                    self.elements.push(TextElement::LineBreak);
                } else if !is_underline_tag(html) {
                    self.push_text(html, ctx);
                }
            }
            _ => self.walk_siblings(&children, ctx, depth + 1),
        }
    }

    fn push_image(&mut self, alt: String, url: &str, ctx: &StyleContext) {
        match classify_image_source(url, &self.options.uri_scheme) {
            ImageSource::Remote(_) | ImageSource::Media(_) => {
                self.elements.push(TextElement::ImageRef {
                    alt,
                    url: url.to_string(),
                    style: ctx.flags,
                });
            }
            ImageSource::Local(path) if self.options.upload_images => {
                self.elements.push(TextElement::PendingImage { alt, path });
            }
            ImageSource::Local(_) => self.push_text(&format!("![{alt}]({url})"), ctx),
        }
    }
}

/// Plain text of inline nodes, for alt texts, link titles and raw cell text.
/// Nesting below [`MAX_DEPTH`] is dropped.
pub fn plain_text<'a>(nodes: &[&'a AstNode<'a>]) -> String {
    let mut out = String::new();
    for node in nodes {
        collect_plain_text(node, 0, &mut out);
    }
    out
}

fn collect_plain_text<'a>(node: &'a AstNode<'a>, depth: usize, out: &mut String) {
    if depth >= MAX_DEPTH {
        return;
    }
    match &node.data.borrow().value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        NodeValue::Math(math) => out.push_str(&math.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
        _ => {
            for child in node.children() {
                collect_plain_text(child, depth + 1, out);
            }
        }
    }
}

/// Split a sibling list at its top-level soft and hard line breaks.
pub fn split_lines<'a>(nodes: &[&'a AstNode<'a>]) -> Vec<Vec<&'a AstNode<'a>>> {
    let mut lines = vec![Vec::new()];
    for &node in nodes {
        let is_break = matches!(
            node.data.borrow().value,
            NodeValue::SoftBreak | NodeValue::LineBreak
        );
        if is_break {
            lines.push(Vec::new());
        } else if let Some(line) = lines.last_mut() {
            line.push(node);
        }
    }
    lines
}

fn is_autolink(url: &str, text: &str) -> bool {
    url == text || url.strip_prefix("mailto:") == Some(text)
}

fn html_tag(node: &AstNode<'_>) -> Option<String> {
    match &node.data.borrow().value {
        NodeValue::HtmlInline(html) => Some(html.trim().to_ascii_lowercase()),
        _ => None,
    }
}

fn is_underline_open(node: &AstNode<'_>) -> bool {
    html_tag(node).as_deref() == Some("<u>")
}

fn is_underline_close(node: &AstNode<'_>) -> bool {
    html_tag(node).as_deref() == Some("</u>")
}

fn is_underline_tag(html: &str) -> bool {
    matches!(html.trim().to_ascii_lowercase().as_str(), "<u>" | "</u>")
}

fn is_line_break_tag(html: &str) -> bool {
    matches!(
        html.trim().to_ascii_lowercase().as_str(),
        "<br>" | "<br/>" | "<br />"
    )
}

/// Index of the `</u>` closing the `<u>` at `open`, honouring nested spans.
fn find_underline_close<'a>(nodes: &[&'a AstNode<'a>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, node) in nodes.iter().enumerate().skip(open + 1) {
        if is_underline_open(node) {
            depth += 1;
        } else if is_underline_close(node) {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}
