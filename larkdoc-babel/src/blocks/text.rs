//! Styled text carried by text-bearing blocks.

use serde::{Deserialize, Serialize};

/// Inline style flags attached to a text run.
///
/// Flags are independent and only ever added while descending nested inline
/// markup, so the final set is the union of every enclosing context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleFlags {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub inline_code: bool,
}

impl StyleFlags {
    pub fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn with_italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }

    pub fn with_strikethrough(self) -> Self {
        Self {
            strikethrough: true,
            ..self
        }
    }

    pub fn with_underline(self) -> Self {
        Self {
            underline: true,
            ..self
        }
    }

    pub fn with_inline_code(self) -> Self {
        Self {
            inline_code: true,
            ..self
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == StyleFlags::default()
    }
}

/// A run of text sharing one style and (optionally) one link target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,
    #[serde(default)]
    pub style: StyleFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: StyleFlags::default(),
            link: None,
        }
    }
}

/// Where a document mention points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocTarget {
    Url(String),
    Token(String),
}

/// One element of a [`TextBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextElement {
    Run(TextRun),
    MentionUser {
        user_id: String,
    },
    MentionDoc {
        title: String,
        target: DocTarget,
    },
    Equation {
        content: String,
    },
    LineBreak,
    /// A bare URL (`<https://..>` or an extension autolink).
    AutoLink {
        url: String,
        #[serde(default)]
        style: StyleFlags,
    },
    /// An inline image that already has a resolvable URL.
    ImageRef {
        alt: String,
        url: String,
        #[serde(default)]
        style: StyleFlags,
    },
    /// An inline image on the local filesystem, waiting for an upload step.
    PendingImage {
        alt: String,
        path: String,
    },
}

impl TextElement {
    /// Plain text of the element, ignoring styles and link targets.
    pub fn plain_text(&self) -> String {
        match self {
            TextElement::Run(run) => run.content.clone(),
            TextElement::MentionUser { user_id } => format!("@{user_id}"),
            TextElement::MentionDoc { title, .. } => title.clone(),
            TextElement::Equation { content } => content.clone(),
            TextElement::LineBreak => "\n".to_string(),
            TextElement::AutoLink { url, .. } => url.clone(),
            TextElement::ImageRef { alt, .. } | TextElement::PendingImage { alt, .. } => {
                alt.clone()
            }
        }
    }
}

/// Horizontal alignment of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Block-level text style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStyle {
    /// Fenced code language tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Checkbox state of a todo item.
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    /// Number an ordered item starts counting from. Items without one
    /// continue from the previous sibling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<usize>,
}

/// Ordered styled text of a text-bearing block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub elements: Vec<TextElement>,
    #[serde(default)]
    pub style: BlockStyle,
}

impl TextBody {
    pub fn new(elements: Vec<TextElement>) -> Self {
        Self {
            elements,
            style: BlockStyle::default(),
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(vec![TextElement::Run(TextRun::plain(content))])
    }

    pub fn with_style(mut self, style: BlockStyle) -> Self {
        self.style = style;
        self
    }

    pub fn plain_text(&self) -> String {
        self.elements.iter().map(TextElement::plain_text).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(|e| match e {
            TextElement::Run(run) => run.content.is_empty(),
            _ => false,
        })
    }
}
