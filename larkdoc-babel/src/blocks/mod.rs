//! Block tree data model.
//!
//! A document is a flat forest of [`Block`]s addressed by id. Parents list their
//! children by id, so the tree is reconstructed through a [`BlockIndex`] rather
//! than in-memory pointers. Every kind carries its payload inside the
//! [`BlockKind`] variant; a `None` payload is a legal state and renders as the
//! kind's empty default.

pub mod index;
pub mod text;

pub use index::BlockIndex;
pub use text::{
    Align, BlockStyle, DocTarget, StyleFlags, TextBody, TextElement, TextRun,
};

use serde::{Deserialize, Serialize};

/// Identifier of a block inside one document.
pub type BlockId = String;

/// Deepest heading level the block model can express.
pub const MAX_HEADING_LEVEL: u8 = 9;

/// One node of the block forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockId>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<BlockId>) -> Self {
        self.children = children;
        self
    }
}

/// Background colour tag of a callout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalloutColor {
    LightRed,
    LightOrange,
    LightYellow,
    LightGreen,
    LightBlue,
    LightPurple,
    LightGray,
}

impl CalloutColor {
    pub fn code(self) -> u8 {
        match self {
            CalloutColor::LightRed => 1,
            CalloutColor::LightOrange => 2,
            CalloutColor::LightYellow => 3,
            CalloutColor::LightGreen => 4,
            CalloutColor::LightBlue => 5,
            CalloutColor::LightPurple => 6,
            CalloutColor::LightGray => 7,
        }
    }

    /// Colour for a GitHub-style admonition keyword (`[!NOTE]`, `[!TIP]`, ...).
    /// Keywords are case-insensitive; unknown ones fall back to grey.
    pub fn from_admonition(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "NOTE" => CalloutColor::LightBlue,
            "TIP" => CalloutColor::LightGreen,
            "IMPORTANT" => CalloutColor::LightPurple,
            "WARNING" => CalloutColor::LightYellow,
            "CAUTION" => CalloutColor::LightRed,
            _ => CalloutColor::LightGray,
        }
    }

    /// Admonition keyword used when exporting a callout of this colour.
    pub fn admonition(self) -> &'static str {
        match self {
            CalloutColor::LightBlue | CalloutColor::LightGray => "NOTE",
            CalloutColor::LightGreen => "TIP",
            CalloutColor::LightPurple => "IMPORTANT",
            CalloutColor::LightYellow | CalloutColor::LightOrange => "WARNING",
            CalloutColor::LightRed => "CAUTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callout {
    pub background: CalloutColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramType {
    Flowchart,
    Uml,
}

impl DiagramType {
    pub fn label(self) -> &'static str {
        match self {
            DiagramType::Flowchart => "Flowchart",
            DiagramType::Uml => "UML",
        }
    }
}

/// Source of an image that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ImageSource {
    /// `http`/`https` URL.
    Remote(String),
    /// Local or relative filesystem path.
    Local(String),
    /// Internal media URI carrying an already uploaded token.
    Media(String),
}

/// Image payload. Alt text lives in the block's text-bearing children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ImageSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub token: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsvPayload {
    pub component_type_id: String,
    pub component_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReferencePayload {
    pub source_block_id: String,
    pub source_document_id: String,
}

/// Geometry of a table block.
///
/// `cells` is row-major; the declared counts may disagree with `cells.len()`
/// on malformed input and consumers must cope with that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProperty {
    #[serde(default)]
    pub cells: Vec<BlockId>,
    pub row_size: usize,
    pub column_size: usize,
    #[serde(default)]
    pub header_row: bool,
}

/// Kind and payload of a block.
///
/// Numeric codes (see [`BlockKind::code`]) follow the cloud editor's block
/// type numbering. Unrecognised codes are kept as [`BlockKind::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum BlockKind {
    Page(Option<TextBody>),
    Text(Option<TextBody>),
    Heading { level: u8, text: Option<TextBody> },
    Bullet(Option<TextBody>),
    Ordered(Option<TextBody>),
    Code(Option<TextBody>),
    Quote(Option<TextBody>),
    Equation(Option<TextBody>),
    Todo(Option<TextBody>),
    Bitable(Option<String>),
    Callout(Option<Callout>),
    ChatCard(Option<String>),
    Diagram(Option<DiagramType>),
    Divider,
    File(Option<FilePayload>),
    Grid { column_size: Option<u32> },
    GridColumn { width_ratio: Option<u32> },
    Iframe(Option<String>),
    Image(Option<ImagePayload>),
    Isv(Option<IsvPayload>),
    MindNote(Option<String>),
    Sheet(Option<String>),
    Table(Option<TableProperty>),
    TableCell,
    View,
    QuoteContainer,
    Task(Option<String>),
    Okr,
    OkrObjective,
    OkrKeyResult,
    OkrProgress,
    AddOns(Option<String>),
    JiraIssue(Option<String>),
    WikiCatalog,
    Board(Option<String>),
    Agenda,
    AgendaItem,
    AgendaItemTitle,
    AgendaItemContent,
    LinkPreview(Option<String>),
    SyncSource,
    SyncReference(Option<SyncReferencePayload>),
    WikiCatalogV2,
    AiTemplate,
    Unknown(u16),
}

impl BlockKind {
    /// Heading with its level clamped into `1..=9`.
    pub fn heading(level: u8, text: TextBody) -> Self {
        BlockKind::Heading {
            level: level.clamp(1, MAX_HEADING_LEVEL),
            text: Some(text),
        }
    }

    /// Numeric block type code.
    pub fn code(&self) -> u16 {
        match self {
            BlockKind::Page(_) => 1,
            BlockKind::Text(_) => 2,
            BlockKind::Heading { level, .. } => {
                2 + u16::from((*level).clamp(1, MAX_HEADING_LEVEL))
            }
            BlockKind::Bullet(_) => 12,
            BlockKind::Ordered(_) => 13,
            BlockKind::Code(_) => 14,
            BlockKind::Quote(_) => 15,
            BlockKind::Equation(_) => 16,
            BlockKind::Todo(_) => 17,
            BlockKind::Bitable(_) => 18,
            BlockKind::Callout(_) => 19,
            BlockKind::ChatCard(_) => 20,
            BlockKind::Diagram(_) => 21,
            BlockKind::Divider => 22,
            BlockKind::File(_) => 23,
            BlockKind::Grid { .. } => 24,
            BlockKind::GridColumn { .. } => 25,
            BlockKind::Iframe(_) => 26,
            BlockKind::Image(_) => 27,
            BlockKind::Isv(_) => 28,
            BlockKind::MindNote(_) => 29,
            BlockKind::Sheet(_) => 30,
            BlockKind::Table(_) => 31,
            BlockKind::TableCell => 32,
            BlockKind::View => 33,
            BlockKind::QuoteContainer => 34,
            BlockKind::Task(_) => 35,
            BlockKind::Okr => 36,
            BlockKind::OkrObjective => 37,
            BlockKind::OkrKeyResult => 38,
            BlockKind::OkrProgress => 39,
            BlockKind::AddOns(_) => 40,
            BlockKind::JiraIssue(_) => 41,
            BlockKind::WikiCatalog => 42,
            BlockKind::Board(_) => 43,
            BlockKind::Agenda => 44,
            BlockKind::AgendaItem => 45,
            BlockKind::AgendaItemTitle => 46,
            BlockKind::AgendaItemContent => 47,
            BlockKind::LinkPreview(_) => 48,
            BlockKind::SyncSource => 49,
            BlockKind::SyncReference(_) => 50,
            BlockKind::WikiCatalogV2 => 51,
            BlockKind::AiTemplate => 52,
            BlockKind::Unknown(code) => *code,
        }
    }

    /// Empty-payload kind for a numeric code.
    ///
    /// Hosts decoding the cloud API use this to pick the variant before filling
    /// in the payload; unknown codes never fail.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => BlockKind::Page(None),
            2 => BlockKind::Text(None),
            3..=11 => BlockKind::Heading {
                level: (code - 2) as u8,
                text: None,
            },
            12 => BlockKind::Bullet(None),
            13 => BlockKind::Ordered(None),
            14 => BlockKind::Code(None),
            15 => BlockKind::Quote(None),
            16 => BlockKind::Equation(None),
            17 => BlockKind::Todo(None),
            18 => BlockKind::Bitable(None),
            19 => BlockKind::Callout(None),
            20 => BlockKind::ChatCard(None),
            21 => BlockKind::Diagram(None),
            22 => BlockKind::Divider,
            23 => BlockKind::File(None),
            24 => BlockKind::Grid { column_size: None },
            25 => BlockKind::GridColumn { width_ratio: None },
            26 => BlockKind::Iframe(None),
            27 => BlockKind::Image(None),
            28 => BlockKind::Isv(None),
            29 => BlockKind::MindNote(None),
            30 => BlockKind::Sheet(None),
            31 => BlockKind::Table(None),
            32 => BlockKind::TableCell,
            33 => BlockKind::View,
            34 => BlockKind::QuoteContainer,
            35 => BlockKind::Task(None),
            36 => BlockKind::Okr,
            37 => BlockKind::OkrObjective,
            38 => BlockKind::OkrKeyResult,
            39 => BlockKind::OkrProgress,
            40 => BlockKind::AddOns(None),
            41 => BlockKind::JiraIssue(None),
            42 => BlockKind::WikiCatalog,
            43 => BlockKind::Board(None),
            44 => BlockKind::Agenda,
            45 => BlockKind::AgendaItem,
            46 => BlockKind::AgendaItemTitle,
            47 => BlockKind::AgendaItemContent,
            48 => BlockKind::LinkPreview(None),
            49 => BlockKind::SyncSource,
            50 => BlockKind::SyncReference(None),
            51 => BlockKind::WikiCatalogV2,
            52 => BlockKind::AiTemplate,
            other => BlockKind::Unknown(other),
        }
    }

    /// Styled text of a text-bearing kind, `None` for every other kind or an
    /// absent payload.
    pub fn text(&self) -> Option<&TextBody> {
        match self {
            BlockKind::Page(text)
            | BlockKind::Text(text)
            | BlockKind::Heading { text, .. }
            | BlockKind::Bullet(text)
            | BlockKind::Ordered(text)
            | BlockKind::Code(text)
            | BlockKind::Quote(text)
            | BlockKind::Equation(text)
            | BlockKind::Todo(text) => text.as_ref(),
            _ => None,
        }
    }

    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            BlockKind::Bullet(_) | BlockKind::Ordered(_) | BlockKind::Todo(_)
        )
    }
}
