//! Markdown format implementation
//!
//! This module implements bidirectional conversion between block trees and GFM Markdown.
//!
//! # Library Choice
//!
//! Parsing uses the `comrak` crate with the table, strikethrough, autolink, tasklist and
//! dollar-math extensions. Export renders Markdown text directly: several block kinds have
//! no comrak node (callouts, placeholders for embedded objects, `<u>` underline spans) and
//! the output has to stay byte-stable for round trips.
//!
//! # Element Mapping Table
//!
//! | Block kind       | Markdown Equivalent        | Export Notes                         | Import Notes                            |
//! |------------------|----------------------------|--------------------------------------|-----------------------------------------|
//! | Page             | `# title` + children       | Title omitted when empty             | Not produced                            |
//! | Text             | Paragraph                  | Direct mapping                       | Direct mapping, raw HTML blocks too     |
//! | Heading 1-9      | `#` .. `######`            | Levels 7-9 clamp, one line           | Direct mapping                          |
//! | Bullet / Ordered | `- item` / `1. item`       | Numbered per run from `sequence`     | Per item, start kept on the first item  |
//! | Todo             | `- [ ]` / `- [x]`          | Checkbox from `done`                 | Task list items, marker stripped        |
//! | Code             | Fenced code block          | Fence outgrows backticks in content  | Info string → language                  |
//! | Equation         | `$$…$$`                    | Single line                          | Paragraph holding only display math     |
//! | Quote container  | `> line`                   | Quote leaves are lines of one block  | One quote leaf per soft line            |
//! | Callout          | `> [!NOTE]`                | Colour → admonition keyword          | Keyword → colour, unknown → grey        |
//! | Divider          | `---`                      | Direct                               | Ignored inside quotes and callouts      |
//! | Table            | GFM pipe table             | Complete rows only                   | Split every 9 body rows                 |
//! | Image            | `![alt](token)`            | `![image]()` without token           | Paragraph holding only one image        |
//! | Grid             | Columns in sequence        | Non-column children ignored          | Not produced                            |
//! | Embedded objects | `[Sheet](lark://sheet/…)`  | Typed placeholder links              | Not produced                            |
//! | Inline:          |                            |                                      |                                         |
//! |   Bold / Italic  | `**x**` / `*x*`            | Whitespace kept outside markers      | Parse both marker styles                |
//! |   Strikethrough  | `~~x~~`                    | Direct                               | Extension                               |
//! |   Underline      | `<u>x</u>`                 | Direct                               | Recognised structurally                 |
//! |   Code           | `` `x` ``                  | Fence outgrows backticks             | Direct                                  |
//! |   Link           | `[x](url)`                 | `(`/`)` escaped, rest decoded        | Doc URIs become document mentions       |
//! |   User mention   | `[@Name](mailto:…)`        | Resolved or `@[user:ID]`             | Not produced                            |
//! |   Line break     | `<br>`                     | Direct                               | `<br>` and hard breaks                  |
//!
//! # Lossy Conversions
//!
//! - Headings beyond level 6 export as level 6
//! - Soft line breaks inside headings and page titles export as spaces
//! - Grids, pages and embedded objects import back as plain paragraphs or links
//! - Image alt text is not kept for images that were never uploaded and have no children
//! - Plain text is not escaped, so literal Markdown syntax inside runs is re-parsed on import

pub mod parser;
pub mod serializer;

pub use parser::{import_markdown, import_markdown_bytes, ImportOutput, RawTable};
pub use serializer::{cell_plain_text, export_markdown, table_plain_text, ExportOutput};
