//! Markdown interoperability for cloud document block trees
//!
//!     This crate converts between GFM Markdown and the block forest used by cloud document
//!     editors (pages, headings, lists, callouts, tables, embedded sheets and boards, ...).
//!
//!     TLDR:
//!         - Babel never parses Markdown itself, it relies on comrak and walks its AST
//!         - A document is a flat list of blocks linked by child ids, looked up through a BlockIndex
//!         - Import and export are total: malformed trees, bad table geometry and unknown kinds
//!           degrade locally instead of failing
//!         - Every tree walk stops at a fixed depth (common::MAX_DEPTH) and keeps what it built
//!
//!     This is a pure lib: no HTTP, no file I/O, no terminal. Uploading images, talking to the
//!     cloud API and looking up users are the host's job; the converter only reports what it
//!     needs (pending images, image tokens, mentioned user ids).
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── options.rs              # ConvertOptions
//!     ├── converter.rs            # Converter facade (options + resolver + mention cache)
//!     ├── mentions.rs             # MentionResolver, MentionCache, id collection
//!     ├── blocks
//!     │   ├── mod.rs              # Block, BlockKind and payloads
//!     │   ├── text.rs             # TextBody, TextElement, StyleFlags
//!     │   └── index.rs            # BlockIndex
//!     ├── formats
//!     │   └── markdown
//!     │       ├── parser.rs       # Markdown → blocks
//!     │       ├── serializer.rs   # blocks → Markdown
//!     │       └── mod.rs
//!     └── common
//!         ├── style.rs            # inline style composition over comrak nodes
//!         ├── table.rs            # table pagination and reassembly
//!         └── links.rs            # link encoding, internal URIs, image sources
//!
//! Testing
//!     tests
//!     └── markdown
//!         └── <area>.rs
//!
//!     Note that rust does not by default discover tests in subdirectories, so we need to include these
//!     in the mod.
//!
//! Core Algorithms
//!
//!     Inline styles are composed by carrying an immutable style context down the comrak inline
//!     tree; every emphasis-like node extends a copy for its children, so the final flags of a run
//!     do not depend on nesting order. Underline, which has no Markdown syntax, enters through
//!     `<u>`/`</u>` inline HTML siblings.
//!
//!     Tables are paginated on import: the cloud editor caps table size, so long tables are split
//!     into several sibling tables that each repeat the header. Export reassembles a row-major grid
//!     from the flat cell list and renders only complete rows.
//!
//!     User mentions are resolved in two passes on export: collect every id, resolve the uncached
//!     ones in one batch, then render from the cache.

pub mod blocks;
pub mod common;
pub mod converter;
pub mod error;
pub mod formats;
pub mod mentions;
pub mod options;

pub use blocks::{Block, BlockId, BlockIndex, BlockKind, TextBody, TextElement};
pub use converter::Converter;
pub use error::{ConvertError, ResolveError};
pub use formats::markdown::{ExportOutput, ImportOutput, RawTable};
pub use mentions::{MentionCache, MentionResolver, MentionUserInfo};
pub use options::ConvertOptions;
