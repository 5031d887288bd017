//! Conversion entry point bundling options, the mention resolver and its cache.

use crate::blocks::{BlockId, BlockIndex};
use crate::error::ConvertError;
use crate::formats::markdown::{
    export_markdown, import_markdown, import_markdown_bytes, ExportOutput, ImportOutput,
};
use crate::mentions::{collect_mention_ids, MentionCache, MentionResolver};
use crate::options::ConvertOptions;

/// Converts between Markdown and block forests.
///
/// One converter is meant to serve one session: resolved mention users are
/// cached on it and reused by later exports. Each call builds its own forest
/// or output; nothing else is shared between calls.
pub struct Converter {
    options: ConvertOptions,
    resolver: Option<Box<dyn MentionResolver>>,
    mentions: MentionCache,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            resolver: None,
            mentions: MentionCache::new(),
        }
    }

    /// Install the lookup used to expand user mentions on export.
    pub fn with_resolver(mut self, resolver: impl MentionResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn mention_cache(&self) -> &MentionCache {
        &self.mentions
    }

    pub fn import_markdown(&self, source: &str) -> ImportOutput {
        import_markdown(source, &self.options)
    }

    pub fn import_bytes(&self, bytes: &[u8]) -> Result<ImportOutput, ConvertError> {
        import_markdown_bytes(bytes, &self.options)
    }

    /// Render the blocks reachable from `roots`.
    ///
    /// With `expand_mentions` set, the user ids mentioned anywhere under the
    /// roots are collected first and the uncached ones resolved in a single
    /// batch before anything is rendered.
    pub fn export_markdown(&mut self, index: &BlockIndex, roots: &[BlockId]) -> ExportOutput {
        if self.options.expand_mentions {
            let wanted = collect_mention_ids(index, roots);
            self.mentions.fill(self.resolver.as_deref(), &wanted);
        }
        export_markdown(index, roots, &self.options, &self.mentions)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .field("has_resolver", &self.resolver.is_some())
            .field("cached_users", &self.mentions.len())
            .finish()
    }
}
