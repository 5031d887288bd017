//! Conversion options shared by import and export.

use serde::{Deserialize, Serialize};

/// Knobs recognised by the importer and exporter.
///
/// Deserializes from a partial table: absent keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Resolve mention-user ids to names/emails on export.
    pub expand_mentions: bool,
    /// Point exported images at downloaded files under `image_dir` instead of
    /// referencing the raw token.
    pub download_images: bool,
    /// Emit local inline images as upload-pending elements on import.
    pub upload_images: bool,
    /// Document the converted blocks belong to.
    pub document_id: String,
    /// Scheme of synthesised document-reference and media URIs.
    pub uri_scheme: String,
    /// Directory downloaded images are referenced from.
    pub image_dir: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            expand_mentions: false,
            download_images: false,
            upload_images: false,
            document_id: String::new(),
            uri_scheme: "lark".to_string(),
            image_dir: "static".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = document_id.into();
        self
    }

    pub fn with_expand_mentions(mut self, expand: bool) -> Self {
        self.expand_mentions = expand;
        self
    }

    pub fn with_upload_images(mut self, upload: bool) -> Self {
        self.upload_images = upload;
        self
    }

    pub fn with_download_images(mut self, download: bool) -> Self {
        self.download_images = download;
        self
    }
}
