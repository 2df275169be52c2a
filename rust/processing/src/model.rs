// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loaded IFC model: file content plus a shared entity index.

use ifc_report_core::{build_entity_index, EntityIndex, SchemaVersion};
use std::path::Path;
use std::sync::Arc;

/// In-memory IFC model ready for element extraction.
#[derive(Debug, Clone)]
pub struct IfcModel {
    content: Arc<str>,
    index: Arc<EntityIndex>,
    schema: SchemaVersion,
}

impl IfcModel {
    /// Read a model from disk.
    ///
    /// Returns `None` when the file cannot be read or is not STEP content;
    /// the failure is logged, not raised.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read model file");
                return None;
            }
        };

        let model = Self::from_bytes(&bytes);
        if model.is_none() {
            tracing::warn!(path = %path.display(), size = bytes.len(), "File is not an IFC/STEP model");
        }
        model
    }

    /// Build a model from raw bytes. Invalid UTF-8 is replaced, not rejected.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let content = String::from_utf8_lossy(bytes);
        Self::from_content(&content)
    }

    /// Build a model from text.
    ///
    /// The text must carry the `ISO-10303-21` header or at least one entity instance.
    pub fn from_content(content: &str) -> Option<Self> {
        let start = std::time::Instant::now();
        let index = build_entity_index(content);
        let has_header = content.trim_start().starts_with("ISO-10303-21");

        if index.is_empty() && !has_header {
            return None;
        }

        let schema = SchemaVersion::detect(content);
        tracing::debug!(
            entities = index.len(),
            schema = %schema,
            index_time_ms = start.elapsed().as_millis(),
            "Indexed model"
        );

        Some(Self {
            content: Arc::from(content),
            index: Arc::new(index),
            schema,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn index(&self) -> &Arc<EntityIndex> {
        &self.index
    }

    pub fn schema(&self) -> &SchemaVersion {
        &self.schema
    }

    pub fn entity_count(&self) -> usize {
        self.index.len()
    }
}
