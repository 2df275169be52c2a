// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity Decoder - On-demand entity parsing
//!
//! Lazily decode IFC entities from byte offsets without materializing the
//! whole file as attribute trees.

use crate::attribute::{AttributeValue, DecodedEntity};
use crate::error::{Error, Result};
use crate::parser::{parse_entity, EntityScanner};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Pre-built entity index type (entity id -> byte range of its statement)
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// Build entity index from content with a single scan of the DATA section.
pub fn build_entity_index(content: &str) -> EntityIndex {
    // Roughly one entity per 50 bytes in exported models
    let mut index =
        FxHashMap::with_capacity_and_hasher(content.len() / 50, Default::default());

    let mut scanner = EntityScanner::new(content);
    while let Some((id, _, start, end)) = scanner.next_entity() {
        index.insert(id, (start, end));
    }

    index
}

/// Entity decoder for lazy parsing - uses Arc for cheap cache hits
pub struct EntityDecoder<'a> {
    content: &'a str,
    /// entity_id -> decoded entity
    cache: FxHashMap<u32, Arc<DecodedEntity>>,
    /// Shared so parallel decoders do not clone the map
    entity_index: Option<Arc<EntityIndex>>,
}

impl<'a> EntityDecoder<'a> {
    /// Create new decoder; the index is built on first lookup by id
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            cache: FxHashMap::default(),
            entity_index: None,
        }
    }

    /// Create decoder with shared Arc index (for parallel processing)
    pub fn with_arc_index(content: &'a str, index: Arc<EntityIndex>) -> Self {
        Self {
            content,
            cache: FxHashMap::default(),
            entity_index: Some(index),
        }
    }

    fn build_index(&mut self) {
        if self.entity_index.is_none() {
            self.entity_index = Some(Arc::new(build_entity_index(self.content)));
        }
    }

    /// Decode entity at byte offset
    pub fn decode_at(&mut self, start: usize, end: usize) -> Result<DecodedEntity> {
        let line = self
            .content
            .get(start..end)
            .ok_or_else(|| Error::parse(start, "entity range out of bounds"))?;

        let (id, type_name, tokens) = parse_entity(line).map_err(|e| {
            Error::parse(
                start,
                format!("{}, input: {:?}", e, &line[..line.len().min(100)]),
            )
        })?;

        if let Some(entity) = self.cache.get(&id) {
            return Ok(entity.as_ref().clone());
        }

        let attributes = tokens.iter().map(AttributeValue::from_token).collect();
        let entity = DecodedEntity::new(id, type_name, attributes);
        self.cache.insert(id, Arc::new(entity.clone()));
        Ok(entity)
    }

    /// Decode entity at byte offset with known ID (checks cache before parsing)
    pub fn decode_at_with_id(&mut self, id: u32, start: usize, end: usize) -> Result<DecodedEntity> {
        if let Some(entity) = self.cache.get(&id) {
            return Ok(entity.as_ref().clone());
        }
        self.decode_at(start, end)
    }

    /// Decode entity by ID - O(1) lookup using entity index
    pub fn decode_by_id(&mut self, entity_id: u32) -> Result<DecodedEntity> {
        if let Some(entity) = self.cache.get(&entity_id) {
            return Ok(entity.as_ref().clone());
        }

        self.build_index();

        let (start, end) = self
            .entity_index
            .as_ref()
            .and_then(|idx| idx.get(&entity_id).copied())
            .ok_or(Error::EntityNotFound(entity_id))?;

        self.decode_at(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entity() {
        let content = r#"
#1=IFCPROJECT('2vqT3bvqj9RBFjLlXpN8n9',$,$,$,$,$,$,$,$);
#2=IFCWALL('3a4T3bvqj9RBFjLlXpN8n0',$,'Wall-001',$,$,#3,$,'T-1');
#3=IFCLOCALPLACEMENT($,$);
"#;

        let mut decoder = EntityDecoder::new(content);

        let start = content.find("#2=").unwrap();
        let end = content[start..].find(';').unwrap() + start + 1;

        let entity = decoder.decode_at(start, end).unwrap();
        assert_eq!(entity.id, 2);
        assert_eq!(entity.type_name, "IFCWALL");
        assert_eq!(entity.attributes.len(), 8);
        assert_eq!(entity.get_string(2), Some("Wall-001"));
        assert_eq!(entity.get_ref(5), Some(3));
        assert_eq!(entity.get_string(7), Some("T-1"));
    }

    #[test]
    fn test_decode_by_id() {
        let content = r#"
#1=IFCPROJECT('guid',$,$,$,$,$,$,$,$);
#5=IFCWALL('guid2',$,'Wall-001',$,$,$,$,$);
#10=IFCDOOR('guid3',$,'Door-001',$,$,$,$,$);
"#;

        let mut decoder = EntityDecoder::new(content);

        let entity = decoder.decode_by_id(5).unwrap();
        assert_eq!(entity.id, 5);
        assert_eq!(entity.type_name, "IFCWALL");
        assert_eq!(entity.get_string(2), Some("Wall-001"));

        assert_eq!(decoder.cache.len(), 1);

        assert!(matches!(
            decoder.decode_by_id(99),
            Err(Error::EntityNotFound(99))
        ));
    }

    #[test]
    fn test_shared_index_and_cache() {
        let content = r#"
#1=IFCBUILDINGSTOREY('guid',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#2=IFCWALL('guid1',$,$,$,$,$,$,$);
#4=IFCRELCONTAINEDINSPATIALSTRUCTURE('guid3',$,$,$,(#2),#1);
"#;

        let index = Arc::new(build_entity_index(content));
        assert_eq!(index.len(), 3);

        let mut decoder = EntityDecoder::with_arc_index(content, index.clone());
        let rel = decoder.decode_by_id(4).unwrap();
        assert_eq!(rel.get_ref_list(4), vec![2]);

        let storey = decoder.decode_by_id(rel.get_ref(5).unwrap()).unwrap();
        assert_eq!(storey.get_string(2), Some("Level 1"));
        decoder.decode_by_id(1).unwrap();
        assert_eq!(decoder.cache.len(), 2);

        // a second decoder over the same index starts cold
        let other = EntityDecoder::with_arc_index(content, index);
        assert!(other.cache.is_empty());
    }
}
