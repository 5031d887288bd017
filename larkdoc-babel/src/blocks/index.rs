//! Id-addressed arena over a block forest.

use super::{Block, BlockId};
use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arena of blocks with an id → position lookup.
///
/// Built once per conversion and read-only while a traversal runs. A lookup
/// miss is an ordinary `None`, never a panic: dangling child ids are part of
/// the data model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Block>", into = "Vec<Block>")]
pub struct BlockIndex {
    blocks: Vec<Block>,
    positions: HashMap<BlockId, usize>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block. A later block with an id already present replaces the
    /// earlier one in place.
    pub fn insert(&mut self, block: Block) {
        match self.positions.get(&block.id) {
            Some(&pos) => self.blocks[pos] = block,
            None => {
                self.positions.insert(block.id.clone(), self.blocks.len());
                self.blocks.push(block);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.positions.get(id).map(|&pos| &self.blocks[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Blocks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Resolve child ids of `block`, silently skipping the ones that are missing.
    pub fn children_of<'a>(&'a self, block: &'a Block) -> impl Iterator<Item = &'a Block> + 'a {
        block.children.iter().filter_map(move |id| {
            let child = self.get(id);
            if child.is_none() {
                tracing::trace!(parent = %block.id, child = %id, "skipping missing child block");
            }
            child
        })
    }

    pub fn to_json(&self) -> Result<String, ConvertError> {
        Ok(serde_json::to_string_pretty(&self.blocks)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        let blocks: Vec<Block> = serde_json::from_str(json)?;
        Ok(Self::from(blocks))
    }
}

impl From<Vec<Block>> for BlockIndex {
    fn from(blocks: Vec<Block>) -> Self {
        let mut index = BlockIndex::new();
        for block in blocks {
            index.insert(block);
        }
        index
    }
}

impl From<BlockIndex> for Vec<Block> {
    fn from(index: BlockIndex) -> Self {
        index.blocks
    }
}

impl FromIterator<Block> for BlockIndex {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        let mut index = BlockIndex::new();
        for block in iter {
            index.insert(block);
        }
        index
    }
}
