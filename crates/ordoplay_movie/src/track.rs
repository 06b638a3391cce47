// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions.
//!
//! Tracks are owned by a [`crate::Clip`], which links them into a hierarchy
//! by id. A track only knows its parent's id and its children's ids.

use crate::block::{Block, BlockData, BlockId};
use crate::error::{MovieError, Result};
use crate::keyframe::KeyframeCurve;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named, typed channel of time-varying data
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    /// Display name, also used as the member name when auto-resolving
    pub name: String,
    value_type: ValueType,
    pub(crate) parent: Option<TrackId>,
    pub(crate) children: Vec<TrackId>,
    blocks: Vec<Block>,
    next_block_id: u32,
    keyframes: Option<KeyframeCurve>,
}

impl Track {
    pub(crate) fn new(
        id: TrackId,
        name: impl Into<String>,
        value_type: ValueType,
        parent: Option<TrackId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            value_type,
            parent,
            children: Vec::new(),
            blocks: Vec::new(),
            next_block_id: 0,
            keyframes: None,
        }
    }

    /// Unique track ID
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Declared type of values on this track
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Parent track, if nested
    pub fn parent(&self) -> Option<TrackId> {
        self.parent
    }

    /// Child tracks, ordered by id
    pub fn children(&self) -> &[TrackId] {
        &self.children
    }

    /// Blocks, ordered by start time
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Get block count
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Keyframes this track was last compiled from
    pub fn keyframes(&self) -> Option<&KeyframeCurve> {
        self.keyframes.as_ref()
    }

    pub(crate) fn set_keyframes(&mut self, curve: KeyframeCurve) {
        self.keyframes = Some(curve);
    }

    /// Add a block.
    ///
    /// Open-ended blocks claim everything after their start, so they can only
    /// come last.
    pub fn add_block(
        &mut self,
        start_time: f32,
        duration: Option<f32>,
        data: BlockData,
    ) -> Result<BlockId> {
        let id = BlockId(self.next_block_id);
        self.insert_block(Block {
            id,
            start_time,
            duration,
            data,
        })?;
        Ok(id)
    }

    /// Insert a block keeping its id, e.g. when loading a saved clip
    pub(crate) fn insert_block(&mut self, block: Block) -> Result<()> {
        let valid_duration = block.duration.map_or(true, |d| d.is_finite() && d >= 0.0);
        if !block.start_time.is_finite() || block.start_time < 0.0 || !valid_duration {
            return Err(MovieError::InvalidBlockTime {
                start: block.start_time,
                duration: block.duration,
            });
        }

        if !block.data.is_of_type(&self.value_type) {
            return Err(self.type_mismatch(&block.data));
        }

        let start = block.start_time;
        let end = block.end_or_infinity();
        let overlaps = self.blocks.iter().any(|other| {
            other.start_time == start || (other.start_time < end && start < other.end_or_infinity())
        });
        if overlaps || self.block(block.id).is_some() {
            return Err(MovieError::BlockOverlap { start });
        }

        let next_id = block
            .id
            .0
            .checked_add(1)
            .ok_or(MovieError::InvalidBlockId(block.id))?;
        self.next_block_id = self.next_block_id.max(next_id);
        let idx = self.blocks.partition_point(|b| b.start_time < start);
        self.blocks.insert(idx, block);
        Ok(())
    }

    /// Replace every block at once. On error the track keeps its old blocks.
    pub(crate) fn replace_blocks(
        &mut self,
        blocks: impl IntoIterator<Item = (f32, Option<f32>, BlockData)>,
    ) -> Result<()> {
        let old_blocks = std::mem::take(&mut self.blocks);
        let old_next_id = self.next_block_id;

        for (start_time, duration, data) in blocks {
            if let Err(err) = self.add_block(start_time, duration, data) {
                self.blocks = old_blocks;
                self.next_block_id = old_next_id;
                return Err(err);
            }
        }

        Ok(())
    }

    /// Remove a block by ID
    pub fn remove_block(&mut self, block_id: BlockId) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| b.id == block_id)?;
        Some(self.blocks.remove(idx))
    }

    /// Remove every block
    pub fn remove_blocks(&mut self) {
        self.blocks.clear();
    }

    /// Get block by ID
    pub fn block(&self, block_id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    /// Get mutable block by ID.
    ///
    /// Timing is fixed once a block is added; only its data can change, and
    /// only to data of the track's type.
    pub fn block_mut(&mut self, block_id: BlockId) -> Option<BlockMut<'_>> {
        let value_type = &self.value_type;
        let block = self.blocks.iter_mut().find(|b| b.id == block_id)?;
        Some(BlockMut { value_type, block })
    }

    /// Replace the data of an existing block, keeping its timing
    pub fn set_block_data(&mut self, block_id: BlockId, data: BlockData) -> Result<BlockData> {
        let mut block = self
            .block_mut(block_id)
            .ok_or(MovieError::BlockNotFound(block_id))?;
        block.replace_data(data)
    }

    /// Get the block covering `time`.
    ///
    /// Ranges are half-open, except the last block, which also covers its end
    /// time so a clip stopped at its end still shows the final value.
    pub fn block_at(&self, time: f32) -> Option<&Block> {
        let idx = self.blocks.partition_point(|b| b.start_time <= time);
        let block = self.blocks.get(idx.checked_sub(1)?)?;

        if block.contains(time) {
            return Some(block);
        }

        let is_last = idx == self.blocks.len();
        (is_last && block.end_time() == Some(time)).then_some(block)
    }

    /// Evaluate the value at `time`, if a value block covers it
    pub fn value_at(&self, time: f32) -> Option<Value> {
        self.block_at(time)?.value_at(time)
    }

    /// Latest bounded end time over all blocks
    pub fn duration(&self) -> f32 {
        self.blocks
            .iter()
            .map(|b| b.start_time + b.duration.unwrap_or(0.0))
            .fold(0.0, f32::max)
    }

    fn type_mismatch(&self, data: &BlockData) -> MovieError {
        type_mismatch(&self.value_type, data)
    }
}

fn type_mismatch(expected: &ValueType, data: &BlockData) -> MovieError {
    MovieError::TypeMismatch {
        expected: expected.clone(),
        actual: data.stored_type().unwrap_or_else(|| expected.clone()),
    }
}

/// Mutable access to a block's data
pub struct BlockMut<'a> {
    value_type: &'a ValueType,
    block: &'a mut Block,
}

impl BlockMut<'_> {
    /// The block being edited
    pub fn block(&self) -> &Block {
        self.block
    }

    /// Swap in new data of the track's type, returning the old data
    pub fn replace_data(&mut self, data: BlockData) -> Result<BlockData> {
        if !data.is_of_type(self.value_type) {
            return Err(type_mismatch(self.value_type, &data));
        }
        Ok(std::mem::replace(&mut self.block.data, data))
    }
}
