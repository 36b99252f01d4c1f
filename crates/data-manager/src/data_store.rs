//! Sample storage: preloaded blocks plus a capped live tail per path

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use shared_types::{Block, PlayerState, Sample};

/// Holds everything the player has delivered so far.
///
/// Blocks are kept by reference and replaced wholesale when the player sends
/// a different block list. Streamed samples accumulate per path until the cap
/// is reached, oldest first out.
#[derive(Debug)]
pub struct SeriesStore {
    blocks: Vec<Option<Arc<Block>>>,
    streamed: HashMap<String, VecDeque<Sample>>,
    max_streamed: usize,
}

impl SeriesStore {
    pub fn new(max_streamed: usize) -> Self {
        Self {
            blocks: Vec::new(),
            streamed: HashMap::new(),
            max_streamed: max_streamed.max(1),
        }
    }

    /// Take in one player snapshot. Returns whether anything observable changed.
    pub fn ingest(&mut self, state: &PlayerState) -> bool {
        let mut changed = false;

        if !same_blocks(&self.blocks, &state.blocks) {
            self.blocks = state.blocks.clone();
            changed = true;
        }

        for (path, samples) in &state.messages {
            if samples.is_empty() {
                continue;
            }
            let buffer = self.streamed.entry(path.clone()).or_default();
            buffer.extend(samples.iter().copied());
            while buffer.len() > self.max_streamed {
                buffer.pop_front();
            }
            changed = true;
        }

        changed
    }

    /// Drop the live tail, keeping preloaded blocks. Used on seek.
    pub fn clear_streamed(&mut self) -> bool {
        let had_samples = self.streamed.values().any(|b| !b.is_empty());
        self.streamed.clear();
        had_samples
    }

    pub fn streamed_len(&self, path: &str) -> usize {
        self.streamed.get(path).map_or(0, VecDeque::len)
    }

    pub fn loaded_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    /// All samples for `path`: block history in block order, then streamed
    /// samples that are newer than the last block sample. Streamed samples
    /// sharing the boundary timestamp are kept unless the block already has
    /// the identical sample.
    pub fn samples(&self, path: &str) -> Vec<Sample> {
        let mut merged: Vec<Sample> = self
            .blocks
            .iter()
            .flatten()
            .filter_map(|block| block.samples.get(path))
            .flat_map(|samples| samples.iter().copied())
            .collect();

        let Some(streamed) = self.streamed.get(path) else {
            return merged;
        };

        let Some(block_end) = merged.last().map(|s| s.receive_time) else {
            merged.extend(streamed.iter().copied());
            return merged;
        };

        let boundary_start = merged
            .iter()
            .rposition(|s| s.receive_time < block_end)
            .map_or(0, |i| i + 1);
        let boundary: Vec<Sample> = merged[boundary_start..].to_vec();

        merged.extend(streamed.iter().copied().filter(|s| {
            s.receive_time > block_end
                || (s.receive_time == block_end && !boundary.contains(s))
        }));
        merged
    }
}

fn same_blocks(a: &[Option<Arc<Block>>], b: &[Option<Arc<Block>>]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            (None, None) => true,
            _ => false,
        })
}
