//! Segment bounds derived from a memory configuration.
//!
//! The memory model addresses four tables: text, data (`.data` plus heap), stack and MMIO.
//! This module computes, for one configuration:
//! 1. **Bounds:** A half-open `[base, end)` byte interval per segment, clamped to what the
//!    segment's block table can hold.
//! 2. **Table Lengths:** The number of blocks each table needs.
//! 3. **Classification:** Which segment owns an address and at which word slot.
//!
//! The stack table is indexed downwards from the highest stack word, so word slot 0 is the
//! word at the stack base.

use crate::common::constants::{BLOCK_LENGTH_BYTES, BLOCK_TABLE_LENGTH, MMIO_TABLE_LENGTH};

use super::configuration::MemoryConfiguration;

/// Half-open byte interval `[base, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    base: u32,
    end: u64,
}

impl Bounds {
    /// First address inside the segment.
    pub const fn base(self) -> u32 {
        self.base
    }

    /// First address past the segment (may be `2^32`).
    pub const fn end(self) -> u64 {
        self.end
    }

    /// Last address inside the segment.
    pub const fn limit(self) -> u32 {
        (self.end - 1) as u32
    }

    /// Returns `true` if `address` lies inside the segment.
    pub const fn contains(self, address: u32) -> bool {
        self.base <= address && (address as u64) < self.end
    }
}

/// Segment owning an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// `.data` and heap.
    Data,
    /// Stack.
    Stack,
    /// Memory-mapped I/O.
    Mmio,
    /// Instructions.
    Text,
}

/// Segment bounds and table lengths for one configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentLayout {
    /// Text segment.
    pub text: Bounds,
    /// Data segment (`.data` and heap).
    pub data: Bounds,
    /// Stack segment.
    pub stack: Bounds,
    /// Memory-mapped I/O segment.
    pub mmio: Bounds,
    stack_top: u32,
    dimensions: [usize; 4],
}

fn capacity_bytes(blocks: usize) -> u64 {
    blocks as u64 * u64::from(BLOCK_LENGTH_BYTES)
}

fn blocks_for(span: u64) -> usize {
    span.div_ceil(u64::from(BLOCK_LENGTH_BYTES)) as usize
}

/// Bounds of a segment growing upwards from `base` to the word holding `limit`.
fn upward(base: u32, limit: u32, max_blocks: usize) -> (Bounds, usize) {
    let span = ((u64::from(limit) | 3) + 1)
        .saturating_sub(u64::from(base))
        .min(capacity_bytes(max_blocks));
    let bounds = Bounds {
        base,
        end: u64::from(base) + span,
    };
    (bounds, blocks_for(span))
}

/// Bounds of a segment growing downwards from the word at `top` to `low`.
fn downward(top: u32, low: u32, max_blocks: usize) -> (Bounds, usize) {
    let end = u64::from(top) + 4;
    let span = end
        .saturating_sub(u64::from(low))
        .min(capacity_bytes(max_blocks));
    let bounds = Bounds {
        base: (end - span) as u32,
        end,
    };
    (bounds, blocks_for(span))
}

impl SegmentLayout {
    /// Derives segment bounds from `configuration`.
    pub fn from_configuration(configuration: &MemoryConfiguration) -> Self {
        let (text, text_blocks) = upward(
            configuration.text_base_address(),
            configuration.text_limit_address(),
            BLOCK_TABLE_LENGTH,
        );
        let (data, data_blocks) = upward(
            configuration.data_segment_base_address(),
            configuration.data_segment_limit_address(),
            BLOCK_TABLE_LENGTH,
        );
        let stack_top = configuration.stack_base_address();
        let (stack, stack_blocks) = downward(
            stack_top,
            configuration.stack_limit_address(),
            BLOCK_TABLE_LENGTH,
        );
        let (mmio, mmio_blocks) = upward(
            configuration.memory_map_base_address(),
            configuration.memory_map_limit_address(),
            MMIO_TABLE_LENGTH,
        );
        Self {
            text,
            data,
            stack,
            mmio,
            stack_top,
            dimensions: [text_blocks, data_blocks, stack_blocks, mmio_blocks],
        }
    }

    /// Table lengths in blocks: text, data, stack, MMIO.
    pub const fn dimensions(&self) -> [usize; 4] {
        self.dimensions
    }

    /// Returns the segment owning `address`, checking data, stack, MMIO then text.
    pub const fn segment_of(&self, address: u32) -> Option<Segment> {
        if self.data.contains(address) {
            Some(Segment::Data)
        } else if self.stack.contains(address) {
            Some(Segment::Stack)
        } else if self.mmio.contains(address) {
            Some(Segment::Mmio)
        } else if self.text.contains(address) {
            Some(Segment::Text)
        } else {
            None
        }
    }

    /// Word slot of `address` inside `segment`. `address` must lie in that segment.
    pub const fn word_index(&self, segment: Segment, address: u32) -> usize {
        let offset = match segment {
            Segment::Data => address - self.data.base,
            Segment::Stack => self.stack_top - (address & !3),
            Segment::Mmio => address - self.mmio.base,
            Segment::Text => address - self.text.base,
        };
        (offset >> 2) as usize
    }
}
