//! Lazily allocated block table.
//!
//! Segment storage is a fixed-length table of blocks, each holding `BLOCK_LENGTH_WORDS`
//! word slots. A block is allocated on its first write, so a 4 GiB address space costs
//! only what the program touches. Each block sits behind its own lock so unrelated
//! blocks update concurrently.
//!
//! Slots are `Option<T>`: `None` marks a word that was never written, which dump tooling
//! reports as "null" and ordinary reads treat as zero.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::common::constants::BLOCK_LENGTH_WORDS;

type Block<T> = Box<[Option<T>]>;

/// Fixed-length table of lazily allocated word blocks.
pub struct BlockTable<T> {
    blocks: Vec<RwLock<Option<Block<T>>>>,
}

impl<T: Clone> BlockTable<T> {
    /// Creates a table of `length` unallocated blocks.
    pub fn new(length: usize) -> Self {
        Self {
            blocks: (0..length).map(|_| RwLock::new(None)).collect(),
        }
    }

    /// Returns the number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the table has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the number of word slots covered by the table.
    pub fn word_capacity(&self) -> usize {
        self.blocks.len() * BLOCK_LENGTH_WORDS
    }

    /// Returns the number of blocks allocated so far.
    pub fn allocated_blocks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.read().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    /// Reads word slot `index`.
    ///
    /// # Returns
    ///
    /// `None` for unwritten slots, unallocated blocks and indices past the table.
    pub fn read(&self, index: usize) -> Option<T> {
        let block = self.blocks.get(index / BLOCK_LENGTH_WORDS)?;
        let guard = block.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .and_then(|slots| slots[index % BLOCK_LENGTH_WORDS].clone())
    }

    /// Applies `f` to word slot `index` under the block's write lock, allocating the block
    /// first if needed.
    ///
    /// # Returns
    ///
    /// `None` if `index` lies past the table, otherwise the closure's result.
    pub fn update<R>(&self, index: usize, f: impl FnOnce(&mut Option<T>) -> R) -> Option<R> {
        let block = self.blocks.get(index / BLOCK_LENGTH_WORDS)?;
        let mut guard = block.write().unwrap_or_else(PoisonError::into_inner);
        let slots = guard.get_or_insert_with(|| vec![None; BLOCK_LENGTH_WORDS].into_boxed_slice());
        Some(f(&mut slots[index % BLOCK_LENGTH_WORDS]))
    }

    /// Stores `value` into word slot `index` and returns the previous content.
    pub fn write(&self, index: usize, value: T) -> Option<T> {
        self.update(index, |slot| slot.replace(value)).flatten()
    }

    /// Drops every block.
    pub fn clear(&self) {
        for block in &self.blocks {
            *block.write().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    /// Replaces the contents with a deep copy of `other`.
    ///
    /// # Returns
    ///
    /// `false`, leaving `self` untouched, when the tables differ in length.
    pub fn copy_from(&self, other: &Self) -> bool {
        if self.blocks.len() != other.blocks.len() {
            return false;
        }
        for (dst, src) in self.blocks.iter().zip(&other.blocks) {
            let copy = src.read().unwrap_or_else(PoisonError::into_inner).clone();
            *dst.write().unwrap_or_else(PoisonError::into_inner) = copy;
        }
        true
    }
}

impl<T> fmt::Debug for BlockTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockTable")
            .field("blocks", &self.blocks.len())
            .finish_non_exhaustive()
    }
}
