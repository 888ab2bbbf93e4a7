//! Simulated Main Memory.
//!
//! This module implements the byte-addressable 32-bit memory of the simulated machine.
//! It provides:
//! 1. **Storage:** Lazily allocated block tables for the text, data, stack and MMIO segments.
//! 2. **Access:** Byte, half-word, word and double-word loads and stores, little-endian,
//!    with alignment checks and load/store-specific faults.
//! 3. **Text Segment:** Decoded statements; data access requires self-modifying code and
//!    re-decodes rewritten words through the injected [`InstructionDecoder`].
//! 4. **Heap:** A bump allocator inside the data segment.
//! 5. **Observers:** Address-range scoped notification of reads and writes.
//!
//! Every store returns the value it overwrote. The public setters (`set_word`, `set_half`,
//! `set_byte`, `set_raw_word`, `set_double_word`) also push an undo record when a
//! backstepper is attached.

/// Lazily allocated block tables.
pub mod buffer;

/// Memory layout configurations and their registry.
pub mod configuration;

/// Segment bounds derived from a configuration.
pub mod layout;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};

use crate::common::constants::{
    BYTE_LENGTH_BYTES, HALF_LENGTH_BYTES, SIGN_BOUNDARY, WORD_LENGTH_BYTES,
};
use crate::common::{
    AccessType, AddressError, HeapError, MemoryAccessNotice, MemoryObserver, ObserverId,
    ObserverRangeError,
};
use crate::core::backstep::{BackstepSlot, Backstepper, RestoreRecord};
use crate::isa::statement::{BinaryStatementDecoder, InstructionDecoder, ProgramStatement};

use self::buffer::BlockTable;
use self::configuration::MemoryConfiguration;
use self::layout::{Segment, SegmentLayout};

/// Mask selecting the low `length` bytes of a word.
const fn low_mask(length: u32) -> u32 {
    if length >= 4 {
        u32::MAX
    } else {
        (1 << (8 * length)) - 1
    }
}

const fn valid_length(length: u32) -> bool {
    matches!(length, 1 | 2 | 4)
}

struct Segments {
    configuration: Arc<MemoryConfiguration>,
    layout: SegmentLayout,
    text: BlockTable<Arc<ProgramStatement>>,
    data: BlockTable<u32>,
    stack: BlockTable<u32>,
    mmio: BlockTable<u32>,
}

impl Segments {
    fn new(configuration: Arc<MemoryConfiguration>) -> Self {
        let layout = SegmentLayout::from_configuration(&configuration);
        let [text, data, stack, mmio] = layout.dimensions();
        Self {
            configuration,
            layout,
            text: BlockTable::new(text),
            data: BlockTable::new(data),
            stack: BlockTable::new(stack),
            mmio: BlockTable::new(mmio),
        }
    }

    const fn words(&self, segment: Segment) -> Option<&BlockTable<u32>> {
        match segment {
            Segment::Data => Some(&self.data),
            Segment::Stack => Some(&self.stack),
            Segment::Mmio => Some(&self.mmio),
            Segment::Text => None,
        }
    }

    fn clear(&self) {
        self.text.clear();
        self.data.clear();
        self.stack.clear();
        self.mmio.clear();
    }
}

struct Registration {
    id: ObserverId,
    start: u32,
    end: u32,
    observer: Arc<dyn MemoryObserver>,
}

impl Registration {
    /// The word starting at `end` is observed as a whole.
    fn matches(&self, address: u32) -> bool {
        self.start <= address && u64::from(address) < u64::from(self.end) + 4
    }
}

/// The simulated memory.
pub struct Memory {
    segments: RwLock<Segments>,
    heap_address: AtomicU32,
    self_modifying_code: AtomicBool,
    decoder: RwLock<Arc<dyn InstructionDecoder>>,
    observers: RwLock<Vec<Registration>>,
    backstep: BackstepSlot,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(Arc::new(MemoryConfiguration::default_layout()))
    }
}

impl Memory {
    /// Creates an empty memory laid out by `configuration`.
    pub fn new(configuration: Arc<MemoryConfiguration>) -> Self {
        let heap = configuration.heap_base_address();
        let decoder: Arc<dyn InstructionDecoder> = Arc::new(BinaryStatementDecoder);
        Self {
            segments: RwLock::new(Segments::new(configuration)),
            heap_address: AtomicU32::new(heap),
            self_modifying_code: AtomicBool::new(false),
            decoder: RwLock::new(decoder),
            observers: RwLock::new(Vec::new()),
            backstep: BackstepSlot::default(),
        }
    }

    fn segments(&self) -> RwLockReadGuard<'_, Segments> {
        self.segments.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn segments_mut(&self) -> RwLockWriteGuard<'_, Segments> {
        self.segments.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the active layout.
    pub fn configuration(&self) -> Arc<MemoryConfiguration> {
        Arc::clone(&self.segments().configuration)
    }

    /// Re-lays memory out for `configuration` and clears it. Observers are kept.
    pub fn set_configuration(&self, configuration: Arc<MemoryConfiguration>) {
        let heap = configuration.heap_base_address();
        debug!(
            identifier = configuration.identifier(),
            "memory reconfigured"
        );
        *self.segments_mut() = Segments::new(configuration);
        self.heap_address.store(heap, Ordering::SeqCst);
    }

    /// Drops all contents and resets the heap. Observers are kept.
    pub fn clear(&self) {
        let segments = self.segments_mut();
        segments.clear();
        self.heap_address
            .store(segments.configuration.heap_base_address(), Ordering::SeqCst);
        debug!("memory cleared");
    }

    /// Returns the segment layout.
    pub fn layout(&self) -> SegmentLayout {
        self.segments().layout
    }

    /// Enables or disables data access to the text segment.
    pub fn set_self_modifying_code(&self, enabled: bool) {
        self.self_modifying_code.store(enabled, Ordering::SeqCst);
    }

    /// Returns `true` if data access to the text segment is allowed.
    pub fn self_modifying_code(&self) -> bool {
        self.self_modifying_code.load(Ordering::SeqCst)
    }

    /// Replaces the decoder used to rebuild statements after text writes.
    pub fn set_decoder(&self, decoder: Arc<dyn InstructionDecoder>) {
        *self.decoder.write().unwrap_or_else(PoisonError::into_inner) = decoder;
    }

    /// Attaches or detaches the undo sink.
    pub fn set_backstepper(&self, backstepper: Option<Arc<dyn Backstepper>>) {
        self.backstep.set(backstepper);
    }

    /// First address of the text segment.
    pub fn text_base_address(&self) -> u32 {
        self.segments().layout.text.base()
    }

    /// Last address of the text segment.
    pub fn text_limit_address(&self) -> u32 {
        self.segments().layout.text.limit()
    }

    /// First address of the data segment.
    pub fn data_segment_base_address(&self) -> u32 {
        self.segments().layout.data.base()
    }

    /// Last address of the data segment.
    pub fn data_segment_limit_address(&self) -> u32 {
        self.segments().layout.data.limit()
    }

    /// Address where `.data` directives start placing values.
    pub fn data_base_address(&self) -> u32 {
        self.segments().configuration.data_base_address()
    }

    /// First address handed out by the heap allocator.
    pub fn heap_base_address(&self) -> u32 {
        self.segments().configuration.heap_base_address()
    }

    /// Next address the heap allocator will hand out.
    pub fn heap_address(&self) -> u32 {
        self.heap_address.load(Ordering::SeqCst)
    }

    /// Highest stack word.
    pub fn stack_base_address(&self) -> u32 {
        self.segments().configuration.stack_base_address()
    }

    /// Lowest address of the stack segment.
    pub fn stack_limit_address(&self) -> u32 {
        self.segments().layout.stack.base()
    }

    /// First address of the memory-mapped I/O segment.
    pub fn memory_map_base_address(&self) -> u32 {
        self.segments().layout.mmio.base()
    }

    /// Last address of the memory-mapped I/O segment.
    pub fn memory_map_limit_address(&self) -> u32 {
        self.segments().layout.mmio.limit()
    }

    /// Returns `true` if `address` lies in the text segment.
    pub fn in_text_segment(&self, address: u32) -> bool {
        self.segments().layout.text.contains(address)
    }

    /// Returns `true` if `address` lies in the data segment.
    pub fn in_data_segment(&self, address: u32) -> bool {
        self.segments().layout.data.contains(address)
    }

    /// Returns `true` if `address` lies in the stack segment.
    pub fn in_stack_segment(&self, address: u32) -> bool {
        self.segments().layout.stack.contains(address)
    }

    /// Returns `true` if `address` lies in the memory-mapped I/O segment.
    pub fn in_memory_map_segment(&self, address: u32) -> bool {
        self.segments().layout.mmio.contains(address)
    }

    /// Reserves `num_bytes` from the heap.
    ///
    /// # Arguments
    ///
    /// * `num_bytes` - Requested size; the cursor advances by this rounded up to a word.
    ///
    /// # Returns
    ///
    /// The address of the reserved block, or a `HeapError` for negative sizes and requests
    /// that would pass the end of the data segment.
    pub fn allocate_bytes_from_heap(&self, num_bytes: i32) -> Result<u32, HeapError> {
        let size = u64::try_from(num_bytes).map_err(|_| HeapError::NegativeSize(num_bytes))?;
        let end = self.segments().layout.data.end();
        let result = self
            .heap_address
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |heap| {
                let next = (u64::from(heap) + size + 3) & !3;
                u32::try_from(next).ok().filter(|&n| u64::from(n) <= end)
            });
        match result {
            Ok(address) => {
                trace!(address, num_bytes, "heap allocation");
                Ok(address)
            }
            Err(_) => Err(HeapError::Exhausted(num_bytes)),
        }
    }

    fn store(&self, address: u32, value: u32, length: u32) -> Result<u32, AddressError> {
        if !valid_length(length) {
            return Err(AddressError::StoreMisaligned(address));
        }
        let segments = self.segments();
        let layout = segments.layout;
        let last = address
            .checked_add(length - 1)
            .ok_or(AddressError::StoreOutOfRange(address))?;
        let segment = layout
            .segment_of(address)
            .ok_or(AddressError::StoreOutOfRange(address))?;
        if segment == Segment::Text {
            return self.store_text(&segments, address, value, length);
        }
        if layout.segment_of(last) != Some(segment) {
            return Err(AddressError::StoreOutOfRange(address));
        }
        let Some(table) = segments.words(segment) else {
            return Err(AddressError::StoreOutOfRange(address));
        };
        let mut old = 0;
        let mut done = 0;
        while done < length {
            let at = address + done;
            let shift = (at & 3) * 8;
            let count = (4 - (at & 3)).min(length - done);
            let mask = low_mask(count) << shift;
            let bits = ((value >> (8 * done)) << shift) & mask;
            let previous = table
                .update(layout.word_index(segment, at), |slot| {
                    let word = slot.unwrap_or(0);
                    *slot = Some((word & !mask) | bits);
                    (word & mask) >> shift
                })
                .ok_or(AddressError::StoreOutOfRange(at))?;
            old |= previous << (8 * done);
            done += count;
        }
        Ok(old)
    }

    fn store_text(
        &self,
        segments: &Segments,
        address: u32,
        value: u32,
        length: u32,
    ) -> Result<u32, AddressError> {
        if !self.self_modifying_code() {
            return Err(AddressError::TextWriteForbidden(address));
        }
        let shift = (address & 3) * 8;
        if (address & 3) + length > WORD_LENGTH_BYTES {
            return Err(AddressError::StoreMisaligned(address));
        }
        let word_address = address & !3;
        let index = segments.layout.word_index(Segment::Text, word_address);
        let mask = low_mask(length) << shift;
        let decoder = self
            .decoder
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let (old_word, new_word) = segments
            .text
            .update(index, |slot| {
                let old_word = slot.as_ref().map_or(0, |s| s.binary());
                let new_word = (old_word & !mask) | ((value << shift) & mask);
                *slot = Some(Arc::new(decoder.decode(new_word, word_address)));
                (old_word, new_word)
            })
            .ok_or(AddressError::StoreOutOfRange(address))?;
        debug!(address = word_address, binary = new_word, "text segment rewritten");
        Ok((old_word & mask) >> shift)
    }

    fn fetch(&self, address: u32, length: u32) -> Result<u32, AddressError> {
        if !valid_length(length) {
            return Err(AddressError::LoadMisaligned(address));
        }
        let segments = self.segments();
        let layout = segments.layout;
        let last = address
            .checked_add(length - 1)
            .ok_or(AddressError::LoadOutOfRange(address))?;
        let segment = layout
            .segment_of(address)
            .ok_or(AddressError::LoadOutOfRange(address))?;
        if segment == Segment::Text {
            if !self.self_modifying_code() {
                return Err(AddressError::TextReadForbidden(address));
            }
            if (address & 3) + length > WORD_LENGTH_BYTES {
                return Err(AddressError::LoadMisaligned(address));
            }
            let index = layout.word_index(Segment::Text, address & !3);
            let word = segments.text.read(index).map_or(0, |s| s.binary());
            return Ok((word >> ((address & 3) * 8)) & low_mask(length));
        }
        if layout.segment_of(last) != Some(segment) {
            return Err(AddressError::LoadOutOfRange(address));
        }
        let Some(table) = segments.words(segment) else {
            return Err(AddressError::LoadOutOfRange(address));
        };
        let mut value = 0;
        let mut done = 0;
        while done < length {
            let at = address + done;
            let shift = (at & 3) * 8;
            let count = (4 - (at & 3)).min(length - done);
            let word = table.read(layout.word_index(segment, at)).unwrap_or(0);
            value |= ((word >> shift) & low_mask(count)) << (8 * done);
            done += count;
        }
        Ok(value)
    }

    /// Stores the low `length` bytes of `value` at `address`, little-endian.
    ///
    /// # Arguments
    ///
    /// * `address` - Byte address; no alignment is required outside the text segment.
    /// * `value` - Value whose low `length` bytes are stored.
    /// * `length` - Number of bytes: 1, 2 or 4.
    ///
    /// # Returns
    ///
    /// The previous contents of the written bytes.
    pub fn set(&self, address: u32, value: u32, length: u32) -> Result<u32, AddressError> {
        let old = self.store(address, value, length)?;
        self.notify(AccessType::Write, address, length, value & low_mask(length));
        Ok(old)
    }

    /// Loads `length` bytes from `address`, little-endian, notifying observers.
    pub fn get(&self, address: u32, length: u32) -> Result<u32, AddressError> {
        let value = self.fetch(address, length)?;
        self.notify(AccessType::Read, address, length, value);
        Ok(value)
    }

    /// Loads `length` bytes from `address` without notifying observers.
    pub fn get_no_notify(&self, address: u32, length: u32) -> Result<u32, AddressError> {
        self.fetch(address, length)
    }

    const fn check_store_alignment(address: u32, alignment: u32) -> Result<(), AddressError> {
        if address % alignment == 0 {
            Ok(())
        } else {
            Err(AddressError::StoreMisaligned(address))
        }
    }

    const fn check_load_alignment(address: u32, alignment: u32) -> Result<(), AddressError> {
        if address % alignment == 0 {
            Ok(())
        } else {
            Err(AddressError::LoadMisaligned(address))
        }
    }

    /// Stores a word at a word-aligned address and returns the previous word.
    pub fn set_word(&self, address: u32, value: u32) -> Result<u32, AddressError> {
        Self::check_store_alignment(address, WORD_LENGTH_BYTES)?;
        let old = self.set(address, value, WORD_LENGTH_BYTES)?;
        self.backstep
            .record(|| RestoreRecord::MemoryWord { address, value: old });
        Ok(old)
    }

    /// Loads a word from a word-aligned address.
    pub fn get_word(&self, address: u32) -> Result<u32, AddressError> {
        Self::check_load_alignment(address, WORD_LENGTH_BYTES)?;
        self.get(address, WORD_LENGTH_BYTES)
    }

    /// Loads a word from a word-aligned address without notifying observers.
    pub fn get_word_no_notify(&self, address: u32) -> Result<u32, AddressError> {
        Self::check_load_alignment(address, WORD_LENGTH_BYTES)?;
        self.fetch(address, WORD_LENGTH_BYTES)
    }

    /// Stores a half-word at a half-aligned address and returns the previous half-word.
    pub fn set_half(&self, address: u32, value: u32) -> Result<u32, AddressError> {
        Self::check_store_alignment(address, HALF_LENGTH_BYTES)?;
        let old = self.set(address, value, HALF_LENGTH_BYTES)?;
        self.backstep
            .record(|| RestoreRecord::MemoryHalf { address, value: old });
        Ok(old)
    }

    /// Loads a half-word from a half-aligned address.
    pub fn get_half(&self, address: u32) -> Result<u32, AddressError> {
        Self::check_load_alignment(address, HALF_LENGTH_BYTES)?;
        self.get(address, HALF_LENGTH_BYTES)
    }

    /// Stores a byte and returns the previous byte.
    pub fn set_byte(&self, address: u32, value: u32) -> Result<u32, AddressError> {
        let old = self.set(address, value, BYTE_LENGTH_BYTES)?;
        self.backstep
            .record(|| RestoreRecord::MemoryByte { address, value: old });
        Ok(old)
    }

    /// Loads a byte.
    pub fn get_byte(&self, address: u32) -> Result<u32, AddressError> {
        self.get(address, BYTE_LENGTH_BYTES)
    }

    /// Fails the way a word store at `address` would, without writing anything.
    fn check_word_store(&self, address: u32) -> Result<(), AddressError> {
        let layout = self.segments().layout;
        let last = address
            .checked_add(WORD_LENGTH_BYTES - 1)
            .ok_or(AddressError::StoreOutOfRange(address))?;
        match layout.segment_of(address) {
            None => Err(AddressError::StoreOutOfRange(address)),
            Some(Segment::Text) if !self.self_modifying_code() => {
                Err(AddressError::TextWriteForbidden(address))
            }
            Some(Segment::Text) => Ok(()),
            Some(segment) if layout.segment_of(last) == Some(segment) => Ok(()),
            Some(_) => Err(AddressError::StoreOutOfRange(address)),
        }
    }

    fn store_double_word(&self, address: u32, value: u64) -> Result<u64, AddressError> {
        Self::check_store_alignment(address, WORD_LENGTH_BYTES)?;
        let high_address = address
            .checked_add(WORD_LENGTH_BYTES)
            .ok_or(AddressError::StoreOutOfRange(address))?;
        self.check_word_store(address)?;
        self.check_word_store(high_address)?;
        let old_low = self.set(address, value as u32, WORD_LENGTH_BYTES)?;
        let old_high = self.set(high_address, (value >> 32) as u32, WORD_LENGTH_BYTES)?;
        Ok((u64::from(old_high) << 32) | u64::from(old_low))
    }

    /// Stores a double-word at a word-aligned address as two little-endian words.
    pub fn set_double_word(&self, address: u32, value: u64) -> Result<u64, AddressError> {
        let old = self.store_double_word(address, value)?;
        self.backstep
            .record(|| RestoreRecord::MemoryDoubleWord { address, value: old });
        Ok(old)
    }

    /// Loads a double-word from a word-aligned address.
    pub fn get_double_word(&self, address: u32) -> Result<u64, AddressError> {
        Self::check_load_alignment(address, WORD_LENGTH_BYTES)?;
        let high_address = address
            .checked_add(WORD_LENGTH_BYTES)
            .ok_or(AddressError::LoadOutOfRange(address))?;
        let low = self.fetch(address, WORD_LENGTH_BYTES)?;
        let high = self.fetch(high_address, WORD_LENGTH_BYTES)?;
        self.notify(AccessType::Read, address, WORD_LENGTH_BYTES, low);
        self.notify(AccessType::Read, high_address, WORD_LENGTH_BYTES, high);
        Ok((u64::from(high) << 32) | u64::from(low))
    }

    fn store_raw_word(&self, address: u32, value: u32) -> Result<u32, AddressError> {
        Self::check_store_alignment(address, WORD_LENGTH_BYTES)?;
        let old = self.store(address, value, WORD_LENGTH_BYTES)?;
        self.notify(AccessType::Write, address, WORD_LENGTH_BYTES, value);
        Ok(old)
    }

    /// Stores a word at a word-aligned address; a text-segment store re-decodes the word.
    pub fn set_raw_word(&self, address: u32, value: u32) -> Result<u32, AddressError> {
        let old = self.store_raw_word(address, value)?;
        self.backstep
            .record(|| RestoreRecord::MemoryRawWord { address, value: old });
        Ok(old)
    }

    /// Loads the word at a word-aligned address, reporting never-written words as `None`.
    ///
    /// Text-segment words are returned as their statement binary regardless of the
    /// self-modifying-code setting. Observers are not notified.
    pub fn get_raw_word_or_null(&self, address: u32) -> Result<Option<u32>, AddressError> {
        Self::check_load_alignment(address, WORD_LENGTH_BYTES)?;
        let segments = self.segments();
        let layout = segments.layout;
        let segment = layout
            .segment_of(address)
            .ok_or(AddressError::LoadOutOfRange(address))?;
        let index = layout.word_index(segment, address);
        Ok(match segments.words(segment) {
            Some(table) => table.read(index),
            None => segments.text.read(index).map(|s| s.binary()),
        })
    }

    /// Loads the word at a word-aligned address; never-written words read as zero.
    pub fn get_raw_word(&self, address: u32) -> Result<u32, AddressError> {
        Ok(self.get_raw_word_or_null(address)?.unwrap_or(0))
    }

    /// Installs `statement` at a word-aligned text address.
    ///
    /// # Returns
    ///
    /// The statement previously stored there.
    pub fn set_statement(
        &self,
        address: u32,
        statement: ProgramStatement,
    ) -> Result<Option<Arc<ProgramStatement>>, AddressError> {
        Self::check_store_alignment(address, WORD_LENGTH_BYTES)?;
        let segments = self.segments();
        if !segments.layout.text.contains(address) {
            return Err(AddressError::StoreOutOfRange(address));
        }
        let index = segments.layout.word_index(Segment::Text, address);
        Ok(segments.text.write(index, Arc::new(statement)))
    }

    /// Returns the statement at a word-aligned text address, notifying observers.
    pub fn get_statement(
        &self,
        address: u32,
    ) -> Result<Option<Arc<ProgramStatement>>, AddressError> {
        let statement = self.get_statement_no_notify(address)?;
        let binary = statement.as_ref().map_or(0, |s| s.binary());
        self.notify(AccessType::Read, address, WORD_LENGTH_BYTES, binary);
        Ok(statement)
    }

    /// Returns the statement at a word-aligned text address without notifying observers.
    pub fn get_statement_no_notify(
        &self,
        address: u32,
    ) -> Result<Option<Arc<ProgramStatement>>, AddressError> {
        Self::check_load_alignment(address, WORD_LENGTH_BYTES)?;
        let segments = self.segments();
        if !segments.layout.text.contains(address) {
            return Err(AddressError::LoadOutOfRange(address));
        }
        let index = segments.layout.word_index(Segment::Text, address);
        Ok(segments.text.read(index))
    }

    /// Scans word by word from `base` for the first never-written word.
    ///
    /// # Returns
    ///
    /// The first null address below `limit`, or the address where the scan stopped.
    pub fn get_address_of_first_null(&self, base: u32, limit: u32) -> Result<u32, AddressError> {
        let mut address = base;
        while address < limit {
            if self.get_raw_word_or_null(address)?.is_none() {
                break;
            }
            match address.checked_add(WORD_LENGTH_BYTES) {
                Some(next) => address = next,
                None => break,
            }
        }
        Ok(address)
    }

    /// Reapplies an undo record without recording a new one.
    ///
    /// Register records are ignored; they belong to the register files.
    pub(crate) fn restore(&self, record: RestoreRecord) -> Result<(), AddressError> {
        match record {
            RestoreRecord::MemoryWord { address, value } => {
                let _ = self.set(address, value, WORD_LENGTH_BYTES)?;
            }
            RestoreRecord::MemoryHalf { address, value } => {
                let _ = self.set(address, value, HALF_LENGTH_BYTES)?;
            }
            RestoreRecord::MemoryByte { address, value } => {
                let _ = self.set(address, value, BYTE_LENGTH_BYTES)?;
            }
            RestoreRecord::MemoryRawWord { address, value } => {
                let _ = self.store_raw_word(address, value)?;
            }
            RestoreRecord::MemoryDoubleWord { address, value } => {
                let _ = self.store_double_word(address, value)?;
            }
            RestoreRecord::Register { .. }
            | RestoreRecord::FloatingPointRegister { .. }
            | RestoreRecord::ControlAndStatusRegister { .. }
            | RestoreRecord::ProgramCounter { .. } => {}
        }
        Ok(())
    }

    /// Replaces this memory's contents, layout and heap cursor with a copy of `other`.
    ///
    /// # Returns
    ///
    /// `false`, leaving `self` untouched, when the two memories were built from layouts
    /// needing different table sizes.
    pub fn copy_from(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let source = other.segments();
        let mut target = self.segments_mut();
        if source.layout.dimensions() != target.layout.dimensions() {
            warn!(
                source = ?source.layout.dimensions(),
                target = ?target.layout.dimensions(),
                "memory copy rejected: table sizes differ"
            );
            return false;
        }
        let copied = target.text.copy_from(&source.text)
            && target.data.copy_from(&source.data)
            && target.stack.copy_from(&source.stack)
            && target.mmio.copy_from(&source.mmio);
        target.configuration = Arc::clone(&source.configuration);
        target.layout = source.layout;
        self.heap_address
            .store(other.heap_address(), Ordering::SeqCst);
        copied
    }

    /// Observes the whole address space.
    ///
    /// The observer is registered on both halves of the address space under one handle.
    pub fn add_observer(&self, observer: Arc<dyn MemoryObserver>) -> ObserverId {
        let id = ObserverId::next();
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        observers.push(Registration {
            id,
            start: 0,
            end: SIGN_BOUNDARY - WORD_LENGTH_BYTES,
            observer: Arc::clone(&observer),
        });
        observers.push(Registration {
            id,
            start: SIGN_BOUNDARY,
            end: u32::MAX - 3,
            observer,
        });
        debug!(id = id.value(), "memory observer added");
        id
    }

    /// Observes the word containing `address`.
    pub fn add_observer_at(
        &self,
        observer: Arc<dyn MemoryObserver>,
        address: u32,
    ) -> Result<ObserverId, ObserverRangeError> {
        self.add_observer_range(observer, address, address)
    }

    /// Observes `[start, end]`, where the word starting at `end` is included.
    ///
    /// # Returns
    ///
    /// An error if `end < start` or the range crosses `0x80000000`.
    pub fn add_observer_range(
        &self,
        observer: Arc<dyn MemoryObserver>,
        start: u32,
        end: u32,
    ) -> Result<ObserverId, ObserverRangeError> {
        if end < start {
            return Err(ObserverRangeError::Inverted { start, end });
        }
        if start < SIGN_BOUNDARY && end >= SIGN_BOUNDARY {
            return Err(ObserverRangeError::StraddlesSignBoundary { start, end });
        }
        let id = ObserverId::next();
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                id,
                start,
                end,
                observer,
            });
        debug!(id = id.value(), start, end, "memory observer added");
        Ok(id)
    }

    /// Removes the observer registered under `id`. Returns `true` if one was removed.
    pub fn delete_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|r| r.id != id);
        observers.len() != before
    }

    /// Removes every observer.
    pub fn delete_observers(&self) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of observer handles registered.
    pub fn count_observers(&self) -> usize {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ObserverId> = observers.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    fn notify(&self, access_type: AccessType, address: u32, length: u32, value: u32) {
        let targets: Vec<Arc<dyn MemoryObserver>> = {
            let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
            if observers.is_empty() {
                return;
            }
            observers
                .iter()
                .filter(|r| r.matches(address))
                .map(|r| Arc::clone(&r.observer))
                .collect()
        };
        let notice = MemoryAccessNotice::new(access_type, address, length, value);
        for observer in targets {
            observer.memory_accessed(&notice);
        }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments = self.segments();
        f.debug_struct("Memory")
            .field("configuration", &segments.configuration.identifier())
            .field("layout", &segments.layout)
            .field("heap_address", &format_args!("{:#010x}", self.heap_address()))
            .field("self_modifying_code", &self.self_modifying_code())
            .field("backstep", &self.backstep)
            .finish_non_exhaustive()
    }
}
