//! Memory layout configurations.
//!
//! A layout names the address range of every segment the memory model knows about.
//! This module provides:
//! 1. **Ranges:** [`Range`], an inclusive `[low, high]` address interval.
//! 2. **Layouts:** [`MemoryConfiguration`], the section ranges plus the offsets from which
//!    the global pointer and the `.data` directive base are derived.
//! 3. **Registry:** [`MemoryConfigurations`], the built-in layouts, layouts registered at
//!    run time and the current selection.
//!
//! Layouts deserialize from JSON. Addresses may be numbers or `"0x"`-prefixed strings:
//!
//! `{"identifier": "Tiny", "sections": {".text": {"low": "0x0", "high": "0xffc"}, ...},
//!   "gp_offset": "0x800", "extern_size": "0x100"}`

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::config::ConfigError;

/// Section holding instructions.
pub const TEXT_SECTION: &str = ".text";

/// Section holding static data.
pub const DATA_SECTION: &str = ".data";

/// Section holding the heap.
pub const HEAP_SECTION: &str = "heap";

/// Section holding the stack.
pub const STACK_SECTION: &str = "stack";

/// Section holding memory-mapped I/O.
pub const MMIO_SECTION: &str = "mmio";

/// Identifier of the default layout.
pub const DEFAULT_ID: &str = "Default";

/// Identifier of the compact layout with `.data` at address 0.
pub const COMPACT_DATA_AT_ZERO_ID: &str = "CompactDataAtZero";

/// Identifier of the compact layout with `.text` at address 0.
pub const COMPACT_TEXT_AT_ZERO_ID: &str = "CompactTextAtZero";

/// Inclusive address interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct Range {
    low: u32,
    high: u32,
}

impl Range {
    /// Creates `[low, high]`.
    ///
    /// # Returns
    ///
    /// `ConfigError::InvalidRange` if `high < low`.
    pub fn new(low: u32, high: u32) -> Result<Self, ConfigError> {
        if high < low {
            return Err(ConfigError::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    const fn known(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    /// Returns the lowest address.
    pub const fn low(self) -> u32 {
        self.low
    }

    /// Returns the highest address.
    pub const fn high(self) -> u32 {
        self.high
    }

    /// Returns the number of bytes covered.
    pub const fn size(self) -> u64 {
        self.high as u64 - self.low as u64 + 1
    }

    /// Returns the smallest range covering both `self` and `other`.
    pub const fn combine(self, other: Self) -> Self {
        let low = if self.low < other.low { self.low } else { other.low };
        let high = if self.high > other.high { self.high } else { other.high };
        Self { low, high }
    }

    /// Returns `true` if `address` lies inside the range.
    pub const fn contains(self, address: u32) -> bool {
        self.low <= address && address <= self.high
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}-{:#010x}", self.low, self.high)
    }
}

/// An address in JSON: a number or a decimal/`0x` string.
#[derive(Deserialize)]
#[serde(untagged)]
enum AddressLiteral {
    Number(u32),
    Text(String),
}

impl AddressLiteral {
    fn resolve(self) -> Result<u32, ConfigError> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(text) => {
                let digits = text.trim().replace('_', "");
                let parsed = match digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => digits.parse(),
                };
                parsed.map_err(|_| ConfigError::InvalidAddress(text))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRange {
    low: AddressLiteral,
    high: AddressLiteral,
}

impl TryFrom<RawRange> for Range {
    type Error = ConfigError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.low.resolve()?, raw.high.resolve()?)
    }
}

/// Ranges of the five sections of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sections {
    /// Instructions.
    pub text: Range,
    /// Static data.
    pub data: Range,
    /// Heap, grown by the bump allocator.
    pub heap: Range,
    /// Stack, growing downwards from `high`.
    pub stack: Range,
    /// Memory-mapped I/O.
    pub mmio: Range,
}

/// A named memory layout.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawConfiguration")]
pub struct MemoryConfiguration {
    identifier: String,
    name: String,
    sections: Sections,
    gp_offset: u32,
    extern_size: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfiguration {
    identifier: String,
    #[serde(default)]
    name: Option<String>,
    sections: BTreeMap<String, Range>,
    gp_offset: AddressLiteral,
    extern_size: AddressLiteral,
}

impl TryFrom<RawConfiguration> for MemoryConfiguration {
    type Error = ConfigError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        let section = |name: &'static str| {
            raw.sections
                .get(name)
                .copied()
                .ok_or_else(|| ConfigError::MissingSection {
                    identifier: raw.identifier.clone(),
                    section: name,
                })
        };
        let sections = Sections {
            text: section(TEXT_SECTION)?,
            data: section(DATA_SECTION)?,
            heap: section(HEAP_SECTION)?,
            stack: section(STACK_SECTION)?,
            mmio: section(MMIO_SECTION)?,
        };
        let name = raw.name.unwrap_or_else(|| raw.identifier.clone());
        Self::new(
            raw.identifier,
            name,
            sections,
            raw.gp_offset.resolve()?,
            raw.extern_size.resolve()?,
        )
    }
}

impl MemoryConfiguration {
    /// Creates and validates a layout.
    ///
    /// # Arguments
    ///
    /// * `identifier` - Registry key.
    /// * `name` - Human-readable description.
    /// * `sections` - Section ranges.
    /// * `gp_offset` - Global pointer offset from the `.data` base.
    /// * `extern_size` - Size of the `.extern` area at the start of `.data`.
    ///
    /// # Returns
    ///
    /// An error if a section starts off a word boundary or the global pointer or the
    /// `.data` directive base falls outside `.data`.
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        sections: Sections,
        gp_offset: u32,
        extern_size: u32,
    ) -> Result<Self, ConfigError> {
        let identifier = identifier.into();
        let named = [
            (TEXT_SECTION, sections.text),
            (DATA_SECTION, sections.data),
            (HEAP_SECTION, sections.heap),
            (STACK_SECTION, sections.stack),
            (MMIO_SECTION, sections.mmio),
        ];
        if let Some(&(section, range)) = named.iter().find(|(_, r)| r.low() % 4 != 0) {
            return Err(ConfigError::UnalignedSection {
                identifier,
                section,
                address: range.low(),
            });
        }
        let data = sections.data;
        for (what, offset) in [("global pointer", gp_offset), (".data base", extern_size)] {
            let address = u64::from(data.low()) + u64::from(offset);
            if address > u64::from(data.high()) {
                return Err(ConfigError::OutsideData {
                    identifier,
                    what,
                    address,
                });
            }
        }
        Ok(Self {
            identifier,
            name: name.into(),
            sections,
            gp_offset,
            extern_size,
        })
    }

    /// The default layout: text at `0x00400000`, data at `0x10000000`, 32-bit address space.
    pub fn default_layout() -> Self {
        Self {
            identifier: DEFAULT_ID.to_owned(),
            name: "Default".to_owned(),
            sections: Sections {
                text: Range::known(0x0040_0000, 0x0FFF_FFFC),
                data: Range::known(0x1000_0000, 0x1003_FFFF),
                heap: Range::known(0x1004_0000, 0x3FFF_FFFF),
                stack: Range::known(0x4000_0000, 0x7FFF_EFFC),
                mmio: Range::known(0xFFFF_0000, 0xFFFF_FFFF),
            },
            gp_offset: 0x8000,
            extern_size: 0x1_0000,
        }
    }

    /// Compact 32 KiB layout with `.data` at address 0.
    pub fn compact_data_at_zero() -> Self {
        Self {
            identifier: COMPACT_DATA_AT_ZERO_ID.to_owned(),
            name: "Compact, Data at Address 0".to_owned(),
            sections: Sections {
                text: Range::known(0x3000, 0x3FFC),
                data: Range::known(0x0000, 0x0FFF),
                heap: Range::known(0x1000, 0x1FFF),
                stack: Range::known(0x2000, 0x2FFC),
                mmio: Range::known(0x7F00, 0x7FFF),
            },
            gp_offset: 0x800,
            extern_size: 0x100,
        }
    }

    /// Compact 32 KiB layout with `.text` at address 0.
    pub fn compact_text_at_zero() -> Self {
        Self {
            identifier: COMPACT_TEXT_AT_ZERO_ID.to_owned(),
            name: "Compact, Text at Address 0".to_owned(),
            sections: Sections {
                text: Range::known(0x0000, 0x0FFC),
                data: Range::known(0x1000, 0x1FFF),
                heap: Range::known(0x2000, 0x2FFF),
                stack: Range::known(0x3000, 0x3FFC),
                mmio: Range::known(0x7F00, 0x7FFF),
            },
            gp_offset: 0x800,
            extern_size: 0x100,
        }
    }

    /// Returns the registry key.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the human-readable description.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all section ranges.
    pub const fn sections(&self) -> &Sections {
        &self.sections
    }

    /// Returns the range of the named section.
    pub fn section(&self, name: &str) -> Option<Range> {
        match name {
            TEXT_SECTION => Some(self.sections.text),
            DATA_SECTION => Some(self.sections.data),
            HEAP_SECTION => Some(self.sections.heap),
            STACK_SECTION => Some(self.sections.stack),
            MMIO_SECTION => Some(self.sections.mmio),
            _ => None,
        }
    }

    /// First address of the text segment.
    pub const fn text_base_address(&self) -> u32 {
        self.sections.text.low()
    }

    /// Last address of the text segment.
    pub const fn text_limit_address(&self) -> u32 {
        self.sections.text.high()
    }

    /// First address of the data segment (`.data` and heap).
    pub const fn data_segment_base_address(&self) -> u32 {
        self.sections.data.low()
    }

    /// Last address of the data segment (`.data` and heap).
    pub const fn data_segment_limit_address(&self) -> u32 {
        self.sections.data.combine(self.sections.heap).high()
    }

    /// First address of the `.extern` area.
    pub const fn extern_base_address(&self) -> u32 {
        self.sections.data.low()
    }

    /// Reset value of the global pointer.
    pub const fn global_pointer(&self) -> u32 {
        self.sections.data.low() + self.gp_offset
    }

    /// Address where `.data` directives start placing values.
    pub const fn data_base_address(&self) -> u32 {
        self.sections.data.low() + self.extern_size
    }

    /// First address handed out by the heap allocator.
    pub const fn heap_base_address(&self) -> u32 {
        self.sections.heap.low()
    }

    /// Highest stack word; the stack grows downwards from here.
    pub const fn stack_base_address(&self) -> u32 {
        self.sections.stack.high() & !3
    }

    /// Reset value of the stack pointer.
    pub const fn stack_pointer(&self) -> u32 {
        self.stack_base_address()
    }

    /// Lowest address the stack may grow to.
    pub const fn stack_limit_address(&self) -> u32 {
        self.sections.stack.low()
    }

    /// First address of the memory-mapped I/O segment.
    pub const fn memory_map_base_address(&self) -> u32 {
        self.sections.mmio.low()
    }

    /// Last address of the memory-mapped I/O segment.
    pub const fn memory_map_limit_address(&self) -> u32 {
        self.sections.mmio.high()
    }

    /// Offset of the global pointer from the `.data` base.
    pub const fn gp_offset(&self) -> u32 {
        self.gp_offset
    }

    /// Size of the `.extern` area.
    pub const fn extern_size(&self) -> u32 {
        self.extern_size
    }
}

impl Default for MemoryConfiguration {
    fn default() -> Self {
        Self::default_layout()
    }
}

/// Registry of layouts with a current selection.
#[derive(Clone, Debug)]
pub struct MemoryConfigurations {
    configurations: Vec<Arc<MemoryConfiguration>>,
    current: usize,
}

impl Default for MemoryConfigurations {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConfigurations {
    /// Creates the registry with the built-in layouts; `Default` is selected.
    pub fn new() -> Self {
        Self {
            configurations: vec![
                Arc::new(MemoryConfiguration::default_layout()),
                Arc::new(MemoryConfiguration::compact_data_at_zero()),
                Arc::new(MemoryConfiguration::compact_text_at_zero()),
            ],
            current: 0,
        }
    }

    /// Returns every registered layout, built-ins first.
    pub fn get_configurations(&self) -> &[Arc<MemoryConfiguration>] {
        &self.configurations
    }

    /// Finds a layout by identifier.
    pub fn get_configuration_by_name(&self, identifier: &str) -> Option<&Arc<MemoryConfiguration>> {
        self.configurations
            .iter()
            .find(|c| c.identifier() == identifier)
    }

    /// Returns the `Default` layout.
    pub fn get_default_configuration(&self) -> &Arc<MemoryConfiguration> {
        &self.configurations[0]
    }

    /// Returns the selected layout.
    pub fn get_current_configuration(&self) -> &Arc<MemoryConfiguration> {
        &self.configurations[self.current]
    }

    /// Adds a layout to the registry.
    ///
    /// # Returns
    ///
    /// The shared layout, or `ConfigError::DuplicateConfiguration` if the identifier is taken.
    pub fn register(
        &mut self,
        configuration: MemoryConfiguration,
    ) -> Result<Arc<MemoryConfiguration>, ConfigError> {
        if self
            .get_configuration_by_name(configuration.identifier())
            .is_some()
        {
            return Err(ConfigError::DuplicateConfiguration(
                configuration.identifier().to_owned(),
            ));
        }
        debug!(identifier = configuration.identifier(), "memory configuration registered");
        let configuration = Arc::new(configuration);
        self.configurations.push(Arc::clone(&configuration));
        Ok(configuration)
    }

    /// Parses a layout from JSON and registers it.
    pub fn load_json(&mut self, json: &str) -> Result<Arc<MemoryConfiguration>, ConfigError> {
        let configuration: MemoryConfiguration = serde_json::from_str(json)?;
        self.register(configuration)
    }

    /// Selects the layout called `identifier`.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the selection changed, `Ok(false)` if it was already current.
    pub fn set_current_configuration(&mut self, identifier: &str) -> Result<bool, ConfigError> {
        let index = self
            .configurations
            .iter()
            .position(|c| c.identifier() == identifier)
            .ok_or_else(|| ConfigError::UnknownConfiguration(identifier.to_owned()))?;
        let changed = index != self.current;
        self.current = index;
        Ok(changed)
    }
}
