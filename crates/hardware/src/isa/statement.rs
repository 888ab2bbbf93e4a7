//! Program statements and the decoding seam.
//!
//! The text segment stores decoded statements rather than raw words so the execution loop
//! does not re-decode on every fetch. This module provides:
//! 1. **Statements:** [`ProgramStatement`], the unit installed by the assembler.
//! 2. **Decoding:** [`InstructionDecoder`], injected by the decode collaborator and used by
//!    self-modifying-code writes to turn a merged word back into a statement.

use std::fmt;

/// One assembled instruction as stored in the text segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramStatement {
    binary: u32,
    address: u32,
    source: Option<String>,
    source_line: Option<u32>,
}

impl ProgramStatement {
    /// Creates a statement from its machine encoding alone.
    ///
    /// # Arguments
    ///
    /// * `binary` - 32-bit instruction encoding.
    /// * `address` - Text-segment address the statement lives at.
    pub const fn from_binary(binary: u32, address: u32) -> Self {
        Self {
            binary,
            address,
            source: None,
            source_line: None,
        }
    }

    /// Creates a statement carrying its assembler source text and line number.
    pub fn with_source(binary: u32, address: u32, source: impl Into<String>, line: u32) -> Self {
        Self {
            binary,
            address,
            source: Some(source.into()),
            source_line: Some(line),
        }
    }

    /// Returns the 32-bit machine encoding.
    pub const fn binary(&self) -> u32 {
        self.binary
    }

    /// Returns the text-segment address.
    pub const fn address(&self) -> u32 {
        self.address
    }

    /// Returns the assembler source text, if known.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Returns the assembler source line, if known.
    pub const fn source_line(&self) -> Option<u32> {
        self.source_line
    }
}

impl fmt::Display for ProgramStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}: {:#010x}", self.address, self.binary)?;
        if let Some(source) = &self.source {
            write!(f, "  {source}")?;
        }
        Ok(())
    }
}

/// Turns a 32-bit word back into a statement.
///
/// Implemented by the decode collaborator; memory calls it when a self-modifying store
/// rewrites part of an instruction word.
pub trait InstructionDecoder: Send + Sync {
    /// Decodes `binary`, which lives at `address`.
    fn decode(&self, binary: u32, address: u32) -> ProgramStatement;
}

impl<F> InstructionDecoder for F
where
    F: Fn(u32, u32) -> ProgramStatement + Send + Sync,
{
    fn decode(&self, binary: u32, address: u32) -> ProgramStatement {
        self(binary, address)
    }
}

/// Decoder that keeps only the raw encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryStatementDecoder;

impl InstructionDecoder for BinaryStatementDecoder {
    fn decode(&self, binary: u32, address: u32) -> ProgramStatement {
        ProgramStatement::from_binary(binary, address)
    }
}
