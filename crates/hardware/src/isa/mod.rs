//! Instruction Set Architecture (ISA) collaborators.
//!
//! The core does not decode or execute instructions. It stores what the assembler
//! produces and asks an injected decoder to rebuild statements after self-modifying
//! writes.
//!
//! * `statement`: Program statements and the decoder seam.
//! * `symbol`: Global symbol lookup for the program entry point.

/// Program statements and instruction decoding seam.
pub mod statement;

/// Global symbol lookup.
pub mod symbol;

pub use statement::{BinaryStatementDecoder, InstructionDecoder, ProgramStatement};
pub use symbol::SymbolTable;
