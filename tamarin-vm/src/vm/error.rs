// tamarin-vm - Bytecode compiler and virtual machine for the Tamarin programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime errors for the VM.

use std::fmt;

/// Runtime error during VM execution. Fatal for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The value stack or the frame stack exceeded its fixed capacity.
    StackOverflow(&'static str),
    /// An operation was applied to operands of the wrong type.
    TypeMismatch {
        operation: &'static str,
        found: String,
    },
    /// An operator with no meaning for the operand type.
    UnknownOperator {
        operator: &'static str,
        operand_type: &'static str,
    },
    /// A hash was built or indexed with an unhashable key type.
    UnhashableKey(&'static str),
    /// A byte outside the opcode catalogue reached the dispatch loop.
    UnknownOpcode(u8),
    /// Integer division with a zero divisor.
    DivisionByZero,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::StackOverflow(which) => write!(f, "{} overflow", which),
            RuntimeError::TypeMismatch { operation, found } => {
                write!(f, "unsupported types for {}: {}", operation, found)
            }
            RuntimeError::UnknownOperator {
                operator,
                operand_type,
            } => write!(f, "unknown operator {} for {}", operator, operand_type),
            RuntimeError::UnhashableKey(type_name) => {
                write!(f, "unusable as hash key: {}", type_name)
            }
            RuntimeError::UnknownOpcode(byte) => write!(f, "unknown opcode {}", byte),
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for VM operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
