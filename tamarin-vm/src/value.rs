// tamarin-vm - Bytecode compiler and virtual machine for the Tamarin programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime values.
//!
//! Values move through the VM stack by cloning, so the compound variants
//! are backed by `im` persistent collections and `Rc` and clone in O(1).

use std::fmt;
use std::rc::Rc;

use crate::bytecode::Instructions;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    String(Rc<str>),
    Array(im::Vector<Value>),
    Hash(im::HashMap<HashKey, HashPair>),
    CompiledFunction(Rc<CompiledFunction>),
}

/// The type tag half of a [`HashKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashTag {
    Integer,
    Boolean,
    String,
}

/// A hashable key: the value's type tag plus a 64-bit hash. Only integers,
/// booleans, and strings are hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub tag: HashTag,
    pub value: u64,
}

/// A stored hash entry keeping the original key alongside the value, so
/// inspection can show the key as written.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// The compiled body of a function literal. Shared via `Rc`; never mutated
/// after compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    /// Stack slots to reserve for the function's `let` bindings.
    pub local_count: usize,
}

impl Value {
    /// The value's type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
        }
    }

    /// Human-readable rendering, as shown by the REPL.
    pub fn inspect(&self) -> String {
        self.to_string()
    }

    /// The hash key for this value, or `None` if the type is not hashable.
    ///
    /// Integers hash to their unsigned bit pattern, booleans to 0/1, and
    /// strings to their FNV-1a digest.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(v) => Some(HashKey {
                tag: HashTag::Integer,
                value: *v as u64,
            }),
            Value::Boolean(b) => Some(HashKey {
                tag: HashTag::Boolean,
                value: u64::from(*b),
            }),
            Value::String(s) => Some(HashKey {
                tag: HashTag::String,
                value: fnv1a(s.as_bytes()),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            Value::CompiledFunction(func) => {
                write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func))
            }
        }
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a, the stable non-cryptographic hash used for string keys.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

// ============================================================================
// Tests
// ============================================================================
