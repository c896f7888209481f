// tamarin-vm - Bytecode compiler and virtual machine for the Tamarin programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Call frames for the VM.

use std::rc::Rc;

use crate::bytecode::Instructions;
use crate::value::CompiledFunction;

/// A call frame: the function being executed, its instruction pointer, and
/// where its locals start on the value stack.
#[derive(Debug, Clone)]
pub struct Frame {
    function: Rc<CompiledFunction>,

    /// Instruction pointer. Starts at -1 so the dispatch loop's
    /// pre-increment lands on byte 0.
    pub ip: i64,

    /// Index of the first local slot on the value stack. Fixed at call
    /// time; returns unwind the stack back to it.
    pub base_pointer: usize,
}

impl Frame {
    /// Create a frame for a function whose locals start at `base_pointer`.
    pub fn new(function: Rc<CompiledFunction>, base_pointer: usize) -> Self {
        Frame {
            function,
            ip: -1,
            base_pointer,
        }
    }

    /// The instructions this frame executes.
    pub fn instructions(&self) -> &Instructions {
        &self.function.instructions
    }

    /// Stack slots this frame's function reserves for locals.
    pub fn local_count(&self) -> usize {
        self.function.local_count
    }
}
