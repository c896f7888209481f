// tamarin-vm - Bytecode compiler and virtual machine for the Tamarin programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Stack-based virtual machine executing Tamarin bytecode.
//!
//! The dispatch loop pre-increments the current frame's instruction
//! pointer, fetches the opcode byte, and executes it. Operand bytes are
//! consumed by advancing the pointer past them; jumps set the pointer to
//! `target - 1` so the next increment lands on the target.

pub mod error;
pub mod frame;
pub mod stack;

pub use error::{Result, RuntimeError};
pub use frame::Frame;
pub use stack::{STACK_SIZE, ValueStack};

use std::rc::Rc;

use crate::bytecode::Bytecode;
use crate::opcode::{Op, read_u8, read_u16};
use crate::value::{CompiledFunction, HashPair, Value};

/// Capacity of the globals vector.
pub const GLOBALS_SIZE: usize = 65536;

/// Maximum call depth.
pub const MAX_FRAMES: usize = 1024;

/// The Tamarin virtual machine. Single-threaded; one instance owns its
/// stack, globals, and frames exclusively, and `run` occupies the calling
/// thread until completion or error.
pub struct VM {
    constants: Vec<Value>,
    stack: ValueStack,
    globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl VM {
    /// Create a VM over freshly compiled bytecode with empty globals.
    pub fn new(bytecode: Bytecode) -> Self {
        VM::new_with_globals(bytecode, VM::new_globals())
    }

    /// Create a VM that reuses an existing globals vector, so a REPL can
    /// carry bindings across lines.
    pub fn new_with_globals(bytecode: Bytecode, mut globals: Vec<Value>) -> Self {
        globals.resize(GLOBALS_SIZE, Value::Null);

        // The program itself runs inside an outermost frame.
        let main_function = CompiledFunction {
            instructions: bytecode.instructions,
            local_count: 0,
        };

        VM {
            constants: bytecode.constants,
            stack: ValueStack::new(),
            globals,
            frames: vec![Frame::new(Rc::new(main_function), 0)],
        }
    }

    /// A globals vector of the right capacity, all slots null.
    pub fn new_globals() -> Vec<Value> {
        vec![Value::Null; GLOBALS_SIZE]
    }

    /// The most recently popped stack value. Expression statements pop
    /// their value, so after `run` this is the program's result.
    pub fn last_popped_stack_elem(&self) -> Value {
        self.stack.last_popped()
    }

    /// The current stack pointer. Zero after a completed run.
    pub fn stack_pointer(&self) -> usize {
        self.stack.sp()
    }

    /// Consume the VM and hand back its globals vector.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// Execute until the outermost frame runs off the end of its
    /// instructions, or an error stops the machine.
    pub fn run(&mut self) -> Result<()> {
        'run: loop {
            {
                let frame = self.frame_mut();
                frame.ip += 1;
                if frame.ip as usize >= frame.instructions().len() {
                    break;
                }
            }

            let ip = self.frame().ip as usize;
            let byte = self.frame().instructions().0[ip];
            let op = Op::from_byte(byte).ok_or(RuntimeError::UnknownOpcode(byte))?;

            match op {
                Op::Constant => {
                    let index = self.read_u16_operand();
                    let value = self.constants[index].clone();
                    self.push(value)?;
                }
                Op::Pop => {
                    self.stack.pop();
                }

                Op::Add | Op::Sub | Op::Mul | Op::Div => {
                    self.execute_binary_operation(op)?;
                }

                Op::True => self.push(Value::Boolean(true))?,
                Op::False => self.push(Value::Boolean(false))?,
                Op::Null => self.push(Value::Null)?,

                Op::Equal | Op::NotEqual | Op::GreaterThan => {
                    self.execute_comparison(op)?;
                }
                Op::Bang => {
                    let operand = self.stack.pop();
                    self.push(Value::Boolean(!is_truthy(&operand)))?;
                }
                Op::Minus => {
                    let operand = self.stack.pop();
                    match operand {
                        Value::Integer(value) => {
                            self.push(Value::Integer(value.wrapping_neg()))?
                        }
                        other => {
                            return Err(RuntimeError::TypeMismatch {
                                operation: "negation",
                                found: other.type_name().to_string(),
                            });
                        }
                    }
                }

                Op::Jump => {
                    let frame = self.frame_mut();
                    let ip = frame.ip as usize;
                    let target = read_u16(&frame.instructions().0[ip + 1..]) as i64;
                    frame.ip = target - 1;
                }
                Op::JumpNotTruthy => {
                    let target = self.read_u16_operand() as i64;
                    let condition = self.stack.pop();
                    if !is_truthy(&condition) {
                        self.frame_mut().ip = target - 1;
                    }
                }

                Op::SetGlobal => {
                    let index = self.read_u16_operand();
                    self.globals[index] = self.stack.pop();
                }
                Op::GetGlobal => {
                    let index = self.read_u16_operand();
                    let value = self.globals[index].clone();
                    self.push(value)?;
                }
                Op::SetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.frame().base_pointer;
                    let value = self.stack.pop();
                    self.stack.set(base + index, value);
                }
                Op::GetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.frame().base_pointer;
                    let value = self.stack.get(base + index);
                    self.push(value)?;
                }

                Op::Array => {
                    let count = self.read_u16_operand();
                    let start = self.stack.sp() - count;

                    let mut elements = im::Vector::new();
                    for slot in start..start + count {
                        elements.push_back(self.stack.get(slot));
                    }
                    self.stack.set_sp(start)?;
                    self.push(Value::Array(elements))?;
                }
                Op::Hash => {
                    let count = self.read_u16_operand();
                    let start = self.stack.sp() - count;

                    let mut pairs = im::HashMap::new();
                    for slot in (start..start + count).step_by(2) {
                        let key = self.stack.get(slot);
                        let value = self.stack.get(slot + 1);
                        let hash_key = key
                            .hash_key()
                            .ok_or(RuntimeError::UnhashableKey(key.type_name()))?;
                        pairs.insert(hash_key, HashPair { key, value });
                    }
                    self.stack.set_sp(start)?;
                    self.push(Value::Hash(pairs))?;
                }
                Op::Index => {
                    let index = self.stack.pop();
                    let left = self.stack.pop();
                    self.execute_index(left, index)?;
                }

                Op::Call => {
                    let callee = self.stack.pop();
                    let function = match callee {
                        Value::CompiledFunction(function) => function,
                        other => {
                            return Err(RuntimeError::TypeMismatch {
                                operation: "call",
                                found: other.type_name().to_string(),
                            });
                        }
                    };
                    if self.frames.len() >= MAX_FRAMES {
                        return Err(RuntimeError::StackOverflow("frame stack"));
                    }

                    let base_pointer = self.stack.sp();
                    self.stack.set_sp(base_pointer + function.local_count)?;
                    self.frames.push(Frame::new(function, base_pointer));
                }
                Op::ReturnValue => {
                    let return_value = self.stack.pop();
                    let frame = self.frames.pop();
                    let base = frame.map(|f| f.base_pointer).unwrap_or(0);
                    self.stack.set_sp(base)?;
                    if self.frames.is_empty() {
                        // A return in the outermost frame ends the program.
                        // The value is left where a popped expression value
                        // would sit, keeping the stack drained.
                        self.stack.set(base, return_value);
                        break 'run;
                    }
                    self.push(return_value)?;
                }
                Op::Return => {
                    let frame = self.frames.pop();
                    let base = frame.map(|f| f.base_pointer).unwrap_or(0);
                    self.stack.set_sp(base)?;
                    if self.frames.is_empty() {
                        self.stack.set(base, Value::Null);
                        break 'run;
                    }
                    self.push(Value::Null)?;
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Dispatch helpers
    // ========================================================================

    fn frame(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    #[inline]
    fn push(&mut self, value: Value) -> Result<()> {
        self.stack.push(value)
    }

    /// Decode a two-byte operand and step the instruction pointer past it.
    fn read_u16_operand(&mut self) -> usize {
        let frame = self.frame_mut();
        let ip = frame.ip as usize;
        let value = read_u16(&frame.instructions().0[ip + 1..]) as usize;
        frame.ip += 2;
        value
    }

    /// Decode a one-byte operand and step the instruction pointer past it.
    fn read_u8_operand(&mut self) -> usize {
        let frame = self.frame_mut();
        let ip = frame.ip as usize;
        let value = read_u8(&frame.instructions().0[ip + 1..]) as usize;
        frame.ip += 1;
        value
    }

    fn execute_binary_operation(&mut self, op: Op) -> Result<()> {
        let right = self.stack.pop();
        let left = self.stack.pop();

        match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => {
                self.execute_binary_integer_operation(op, *l, *r)
            }
            (Value::String(l), Value::String(r)) => {
                if op == Op::Add {
                    self.push(Value::String(Rc::from(format!("{}{}", l, r))))
                } else {
                    Err(RuntimeError::UnknownOperator {
                        operator: op.definition().name,
                        operand_type: "STRING",
                    })
                }
            }
            _ => Err(RuntimeError::TypeMismatch {
                operation: "binary operation",
                found: format!("{} {}", left.type_name(), right.type_name()),
            }),
        }
    }

    fn execute_binary_integer_operation(&mut self, op: Op, left: i64, right: i64) -> Result<()> {
        let result = match op {
            Op::Add => left.wrapping_add(right),
            Op::Sub => left.wrapping_sub(right),
            Op::Mul => left.wrapping_mul(right),
            Op::Div => {
                if right == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                left.wrapping_div(right)
            }
            _ => {
                return Err(RuntimeError::UnknownOperator {
                    operator: op.definition().name,
                    operand_type: "INTEGER",
                });
            }
        };
        self.push(Value::Integer(result))
    }

    fn execute_comparison(&mut self, op: Op) -> Result<()> {
        let right = self.stack.pop();
        let left = self.stack.pop();

        if let (Value::Integer(l), Value::Integer(r)) = (&left, &right) {
            let result = match op {
                Op::Equal => l == r,
                Op::NotEqual => l != r,
                Op::GreaterThan => l > r,
                _ => {
                    return Err(RuntimeError::UnknownOperator {
                        operator: op.definition().name,
                        operand_type: "INTEGER",
                    });
                }
            };
            return self.push(Value::Boolean(result));
        }

        // Outside integers, equality is identity of the interned
        // singletons.
        match op {
            Op::Equal => {
                let identical = values_identical(&left, &right);
                self.push(Value::Boolean(identical))
            }
            Op::NotEqual => {
                let identical = values_identical(&left, &right);
                self.push(Value::Boolean(!identical))
            }
            _ => Err(RuntimeError::TypeMismatch {
                operation: "comparison",
                found: format!("{} {}", left.type_name(), right.type_name()),
            }),
        }
    }

    fn execute_index(&mut self, left: Value, index: Value) -> Result<()> {
        match (&left, &index) {
            (Value::Array(elements), Value::Integer(i)) => {
                let value = if *i < 0 || *i as usize >= elements.len() {
                    Value::Null
                } else {
                    elements[*i as usize].clone()
                };
                self.push(value)
            }
            (Value::Hash(pairs), key) => {
                let hash_key = key
                    .hash_key()
                    .ok_or(RuntimeError::UnhashableKey(key.type_name()))?;
                let value = pairs
                    .get(&hash_key)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Value::Null);
                self.push(value)
            }
            _ => Err(RuntimeError::TypeMismatch {
                operation: "index operator",
                found: left.type_name().to_string(),
            }),
        }
    }
}

/// Everything is truthy except `false` and `null`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Null => false,
        _ => true,
    }
}

fn values_identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Boolean(l), Value::Boolean(r)) => l == r,
        (Value::Null, Value::Null) => true,
        (Value::CompiledFunction(l), Value::CompiledFunction(r)) => Rc::ptr_eq(l, r),
        _ => false,
    }
}
