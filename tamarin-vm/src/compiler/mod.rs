// tamarin-vm - Bytecode compiler and virtual machine for the Tamarin programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Single-pass bytecode compiler: lowers the AST to a flat instruction
//! stream over a constant pool.
//!
//! The compiler keeps a stack of compilation scopes, one per function
//! literal being compiled, each with its own instruction buffer and a
//! record of the last two emitted instructions. Forward jumps are emitted
//! with a placeholder operand and patched once the target offset is known.

pub mod error;

pub use error::{CompileError, Result};

use std::rc::Rc;

use tamarin_parser::ast::{Block, Expression, Program, Statement};

use crate::bytecode::{Bytecode, Instructions};
use crate::opcode::{Op, make};
use crate::symbol_table::{SymbolScope, SymbolTable};
use crate::value::{CompiledFunction, Value};

/// Placeholder operand for forward jumps, rewritten by `change_operand`
/// once the target is known.
const JUMP_PLACEHOLDER: usize = 9999;

/// Opcode and start offset of an instruction already in the buffer.
#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Op,
    position: usize,
}

/// One function body being compiled: its instruction buffer plus the last
/// two instructions emitted into it.
#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

/// The bytecode compiler.
pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
}

impl Compiler {
    /// Create a compiler with a fresh symbol table and constant pool.
    pub fn new() -> Self {
        Compiler {
            constants: Vec::new(),
            symbol_table: SymbolTable::new(),
            scopes: vec![CompilationScope::default()],
            scope_index: 0,
        }
    }

    /// Create a compiler that continues from an earlier session's symbol
    /// table and constant pool, so globals keep their indices across
    /// lines of a REPL.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Compiler {
            constants,
            symbol_table,
            ..Compiler::new()
        }
    }

    /// Compile a whole program into the current scope.
    pub fn compile(&mut self, program: &Program) -> Result<()> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// The finished artifact: the main scope's instructions plus the
    /// constant pool.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_instructions().clone(),
            constants: self.constants.clone(),
        }
    }

    /// Tear down the compiler, yielding the session state a follow-up
    /// `new_with_state` call needs.
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    // ========================================================================
    // Statement lowering
    // ========================================================================

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Expression { value, .. } => {
                self.compile_expression(value)?;
                self.emit(Op::Pop, &[]);
            }
            Statement::Let { name, value, .. } => {
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(&name.value);
                match symbol.scope {
                    SymbolScope::Global => self.emit(Op::SetGlobal, &[symbol.index]),
                    SymbolScope::Local => self.emit(Op::SetLocal, &[symbol.index]),
                };
            }
            Statement::Return { value, .. } => {
                self.compile_expression(value)?;
                self.emit(Op::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> Result<()> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    // ========================================================================
    // Expression lowering
    // ========================================================================

    fn compile_expression(&mut self, expression: &Expression) -> Result<()> {
        match expression {
            Expression::IntegerLit { value, .. } => {
                let constant = self.add_constant(Value::Integer(*value));
                self.emit(Op::Constant, &[constant]);
            }
            Expression::StringLit { value, .. } => {
                let constant = self.add_constant(Value::String(Rc::from(value.as_str())));
                self.emit(Op::Constant, &[constant]);
            }
            Expression::BooleanLit { value, .. } => {
                if *value {
                    self.emit(Op::True, &[]);
                } else {
                    self.emit(Op::False, &[]);
                }
            }
            Expression::Identifier(ident) => {
                let symbol = self
                    .symbol_table
                    .resolve(&ident.value)
                    .cloned()
                    .ok_or_else(|| CompileError::UnresolvedIdentifier(ident.value.clone()))?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(Op::GetGlobal, &[symbol.index]),
                    SymbolScope::Local => self.emit(Op::GetLocal, &[symbol.index]),
                };
            }
            Expression::Prefix {
                operator, right, ..
            } => {
                self.compile_expression(right)?;
                match operator.as_str() {
                    "!" => self.emit(Op::Bang, &[]),
                    "-" => self.emit(Op::Minus, &[]),
                    other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
            }
            Expression::Infix {
                operator,
                left,
                right,
                ..
            } => {
                // There is no less-than opcode: compile the operands in
                // reverse and emit greater-than instead.
                if operator == "<" {
                    self.compile_expression(right)?;
                    self.compile_expression(left)?;
                    self.emit(Op::GreaterThan, &[]);
                    return Ok(());
                }

                self.compile_expression(left)?;
                self.compile_expression(right)?;
                match operator.as_str() {
                    "+" => self.emit(Op::Add, &[]),
                    "-" => self.emit(Op::Sub, &[]),
                    "*" => self.emit(Op::Mul, &[]),
                    "/" => self.emit(Op::Div, &[]),
                    ">" => self.emit(Op::GreaterThan, &[]),
                    "==" => self.emit(Op::Equal, &[]),
                    "!=" => self.emit(Op::NotEqual, &[]),
                    other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
            }
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                self.compile_expression(condition)?;

                let jump_not_truthy_pos = self.emit(Op::JumpNotTruthy, &[JUMP_PLACEHOLDER]);

                self.compile_block(consequence)?;
                if self.last_instruction_is(Op::Pop) {
                    self.remove_last_pop();
                }

                let jump_pos = self.emit(Op::Jump, &[JUMP_PLACEHOLDER]);

                let after_consequence = self.current_instructions().len();
                self.change_operand(jump_not_truthy_pos, after_consequence);

                match alternative {
                    Some(alternative) => {
                        self.compile_block(alternative)?;
                        if self.last_instruction_is(Op::Pop) {
                            self.remove_last_pop();
                        }
                    }
                    None => {
                        self.emit(Op::Null, &[]);
                    }
                }

                let after_alternative = self.current_instructions().len();
                self.change_operand(jump_pos, after_alternative);
            }
            Expression::ArrayLit { elements, .. } => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Op::Array, &[elements.len()]);
            }
            Expression::HashLit { pairs, .. } => {
                // Sort keys by their rendered form so the emitted bytecode
                // is deterministic regardless of source order.
                let mut sorted: Vec<&(Expression, Expression)> = pairs.iter().collect();
                sorted.sort_by_key(|(key, _)| key.to_string());

                for (key, value) in sorted {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Op::Hash, &[pairs.len() * 2]);
            }
            Expression::Index { left, index, .. } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Op::Index, &[]);
            }
            Expression::FunctionLit { body, .. } => {
                self.enter_scope();

                self.compile_block(body)?;

                // An expression in tail position becomes the implicit
                // return value; an empty body returns null.
                if self.last_instruction_is(Op::Pop) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(Op::ReturnValue) {
                    self.emit(Op::Return, &[]);
                }

                let local_count = self.symbol_table.num_definitions();
                let instructions = self.leave_scope();

                let function = CompiledFunction {
                    instructions,
                    local_count,
                };
                let constant = self.add_constant(Value::CompiledFunction(Rc::new(function)));
                self.emit(Op::Constant, &[constant]);
            }
            Expression::Call { function, .. } => {
                self.compile_expression(function)?;
                self.emit(Op::Call, &[]);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Emission primitives
    // ========================================================================

    /// Intern a constant, returning its pool index.
    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Encode and append an instruction, returning its start offset.
    fn emit(&mut self, op: Op, operands: &[usize]) -> usize {
        let instruction = make(op, operands);
        let position = self.add_instruction(&instruction);
        self.set_last_instruction(op, position);
        position
    }

    fn add_instruction(&mut self, instruction: &[u8]) -> usize {
        let scope = &mut self.scopes[self.scope_index];
        let position = scope.instructions.len();
        scope.instructions.0.extend_from_slice(instruction);
        position
    }

    fn set_last_instruction(&mut self, opcode: Op, position: usize) {
        let scope = &mut self.scopes[self.scope_index];
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    fn current_instructions(&self) -> &Instructions {
        &self.scopes[self.scope_index].instructions
    }

    fn last_instruction_is(&self, op: Op) -> bool {
        self.scopes[self.scope_index]
            .last_instruction
            .is_some_and(|last| last.opcode == op)
    }

    /// Drop the trailing `OpPop` so the preceding expression's value stays
    /// on the stack for the enclosing expression to observe.
    fn remove_last_pop(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        if let Some(last) = scope.last_instruction {
            scope.instructions.0.truncate(last.position);
            scope.last_instruction = scope.previous_instruction;
            scope.previous_instruction = None;
        }
    }

    fn replace_last_pop_with_return(&mut self) {
        let Some(last) = self.scopes[self.scope_index].last_instruction else {
            return;
        };
        let instruction = make(Op::ReturnValue, &[]);
        self.replace_instruction(last.position, &instruction);
        if let Some(last) = &mut self.scopes[self.scope_index].last_instruction {
            last.opcode = Op::ReturnValue;
        }
    }

    /// Overwrite bytes starting at `position`. The replacement must be the
    /// same width as what it replaces.
    fn replace_instruction(&mut self, position: usize, instruction: &[u8]) {
        let buffer = &mut self.scopes[self.scope_index].instructions.0;
        buffer[position..position + instruction.len()].copy_from_slice(instruction);
    }

    /// Re-encode the instruction at `position` with a new operand. Only
    /// valid for same-opcode, same-width rewrites.
    fn change_operand(&mut self, position: usize, operand: usize) {
        let byte = self.current_instructions().0[position];
        let op = Op::from_byte(byte);
        debug_assert!(op.is_some(), "change_operand at non-opcode byte {}", byte);
        if let Some(op) = op {
            let instruction = make(op, &[operand]);
            self.replace_instruction(position, &instruction);
        }
    }

    // ========================================================================
    // Compilation scopes
    // ========================================================================

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.scope_index += 1;

        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().unwrap_or_default();
        self.scope_index -= 1;

        let table = std::mem::take(&mut self.symbol_table);
        self.symbol_table = table.into_outer().unwrap_or_default();

        scope.instructions
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}
