// tamarin-embed - Engine implementation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Engine struct - main entry point for embedding Tamarin.

use std::fmt;
use std::path::Path;

use tamarin_parser::{ParseError, parse};
use tamarin_vm::{CompileError, Compiler, RuntimeError, SymbolTable, VM, Value};

/// An error surfaced by [`Engine::eval`]. Parse errors come as the full
/// accumulated list; compile and runtime errors stop at the first.
#[derive(Debug, Clone)]
pub enum EngineError {
    Parse(Vec<ParseError>),
    Compile(CompileError),
    Runtime(RuntimeError),
    Io { path: String, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Parse(errors) => {
                write!(f, "parser errors:")?;
                for error in errors {
                    write!(f, "\n\t{}", error)?;
                }
                Ok(())
            }
            EngineError::Compile(error) => write!(f, "compilation failed: {}", error),
            EngineError::Runtime(error) => write!(f, "executing bytecode failed: {}", error),
            EngineError::Io { path, message } => write!(f, "error reading '{}': {}", path, message),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// A persistent Tamarin session.
///
/// `Engine` threads the compiler's symbol table and constant pool and the
/// VM's globals vector from one `eval` to the next, so bindings made on an
/// earlier line stay visible. A line that fails to parse, compile, or run
/// leaves all of that state untouched.
///
/// # Thread Safety
///
/// **`Engine` is NOT thread-safe.** Values are shared with `Rc` internally.
/// Do not share an `Engine` between threads; create one per thread instead.
///
/// # Example
///
/// ```rust
/// use tamarin_embed::Engine;
///
/// let mut engine = Engine::new();
/// engine.eval("let x = 2;").unwrap();
/// let result = engine.eval("x * 21").unwrap();
/// assert_eq!(result.inspect(), "42");
/// ```
pub struct Engine {
    symbol_table: SymbolTable,
    constants: Vec<Value>,
    globals: Vec<Value>,
}

impl Engine {
    /// Create an engine with an empty session.
    pub fn new() -> Self {
        Engine {
            symbol_table: SymbolTable::new(),
            constants: Vec::new(),
            globals: VM::new_globals(),
        }
    }

    /// Evaluate a string of Tamarin code.
    ///
    /// Returns the last value the VM popped: for input ending in an
    /// expression statement, that expression's value; for input ending in
    /// a binding, the bound value.
    ///
    /// # Errors
    ///
    /// Returns an error if the code fails to parse, compile, or execute.
    /// Session state is only committed when the whole pipeline succeeds.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let (program, errors) = parse(source);
        if !errors.is_empty() {
            return Err(EngineError::Parse(errors));
        }

        let mut compiler =
            Compiler::new_with_state(self.symbol_table.clone(), self.constants.clone());
        compiler.compile(&program).map_err(EngineError::Compile)?;

        let bytecode = compiler.bytecode();
        let (symbol_table, constants) = compiler.into_state();

        let mut vm = VM::new_with_globals(bytecode, self.globals.clone());
        vm.run().map_err(EngineError::Runtime)?;

        let result = vm.last_popped_stack_elem();
        self.symbol_table = symbol_table;
        self.constants = constants;
        self.globals = vm.into_globals();
        Ok(result)
    }

    /// Evaluate a file of Tamarin code.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents fail to
    /// evaluate.
    pub fn eval_file(&mut self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| EngineError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.eval(&source)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
