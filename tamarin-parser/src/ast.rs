// tamarin-parser - AST for Tamarin
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Abstract syntax tree produced by the parser.
//!
//! Nodes are immutable after parsing and every node keeps the token it was
//! parsed from for diagnostics. The `Display` implementations render a
//! source-like form; the compiler relies on it to order hash-literal keys
//! deterministically.

use std::fmt;

use crate::token::Token;

/// A parsed program: a list of top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// An identifier together with the token it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A braced statement list, used by `if` arms and function bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let <name> = <value>;`
    Let {
        token: Token,
        name: Identifier,
        value: Expression,
    },
    /// `return <value>;`
    Return { token: Token, value: Expression },
    /// A bare expression used as a statement.
    Expression { token: Token, value: Expression },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value, .. } => write!(f, "let {} = {};", name, value),
            Statement::Return { value, .. } => write!(f, "return {};", value),
            Statement::Expression { value, .. } => write!(f, "{}", value),
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    IntegerLit {
        token: Token,
        value: i64,
    },
    StringLit {
        token: Token,
        value: String,
    },
    BooleanLit {
        token: Token,
        value: bool,
    },
    /// `[a, b, c]`
    ArrayLit {
        token: Token,
        elements: Vec<Expression>,
    },
    /// `{k: v, ...}` in source order; the compiler sorts.
    HashLit {
        token: Token,
        pairs: Vec<(Expression, Expression)>,
    },
    /// `!x` or `-x`.
    Prefix {
        token: Token,
        operator: String,
        right: Box<Expression>,
    },
    /// `left <op> right`.
    Infix {
        token: Token,
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `if (cond) { ... } else { ... }`, the else arm optional.
    If {
        token: Token,
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },
    /// `fn(a, b) { ... }`
    FunctionLit {
        token: Token,
        parameters: Vec<Identifier>,
        body: Block,
    },
    /// `callee(args...)`
    Call {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// `target[index]`
    Index {
        token: Token,
        left: Box<Expression>,
        index: Box<Expression>,
    },
}

impl Expression {
    /// The token this expression was parsed from.
    pub fn token(&self) -> &Token {
        match self {
            Expression::Identifier(ident) => &ident.token,
            Expression::IntegerLit { token, .. }
            | Expression::StringLit { token, .. }
            | Expression::BooleanLit { token, .. }
            | Expression::ArrayLit { token, .. }
            | Expression::HashLit { token, .. }
            | Expression::Prefix { token, .. }
            | Expression::Infix { token, .. }
            | Expression::If { token, .. }
            | Expression::FunctionLit { token, .. }
            | Expression::Call { token, .. }
            | Expression::Index { token, .. } => token,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::IntegerLit { token, .. } => write!(f, "{}", token.literal),
            Expression::StringLit { token, .. } => write!(f, "{}", token.literal),
            Expression::BooleanLit { token, .. } => write!(f, "{}", token.literal),
            Expression::ArrayLit { elements, .. } => {
                write!(f, "[{}]", join(elements, ", "))
            }
            Expression::HashLit { pairs, .. } => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                write!(f, "}}")
            }
            Expression::Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                operator,
                left,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if{} {}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, "else {}", alt)?;
                }
                Ok(())
            }
            Expression::FunctionLit {
                parameters, body, ..
            } => {
                write!(f, "fn({}) {}", join(parameters, ", "), body)
            }
            Expression::Call {
                function,
                arguments,
                ..
            } => write!(f, "{}({})", function, join(arguments, ", ")),
            Expression::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
        }
    }
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}
