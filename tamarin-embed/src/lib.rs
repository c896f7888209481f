// tamarin-embed - Embedding API for the Tamarin programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! High-level embedding API for Tamarin.
//!
//! [`Engine`] wraps the parse → compile → run pipeline behind a persistent
//! session, which is what a REPL or a host application wants: globals and
//! their compile-time indices survive from one evaluation to the next.

pub mod engine;

pub use engine::{Engine, EngineError, Result};
