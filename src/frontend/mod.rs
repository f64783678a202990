//! Compiler frontend for the managed source language.
//!
//! Logos lexer, recursive-descent parser, and the AST the code model is
//! built from. The rest of the crate depends on this module only through
//! [`parse`] and the AST types, so the frontend is swappable.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use parser::{Parse, SyntaxError, parse};

/// File extension of managed source units.
pub const SOURCE_EXTENSION: &str = "cs";

/// True if the path points at a managed source unit.
pub fn is_source_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION))
}
