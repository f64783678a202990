//! # regen
//!
//! Live template-driven code generation from a compiled source tree.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! watch     → filesystem events → resynchronize → regenerate
//!   ↓
//! driver    → template registry, helpers, generation passes
//!   ↓
//! output    → output slots, content-hash ledger, epoch sweep
//!   ↓
//! solution  → manifest, project index, incremental transitions
//!   ↓
//! model     → compilation arenas, symbol views, member flattening,
//!             return-shape inference, JSON projection
//!   ↓
//! frontend  → Logos lexer, recursive-descent parser, AST
//! ```

/// Compiler frontend: lexer, parser, AST for the managed language
pub mod frontend;

/// Code model: compilations and the views templates bind against
pub mod model;

/// Project and solution index with incremental resynchronization
pub mod solution;

/// Output slots, content-hash ledger, stale-output sweep
pub mod output;

/// Template registry, helpers, generation passes
pub mod driver;

/// Filesystem watcher and the regeneration loop
pub mod watch;

/// Crate error type
pub mod error;

pub use error::{Error, Result};
