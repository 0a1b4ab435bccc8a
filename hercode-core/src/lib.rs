//! Core compiler pipeline for the HerCode language.
//!
//! The pipeline is:
//!
//!   source .hc
//!     -> preamble   (optional C code above a `---` line)
//!     -> lexer      (tokens, with Indent/Dedent from leading whitespace)
//!     -> parser     (AST: say / function definition / call)
//!     -> codegen_c  (C translation unit)
//!     -> toolchain  (system C compiler)
//!
//! Higher-level tools (the CLI) should depend on this crate rather than
//! reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod preamble;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod codegen_c;
pub mod toolchain;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, compile_executable, compile_to_c, dump_tokens};
pub use error::CoreError;
pub use toolchain::Toolchain;
