//! Parsing of function source ranges
//!
//! Everything here is plain data and may run on any thread: the
//! [`SourceStream`] a job hands to [`parse`], the [`ParseArtifact`] it gets
//! back, and the [`PendingCompilationError`] recorded on failure.

pub mod ast;
mod lexer;
mod parser;
mod pending_error;
mod source;
pub mod token;

pub use ast::ParseArtifact;
pub use parser::{STACK_HEADROOM_DIVISOR, parse};
pub use pending_error::PendingCompilationError;
pub use source::SourceStream;
