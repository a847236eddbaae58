//! # compiler-dispatcher - background compilation jobs
//!
//! A compilation job lets the expensive parse of a function's source run
//! off the thread that owns the managed heap. Every step that touches heap
//! objects stays on the owning thread, and a syntax error found during the
//! parse is kept as plain data until the owning thread materializes it as
//! an exception.
//!
//! ## Quick Start
//!
//! ```
//! use compiler_dispatcher::prelude::*;
//!
//! let mut isolate = Isolate::new();
//! let source = isolate.new_string_from_static_chars("var answer = 6 * 7;");
//! let function = isolate.new_function_for_source("f", source);
//!
//! let mut job = CompilerDispatcherJob::new(&isolate, function, 984)?;
//! job.prepare_to_parse_on_main_thread(&isolate)?;
//! job.parse()?;
//! job.finalize_parsing_on_main_thread(&isolate)?;
//! assert_eq!(job.status(), CompileJobStatus::ReadyToCompile);
//!
//! job.reset_on_main_thread(&isolate)?;
//! assert_eq!(job.status(), CompileJobStatus::Initial);
//! # Ok::<(), JobError>(())
//! ```
//!
//! ## Layout
//!
//! - [`dispatcher`]: the job, its status machine and misuse errors
//! - [`parsing`]: source streams, the parser and deferred errors
//! - [`heap`]: the owning-thread isolate and error builtins
//! - [`messages`]: message templates shared by parser and builtins
//! - [`infrastructure`]: configuration and logging

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod dispatcher;
pub mod heap;
pub mod infrastructure;
pub mod messages;
pub mod parsing;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use dispatcher::{
    CompileJobStatus, CompilerDispatcherJob, JobError, JobId, JobResult, SourceKind,
};
pub use heap::{Exception, Handle, Isolate, IsolateId, JsFunction, Value};
pub use infrastructure::{ConfigError, DispatcherConfig, init_logging};
pub use messages::MessageTemplate;
pub use parsing::{ParseArtifact, PendingCompilationError, SourceStream};

/// Version of the compiler-dispatcher crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
