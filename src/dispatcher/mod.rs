//! Background compilation jobs
//!
//! A [`CompilerDispatcherJob`] carries one function through
//! prepare → parse → finalize, and then either reset or error reporting.
//! The scheduler deciding where each step runs lives outside this crate;
//! the job only says whether its parse may leave the owning thread.

mod errors;
mod job;
mod status;


pub use errors::{JobError, JobResult};
pub use job::{CompilerDispatcherJob, JobId, SourceKind};
pub use status::CompileJobStatus;
