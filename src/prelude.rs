//! Prelude module for common imports

// Job types
pub use crate::dispatcher::{
    CompileJobStatus, CompilerDispatcherJob, JobError, JobId, JobResult, SourceKind,
};

// Heap types
pub use crate::heap::{
    ErrorType, Exception, ExternalOneByteResource, Handle, HeapString, Isolate, IsolateId,
    JsFunction, JsObject, StaticOneByteResource, Value, error_to_string,
};

// Parsing types
pub use crate::messages::MessageTemplate;
pub use crate::parsing::{ParseArtifact, PendingCompilationError, SourceStream};

// Configuration
pub use crate::infrastructure::{DispatcherConfig, init_logging};
