//! Error types for job operations
//!
//! These report misuse of a job by its caller. Syntax errors in the parsed
//! source are not among them: those are recorded on the job as data.

use thiserror::Error;

use super::status::CompileJobStatus;
use crate::heap::IsolateId;

/// Contract violations detected by a compilation job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Operation invoked in a status that does not allow it
    #[error("Cannot {operation} a job in status '{actual}'")]
    InvalidStatus {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Status the job was in.
        actual: CompileJobStatus,
    },

    /// Main-thread operation invoked with an isolate other than the job's
    #[error("Cannot {operation} on {actual}: job belongs to {expected}")]
    ForeignIsolate {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Isolate the job was created against.
        expected: IsolateId,
        /// Isolate that was passed in.
        actual: IsolateId,
    },

    /// The handle given at construction does not resolve to a function
    #[error("Handle does not refer to a function")]
    NotAFunction,

    /// The function's metadata has no script or source attached
    #[error("Function '{function}' has no script source")]
    MissingScript {
        /// Function name, empty if anonymous.
        function: String,
    },
}

/// Result type for job operations
pub type JobResult<T = ()> = Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = JobError::InvalidStatus {
            operation: "parse",
            actual: CompileJobStatus::Initial,
        };
        assert_eq!(err.to_string(), "Cannot parse a job in status 'initial'");

        let err = JobError::MissingScript {
            function: "f".into(),
        };
        assert_eq!(err.to_string(), "Function 'f' has no script source");
    }
}
