//! The per-function compilation job.
//!
//! A job walks one function through the phases of background compilation.
//! Operations suffixed `_on_main_thread` take the [`Isolate`] they work on,
//! and since an isolate cannot leave its thread, holding the borrow is proof
//! of running on the owning thread. [`CompilerDispatcherJob::parse`] takes
//! no isolate: everything it reads was captured into a [`SourceStream`]
//! during preparation, and any failure is recorded as a
//! [`PendingCompilationError`] instead of a heap exception.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use super::errors::{JobError, JobResult};
use super::status::CompileJobStatus;
use crate::heap::{Handle, HeapString, Isolate, IsolateId, JsFunction, SharedFunctionInfo};
use crate::parsing::{self, ParseArtifact, PendingCompilationError, SourceStream};

/// Unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the function's source characters are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Embedder-owned one-byte buffer, independent of the collector
    ExternalBuffer,
    /// String allocated on the managed heap
    ManagedBuffer,
}

impl SourceKind {
    fn of(source: &HeapString) -> Self {
        if source.is_external() {
            Self::ExternalBuffer
        } else {
            Self::ManagedBuffer
        }
    }
}

/// Per-status payload. Each artifact exists only in the status that owns it.
#[derive(Debug)]
enum JobState {
    Initial,
    ReadyToParse(SourceStream),
    Parsed(Result<ParseArtifact, PendingCompilationError>),
    ReadyToCompile(ParseArtifact),
    Failed(PendingCompilationError),
    Done,
}

impl JobState {
    fn status(&self) -> CompileJobStatus {
        match self {
            Self::Initial => CompileJobStatus::Initial,
            Self::ReadyToParse(_) => CompileJobStatus::ReadyToParse,
            Self::Parsed(_) => CompileJobStatus::Parsed,
            Self::ReadyToCompile(_) => CompileJobStatus::ReadyToCompile,
            Self::Failed(_) => CompileJobStatus::Failed,
            Self::Done => CompileJobStatus::Done,
        }
    }
}

/// Compilation state for one function.
///
/// The job is `Send` so a scheduler can hand it to a worker for
/// [`parse`](Self::parse); it holds no locks, and callers must not run two
/// operations on the same job at once. A failed operation returns a
/// [`JobError`] and leaves the job exactly as it was.
#[derive(Debug)]
pub struct CompilerDispatcherJob {
    id: JobId,
    isolate_id: IsolateId,
    owner_thread: ThreadId,
    function: Handle<JsFunction>,
    function_name: String,
    source_kind: SourceKind,
    max_stack_size: usize,
    state: JobState,
}

fn resolve_source<'a>(
    isolate: &'a Isolate,
    function: Handle<JsFunction>,
) -> JobResult<(&'a SharedFunctionInfo, &'a HeapString)> {
    let shared = isolate
        .get(function)
        .and_then(|f| isolate.get(f.shared))
        .ok_or(JobError::NotAFunction)?;
    let source = shared
        .script
        .and_then(|script| isolate.get(script))
        .and_then(|script| isolate.get(script.source))
        .ok_or_else(|| JobError::MissingScript {
            function: isolate.function_name(function).unwrap_or_default(),
        })?;
    Ok((shared, source))
}

impl CompilerDispatcherJob {
    /// Creates a job for `function` whose parser may use `max_stack_size` KiB
    /// of stack.
    ///
    /// # Errors
    ///
    /// [`JobError::NotAFunction`] if the handle does not resolve on `isolate`,
    /// [`JobError::MissingScript`] if the function has no script source.
    pub fn new(
        isolate: &Isolate,
        function: Handle<JsFunction>,
        max_stack_size: usize,
    ) -> JobResult<Self> {
        let (_, source) = resolve_source(isolate, function)?;
        let job = Self {
            id: JobId::new(),
            isolate_id: isolate.id(),
            owner_thread: thread::current().id(),
            function,
            function_name: isolate.function_name(function).unwrap_or_default(),
            source_kind: SourceKind::of(source),
            max_stack_size,
            state: JobState::Initial,
        };
        debug!(
            job = %job.id,
            function = %job.function_name,
            source_kind = ?job.source_kind,
            max_stack_size,
            "compile job created"
        );
        Ok(job)
    }

    /// Job identifier.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> CompileJobStatus {
        self.state.status()
    }

    /// The function being compiled.
    #[must_use]
    pub fn function(&self) -> Handle<JsFunction> {
        self.function
    }

    /// Name of the function, empty if anonymous.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Isolate the job was created against.
    #[must_use]
    pub fn isolate_id(&self) -> IsolateId {
        self.isolate_id
    }

    /// Parser stack limit in KiB.
    #[must_use]
    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// Storage of the source characters, fixed at construction.
    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    /// Returns true if [`parse`](Self::parse) may run off the owning thread.
    ///
    /// Only embedder-owned buffers qualify; a managed string may be moved
    /// or freed by the collector while a worker reads it.
    #[must_use]
    pub fn can_parse_on_background_thread(&self) -> bool {
        self.source_kind == SourceKind::ExternalBuffer
    }

    /// The parse artifact, present from a successful parse until reset.
    #[must_use]
    pub fn parse_artifact(&self) -> Option<&ParseArtifact> {
        match &self.state {
            JobState::Parsed(Ok(artifact)) | JobState::ReadyToCompile(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// The recorded syntax error, present only while the job is `Failed`.
    #[must_use]
    pub fn pending_error(&self) -> Option<&PendingCompilationError> {
        match &self.state {
            JobState::Failed(error) => Some(error),
            _ => None,
        }
    }

    fn invalid_status(&self, operation: &'static str) -> JobError {
        JobError::InvalidStatus {
            operation,
            actual: self.status(),
        }
    }

    fn check_isolate(&self, operation: &'static str, isolate: &Isolate) -> JobResult {
        if isolate.id() == self.isolate_id {
            Ok(())
        } else {
            Err(JobError::ForeignIsolate {
                operation,
                expected: self.isolate_id,
                actual: isolate.id(),
            })
        }
    }

    fn advance(&mut self, from: CompileJobStatus, next: JobState) {
        let to = next.status();
        debug_assert!(from.can_advance_to(to), "illegal transition {from} -> {to}");
        debug!(
            job = %self.id,
            function = %self.function_name,
            %from,
            %to,
            "compile job transition"
        );
        self.state = next;
    }

    /// Resolves the function's source range and captures it for parsing.
    ///
    /// # Errors
    ///
    /// [`JobError::InvalidStatus`] unless `Initial`,
    /// [`JobError::ForeignIsolate`] for another isolate,
    /// [`JobError::MissingScript`] if the script was detached since
    /// construction.
    pub fn prepare_to_parse_on_main_thread(&mut self, isolate: &Isolate) -> JobResult {
        const OPERATION: &str = "prepare";
        self.check_isolate(OPERATION, isolate)?;
        if self.status() != CompileJobStatus::Initial {
            return Err(self.invalid_status(OPERATION));
        }

        let (shared, source) = resolve_source(isolate, self.function)?;
        let range = shared.start_position..shared.end_position;
        let stream = match source {
            HeapString::ExternalOneByte(resource) => {
                SourceStream::external(Arc::clone(resource), range)
            }
            HeapString::Sequential(text) => SourceStream::managed(Arc::clone(text), range),
        };
        trace!(
            job = %self.id,
            start = stream.start(),
            end = stream.end(),
            external = stream.is_external(),
            "source range captured"
        );

        self.advance(CompileJobStatus::Initial, JobState::ReadyToParse(stream));
        Ok(())
    }

    /// Parses the captured source range.
    ///
    /// Runs on a worker thread only when
    /// [`can_parse_on_background_thread`](Self::can_parse_on_background_thread)
    /// holds. Always ends in `Parsed`; a syntax error is recorded and only
    /// surfaces at finalization.
    ///
    /// # Errors
    ///
    /// [`JobError::InvalidStatus`] unless `ReadyToParse`.
    pub fn parse(&mut self) -> JobResult {
        let JobState::ReadyToParse(stream) = &self.state else {
            return Err(self.invalid_status("parse"));
        };
        debug_assert!(
            self.can_parse_on_background_thread() || thread::current().id() == self.owner_thread,
            "managed source parsed off the owning thread"
        );

        trace!(job = %self.id, length = stream.len(), "parsing");
        let result = parsing::parse(stream, self.max_stack_size);
        match &result {
            Ok(artifact) => {
                trace!(job = %self.id, nodes = artifact.node_count(), "parse succeeded");
            }
            Err(error) => {
                debug!(job = %self.id, %error, "syntax error recorded");
            }
        }

        self.advance(CompileJobStatus::ReadyToParse, JobState::Parsed(result));
        Ok(())
    }

    /// Promotes the parse outcome to `ReadyToCompile` or `Failed`.
    ///
    /// Nothing is thrown on failure; see
    /// [`report_errors_on_main_thread`](Self::report_errors_on_main_thread).
    ///
    /// # Errors
    ///
    /// [`JobError::InvalidStatus`] unless `Parsed`,
    /// [`JobError::ForeignIsolate`] for another isolate.
    pub fn finalize_parsing_on_main_thread(&mut self, isolate: &Isolate) -> JobResult {
        const OPERATION: &str = "finalize";
        self.check_isolate(OPERATION, isolate)?;

        let next = match std::mem::replace(&mut self.state, JobState::Initial) {
            JobState::Parsed(Ok(artifact)) => JobState::ReadyToCompile(artifact),
            JobState::Parsed(Err(error)) => JobState::Failed(error),
            other => {
                self.state = other;
                return Err(self.invalid_status(OPERATION));
            }
        };

        self.advance(CompileJobStatus::Parsed, next);
        Ok(())
    }

    /// Discards all artifacts and returns the job to `Initial`.
    ///
    /// Accepted from any status except `Done`, so an aborted job can be
    /// recycled. A background parse must finish before its job is reset.
    ///
    /// # Errors
    ///
    /// [`JobError::InvalidStatus`] when `Done`,
    /// [`JobError::ForeignIsolate`] for another isolate.
    pub fn reset_on_main_thread(&mut self, isolate: &Isolate) -> JobResult {
        const OPERATION: &str = "reset";
        self.check_isolate(OPERATION, isolate)?;
        let from = self.status();
        if from.is_terminal() {
            return Err(self.invalid_status(OPERATION));
        }

        self.advance(from, JobState::Initial);
        Ok(())
    }

    /// Throws the recorded syntax error on `isolate` and moves to `Done`.
    ///
    /// This is the only operation that allocates on the heap for a failed
    /// job.
    ///
    /// # Errors
    ///
    /// [`JobError::InvalidStatus`] unless `Failed`,
    /// [`JobError::ForeignIsolate`] for another isolate.
    pub fn report_errors_on_main_thread(&mut self, isolate: &mut Isolate) -> JobResult {
        const OPERATION: &str = "report errors of";
        self.check_isolate(OPERATION, isolate)?;
        let JobState::Failed(error) = &self.state else {
            return Err(self.invalid_status(OPERATION));
        };

        debug!(job = %self.id, message = %error.message(), "reporting syntax error");
        let _thrown = error.throw_on(isolate);

        self.advance(CompileJobStatus::Failed, JobState::Done);
        Ok(())
    }
}
