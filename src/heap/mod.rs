//! Owning-thread heap model
//!
//! The function and script metadata a compilation job reads, the
//! pending-exception slot it reports into, and the error builtins used to
//! materialize deferred errors. All of it is reachable only through an
//! [`Isolate`], which never leaves the thread that created it.

pub mod builtins;
mod handle;
mod isolate;
mod objects;
mod value;

pub use builtins::{
    ErrorType, FrameSkipMode, capture_stack_trace, construct_error, error_to_string,
    throw_new_error,
};
pub use handle::Handle;
pub use isolate::{DEFAULT_STACK_TRACE_LIMIT, Exception, Isolate, IsolateId};
pub use objects::{
    ExternalOneByteResource, HeapKind, HeapObject, HeapString, JsFunction, JsObject, ObjectKind,
    PropertyDescriptor, Script, SharedFunctionInfo, StaticOneByteResource,
};
pub use value::Value;
