//! The owning-thread context.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::builtins::ErrorType;
use super::handle::Handle;
use super::objects::{
    ExternalOneByteResource, HeapKind, HeapObject, HeapString, JsFunction, JsObject, ObjectKind,
    Script, SharedFunctionInfo,
};
use super::value::Value;

/// Default number of frames captured into a `stack` property.
pub const DEFAULT_STACK_TRACE_LIMIT: usize = 10;

static NEXT_ISOLATE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identifier of an isolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IsolateId(u32);

impl fmt::Display for IsolateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "isolate-{}", self.0)
    }
}

/// Marker returned by operations that threw.
///
/// The thrown value is pending on the isolate; this type carries nothing
/// itself so it can be returned through `?` cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exception;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("exception pending on isolate")
    }
}

impl std::error::Error for Exception {}

/// The managed heap and everything bound to the thread that owns it.
///
/// An `Isolate` is neither `Send` nor `Sync`. Code holding only a
/// [`Handle`] therefore cannot read or mutate heap objects from another
/// thread; every heap access goes through a borrow of the isolate.
#[derive(Debug)]
pub struct Isolate {
    id: IsolateId,
    heap: Vec<HeapObject>,
    pending_exception: Option<Value>,
    frames: Vec<Handle<JsFunction>>,
    stack_trace_limit: usize,
    _owning_thread: PhantomData<*const ()>,
}

impl Isolate {
    /// Creates an empty isolate bound to the current thread.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stack_trace_limit(DEFAULT_STACK_TRACE_LIMIT)
    }

    /// Creates an isolate capturing at most `limit` frames per stack trace.
    #[must_use]
    pub fn with_stack_trace_limit(limit: usize) -> Self {
        let id = IsolateId(NEXT_ISOLATE_ID.fetch_add(1, Ordering::Relaxed));
        trace!(%id, "isolate created");
        Self {
            id,
            heap: Vec::new(),
            pending_exception: None,
            frames: Vec::new(),
            stack_trace_limit: limit,
            _owning_thread: PhantomData,
        }
    }

    /// Returns the isolate identifier.
    #[must_use]
    pub fn id(&self) -> IsolateId {
        self.id
    }

    /// Maximum number of frames captured into a `stack` property.
    #[must_use]
    pub fn stack_trace_limit(&self) -> usize {
        self.stack_trace_limit
    }

    fn allocate<T: HeapKind>(&mut self, value: T) -> Handle<T> {
        let handle = Handle::new(self.heap.len());
        self.heap.push(value.into_object());
        handle
    }

    /// Dereferences a handle.
    ///
    /// Returns `None` for handles allocated by another isolate that do not
    /// resolve to an object of the expected kind here.
    #[must_use]
    pub fn get<T: HeapKind>(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.heap.get(handle.index())?;
        let value = T::from_object(slot);
        if value.is_none() {
            trace!(isolate = %self.id, ?handle, expected = T::NAME, "handle kind mismatch");
        }
        value
    }

    /// Mutably dereferences a handle.
    pub fn get_mut<T: HeapKind>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.heap.get_mut(handle.index()).and_then(T::from_object_mut)
    }

    // Factory

    /// Allocates a managed string.
    pub fn new_string_from_static_chars(&mut self, text: &str) -> Handle<HeapString> {
        self.allocate(HeapString::Sequential(Arc::from(text)))
    }

    /// Allocates a string whose characters stay owned by the embedder.
    pub fn new_external_string_from_one_byte(
        &mut self,
        resource: Arc<dyn ExternalOneByteResource>,
    ) -> Handle<HeapString> {
        self.allocate(HeapString::ExternalOneByte(resource))
    }

    /// Allocates a script over `source`.
    pub fn new_script(&mut self, source: Handle<HeapString>) -> Handle<Script> {
        self.allocate(Script { source })
    }

    /// Allocates function metadata with an empty source range and no script.
    pub fn new_shared_function_info(
        &mut self,
        name: Handle<HeapString>,
    ) -> Handle<SharedFunctionInfo> {
        self.allocate(SharedFunctionInfo {
            name,
            script: None,
            start_position: 0,
            end_position: 0,
        })
    }

    /// Attaches `script` to `shared`.
    pub fn set_script(&mut self, shared: Handle<SharedFunctionInfo>, script: Handle<Script>) {
        if let Some(info) = self.get_mut(shared) {
            info.script = Some(script);
        }
    }

    /// Sets the exclusive end of the function's source range.
    pub fn set_end_position(&mut self, shared: Handle<SharedFunctionInfo>, end: usize) {
        if let Some(info) = self.get_mut(shared) {
            info.end_position = end;
        }
    }

    /// Allocates a function for `shared`.
    pub fn new_function_from_shared_function_info(
        &mut self,
        shared: Handle<SharedFunctionInfo>,
    ) -> Handle<JsFunction> {
        self.allocate(JsFunction { shared })
    }

    /// Allocates a named function whose source range covers all of `source`.
    pub fn new_function_for_source(
        &mut self,
        name: &str,
        source: Handle<HeapString>,
    ) -> Handle<JsFunction> {
        let length = self.get(source).map_or(0, HeapString::len);
        let script = self.new_script(source);
        let name = self.new_string_from_static_chars(name);
        let shared = self.new_shared_function_info(name);
        self.set_script(shared, script);
        self.set_end_position(shared, length);
        self.new_function_from_shared_function_info(shared)
    }

    /// Allocates an empty ordinary object.
    pub fn new_object(&mut self) -> Handle<JsObject> {
        self.allocate(JsObject::new(ObjectKind::Plain))
    }

    pub(crate) fn new_error_object(&mut self, kind: ErrorType) -> Handle<JsObject> {
        self.allocate(JsObject::new(ObjectKind::Error(kind)))
    }

    /// Returns the function's name, if it resolves.
    #[must_use]
    pub fn function_name(&self, function: Handle<JsFunction>) -> Option<String> {
        let shared = self.get(self.get(function)?.shared)?;
        Some(self.get(shared.name)?.to_rust_string())
    }

    // Exceptions

    /// Installs `value` as the pending exception.
    pub fn throw(&mut self, value: Value) -> Exception {
        trace!(isolate = %self.id, "exception thrown");
        self.pending_exception = Some(value);
        Exception
    }

    /// Returns true if an exception is pending.
    #[must_use]
    pub fn has_pending_exception(&self) -> bool {
        self.pending_exception.is_some()
    }

    /// Returns the pending exception.
    #[must_use]
    pub fn pending_exception(&self) -> Option<&Value> {
        self.pending_exception.as_ref()
    }

    /// Removes and returns the pending exception.
    pub fn clear_pending_exception(&mut self) -> Option<Value> {
        self.pending_exception.take()
    }

    // Call stack

    /// Pushes a frame for `function`.
    pub fn enter_function(&mut self, function: Handle<JsFunction>) {
        self.frames.push(function);
    }

    /// Pops the innermost frame.
    pub fn leave_function(&mut self) -> Option<Handle<JsFunction>> {
        self.frames.pop()
    }

    /// Active frames, innermost first.
    pub fn frames(&self) -> impl Iterator<Item = Handle<JsFunction>> + '_ {
        self.frames.iter().rev().copied()
    }
}

impl Default for Isolate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::StaticOneByteResource;

    #[test]
    fn test_isolate_ids_are_unique() {
        let a = Isolate::new();
        let b = Isolate::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_new_function_for_source_covers_whole_source() {
        let mut isolate = Isolate::new();
        let source = isolate.new_string_from_static_chars("source");
        let function = isolate.new_function_for_source("f", source);

        let shared = isolate.get(function).map(|f| f.shared).unwrap();
        let info = isolate.get(shared).unwrap();
        assert_eq!(info.start_position, 0);
        assert_eq!(info.end_position, 6);
        assert!(info.script.is_some());
        assert_eq!(isolate.function_name(function).as_deref(), Some("f"));
    }

    #[test]
    fn test_handle_kind_mismatch_resolves_to_none() {
        let mut isolate = Isolate::new();
        let string = isolate.new_string_from_static_chars("x");
        let as_script: Handle<Script> = Handle::new(string.index());
        assert!(isolate.get(as_script).is_none());
    }

    #[test]
    fn test_external_string_allocation() {
        let mut isolate = Isolate::new();
        let resource = Arc::new(StaticOneByteResource::new(b"script"));
        let string = isolate.new_external_string_from_one_byte(resource);
        assert!(isolate.get(string).unwrap().is_external());
    }

    #[test]
    fn test_pending_exception_lifecycle() {
        let mut isolate = Isolate::new();
        assert!(!isolate.has_pending_exception());

        let _ = isolate.throw(Value::Number(1.0));
        assert!(isolate.has_pending_exception());
        assert_eq!(isolate.pending_exception(), Some(&Value::Number(1.0)));

        assert_eq!(isolate.clear_pending_exception(), Some(Value::Number(1.0)));
        assert!(!isolate.has_pending_exception());
    }

    #[test]
    fn test_frames_are_innermost_first() {
        let mut isolate = Isolate::new();
        let source = isolate.new_string_from_static_chars("");
        let outer = isolate.new_function_for_source("outer", source);
        let inner = isolate.new_function_for_source("inner", source);

        isolate.enter_function(outer);
        isolate.enter_function(inner);
        assert_eq!(isolate.frames().collect::<Vec<_>>(), vec![inner, outer]);

        assert_eq!(isolate.leave_function(), Some(inner));
        assert_eq!(isolate.frames().count(), 1);
    }
}
