//! Error builtins
//!
//! The `Error` constructor, `Error.captureStackTrace` and
//! `Error.prototype.toString`, expressed over the [`Isolate`] model. These are
//! the only paths by which error objects are allocated; they must run on the
//! owning thread, which the `&mut Isolate` parameter guarantees.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::handle::Handle;
use super::isolate::{Exception, Isolate};
use super::objects::{JsFunction, JsObject, ObjectKind, PropertyDescriptor};
use super::value::Value;
use crate::messages::MessageTemplate;

/// The error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// `Error`
    Error,
    /// `SyntaxError`
    SyntaxError,
    /// `TypeError`
    TypeError,
    /// `RangeError`
    RangeError,
}

impl ErrorType {
    /// Constructor name, which is also the default `name` of instances.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::SyntaxError => "SyntaxError",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which frames to leave out of a captured stack trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSkipMode {
    /// Keep every frame.
    SkipNone,
    /// Drop frames up to and including the innermost frame of the function.
    SkipUntilSeen(Handle<JsFunction>),
}

/// `Error(message)`: allocates an error object of `kind`.
///
/// A `message` other than `undefined` is coerced to a string and stored as
/// an own, non-enumerable `message` property. A `stack` property is captured
/// from the isolate's current frames.
pub fn construct_error(isolate: &mut Isolate, kind: ErrorType, message: &Value) -> Handle<JsObject> {
    let object = isolate.new_error_object(kind);

    if !message.is_undefined() {
        let text = message.to_display(isolate);
        if let Some(error) = isolate.get_mut(object) {
            error.define_own_property("message", PropertyDescriptor::hidden(Value::String(text)));
        }
    }

    // A freshly allocated object has no non-configurable properties, so
    // installing the stack cannot fail.
    let _ = install_stack(isolate, object, FrameSkipMode::SkipNone);
    object
}

/// Formats `template` and throws a new error of its constructor type.
pub fn throw_new_error<S: AsRef<str>>(
    isolate: &mut Isolate,
    template: MessageTemplate,
    args: &[S],
) -> Exception {
    let message = template.format(args);
    let error = construct_error(isolate, template.error_type(), &Value::String(message));
    isolate.throw(Value::Object(error))
}

/// `Error.captureStackTrace(object, caller)`.
///
/// # Errors
///
/// Throws a `TypeError` when `object` is not an object, or when its `stack`
/// property exists and is not configurable.
pub fn capture_stack_trace(
    isolate: &mut Isolate,
    object: &Value,
    caller: Option<&Value>,
) -> Result<(), Exception> {
    let Value::Object(handle) = object else {
        let arg = object.to_display(isolate);
        return Err(throw_new_error(isolate, MessageTemplate::InvalidArgument, &[arg]));
    };

    let mode = match caller {
        Some(Value::Function(function)) => FrameSkipMode::SkipUntilSeen(*function),
        _ => FrameSkipMode::SkipNone,
    };

    install_stack(isolate, *handle, mode)
}

/// `Error.prototype.toString` with `receiver` as `this`.
///
/// # Errors
///
/// Throws a `TypeError` when the receiver is not an object.
pub fn error_to_string(isolate: &mut Isolate, receiver: &Value) -> Result<String, Exception> {
    match receiver {
        Value::Object(handle) => Ok(format_error_header(isolate, *handle)),
        other => {
            let arg = other.to_display(isolate);
            Err(throw_new_error(
                isolate,
                MessageTemplate::IncompatibleMethodReceiver,
                &["Error.prototype.toString", arg.as_str()],
            ))
        }
    }
}

fn format_error_header(isolate: &Isolate, handle: Handle<JsObject>) -> String {
    let Some(object) = isolate.get(handle) else {
        return ErrorType::Error.name().to_string();
    };

    let name = match object.get("name") {
        Some(Value::Undefined) | None => match object.kind() {
            ObjectKind::Error(kind) => kind.name().to_string(),
            ObjectKind::Plain => "Error".to_string(),
        },
        Some(value) => value.to_display(isolate),
    };
    let message = match object.get("message") {
        Some(Value::Undefined) | None => String::new(),
        Some(value) => value.to_display(isolate),
    };

    if name.is_empty() {
        message
    } else if message.is_empty() {
        name
    } else {
        format!("{name}: {message}")
    }
}

fn format_stack(isolate: &Isolate, object: Handle<JsObject>, mode: FrameSkipMode) -> String {
    let frames: Vec<Handle<JsFunction>> = match mode {
        FrameSkipMode::SkipNone => isolate.frames().collect(),
        FrameSkipMode::SkipUntilSeen(caller) => {
            let mut frames = isolate.frames().skip_while(|f| *f != caller);
            frames.next();
            frames.collect()
        }
    };

    let mut stack = format_error_header(isolate, object);
    for frame in frames.into_iter().take(isolate.stack_trace_limit()) {
        let name = isolate
            .function_name(frame)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "<anonymous>".to_string());
        stack.push_str("\n    at ");
        stack.push_str(&name);
    }
    stack
}

fn install_stack(
    isolate: &mut Isolate,
    object: Handle<JsObject>,
    mode: FrameSkipMode,
) -> Result<(), Exception> {
    let stack = format_stack(isolate, object, mode);
    trace!(frames = stack.lines().count().saturating_sub(1), "stack captured");

    let defined = isolate
        .get_mut(object)
        .is_some_and(|o| o.define_own_property("stack", PropertyDescriptor::hidden(Value::String(stack))));

    if defined {
        Ok(())
    } else {
        Err(throw_new_error(isolate, MessageTemplate::RedefineDisallowed, &["stack"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn message_of(isolate: &Isolate, value: &Value) -> Option<String> {
        let Value::Object(handle) = value else {
            return None;
        };
        match isolate.get(*handle)?.get("message")? {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_construct_error_with_message() {
        let mut isolate = Isolate::new();
        let error = construct_error(&mut isolate, ErrorType::SyntaxError, &Value::from("bad"));

        let object = isolate.get(error).unwrap();
        assert_eq!(object.kind(), ObjectKind::Error(ErrorType::SyntaxError));
        assert_eq!(object.get("message"), Some(&Value::from("bad")));
        let desc = object.own_property("message").unwrap();
        assert!(!desc.enumerable);
        assert!(desc.writable);
        assert!(desc.configurable);
    }

    #[test]
    fn test_construct_error_without_message() {
        let mut isolate = Isolate::new();
        let error = construct_error(&mut isolate, ErrorType::Error, &Value::Undefined);
        assert!(isolate.get(error).unwrap().get("message").is_none());
        assert_eq!(error_to_string(&mut isolate, &Value::Object(error)).unwrap(), "Error");
    }

    #[test]
    fn test_construct_error_coerces_message() {
        let mut isolate = Isolate::new();
        let error = construct_error(&mut isolate, ErrorType::RangeError, &Value::Number(7.0));
        assert_eq!(message_of(&isolate, &Value::Object(error)).as_deref(), Some("7"));
    }

    #[test]
    fn test_capture_stack_trace_rejects_non_object() {
        let mut isolate = Isolate::new();
        let result = capture_stack_trace(&mut isolate, &Value::Number(1.0), None);

        assert_eq!(result, Err(Exception));
        let pending = isolate.pending_exception().cloned().unwrap();
        assert_eq!(message_of(&isolate, &pending).as_deref(), Some("invalid_argument"));
        assert_eq!(
            error_to_string(&mut isolate, &pending).unwrap(),
            "TypeError: invalid_argument"
        );
    }

    #[test]
    fn test_capture_stack_trace_formats_frames() {
        let mut isolate = Isolate::new();
        let source = isolate.new_string_from_static_chars("");
        let outer = isolate.new_function_for_source("outer", source);
        let inner = isolate.new_function_for_source("inner", source);
        isolate.enter_function(outer);
        isolate.enter_function(inner);

        let object = isolate.new_object();
        capture_stack_trace(&mut isolate, &Value::Object(object), None).unwrap();

        let desc = isolate.get(object).unwrap().own_property("stack").unwrap().clone();
        assert_eq!(desc.value, Value::from("Error\n    at inner\n    at outer"));
        assert!(desc.writable);
        assert!(desc.configurable);
    }

    #[test]
    fn test_capture_stack_trace_skips_until_caller() {
        let mut isolate = Isolate::new();
        let source = isolate.new_string_from_static_chars("");
        let outer = isolate.new_function_for_source("outer", source);
        let inner = isolate.new_function_for_source("inner", source);
        isolate.enter_function(outer);
        isolate.enter_function(inner);

        let object = isolate.new_object();
        capture_stack_trace(&mut isolate, &Value::Object(object), Some(&Value::Function(inner)))
            .unwrap();

        let stack = isolate.get(object).unwrap().get("stack").cloned();
        assert_eq!(stack, Some(Value::from("Error\n    at outer")));
    }

    #[test]
    fn test_capture_stack_trace_honours_limit() {
        let mut isolate = Isolate::with_stack_trace_limit(1);
        let source = isolate.new_string_from_static_chars("");
        for name in ["a", "b", "c"] {
            let f = isolate.new_function_for_source(name, source);
            isolate.enter_function(f);
        }

        let object = isolate.new_object();
        capture_stack_trace(&mut isolate, &Value::Object(object), None).unwrap();
        let stack = isolate.get(object).unwrap().get("stack").cloned();
        assert_eq!(stack, Some(Value::from("Error\n    at c")));
    }

    #[test]
    fn test_capture_stack_trace_non_configurable_stack_throws() {
        let mut isolate = Isolate::new();
        let object = isolate.new_object();
        isolate.get_mut(object).unwrap().define_own_property(
            "stack",
            PropertyDescriptor {
                value: Value::Null,
                writable: false,
                enumerable: false,
                configurable: false,
            },
        );

        let result = capture_stack_trace(&mut isolate, &Value::Object(object), None);
        assert_eq!(result, Err(Exception));
        let pending = isolate.pending_exception().cloned().unwrap();
        assert_eq!(
            message_of(&isolate, &pending).as_deref(),
            Some("Cannot redefine property: stack")
        );
    }

    #[rstest]
    #[case(Some(Value::from("Custom")), Some(Value::from("boom")), "Custom: boom")]
    #[case(Some(Value::from("")), Some(Value::from("boom")), "boom")]
    #[case(Some(Value::from("Custom")), Some(Value::from("")), "Custom")]
    #[case(None, Some(Value::from("boom")), "Error: boom")]
    #[case(Some(Value::Undefined), None, "Error")]
    fn test_to_string_combinations(
        #[case] name: Option<Value>,
        #[case] message: Option<Value>,
        #[case] expected: &str,
    ) {
        let mut isolate = Isolate::new();
        let object = isolate.new_object();
        let target = isolate.get_mut(object).unwrap();
        if let Some(name) = name {
            target.define_own_property("name", PropertyDescriptor::hidden(name));
        }
        if let Some(message) = message {
            target.define_own_property("message", PropertyDescriptor::hidden(message));
        }

        assert_eq!(error_to_string(&mut isolate, &Value::Object(object)).unwrap(), expected);
    }

    #[test]
    fn test_to_string_incompatible_receiver() {
        let mut isolate = Isolate::new();
        let result = error_to_string(&mut isolate, &Value::Null);

        assert_eq!(result, Err(Exception));
        let pending = isolate.pending_exception().cloned().unwrap();
        assert_eq!(
            message_of(&isolate, &pending).as_deref(),
            Some("Method Error.prototype.toString called on incompatible receiver null")
        );
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::SyntaxError.to_string(), "SyntaxError");
    }
}
