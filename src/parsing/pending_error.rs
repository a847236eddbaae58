//! Deferred compilation errors.

use std::fmt;
use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use crate::heap::{Exception, Isolate, Value, construct_error};
use crate::messages::{MAX_MESSAGE_ARGS, MessageTemplate};

/// A parse failure captured as plain data.
///
/// Recording one allocates nothing on the managed heap, so it may happen on a
/// worker thread. It only becomes an exception object when
/// [`throw_on`](Self::throw_on) runs on the owning thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingCompilationError {
    template: MessageTemplate,
    args: [Option<String>; MAX_MESSAGE_ARGS],
    start_position: usize,
    end_position: usize,
}

impl PendingCompilationError {
    /// Records `template` at the given source span.
    #[must_use]
    pub fn new(template: MessageTemplate, location: Range<usize>) -> Self {
        Self {
            template,
            args: Default::default(),
            start_position: location.start,
            end_position: location.end,
        }
    }

    /// Appends a formatting argument. Arguments past the template limit are
    /// dropped.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(slot) = self.args.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(arg.into());
        }
        self
    }

    /// The message template.
    #[must_use]
    pub fn template(&self) -> MessageTemplate {
        self.template
    }

    /// Formatting arguments in order.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map_while(Option::as_deref)
    }

    /// Absolute source span the error refers to.
    #[must_use]
    pub fn location(&self) -> Range<usize> {
        self.start_position..self.end_position
    }

    /// The formatted message text.
    #[must_use]
    pub fn message(&self) -> String {
        let args: Vec<&str> = self.args().collect();
        self.template.format(&args)
    }

    /// Allocates the error object and installs it as the pending exception.
    pub fn throw_on(&self, isolate: &mut Isolate) -> Exception {
        let message = self.message();
        debug!(
            template = ?self.template,
            start = self.start_position,
            end = self.end_position,
            %message,
            "materializing compilation error"
        );
        let error = construct_error(isolate, self.template.error_type(), &Value::String(message));
        isolate.throw(Value::Object(error))
    }
}

impl fmt::Display for PendingCompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.template.error_type(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{ErrorType, ObjectKind, error_to_string};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_and_format() {
        let error = PendingCompilationError::new(MessageTemplate::UnexpectedToken, 0..1).with_arg("^");
        assert_eq!(error.message(), "Unexpected token '^'");
        assert_eq!(error.location(), 0..1);
        assert_eq!(error.args().collect::<Vec<_>>(), vec!["^"]);
        assert_eq!(error.to_string(), "SyntaxError: Unexpected token '^'");
    }

    #[test]
    fn test_extra_args_are_dropped() {
        let error = PendingCompilationError::new(MessageTemplate::UnexpectedToken, 0..0)
            .with_arg("a")
            .with_arg("b")
            .with_arg("c")
            .with_arg("d");
        assert_eq!(error.args().count(), MAX_MESSAGE_ARGS);
    }

    #[test]
    fn test_is_plain_data() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<PendingCompilationError>();
    }

    #[test]
    fn test_throw_on_installs_pending_exception() {
        let mut isolate = Isolate::new();
        let error = PendingCompilationError::new(MessageTemplate::UnexpectedEos, 3..3);

        assert!(!isolate.has_pending_exception());
        let _ = error.throw_on(&mut isolate);

        let pending = isolate.pending_exception().cloned().unwrap();
        let Value::Object(handle) = &pending else {
            panic!("expected an error object");
        };
        assert_eq!(
            isolate.get(*handle).unwrap().kind(),
            ObjectKind::Error(ErrorType::SyntaxError)
        );
        assert_eq!(
            error_to_string(&mut isolate, &pending).unwrap(),
            "SyntaxError: Unexpected end of input"
        );
    }
}
