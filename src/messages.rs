//! Message templates
//!
//! Templates are identified by a plain enum so they can be recorded on any
//! thread. Formatting substitutes each `%` in the template text with the next
//! argument, in order. Missing arguments format as the empty string.

use serde::{Deserialize, Serialize};

use crate::heap::ErrorType;

/// Maximum number of arguments a template accepts.
pub const MAX_MESSAGE_ARGS: usize = 3;

/// Identifier of a user-visible error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTemplate {
    /// A punctuator or keyword where none was expected.
    UnexpectedToken,
    /// An identifier where none was expected.
    UnexpectedTokenIdentifier,
    /// A numeric literal where none was expected.
    UnexpectedTokenNumber,
    /// A string literal where none was expected.
    UnexpectedTokenString,
    /// Input ended in the middle of a production.
    UnexpectedEos,
    /// A character sequence that does not form a token.
    InvalidOrUnexpectedToken,
    /// Assignment to something that is not a reference.
    InvalidLhsInAssignment,
    /// Recursion exceeded the parser's stack budget.
    StackOverflow,
    /// A builtin received an argument of the wrong kind.
    InvalidArgument,
    /// A method was called on a receiver of the wrong kind.
    IncompatibleMethodReceiver,
    /// A non-configurable property could not be redefined.
    RedefineDisallowed,
}

impl MessageTemplate {
    /// The template text with `%` placeholders.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::UnexpectedToken => "Unexpected token '%'",
            Self::UnexpectedTokenIdentifier => "Unexpected identifier '%'",
            Self::UnexpectedTokenNumber => "Unexpected number",
            Self::UnexpectedTokenString => "Unexpected string",
            Self::UnexpectedEos => "Unexpected end of input",
            Self::InvalidOrUnexpectedToken => "Invalid or unexpected token",
            Self::InvalidLhsInAssignment => "Invalid left-hand side in assignment",
            Self::StackOverflow => "Maximum call stack size exceeded",
            Self::InvalidArgument => "invalid_argument",
            Self::IncompatibleMethodReceiver => "Method % called on incompatible receiver %",
            Self::RedefineDisallowed => "Cannot redefine property: %",
        }
    }

    /// The constructor used when the message is thrown.
    #[must_use]
    pub const fn error_type(self) -> ErrorType {
        match self {
            Self::UnexpectedToken
            | Self::UnexpectedTokenIdentifier
            | Self::UnexpectedTokenNumber
            | Self::UnexpectedTokenString
            | Self::UnexpectedEos
            | Self::InvalidOrUnexpectedToken
            | Self::InvalidLhsInAssignment => ErrorType::SyntaxError,
            Self::StackOverflow => ErrorType::RangeError,
            Self::InvalidArgument
            | Self::IncompatibleMethodReceiver
            | Self::RedefineDisallowed => ErrorType::TypeError,
        }
    }

    /// Substitutes `args` into the template text.
    #[must_use]
    pub fn format<S: AsRef<str>>(self, args: &[S]) -> String {
        let text = self.text();
        let mut out = String::with_capacity(text.len());
        let mut args = args.iter().take(MAX_MESSAGE_ARGS);

        for ch in text.chars() {
            if ch == '%' {
                if let Some(arg) = args.next() {
                    out.push_str(arg.as_ref());
                }
            } else {
                out.push(ch);
            }
        }
        out
    }
}
