//! Tagged values passed to and returned from builtins.

use super::handle::Handle;
use super::isolate::Isolate;
use super::objects::{JsFunction, JsObject, ObjectKind};

/// A script-visible value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// A boolean
    Boolean(bool),
    /// A number
    Number(f64),
    /// A string
    String(String),
    /// An ordinary or error object
    Object(Handle<JsObject>),
    /// A function
    Function(Handle<JsFunction>),
}

impl Value {
    /// Returns true for `undefined`.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Converts the value to the text used for string coercion and message
    /// arguments.
    #[must_use]
    pub fn to_display(&self, isolate: &Isolate) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.clone(),
            Self::Object(handle) => match isolate.get(*handle).map(JsObject::kind) {
                Some(ObjectKind::Error(kind)) => format!("#<{kind}>"),
                _ => "#<Object>".to_string(),
            },
            Self::Function(handle) => {
                let name = isolate.function_name(*handle).unwrap_or_default();
                format!("function {name}() {{ [native code] }}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
