//! Heap object kinds
//!
//! Everything the dispatcher reads about a function lives here: the source
//! string, the script that owns it, the shared function info carrying the
//! source range, and the function itself. Error objects are plain
//! [`JsObject`]s with an [`ObjectKind::Error`] tag.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::builtins::ErrorType;
use super::handle::Handle;
use super::value::Value;

/// Source text supplied by the embedder.
///
/// The bytes live outside the managed heap and are never moved or collected
/// by it, so they may be read from any thread for as long as the resource
/// is alive.
pub trait ExternalOneByteResource: Send + Sync + fmt::Debug {
    /// The one-byte (Latin-1) character data.
    fn data(&self) -> &[u8];

    /// Number of characters in the resource.
    fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns true if the resource holds no characters.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An [`ExternalOneByteResource`] backed by static or owned bytes.
#[derive(Debug, Clone)]
pub struct StaticOneByteResource {
    data: Cow<'static, [u8]>,
}

impl StaticOneByteResource {
    /// Wraps a static byte slice without copying it.
    #[must_use]
    pub const fn new(data: &'static [u8]) -> Self {
        Self {
            data: Cow::Borrowed(data),
        }
    }

    /// Takes ownership of a byte buffer.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data: Cow::Owned(data),
        }
    }
}

impl ExternalOneByteResource for StaticOneByteResource {
    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A string object.
#[derive(Debug, Clone)]
pub enum HeapString {
    /// Characters stored in the managed heap.
    Sequential(Arc<str>),
    /// Characters owned by the embedder.
    ExternalOneByte(Arc<dyn ExternalOneByteResource>),
}

impl HeapString {
    /// Returns true if the characters are owned by the embedder.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalOneByte(_))
    }

    /// Length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Sequential(text) => text.chars().count(),
            Self::ExternalOneByte(resource) => resource.len(),
        }
    }

    /// Returns true if the string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the characters out, decoding one-byte data as Latin-1.
    #[must_use]
    pub fn to_rust_string(&self) -> String {
        match self {
            Self::Sequential(text) => text.to_string(),
            Self::ExternalOneByte(resource) => {
                resource.data().iter().copied().map(char::from).collect()
            }
        }
    }
}

/// A script: the unit of source text functions are carved out of.
#[derive(Debug, Clone)]
pub struct Script {
    /// The complete source string.
    pub source: Handle<HeapString>,
}

/// Per-function metadata shared by every closure of the same function.
#[derive(Debug, Clone)]
pub struct SharedFunctionInfo {
    /// Function name.
    pub name: Handle<HeapString>,
    /// Owning script, if one has been attached.
    pub script: Option<Handle<Script>>,
    /// First character of the function's source range.
    pub start_position: usize,
    /// One past the last character of the function's source range.
    pub end_position: usize,
}

/// A function object.
#[derive(Debug, Clone)]
pub struct JsFunction {
    /// Metadata for this function.
    pub shared: Handle<SharedFunctionInfo>,
}

/// Attributes and value of an own property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Property value
    pub value: Value,
    /// Whether assignment may change the value
    pub writable: bool,
    /// Whether the property shows up in enumeration
    pub enumerable: bool,
    /// Whether the property may be redefined or deleted
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// A writable, configurable, non-enumerable data property.
    #[must_use]
    pub fn hidden(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }
}

/// What an object was constructed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// An ordinary object.
    Plain,
    /// An instance of one of the error constructors.
    Error(ErrorType),
}

/// An ordinary object with insertion-ordered own properties.
#[derive(Debug, Clone)]
pub struct JsObject {
    kind: ObjectKind,
    properties: Vec<(String, PropertyDescriptor)>,
}

impl JsObject {
    pub(crate) fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
        }
    }

    /// Returns what the object was constructed as.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Looks up an own property descriptor.
    #[must_use]
    pub fn own_property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, desc)| desc)
    }

    /// Looks up an own property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.own_property(key).map(|desc| &desc.value)
    }

    /// Defines or redefines an own property.
    ///
    /// Returns false, leaving the object untouched, when an existing
    /// property is non-configurable.
    pub fn define_own_property(&mut self, key: &str, desc: PropertyDescriptor) -> bool {
        match self.properties.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) if !existing.configurable => *existing == desc,
            Some((_, existing)) => {
                *existing = desc;
                true
            }
            None => {
                self.properties.push((key.to_string(), desc));
                true
            }
        }
    }
}

/// A slot in the isolate's arena.
#[derive(Debug, Clone)]
pub enum HeapObject {
    /// String
    String(HeapString),
    /// Script
    Script(Script),
    /// Shared function info
    SharedFunctionInfo(SharedFunctionInfo),
    /// Function
    Function(JsFunction),
    /// Ordinary or error object
    Object(JsObject),
}

/// Typed projection out of a [`HeapObject`].
pub trait HeapKind: Sized {
    /// Human-readable kind name.
    const NAME: &'static str;

    /// Wraps the value into an arena slot.
    fn into_object(self) -> HeapObject;

    /// Borrows the value if the slot holds this kind.
    fn from_object(object: &HeapObject) -> Option<&Self>;

    /// Mutably borrows the value if the slot holds this kind.
    fn from_object_mut(object: &mut HeapObject) -> Option<&mut Self>;
}

macro_rules! heap_kind {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl HeapKind for $ty {
            const NAME: &'static str = $name;

            fn into_object(self) -> HeapObject {
                HeapObject::$variant(self)
            }

            fn from_object(object: &HeapObject) -> Option<&Self> {
                match object {
                    HeapObject::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_object_mut(object: &mut HeapObject) -> Option<&mut Self> {
                match object {
                    HeapObject::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

heap_kind!(HeapString, String, "string");
heap_kind!(Script, Script, "script");
heap_kind!(SharedFunctionInfo, SharedFunctionInfo, "shared function info");
heap_kind!(JsFunction, Function, "function");
heap_kind!(JsObject, Object, "object");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_string_is_external() {
        let resource = Arc::new(StaticOneByteResource::new(b"script"));
        let string = HeapString::ExternalOneByte(resource);
        assert!(string.is_external());
        assert_eq!(string.len(), 6);
        assert_eq!(string.to_rust_string(), "script");
    }

    #[test]
    fn test_sequential_string_counts_chars() {
        let string = HeapString::Sequential(Arc::from("héllo"));
        assert!(!string.is_external());
        assert_eq!(string.len(), 5);
    }

    #[test]
    fn test_latin1_decoding() {
        let resource = Arc::new(StaticOneByteResource::from_bytes(vec![b'a', 0xe9]));
        let string = HeapString::ExternalOneByte(resource);
        assert_eq!(string.to_rust_string(), "aé");
    }

    #[test]
    fn test_define_own_property_respects_configurable() {
        let mut object = JsObject::new(ObjectKind::Plain);
        let locked = PropertyDescriptor {
            value: Value::Number(1.0),
            writable: false,
            enumerable: true,
            configurable: false,
        };
        assert!(object.define_own_property("x", locked.clone()));
        assert!(!object.define_own_property("x", PropertyDescriptor::hidden(Value::Null)));
        assert_eq!(object.get("x"), Some(&Value::Number(1.0)));
        // Redefining with an identical descriptor is allowed.
        assert!(object.define_own_property("x", locked));
    }
}
