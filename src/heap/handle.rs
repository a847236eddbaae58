//! Typed handles into the isolate's object arena.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed reference to an object owned by an [`Isolate`](super::Isolate).
///
/// Handles are plain indices: they can be copied and sent to other threads,
/// but they can only be dereferenced through the isolate that allocated them.
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub(crate) fn index(self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(#{})", self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn test_handle_copy_and_eq() {
        let a: Handle<Marker> = Handle::new(3);
        let b = a;
        assert_eq!(a, b);
        assert_eq!(b.index(), 3);
        assert_ne!(a, Handle::new(4));
    }

    #[test]
    fn test_handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Handle<Marker>>();
    }

    #[test]
    fn test_indices_past_u32_stay_distinct() {
        let last_u32: Handle<Marker> = Handle::new(u32::MAX as usize);
        let next = Handle::new(last_u32.index() + 1);
        assert_ne!(last_u32, next);
        assert_eq!(next.index(), 1 << 32);
    }

    #[test]
    fn test_handle_debug() {
        let h: Handle<Marker> = Handle::new(7);
        assert_eq!(format!("{h:?}"), "Handle(#7)");
    }
}
