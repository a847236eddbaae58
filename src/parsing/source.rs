//! Bounded source ranges handed to the parser.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::heap::ExternalOneByteResource;

#[derive(Clone)]
enum Characters {
    External(Arc<dyn ExternalOneByteResource>),
    Managed(Arc<str>),
}

/// The characters of one function's source range.
///
/// A stream holds no heap handles: external sources share the embedder's
/// buffer, managed sources carry the snapshot taken on the owning thread
/// while preparing the job.
#[derive(Clone)]
pub struct SourceStream {
    characters: Characters,
    range: Range<usize>,
}

impl SourceStream {
    /// A stream over an embedder-owned one-byte buffer.
    #[must_use]
    pub fn external(resource: Arc<dyn ExternalOneByteResource>, range: Range<usize>) -> Self {
        let range = clamp(range, resource.len());
        Self {
            characters: Characters::External(resource),
            range,
        }
    }

    /// A stream over managed characters.
    #[must_use]
    pub fn managed(text: Arc<str>, range: Range<usize>) -> Self {
        let range = clamp(range, text.chars().count());
        Self {
            characters: Characters::Managed(text),
            range,
        }
    }

    /// Returns true if the characters are owned by the embedder.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self.characters, Characters::External(_))
    }

    /// Absolute position of the first character.
    #[must_use]
    pub fn start(&self) -> usize {
        self.range.start
    }

    /// Absolute position one past the last character.
    #[must_use]
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Number of characters in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns true if the range is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Decodes the characters of the range.
    #[must_use]
    pub fn chars(&self) -> Vec<char> {
        match &self.characters {
            Characters::External(resource) => resource.data()[self.range.clone()]
                .iter()
                .copied()
                .map(char::from)
                .collect(),
            Characters::Managed(text) => text
                .chars()
                .skip(self.range.start)
                .take(self.range.len())
                .collect(),
        }
    }
}

impl fmt::Debug for SourceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceStream")
            .field("external", &self.is_external())
            .field("range", &self.range)
            .finish()
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}
