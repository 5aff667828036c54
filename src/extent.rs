//! Source extents: the position record attached to every AST node.
//!
//! An extent never outlives the source text it was computed from; nodes
//! carry an owned copy of the text slice rather than a borrow so the AST
//! can be held independently of the original buffer.

use std::fmt;

/// An immutable source-position record attached to every AST node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceExtent {
    pub file: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub text: String,
}

impl SourceExtent {
    pub fn new(
        file: Option<String>,
        start_offset: usize,
        end_offset: usize,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file,
            start_offset,
            end_offset,
            start_line,
            start_column,
            end_line,
            end_column,
            text: text.into(),
        }
    }

    /// The sentinel "empty extent" used for synthesized nodes that have no
    /// corresponding source text (e.g. default attribute values).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == 0 && self.end_offset == 0 && self.text.is_empty()
    }

    /// True if `self` fully contains `other` (used to validate the AST
    /// invariant that a node's extent contains all descendants' extents).
    pub fn contains(&self, other: &SourceExtent) -> bool {
        if self.is_empty() || other.is_empty() {
            return true;
        }
        self.start_offset <= other.start_offset && other.end_offset <= self.end_offset
    }

    /// Construct the smallest extent that contains both `self` and `other`,
    /// used when building a parent node's extent from its children.
    pub fn join(&self, other: &SourceExtent) -> SourceExtent {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let (start, start_line, start_column) = if self.start_offset <= other.start_offset {
            (self.start_offset, self.start_line, self.start_column)
        } else {
            (other.start_offset, other.start_line, other.start_column)
        };
        let (end, end_line, end_column) = if self.end_offset >= other.end_offset {
            (self.end_offset, self.end_line, self.end_column)
        } else {
            (other.end_offset, other.end_line, other.end_column)
        };
        SourceExtent {
            file: self.file.clone().or_else(|| other.file.clone()),
            start_offset: start,
            end_offset: end,
            start_line,
            start_column,
            end_line,
            end_column,
            text: String::new(),
        }
    }
}

impl fmt::Display for SourceExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "{}:{}:{}-{}:{}",
                file, self.start_line, self.start_column, self.end_line, self.end_column
            ),
            None => write!(
                f,
                "{}:{}-{}:{}",
                self.start_line, self.start_column, self.end_line, self.end_column
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_extent_is_empty() {
        assert!(SourceExtent::empty().is_empty());
    }

    #[test]
    fn contains_checks_offsets() {
        let outer = SourceExtent::new(None, 0, 20, 1, 1, 1, 21, "0123456789abcdefghij");
        let inner = SourceExtent::new(None, 2, 5, 1, 3, 1, 6, "234");
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn join_spans_both() {
        let a = SourceExtent::new(None, 5, 10, 1, 6, 1, 11, "");
        let b = SourceExtent::new(None, 0, 3, 1, 1, 1, 4, "");
        let joined = a.join(&b);
        assert_eq!(joined.start_offset, 0);
        assert_eq!(joined.end_offset, 10);
    }

    #[test]
    fn join_with_empty_returns_other() {
        let a = SourceExtent::new(None, 5, 10, 1, 6, 1, 11, "");
        let joined = a.join(&SourceExtent::empty());
        assert_eq!(joined, a);
    }
}
