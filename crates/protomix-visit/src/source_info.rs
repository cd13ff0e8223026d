//! Source-info cursor: a value pointing into a file's comment side table.

use protomix_descriptor::{CommentIndex, FileDescriptor};
use std::sync::Arc;

/// Path field numbers from descriptor.proto, used to address children in a
/// file's source-location table.
pub mod paths {
    pub mod file {
        pub const MESSAGE_TYPE: i32 = 4;
        pub const ENUM_TYPE: i32 = 5;
        pub const SERVICE: i32 = 6;
    }
    pub mod message {
        pub const FIELD: i32 = 2;
        pub const NESTED_TYPE: i32 = 3;
        pub const ENUM_TYPE: i32 = 4;
    }
}

/// A position in one file's source-location table.
///
/// The comment table is shared read-only behind an `Arc`, so cursors are
/// cheap to clone, never borrow from the descriptor tree, and stay valid
/// after the tree is dropped. `open` derives a child cursor; it never
/// mutates the parent.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    index: Arc<CommentIndex>,
    path: Vec<i32>,
}

impl SourceInfo {
    pub fn root(file: &FileDescriptor) -> Self {
        Self {
            index: Arc::new(CommentIndex::from_file(file)),
            path: Vec::new(),
        }
    }

    /// A cursor over an empty table; every lookup misses.
    pub fn empty() -> Self {
        Self {
            index: Arc::new(CommentIndex::default()),
            path: Vec::new(),
        }
    }

    /// Derive the cursor for the `index`-th child under `field`.
    pub fn open(&self, field: i32, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(field);
        path.push(index as i32);
        Self {
            index: Arc::clone(&self.index),
            path,
        }
    }

    /// Comment text attached to the current position, if any.
    pub fn comment(&self) -> Option<&str> {
        self.index.get(&self.path)
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }
}
