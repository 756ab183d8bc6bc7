//! Value types shared by all storage backends

use chrono::{DateTime, Utc};

/// A contiguous, ordinal-tagged slice of an object's bytes - the unit of
/// upload and download.
///
/// `ordinal * block_size` is the byte offset of this block within the object;
/// only the final block may be shorter than the block size. The bytes are
/// copied out of the producer's read buffer before the block is handed to the
/// channel, so a `Block` is never aliased across tasks and never mutated
/// after creation.
#[derive(Debug, Clone)]
pub struct Block {
    pub bytes: bytes::Bytes,
    /// Zero-based position of this block in the object's byte stream.
    pub ordinal: usize,
}

impl Block {
    /// Copies `data` into a new block tagged with `ordinal`.
    pub fn copy_from(data: &[u8], ordinal: usize) -> Self {
        Self {
            bytes: bytes::Bytes::copy_from_slice(data),
            ordinal,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Identity and metadata of a transferable object, as returned by
/// `stat`/`glob`. Immutable once produced; the pipeline reads it only to
/// compute chunking.
#[derive(Debug, Clone, Default)]
pub struct ObjectInfo {
    /// Object name (final path segment for files, blob name for blobs).
    pub name: String,
    /// Full path or blob name as addressed by the backend.
    pub path: String,
    /// Length in bytes.
    pub length: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: String,
    pub md5: String,
    pub content_type: String,
    /// Object type reported by the backend ("FileSystem", "BlockBlob", ...).
    pub object_type: String,
    /// Always false for object stores - the model has no true directories.
    pub is_dir: bool,
}
