//! Polymorphic storage-provider contract
//!
//! Each backend (local filesystem, cloud block-blob store) implements the
//! same capability set: `stat`, `glob`, `open` (read side) and `create`
//! (write side). The pipeline talks only to this trait; which backend sits
//! behind it is decided once, at configuration-resolution time, via
//! [`ProviderKind`].

use async_trait::async_trait;
use gate::Gate;
use tokio::sync::mpsc;

use crate::chunk::Blocking;
use crate::errors::TransferError;
use crate::object::{Block, ObjectInfo};

/// Closed set of supported backends, selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Filesystem,
    CloudBlob,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Filesystem => write!(f, "file"),
            ProviderKind::CloudBlob => write!(f, "azure-blob"),
        }
    }
}

/// Handle to the asynchronous producer started by [`StorageProvider::open`].
pub type ProducerHandle = tokio::task::JoinHandle<Result<(), TransferError>>;

/// Capability set every storage backend implements.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Resolves `path` to object metadata. Fails with `NotFound` when the
    /// path does not resolve.
    async fn stat(&self, path: &str) -> Result<ObjectInfo, TransferError>;

    /// Enumerates objects matching `pattern`. Pattern semantics are
    /// backend-specific: shell-style wildcards on the filesystem, literal
    /// prefix matching on object stores. An empty result is not an error.
    async fn glob(&self, pattern: &str) -> Result<Vec<ObjectInfo>, TransferError>;

    /// Starts a producer task that reads `path` sequentially and sends
    /// exactly `blocking.block_count` blocks in strictly increasing ordinal
    /// order, then closes the channel by dropping the sender. Returns without
    /// blocking past setup; read failures surface through the returned
    /// handle and must abort the transfer.
    fn open(
        &self,
        path: &str,
        blocks: mpsc::Sender<Block>,
        gate: Gate,
        blocking: Blocking,
    ) -> Result<ProducerHandle, TransferError>;

    /// Consumes `blocks` until the channel closes, writing each block at its
    /// ordinal position, then finalizes the object with a single commit.
    ///
    /// Implementations must bound concurrent network writes with `gate`,
    /// record block identifiers by ordinal, and refuse to commit when any
    /// block failed or fewer than `blocking.block_count` blocks arrived.
    async fn create(
        &self,
        name: &str,
        blocks: mpsc::Receiver<Block>,
        blocking: Blocking,
        gate: Gate,
    ) -> Result<(), TransferError>;
}
