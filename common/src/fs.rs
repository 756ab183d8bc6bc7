//! Local filesystem storage provider
//!
//! The read side produces exact-size sequential blocks; the write side
//! places each received block at `ordinal * block_size` so completion order
//! does not matter, then fsyncs as its "commit".

use std::io::SeekFrom;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gate::Gate;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::chunk::{self, Blocking};
use crate::errors::TransferError;
use crate::object::{Block, ObjectInfo};
use crate::provider::{ProducerHandle, ProviderKind, StorageProvider};

const OBJECT_TYPE: &str = "FileSystem";

#[derive(Debug, Default, Clone)]
pub struct FilesystemProvider;

fn object_info(path: &str, metadata: &std::fs::Metadata) -> ObjectInfo {
    let name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    ObjectInfo {
        name,
        path: path.to_string(),
        length: metadata.len(),
        last_modified: metadata
            .modified()
            .ok()
            .map(DateTime::<Utc>::from),
        object_type: OBJECT_TYPE.to_string(),
        is_dir: metadata.is_dir(),
        ..Default::default()
    }
}

#[async_trait]
impl StorageProvider for FilesystemProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Filesystem
    }

    async fn stat(&self, path: &str) -> Result<ObjectInfo, TransferError> {
        let metadata = tokio::fs::symlink_metadata(path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                TransferError::NotFound(path.to_string())
            } else {
                err.into()
            }
        })?;
        Ok(object_info(path, &metadata))
    }

    async fn glob(&self, pattern: &str) -> Result<Vec<ObjectInfo>, TransferError> {
        let pattern = pattern.to_string();
        // glob matching walks directories, keep it off the async workers
        let paths = tokio::task::spawn_blocking(move || {
            glob::glob(&pattern)
                .map_err(|err| TransferError::NotFound(format!("bad glob pattern: {err}")))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| TransferError::Io(err.into()))
        })
        .await
        .map_err(|err| TransferError::Io(std::io::Error::other(err)))??;
        let mut matches = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.to_string_lossy().into_owned();
            matches.push(self.stat(&path).await?);
        }
        Ok(matches)
    }

    fn open(
        &self,
        path: &str,
        blocks: mpsc::Sender<Block>,
        _gate: Gate,
        blocking: Blocking,
    ) -> Result<ProducerHandle, TransferError> {
        tracing::debug!(
            "open local file {:?} with {} blocks of size {}",
            path,
            blocking.block_count,
            blocking.block_size
        );
        let path = path.to_string();
        let handle = tokio::spawn(async move {
            let mut file = tokio::fs::File::open(&path).await.map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    TransferError::NotFound(path.clone())
                } else {
                    err.into()
                }
            })?;
            let length = file.metadata().await?.len();
            let mut buffer = vec![0u8; blocking.block_size];
            for ordinal in 0..blocking.block_count {
                let len = blocking.block_len(length, ordinal);
                let block = chunk::read_block(&mut file, &mut buffer, ordinal, len).await?;
                if blocks.send(block).await.is_err() {
                    // consumer went away, it carries the error
                    tracing::debug!("block channel closed by consumer, stopping producer");
                    return Ok(());
                }
            }
            Ok(())
        });
        Ok(handle)
    }

    async fn create(
        &self,
        name: &str,
        mut blocks: mpsc::Receiver<Block>,
        blocking: Blocking,
        _gate: Gate,
    ) -> Result<(), TransferError> {
        let mut file = tokio::fs::File::create(name).await?;
        let mut received = 0usize;
        while let Some(block) = blocks.recv().await {
            let offset = block.ordinal as u64 * blocking.block_size as u64;
            file.seek(SeekFrom::Start(offset)).await?;
            file.write_all(&block.bytes).await?;
            received += 1;
        }
        if received != blocking.block_count {
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "{name:?}: expected {} blocks, received {received}",
                    blocking.block_count
                ),
            )));
        }
        // durability point - the filesystem equivalent of a manifest commit
        file.sync_all().await?;
        Ok(())
    }
}
