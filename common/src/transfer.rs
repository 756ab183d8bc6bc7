//! Transfer pipeline: chunker + gate + source/sink providers
//!
//! One pipeline instance moves one object. The source's producer reads
//! sequentially and sends ordinal-tagged blocks into a channel sized to the
//! block count; the target consumes them behind the concurrency gate and
//! finalizes with a single commit. Multiple objects run as independent
//! pipeline instances with independent gates.

use gate::Gate;
use tokio::sync::mpsc;

use crate::chunk;
use crate::errors::TransferError;
use crate::provider::StorageProvider;

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Requested block size in bytes (clamped to provider bounds).
    pub block_size: usize,
    /// Gate size - maximum concurrent network operations.
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct Summary {
    pub objects_transferred: usize,
    pub blocks_transferred: usize,
    pub bytes_transferred: u64,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            objects_transferred: self.objects_transferred + other.objects_transferred,
            blocks_transferred: self.blocks_transferred + other.blocks_transferred,
            bytes_transferred: self.bytes_transferred + other.bytes_transferred,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "objects transferred: {}\n\
            blocks transferred: {}\n\
            bytes transferred: {}",
            self.objects_transferred,
            self.blocks_transferred,
            bytesize::ByteSize(self.bytes_transferred),
        )
    }
}

/// Moves one object from `source` to `target`.
///
/// Aborts without committing on the first unrecoverable error; producer
/// failures take precedence over the consumer's channel-closed error they
/// cause.
pub async fn transfer(
    source: &dyn StorageProvider,
    target: &dyn StorageProvider,
    src_path: &str,
    dst_name: &str,
    settings: &Settings,
) -> Result<Summary, TransferError> {
    let info = source.stat(src_path).await?;
    if info.is_dir {
        return Err(TransferError::Unsupported(
            "directories cannot be transferred, pass files or a glob",
        ));
    }
    let blocking = chunk::compute_blocking(info.length, settings.block_size)?;
    tracing::debug!(
        "transferring {:?} -> {:?}: {} bytes in {} blocks of {}",
        src_path,
        dst_name,
        info.length,
        blocking.block_count,
        bytesize::ByteSize(blocking.block_size as u64),
    );
    let gate = Gate::new(settings.max_concurrency.max(1));
    // capacity block_count: the producer never blocks on a slow sink; this
    // buffers the whole object in the worst case (see DESIGN.md)
    let (tx, rx) = mpsc::channel(blocking.block_count.max(1));
    let producer = source.open(src_path, tx, gate.clone(), blocking)?;
    let created = target.create(dst_name, rx, blocking, gate).await;
    let produced = producer
        .await
        .map_err(|err| TransferError::Io(std::io::Error::other(err)))?;
    // a read failure closes the channel early; report the cause, not the symptom
    produced?;
    created?;
    Ok(Summary {
        objects_transferred: 1,
        blocks_transferred: blocking.block_count,
        bytes_transferred: info.length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FilesystemProvider;

    #[tokio::test]
    async fn filesystem_round_trip_reproduces_bytes_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        // three full blocks plus a short one at the minimum block size
        let data: Vec<u8> = (0..3 * chunk::MIN_BLOCK_SIZE + 123)
            .map(|i| (i % 251) as u8)
            .collect();
        std::fs::write(&src, &data).unwrap();

        let provider = FilesystemProvider;
        let settings = Settings {
            block_size: chunk::MIN_BLOCK_SIZE,
            max_concurrency: 4,
        };
        let summary = transfer(
            &provider,
            &provider,
            src.to_str().unwrap(),
            dst.to_str().unwrap(),
            &settings,
        )
        .await
        .unwrap();

        assert_eq!(summary.objects_transferred, 1);
        assert_eq!(summary.blocks_transferred, 4);
        assert_eq!(summary.bytes_transferred, data.len() as u64);
        let copied = std::fs::read(&dst).unwrap();
        assert_eq!(copied, data);
    }

    #[tokio::test]
    async fn zero_length_object_spawns_no_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("empty");
        let dst = dir.path().join("empty.out");
        std::fs::write(&src, b"").unwrap();

        let provider = FilesystemProvider;
        let settings = Settings {
            block_size: chunk::MIN_BLOCK_SIZE,
            max_concurrency: 2,
        };
        let summary = transfer(
            &provider,
            &provider,
            src.to_str().unwrap(),
            dst.to_str().unwrap(),
            &settings,
        )
        .await
        .unwrap();

        assert_eq!(summary.blocks_transferred, 0);
        assert_eq!(std::fs::read(&dst).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_source_aborts_before_creating_target() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("never");
        let provider = FilesystemProvider;
        let settings = Settings {
            block_size: chunk::MIN_BLOCK_SIZE,
            max_concurrency: 2,
        };
        let err = transfer(
            &provider,
            &provider,
            dir.path().join("missing").to_str().unwrap(),
            dst.to_str().unwrap(),
            &settings,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransferError::NotFound(_)));
        assert!(!dst.exists());
    }

    #[tokio::test]
    async fn directory_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FilesystemProvider;
        let settings = Settings {
            block_size: chunk::MIN_BLOCK_SIZE,
            max_concurrency: 2,
        };
        let err = transfer(
            &provider,
            &provider,
            dir.path().to_str().unwrap(),
            dir.path().join("out").to_str().unwrap(),
            &settings,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransferError::Unsupported(_)));
    }
}
