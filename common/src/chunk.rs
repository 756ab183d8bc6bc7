//! Block sizing policy and block reading
//!
//! The bounds mirror the block-blob provider's hard limits: block sizes are
//! silently clamped into `[MIN_BLOCK_SIZE, MAX_BLOCK_SIZE]` (a provider
//! constraint, not a user mistake), and an object that would need more than
//! [`MAX_BLOCKS`] blocks is rejected before any I/O happens.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::TransferError;
use crate::object::Block;

/// Maximum number of blocks per object (provider limit).
pub const MAX_BLOCKS: usize = 50000;
/// Minimum block size: 5 KiB.
pub const MIN_BLOCK_SIZE: usize = 1024 * 5;
/// Maximum block size: 100 MiB (provider limit).
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024 * 100;

/// Block count and effective block size for one object transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocking {
    pub block_count: usize,
    pub block_size: usize,
}

impl Blocking {
    /// Expected length of the block at `ordinal` for an object of `length`
    /// bytes - `block_size` for all but the final block.
    pub fn block_len(&self, length: u64, ordinal: usize) -> usize {
        let offset = ordinal as u64 * self.block_size as u64;
        std::cmp::min(self.block_size as u64, length - offset) as usize
    }
}

/// Computes the blocking for an object of `length` bytes.
///
/// Out-of-range `block_size` values are corrected to the nearest bound and
/// logged. Fails with `LimitExceeded` when the resulting block count is above
/// [`MAX_BLOCKS`]; the caller must pick a larger block size.
pub fn compute_blocking(length: u64, block_size: usize) -> Result<Blocking, TransferError> {
    let block_size = if block_size < MIN_BLOCK_SIZE {
        tracing::info!("block size raised to minimum allowed: {}", MIN_BLOCK_SIZE);
        MIN_BLOCK_SIZE
    } else if block_size > MAX_BLOCK_SIZE {
        tracing::info!("block size lowered to maximum allowed: {}", MAX_BLOCK_SIZE);
        MAX_BLOCK_SIZE
    } else {
        block_size
    };
    let block_count = length.div_ceil(block_size as u64) as usize;
    if block_count > MAX_BLOCKS {
        return Err(TransferError::LimitExceeded(format!(
            "too many blocks: max is {MAX_BLOCKS}, {block_count} requested - adjust block size?"
        )));
    }
    Ok(Blocking {
        block_count,
        block_size,
    })
}

/// Reads exactly `len` bytes from the current read position and returns them
/// as a block tagged with `ordinal`.
///
/// The producer computes `len` from the object length, so a final block is
/// requested at its (shorter) exact size; hitting end-of-stream before `len`
/// bytes is therefore always an I/O error.
pub async fn read_block<R>(
    reader: &mut R,
    buffer: &mut [u8],
    ordinal: usize,
    len: usize,
) -> Result<Block, TransferError>
where
    R: AsyncRead + Unpin,
{
    debug_assert!(len <= buffer.len());
    reader.read_exact(&mut buffer[..len]).await?;
    tracing::trace!("read block[{}] with length {} bytes", ordinal, len);
    // the buffer is reused across reads; the block gets its own copy
    Ok(Block::copy_from(&buffer[..len], ordinal))
}
