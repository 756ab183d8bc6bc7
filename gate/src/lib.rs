//! Bounded concurrency gate for in-flight network operations
//!
//! A [`Gate`] is a counting token pool created once per object transfer. Every
//! upload (or download) worker must hold exactly one [`GateToken`] for the
//! duration of one network operation; the token is returned automatically when
//! it is dropped, on success and failure paths alike.
//!
//! The gate bounds *concurrent network operations*, not memory - the block
//! channel feeding the workers may still buffer blocks if the producer
//! outruns the gated consumers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gate::Gate;
//!
//! # async fn example() {
//! let gate = Gate::new(8);
//! let token = gate.acquire().await;
//! // perform one network operation while holding the token
//! drop(token); // unblocks one waiter
//! # }
//! ```

use std::sync::Arc;

/// A counting concurrency limiter with a fixed number of tokens.
///
/// Cloning a `Gate` produces another handle to the same token pool.
#[derive(Clone)]
pub struct Gate {
    sem: Arc<tokio::sync::Semaphore>,
    size: usize,
}

/// An opaque capacity unit held for the duration of one network operation.
///
/// Dropping the token returns it to the gate, unblocking one waiter. No
/// ordering is guaranteed among waiters.
pub struct GateToken {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl Gate {
    /// Creates a gate pre-loaded with `size` tokens.
    ///
    /// `size` must be non-zero; a gate of size 1 serializes all operations.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "gate size must be non-zero");
        Self {
            sem: Arc::new(tokio::sync::Semaphore::new(size)),
            size,
        }
    }

    /// Default gate size: ten in-flight operations per core.
    pub fn default_size() -> usize {
        std::thread::available_parallelism().map_or(1, std::num::NonZero::get) * 10
    }

    /// Waits until a token is available and takes it.
    pub async fn acquire(&self) -> GateToken {
        let permit = self
            .sem
            .clone()
            .acquire_owned()
            .await
            .expect("gate semaphore is never closed");
        GateToken { _permit: permit }
    }

    /// Number of tokens in circulation, fixed at creation.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tokens currently available (for diagnostics only).
    pub fn available(&self) -> usize {
        self.sem.available_permits()
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("size", &self.size)
            .field("available", &self.sem.available_permits())
            .finish()
    }
}
