//! Block-blob storage backend for the bcp tools: container/credential
//! handles, shared-key request signing, the retrying HTTP client and the
//! two-phase block upload protocol.

pub mod client;
pub mod container;
pub mod list;
pub mod provider;
pub mod sign;

pub use container::Container;
pub use provider::CloudBlobProvider;
