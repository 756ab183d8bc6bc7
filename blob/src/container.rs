//! Container endpoint and shared-key credential handles
//!
//! Both are produced by configuration resolution and treated as opaque,
//! immutable values by the transfer engine.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use common::TransferError;

/// Default storage endpoint suffix.
pub const STORAGE_BASE: &str = "blob.core.windows.net";

/// Decoded shared account key.
///
/// The raw key material is never logged or serialized; `Debug` redacts it.
#[derive(Clone)]
pub struct SharedKey {
    bytes: Vec<u8>,
}

impl SharedKey {
    /// Decodes a base64 account key.
    pub fn from_base64(key: &str) -> Result<Self, TransferError> {
        let bytes = BASE64
            .decode(key)
            .map_err(|err| TransferError::AuthConfig(format!("account key is not valid base64: {err}")))?;
        Ok(Self { bytes })
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKey").field("key", &"<redacted>").finish()
    }
}

/// One account/container combination with its endpoint and credential.
#[derive(Debug, Clone)]
pub struct Container {
    pub account: String,
    pub name: String,
    pub endpoint: url::Url,
    pub key: SharedKey,
}

impl Container {
    /// Builds a container handle with the default endpoint
    /// `https://{account}.blob.core.windows.net/{container}`.
    pub fn new(account: &str, name: &str, key: &str) -> Result<Self, TransferError> {
        let endpoint = format!("https://{account}.{STORAGE_BASE}/{name}");
        Self::with_endpoint(account, name, key, &endpoint)
    }

    /// Builds a container handle with an explicit endpoint URL (emulators,
    /// sovereign clouds).
    pub fn with_endpoint(
        account: &str,
        name: &str,
        key: &str,
        endpoint: &str,
    ) -> Result<Self, TransferError> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|err| TransferError::AuthConfig(format!("bad endpoint URL {endpoint:?}: {err}")))?;
        Ok(Self {
            account: account.to_string(),
            name: name.to_string(),
            endpoint,
            key: SharedKey::from_base64(key)?,
        })
    }
}
