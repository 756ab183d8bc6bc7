//! CLI plumbing shared by the `bcp` and `bls` binaries: path parsing,
//! configuration and storage-provider resolution.

use anyhow::{anyhow, Context, Result};
use common::fs::FilesystemProvider;
use common::provider::{ProviderKind, StorageProvider};

pub mod config;
pub mod path;

pub use config::Config;
pub use path::TransferPath;

/// A transfer endpoint: the backend plus the path/object name addressed
/// within it.
pub struct Endpoint {
    pub provider: Box<dyn StorageProvider>,
    pub path: String,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("provider", &self.provider.kind())
            .field("path", &self.path)
            .finish()
    }
}

fn provider_kind(name: &str) -> Result<ProviderKind> {
    match name {
        "file" => Ok(ProviderKind::Filesystem),
        "azure-blob" => Ok(ProviderKind::CloudBlob),
        other => Err(anyhow!(
            "unknown provider {other:?}, expected \"file\" or \"azure-blob\""
        )),
    }
}

/// Resolves a parsed path to its backend. Local paths never touch the
/// configuration; aliased paths require a matching `[aliases.<name>]` entry.
pub fn resolve(path: &TransferPath, config: &Config) -> Result<Endpoint> {
    match path {
        TransferPath::Local(local) => Ok(Endpoint {
            provider: Box::new(FilesystemProvider),
            path: local.clone(),
        }),
        TransferPath::Aliased { alias, name } => {
            let entry = config.alias(alias)?;
            match provider_kind(&entry.provider)
                .with_context(|| format!("alias {alias:?}"))?
            {
                ProviderKind::Filesystem => {
                    let root = entry.root.as_deref().ok_or_else(|| {
                        anyhow!("alias {alias:?}: file provider requires a \"root\" directory")
                    })?;
                    Ok(Endpoint {
                        provider: Box::new(FilesystemProvider),
                        path: format!("{}/{name}", root.trim_end_matches('/')),
                    })
                }
                ProviderKind::CloudBlob => {
                    let account = required(entry.account.as_deref(), alias, "account")?;
                    let container_name = required(entry.container.as_deref(), alias, "container")?;
                    let key = required(entry.key.as_deref(), alias, "key")?;
                    let container = match entry.url.as_deref() {
                        Some(url) => {
                            blob::Container::with_endpoint(account, container_name, key, url)
                        }
                        None => blob::Container::new(account, container_name, key),
                    }
                    .with_context(|| format!("alias {alias:?}"))?;
                    let mut provider = blob::CloudBlobProvider::new(container)
                        .with_context(|| format!("alias {alias:?}"))?;
                    if let Some(retries) = config.max_retries {
                        provider = provider.with_retries(retries);
                    }
                    Ok(Endpoint {
                        provider: Box::new(provider),
                        path: name.clone(),
                    })
                }
            }
        }
    }
}

fn required<'cfg>(value: Option<&'cfg str>, alias: &str, field: &str) -> Result<&'cfg str> {
    value.ok_or_else(|| anyhow!("alias {alias:?}: blob provider requires {field:?}"))
}
