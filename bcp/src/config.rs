//! `.bcp.toml` configuration
//!
//! Aliases map short names to storage locations; top-level keys set transfer
//! defaults. The file is looked up in the working directory, then in the
//! user's home directory, and is only required when an aliased path is used.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = ".bcp.toml";

const SKELETON: &str = r#"# bcp configuration

# Defaults for all transfers; flags override these.
# block_size = "4MiB"
# max_concurrency = 0  # 0 = number of CPU cores x 10
# max_retries = 4      # retries per request after the first attempt

# [aliases.backup]
# provider = "azure-blob"
# account = "myaccount"
# container = "mycontainer"
# key = "base64-account-key"
# # url = "https://myaccount.blob.core.windows.net/mycontainer"

# [aliases.scratch]
# provider = "file"
# root = "/mnt/scratch"
"#;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default block size, e.g. "4MiB".
    pub block_size: Option<String>,
    /// Default gate size; 0 picks the automatic default.
    pub max_concurrency: Option<usize>,
    /// Retries per request after the first attempt; unset keeps the
    /// client's built-in default.
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub aliases: HashMap<String, AliasConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    /// "azure-blob" or "file".
    pub provider: String,
    pub account: Option<String>,
    pub container: Option<String>,
    pub key: Option<String>,
    /// Explicit endpoint URL, for emulators and sovereign clouds.
    pub url: Option<String>,
    /// Root directory for "file" aliases.
    pub root: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {path:?}"))?;
        Ok(config)
    }

    pub fn alias(&self, name: &str) -> Result<&AliasConfig> {
        self.aliases
            .get(name)
            .ok_or_else(|| anyhow!("alias {name:?} is not defined in the configuration"))
    }

    pub fn default_block_size(&self) -> Result<Option<usize>> {
        self.block_size
            .as_deref()
            .map(|text| {
                bytesize::ByteSize::from_str(text)
                    .map(|size| size.0 as usize)
                    .map_err(|err| anyhow!("bad block_size {text:?} in configuration: {err}"))
            })
            .transpose()
    }
}

/// Resolves the config file to use: an explicit `--config` path, else
/// `.bcp.toml` in the working directory, else in the home directory.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let cwd = PathBuf::from(CONFIG_FILE_NAME);
    if cwd.exists() {
        return Some(cwd);
    }
    let home = dirs::home_dir()?.join(CONFIG_FILE_NAME);
    home.exists().then_some(home)
}

/// Writes a commented skeleton config, refusing to clobber an existing file.
pub fn write_skeleton(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(anyhow!(
            "{path:?} already exists, remove it first to generate a new skeleton"
        ));
    }
    std::fs::write(path, SKELETON)
        .with_context(|| format!("failed to write config skeleton {path:?}"))?;
    Ok(())
}
