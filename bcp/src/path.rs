//! Transfer path parsing
//!
//! Aliased paths address a configured remote container: `//alias/name`
//! (the object name may be empty for listing and may contain slashes).
//! Everything else is a plain local filesystem path.

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPath {
    Local(String),
    Aliased { alias: String, name: String },
}

impl TransferPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(rest) = raw.strip_prefix("//") else {
            return Ok(Self::Local(raw.to_string()));
        };
        let (alias, name) = rest.split_once('/').unwrap_or((rest, ""));
        if alias.is_empty() {
            return Err(anyhow!(
                "{raw:?}: aliased paths have the form //alias/name"
            ));
        }
        Ok(Self::Aliased {
            alias: alias.to_string(),
            name: name.to_string(),
        })
    }

    pub fn is_aliased(&self) -> bool {
        matches!(self, Self::Aliased { .. })
    }

    /// True when a destination addresses a container/directory rather than a
    /// final object name - multiple sources require this form.
    pub fn is_prefix(&self) -> bool {
        match self {
            Self::Local(path) => path.ends_with('/'),
            Self::Aliased { name, .. } => name.is_empty() || name.ends_with('/'),
        }
    }

    /// Destination name for `file_name` copied into this path.
    ///
    /// A prefix destination gets the file name appended; otherwise the path
    /// itself is the name.
    pub fn join_name(&self, file_name: &str) -> String {
        match self {
            Self::Local(path) if self.is_prefix() => format!("{path}{file_name}"),
            Self::Local(path) => path.clone(),
            Self::Aliased { name, .. } if self.is_prefix() => format!("{name}{file_name}"),
            Self::Aliased { name, .. } => name.clone(),
        }
    }
}
