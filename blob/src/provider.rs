//! Block-blob storage backend
//!
//! Uploads go through the two-phase block protocol: each block is staged
//! with its own PUT carrying a deterministic identifier, and the object
//! becomes visible only when the final commit submits the ordinal-ordered
//! identifier list. A failed or missing block means no commit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use gate::Gate;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;

use common::TransferError;
use common::chunk::Blocking;
use common::object::{Block, ObjectInfo};
use common::provider::{ProducerHandle, ProviderKind, StorageProvider};

use crate::client::RetryClient;
use crate::container::Container;
use crate::list::{self, block_list_body};
use crate::sign::{
    self, STORAGE_API_VERSION, canonical_list, canonical_put_block, canonical_put_block_list,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct CloudBlobProvider {
    container: Container,
    client: Arc<RetryClient>,
}

impl CloudBlobProvider {
    pub fn new(container: Container) -> Result<Self, TransferError> {
        let client = Arc::new(RetryClient::new(REQUEST_TIMEOUT)?);
        Ok(Self { container, client })
    }

    /// Overrides the retry budget of the request client.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.client = Arc::new(RetryClient::clone(&self.client).with_retries(retries));
        self
    }

    /// Identifier for block `ordinal` of `blob`. All identifiers of one
    /// upload share a prefix derived from the blob name and have equal
    /// length, as the commit protocol requires.
    fn make_block_id(blob: &str, ordinal: usize) -> String {
        let digest = Sha256::digest(blob.as_bytes());
        let prefix = hex::encode(&digest[..8]);
        BASE64.encode(format!("{prefix}{ordinal:08}"))
    }

    fn blob_url(&self, blob: &str) -> Result<url::Url, TransferError> {
        let mut url = self.container.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                TransferError::AuthConfig(format!(
                    "endpoint {} cannot address blobs",
                    self.container.endpoint
                ))
            })?;
            for segment in blob.split('/') {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    async fn put_block(
        &self,
        blob: &str,
        block_id: &str,
        body: bytes::Bytes,
    ) -> Result<(), TransferError> {
        let mut url = self.blob_url(blob)?;
        url.query_pairs_mut()
            .append_pair("comp", "block")
            .append_pair("blockid", block_id);
        let date = sign::rfc1123_now();
        let canonical =
            canonical_put_block(&self.container, blob, block_id, body.len(), &date);
        let request = self
            .client
            .http()
            .put(url)
            .header("Date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", sign::authorization(&self.container, &canonical))
            .body(body)
            .build()
            .map_err(|err| TransferError::Network(err.to_string()))?;
        let response = self.client.send(request).await?;
        if !response.status().is_success() {
            return Err(TransferError::Protocol(format!(
                "staging block {block_id} of {blob:?} returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn put_block_list(&self, blob: &str, block_ids: &[String]) -> Result<(), TransferError> {
        let body = block_list_body(block_ids);
        let mut url = self.blob_url(blob)?;
        url.query_pairs_mut().append_pair("comp", "blocklist");
        let date = sign::rfc1123_now();
        let canonical = canonical_put_block_list(&self.container, blob, body.len(), &date);
        let request = self
            .client
            .http()
            .put(url)
            .header("Date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", sign::authorization(&self.container, &canonical))
            .body(body)
            .build()
            .map_err(|err| TransferError::Network(err.to_string()))?;
        let response = self.client.send(request).await?;
        if !response.status().is_success() {
            return Err(TransferError::Protocol(format!(
                "committing {} blocks of {blob:?} returned status {}",
                block_ids.len(),
                response.status()
            )));
        }
        tracing::info!("committed {:?} ({} blocks)", blob, block_ids.len());
        Ok(())
    }

    async fn list_container(&self) -> Result<Vec<ObjectInfo>, TransferError> {
        let mut url = self.container.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("restype", "container")
            .append_pair("comp", "list");
        let date = sign::rfc1123_now();
        let canonical = canonical_list(&self.container, &date);
        let request = self
            .client
            .http()
            .get(url)
            .header("Date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", sign::authorization(&self.container, &canonical))
            .build()
            .map_err(|err| TransferError::Network(err.to_string()))?;
        let response = self.client.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Protocol(format!(
                "listing container {:?} returned status {status}",
                self.container.name
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|err| TransferError::Network(err.to_string()))?;
        let results = list::parse_enumeration(&body)?;
        Ok(results
            .blobs
            .blobs
            .iter()
            .map(list::BlobEntry::to_object_info)
            .collect())
    }
}

#[async_trait]
impl StorageProvider for CloudBlobProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CloudBlob
    }

    async fn stat(&self, path: &str) -> Result<ObjectInfo, TransferError> {
        self.list_container()
            .await?
            .into_iter()
            .find(|info| info.name == path)
            .ok_or_else(|| TransferError::NotFound(path.to_string()))
    }

    async fn glob(&self, pattern: &str) -> Result<Vec<ObjectInfo>, TransferError> {
        // object stores have no shell globbing: match on the literal prefix
        // up to the first wildcard
        let prefix = pattern.split(['*', '?']).next().unwrap_or(pattern);
        Ok(self
            .list_container()
            .await?
            .into_iter()
            .filter(|info| info.name.starts_with(prefix))
            .collect())
    }

    fn open(
        &self,
        _path: &str,
        _blocks: mpsc::Sender<Block>,
        _gate: Gate,
        _blocking: Blocking,
    ) -> Result<ProducerHandle, TransferError> {
        Err(TransferError::Unsupported("blob download is not implemented"))
    }

    async fn create(
        &self,
        name: &str,
        mut blocks: mpsc::Receiver<Block>,
        blocking: Blocking,
        gate: Gate,
    ) -> Result<(), TransferError> {
        let mut manifest: Vec<String> = vec![String::new(); blocking.block_count];
        let mut join_set = tokio::task::JoinSet::new();
        let mut received = 0usize;
        while let Some(block) = blocks.recv().await {
            let block_id = Self::make_block_id(name, block.ordinal);
            manifest[block.ordinal] = block_id.clone();
            received += 1;
            let token = gate.acquire().await;
            let this = self.clone();
            let blob = name.to_string();
            join_set.spawn(async move {
                let _token = token;
                tracing::debug!("uploading block {} of {:?} ({} bytes)", block.ordinal, blob, block.len());
                this.put_block(&blob, &block_id, block.bytes)
                    .await
                    .map_err(|err| TransferError::block(&blob, block.ordinal, &err.to_string()))
            });
        }
        let mut first_error: Option<TransferError> = None;
        while let Some(result) = join_set.join_next().await {
            let result =
                result.map_err(|err| TransferError::Protocol(format!("upload task failed: {err}")))?;
            if let Err(err) = result {
                tracing::error!("{err}");
                first_error = first_error.or(Some(err));
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }
        if received != blocking.block_count {
            return Err(TransferError::Protocol(format!(
                "{name:?}: expected {} blocks, received {received}; refusing to commit",
                blocking.block_count
            )));
        }
        self.put_block_list(name, &manifest).await
    }
}
