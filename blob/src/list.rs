//! XML wire formats: container enumeration results and the block-list
//! commit body.

use chrono::{DateTime, Utc};
use common::TransferError;
use common::object::ObjectInfo;
use serde::Deserialize;

/// `<EnumerationResults>` document returned by a container listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnumerationResults {
    #[serde(rename = "@ServiceEndpoint", default)]
    pub service_endpoint: String,
    #[serde(rename = "@ContainerName", default)]
    pub container_name: String,
    #[serde(default)]
    pub blobs: Blobs,
}

#[derive(Debug, Default, Deserialize)]
pub struct Blobs {
    #[serde(rename = "Blob", default)]
    pub blobs: Vec<BlobEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlobEntry {
    pub name: String,
    pub properties: BlobProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlobProperties {
    #[serde(rename = "Creation-Time", default)]
    pub creation_time: String,
    #[serde(rename = "Last-Modified", default)]
    pub last_modified: String,
    #[serde(rename = "Etag", default)]
    pub etag: String,
    #[serde(rename = "Content-Length", default)]
    pub content_length: u64,
    #[serde(rename = "Content-Type", default)]
    pub content_type: String,
    #[serde(rename = "Content-MD5", default)]
    pub content_md5: String,
    #[serde(rename = "BlobType", default)]
    pub blob_type: String,
    #[serde(rename = "AccessTier", default)]
    pub access_tier: String,
    #[serde(rename = "LeaseState", default)]
    pub lease_state: String,
    #[serde(rename = "ServerEncrypted", default)]
    pub server_encrypted: String,
}

/// Parses an enumeration response body.
pub fn parse_enumeration(xml: &str) -> Result<EnumerationResults, TransferError> {
    quick_xml::de::from_str(xml)
        .map_err(|err| TransferError::Protocol(format!("bad enumeration response: {err}")))
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl BlobEntry {
    pub fn to_object_info(&self) -> ObjectInfo {
        ObjectInfo {
            name: self.name.clone(),
            path: self.name.clone(),
            length: self.properties.content_length,
            created_at: parse_http_date(&self.properties.creation_time),
            last_modified: parse_http_date(&self.properties.last_modified),
            etag: self.properties.etag.clone(),
            md5: self.properties.content_md5.clone(),
            content_type: self.properties.content_type.clone(),
            object_type: self.properties.blob_type.clone(),
            is_dir: false,
        }
    }
}

/// Serializes the commit body listing every uploaded block identifier in
/// manifest (ordinal) order.
pub fn block_list_body(block_ids: &[String]) -> String {
    let mut body = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<BlockList>\n");
    for id in block_ids {
        body.push_str("  <Uncommitted>");
        body.push_str(id);
        body.push_str("</Uncommitted>\n");
    }
    body.push_str("</BlockList>");
    body
}
