//! Shared-key request signing
//!
//! Each operation kind signs a canonical newline-delimited string with a
//! fixed field order; fields that do not apply stay as empty lines. The
//! signature is over the exact byte layout, blank lines included - any
//! deviation makes the service reject every request.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::hmac;

use crate::container::{Container, SharedKey};

/// Fixed protocol-version marker sent and signed with every request.
pub const STORAGE_API_VERSION: &str = "2017-11-09";

/// Current time in the RFC-1123 layout the wire protocol requires,
/// e.g. `Mon, 02 Jan 2006 15:04:05 GMT`.
pub fn rfc1123_now() -> String {
    chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Canonical string for the container enumeration GET.
pub fn canonical_list(container: &Container, date: &str) -> String {
    format!(
        "GET\n\n\n\n\n\n{date}\n\n\n\n\n\nx-ms-version:{STORAGE_API_VERSION}\n\
        /{account}/{name}\ncomp:list\nrestype:container",
        account = container.account,
        name = container.name,
    )
}

/// Canonical string for a single block PUT.
pub fn canonical_put_block(
    container: &Container,
    blob: &str,
    block_id: &str,
    content_length: usize,
    date: &str,
) -> String {
    format!(
        "PUT\n\n\n{content_length}\n\n\n{date}\n\n\n\n\n\nx-ms-version:{STORAGE_API_VERSION}\n\
        /{account}/{name}/{blob}\nblockid:{block_id}\ncomp:block",
        account = container.account,
        name = container.name,
    )
}

/// Canonical string for the block-list commit PUT.
pub fn canonical_put_block_list(
    container: &Container,
    blob: &str,
    content_length: usize,
    date: &str,
) -> String {
    format!(
        "PUT\n\n\n{content_length}\n\n\n{date}\n\n\n\n\n\nx-ms-version:{STORAGE_API_VERSION}\n\
        /{account}/{name}/{blob}\ncomp:blocklist",
        account = container.account,
        name = container.name,
    )
}

/// HMAC-SHA256 over the UTF-8 bytes of `canonical` with the decoded account
/// key, base64-encoded.
pub fn sign(canonical: &str, key: &SharedKey) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key.bytes());
    let tag = hmac::sign(&key, canonical.as_bytes());
    BASE64.encode(tag.as_ref())
}

/// `Authorization` header value: `SharedKey {account}:{signature}`.
pub fn authorization(container: &Container, canonical: &str) -> String {
    let signature = sign(canonical, &container.key);
    tracing::trace!("canonical string:\n{}", canonical);
    format!("SharedKey {}:{}", container.account, signature)
}
