//! Wire-level signing tests against a loopback capture server.
//!
//! The signature is only valid if the fields it covers are the fields the
//! request actually carries, so these tests rebuild the canonical string
//! from the captured headers and body and compare signatures.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::sync::mpsc;

use blob::sign;
use blob::{CloudBlobProvider, Container};
use common::chunk;
use common::object::Block;
use common::provider::StorageProvider;
use gate::Gate;

const KEY: &str = "c2lnbmluZy1rZXktYnl0ZXM=";

const EMPTY_LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="http://localhost/" ContainerName="cont"><Blobs /></EnumerationResults>"#;

#[derive(Debug, Clone)]
struct Captured {
    method: String,
    target: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

/// Accepts connections, records each request and answers GETs with an empty
/// listing and everything else with the given status line.
fn spawn_capture_server(
    listener: TcpListener,
    captured: Arc<Mutex<Vec<Captured>>>,
    put_status: &'static str,
) {
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let captured = captured.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut tmp = [0u8; 4096];
                let header_end = loop {
                    let Ok(n) = stream.read(&mut tmp).await else {
                        return;
                    };
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&tmp[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
                let mut lines = head.lines();
                let mut request_line = lines.next().unwrap_or_default().split_whitespace();
                let method = request_line.next().unwrap_or_default().to_string();
                let target = request_line.next().unwrap_or_default().to_string();
                let mut headers = HashMap::new();
                for line in lines {
                    if let Some((name, value)) = line.split_once(':') {
                        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                    }
                }
                let content_length: usize = headers
                    .get("content-length")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let mut body = buf[header_end..].to_vec();
                while body.len() < content_length {
                    let Ok(n) = stream.read(&mut tmp).await else {
                        return;
                    };
                    if n == 0 {
                        break;
                    }
                    body.extend_from_slice(&tmp[..n]);
                }
                let response = if method == "GET" {
                    format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        EMPTY_LISTING.len(),
                        EMPTY_LISTING
                    )
                } else {
                    format!(
                        "HTTP/1.1 {put_status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    )
                };
                captured.lock().await.push(Captured {
                    method,
                    target,
                    headers,
                    body,
                });
                stream.write_all(response.as_bytes()).await.ok();
            });
        }
    });
}

async fn capture_setup(
    put_status: &'static str,
) -> (Container, CloudBlobProvider, Arc<Mutex<Vec<Captured>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let captured = Arc::new(Mutex::new(Vec::new()));
    spawn_capture_server(listener, captured.clone(), put_status);
    let container = Container::with_endpoint(
        "acct",
        "cont",
        KEY,
        &format!("http://127.0.0.1:{port}/cont"),
    )
    .unwrap();
    let provider = CloudBlobProvider::new(container.clone()).unwrap();
    (container, provider, captured)
}

/// Block IDs are base64 of the first 8 digest bytes (hex) plus the ordinal.
fn expected_block_id(blob_name: &str, ordinal: usize) -> String {
    let digest = Sha256::digest(blob_name.as_bytes());
    BASE64.encode(format!("{}{ordinal:08}", hex::encode(&digest[..8])))
}

fn expected_authorization(container: &Container, canonical: &str) -> String {
    format!("SharedKey acct:{}", sign::sign(canonical, &container.key))
}

#[tokio::test]
async fn emitted_headers_match_the_signed_fields() {
    let (container, provider, captured) = capture_setup("201 Created").await;

    let data = b"hello block protocol";
    let blocking = chunk::compute_blocking(data.len() as u64, chunk::MIN_BLOCK_SIZE).unwrap();
    let (tx, rx) = mpsc::channel(1);
    tx.send(Block::copy_from(data, 0)).await.unwrap();
    drop(tx);
    provider
        .create("data.bin", rx, blocking, Gate::new(2))
        .await
        .unwrap();

    let requests = captured.lock().await.clone();
    assert_eq!(requests.len(), 2);
    let put_block = requests
        .iter()
        .find(|r| r.target.contains("blockid="))
        .unwrap();
    let commit = requests
        .iter()
        .find(|r| r.target.contains("comp=blocklist"))
        .unwrap();

    for request in [put_block, commit] {
        assert_eq!(request.method, "PUT");
        assert!(request.target.starts_with("/cont/data.bin?"));
        // the canonical string signs the Date slot, so the date must travel
        // as the Date header and never as an (unsigned) x-ms-* header
        assert!(
            request.headers.contains_key("date"),
            "Date header missing: {:?}",
            request.headers
        );
        assert!(!request.headers.contains_key("x-ms-date"));
        assert_eq!(request.headers["x-ms-version"], sign::STORAGE_API_VERSION);
    }

    let block_id = expected_block_id("data.bin", 0);
    let canonical = sign::canonical_put_block(
        &container,
        "data.bin",
        &block_id,
        data.len(),
        &put_block.headers["date"],
    );
    assert_eq!(
        put_block.headers["authorization"],
        expected_authorization(&container, &canonical)
    );
    assert_eq!(put_block.body, data);

    let canonical = sign::canonical_put_block_list(
        &container,
        "data.bin",
        commit.body.len(),
        &commit.headers["date"],
    );
    assert_eq!(
        commit.headers["authorization"],
        expected_authorization(&container, &canonical)
    );
    let commit_body = String::from_utf8(commit.body.clone()).unwrap();
    assert!(commit_body.contains(&format!("<Uncommitted>{block_id}</Uncommitted>")));
}

#[tokio::test]
async fn listing_requests_are_signed_consistently() {
    let (container, provider, captured) = capture_setup("201 Created").await;

    let objects = provider.glob("").await.unwrap();
    assert!(objects.is_empty());

    let requests = captured.lock().await.clone();
    assert_eq!(requests.len(), 1);
    let list = &requests[0];
    assert_eq!(list.method, "GET");
    assert!(list.target.contains("restype=container"));
    assert!(list.target.contains("comp=list"));
    assert!(list.headers.contains_key("date"));
    assert!(!list.headers.contains_key("x-ms-date"));
    let canonical = sign::canonical_list(&container, &list.headers["date"]);
    assert_eq!(
        list.headers["authorization"],
        expected_authorization(&container, &canonical)
    );
}

#[tokio::test]
async fn retry_budget_is_configurable() {
    let (_container, provider, captured) = capture_setup("503 Service Unavailable").await;
    let provider = provider.with_retries(1);

    let data = b"will not land";
    let blocking = chunk::compute_blocking(data.len() as u64, chunk::MIN_BLOCK_SIZE).unwrap();
    let (tx, rx) = mpsc::channel(1);
    tx.send(Block::copy_from(data, 0)).await.unwrap();
    drop(tx);
    let err = provider
        .create("data.bin", rx, blocking, Gate::new(2))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("block 0"), "{err}");

    // one attempt plus one retry, and the failure must prevent the commit
    let requests = captured.lock().await.clone();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.target.contains("blockid=")));
}
