//! Integration tests against a real server.
//!
//! Each test spawns an in-process axum server on 127.0.0.1:0 with in-memory
//! SQLite and a temp local store, then drives it with reqwest.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use fileable_ingest::{Download, Downloader, IngestError, Url};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use fileable_server::test_helpers::{spawn_test_server, spawn_test_server_with, test_state_with};

/// Serves a fixed PNG for `/ok/...` URLs and fails everything else.
struct FakeRemote;

#[async_trait]
impl Downloader for FakeRemote {
    async fn fetch(&self, url: &Url) -> Result<Download, IngestError> {
        if url.path().starts_with("/ok/") {
            Ok(Download {
                body: Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
                content_type: Some("image/png".into()),
            })
        } else {
            Err(IngestError::DownloadFailure(format!("{url}: 404 Not Found")))
        }
    }
}

fn text_part(name: &str, body: &'static str) -> Part {
    Part::bytes(body.as_bytes())
        .file_name(name.to_string())
        .mime_str("text/plain")
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let server = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/api/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v: Value = resp.json().await.unwrap();
    assert_eq!(v["status"], "ok");
}

#[tokio::test]
async fn attachment_lifecycle_via_http() {
    let server = spawn_test_server().await;
    let client = Client::new();
    let base = &server.base_url;

    // Upload two files for one owner
    let form = Form::new()
        .text("title", "ignored")
        .part("file[]", text_part("first.txt", "first body"))
        .part("file[]", text_part("second.txt", "second body"));
    let resp = client
        .post(format!("{base}/api/owners/post/42/attachments?path=posts/42&description=draft"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["name"], "first.txt");
    assert_eq!(created[1]["name"], "second.txt");
    assert_eq!(created[0]["mime_type"], "text/plain");
    assert_eq!(created[0]["size"], 10);
    assert_eq!(created[0]["status"], true);
    assert!(created[0]["path"].as_str().unwrap().starts_with("posts/42/"));
    let first_id = created[0]["id"].as_str().unwrap().to_string();

    // Content is served with the recorded MIME type
    let resp = client
        .get(format!("{base}/api/attachments/{first_id}/content"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/plain");
    assert_eq!(resp.text().await.unwrap(), "first body");

    // Soft delete hides it from the default listing
    let resp = client
        .delete(format!("{base}/api/attachments/{first_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let trashed: Value = resp.json().await.unwrap();
    assert!(!trashed["deleted_at"].is_null());

    let live: Vec<Value> = client
        .get(format!("{base}/api/owners/post/42/attachments"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(live.len(), 1);

    let all: Vec<Value> = client
        .get(format!("{base}/api/owners/post/42/attachments?with_trashed=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // The stored bytes survive the soft delete
    let path = created[0]["path"].as_str().unwrap();
    assert_eq!(
        server.state.store.get(path).await.unwrap().as_ref(),
        b"first body"
    );

    let resp = client
        .get(format!("{base}/api/attachments/{first_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Restore
    let resp = client
        .post(format!("{base}/api/attachments/{first_id}/restore"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client
        .get(format!("{base}/api/attachments/{first_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_owner_creates_no_rows() {
    let server = spawn_test_server().await;
    let client = Client::new();

    let form = Form::new().part("file", text_part("loose.txt", "loose"));
    let resp = client
        .post(format!("{}/api/uploads", server.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let v: Value = resp.json().await.unwrap();
    let path = v["paths"][0].as_str().unwrap();
    assert!(path.starts_with("uploads/"));

    let rows = server
        .state
        .db
        .list_attachments(&Default::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn remote_urls_are_downloaded_and_attached() {
    let server = spawn_test_server_with(test_state_with(Arc::new(FakeRemote))).await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/api/owners/user/9/attachments/remote", server.base_url))
        .json(&json!({
            "urls": ["https://cdn.example.com/ok/avatar.png"],
            "description": "avatar",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["name"], "avatar.png");
    assert_eq!(created[0]["type"], "png");
    assert_eq!(created[0]["mime_type"], "image/png");
    assert!(created[0]["path"].as_str().unwrap().ends_with(".png"));
    assert!(created[0]["path"].as_str().unwrap().starts_with("uploads/user/"));
}

#[tokio::test]
async fn failed_download_is_bad_gateway() {
    let server = spawn_test_server_with(test_state_with(Arc::new(FakeRemote))).await;
    let resp = Client::new()
        .post(format!("{}/api/owners/user/9/attachments/remote", server.base_url))
        .json(&json!({ "urls": ["https://cdn.example.com/missing.png"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v: Value = resp.json().await.unwrap();
    assert!(v["error"].as_str().unwrap().contains("download failed"));
}
