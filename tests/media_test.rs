//! Integration tests for `/media` over a real socket.

mod common;

use common::{patterned, TestHarness};
use reqwest::StatusCode;

fn header<'a>(resp: &'a reqwest::Response, name: &str) -> &'a str {
    resp.headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn full_photo_download() {
    let (h, addr) = TestHarness::with_server().await;
    let data = patterned(1000);
    h.write("photo.jpg", &data);

    let resp = reqwest::get(format!("http://{addr}/media/photo.jpg"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-type"), "image/jpeg");
    assert_eq!(header(&resp, "content-length"), "1000");
    assert_eq!(header(&resp, "accept-ranges"), "bytes");
    assert!(resp.headers().get("content-range").is_none());

    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..], &data[..]);
}

#[tokio::test]
async fn first_hundred_bytes() {
    let (h, addr) = TestHarness::with_server().await;
    let data = patterned(1000);
    h.write("photo.jpg", &data);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/media/photo.jpg"))
        .header("Range", "bytes=0-99")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&resp, "content-range"), "bytes 0-99/1000");
    assert_eq!(header(&resp, "content-length"), "100");
    assert_eq!(header(&resp, "accept-ranges"), "bytes");

    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..], &data[0..100]);
}

#[tokio::test]
async fn open_ended_range_returns_last_byte() {
    let (h, addr) = TestHarness::with_server().await;
    let data = patterned(1000);
    h.write("photo.jpg", &data);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/media/photo.jpg"))
        .header("Range", "bytes=999-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&resp, "content-range"), "bytes 999-999/1000");
    assert_eq!(header(&resp, "content-length"), "1");
    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..], &data[999..]);
}

#[tokio::test]
async fn range_past_end_is_416_with_empty_body() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("photo.jpg", &patterned(1000));

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/media/photo.jpg"))
        .header("Range", "bytes=1000-1005")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header(&resp, "content-range"), "bytes */1000");
    assert!(resp.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn end_beyond_size_is_clamped() {
    let (h, addr) = TestHarness::with_server().await;
    let data = patterned(1000);
    h.write("photo.jpg", &data);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/media/photo.jpg"))
        .header("Range", "bytes=900-5000")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&resp, "content-range"), "bytes 900-999/1000");
    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..], &data[900..]);
}

#[tokio::test]
async fn halves_reassemble_the_file() {
    let (h, addr) = TestHarness::with_server().await;
    let data = patterned(4321);
    h.write("videos/first-dance.mp4", &data);

    let client = reqwest::Client::new();
    let url = format!("http://{addr}/media/videos/first-dance.mp4");
    let mid = data.len() / 2;

    let first = client
        .get(&url)
        .header("Range", format!("bytes=0-{}", mid - 1))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&first, "content-type"), "video/mp4");
    let mut joined = first.bytes().await.unwrap().to_vec();

    let second = client
        .get(&url)
        .header("Range", format!("bytes={mid}-"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::PARTIAL_CONTENT);
    joined.extend_from_slice(&second.bytes().await.unwrap());

    assert_eq!(joined, data);
}

#[tokio::test]
async fn missing_file_is_404() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("http://{addr}/media/ghost.png"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn unsupported_extension_is_415() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("video.mkv", &patterned(64));

    let resp = reqwest::get(format!("http://{addr}/media/video.mkv"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "unsupported_media_type");
}

#[tokio::test]
async fn directory_is_404() {
    let (h, addr) = TestHarness::with_server().await;
    std::fs::create_dir_all(h.root().join("album.jpg")).unwrap();

    let resp = reqwest::get(format!("http://{addr}/media/album.jpg"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uppercase_extension_is_served() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("IMG_0042.JPEG", &patterned(10));

    let resp = reqwest::get(format!("http://{addr}/media/IMG_0042.JPEG"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-type"), "image/jpeg");
}

#[tokio::test]
async fn percent_encoded_names_resolve() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("guests/toast speech.mov", &patterned(32));

    let resp = reqwest::get(format!("http://{addr}/media/guests/toast%20speech.mov"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-type"), "video/quicktime");
    assert_eq!(resp.bytes().await.unwrap().len(), 32);
}

#[tokio::test]
async fn success_headers_forbid_sniffing() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("cake.webp", &patterned(16));

    let resp = reqwest::get(format!("http://{addr}/media/cake.webp"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "x-content-type-options"), "nosniff");
    assert!(header(&resp, "cache-control").contains("max-age"));
    assert!(resp.headers().contains_key("x-request-id"));
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_out_of_root_is_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let outside = tempfile::tempdir().unwrap();
    let secret = outside.path().join("secret.jpg");
    std::fs::write(&secret, b"not for guests").unwrap();
    std::os::unix::fs::symlink(&secret, h.root().join("leak.jpg")).unwrap();

    let resp = reqwest::get(format!("http://{addr}/media/leak.jpg"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signature_check_rejects_disguised_files() {
    let mut config = ks_core::config::Config::default();
    config.media.verify_signatures = true;
    let (h, addr) = TestHarness::with_server_config(config).await;

    // PNG magic bytes behind an .mp4 name.
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&patterned(64));
    h.write("not-a-video.mp4", &png);

    let resp = reqwest::get(format!("http://{addr}/media/not-a-video.mp4"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn health_reports_ok() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}
