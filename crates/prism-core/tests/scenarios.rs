//! End-to-end render scenarios against stubbed origin and metadata services.

use async_trait::async_trait;
use bytes::Bytes;
use httpmock::prelude::*;
use image::{DynamicImage, GenericImageView, ImageFormat};
use prism_core::config::RatioSource;
use prism_core::error::StoreError;
use prism_core::{CacheStore, Config, MemoryStore, Prism, RenderRequest, Trace};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

fn config(server: &MockServer, mirror: &TempDir) -> Config {
    let mut config = Config::default();
    config.origin.base_url = server.base_url();
    config.metadata.base_url = format!("{}/", server.base_url());
    config.mirror.base_dir = mirror.path().to_string_lossy().into_owned();
    config
}

fn seed_placeholder(mirror: &TempDir) {
    std::fs::write(mirror.path().join("default_missing.jpg"), jpeg(16, 16)).unwrap();
}

fn request(path: &str) -> RenderRequest {
    RenderRequest::from_path(path, Trace::discard()).unwrap()
}

fn dimensions(bytes: &[u8]) -> (u32, u32) {
    image::load_from_memory(bytes).unwrap().dimensions()
}

#[tokio::test]
async fn test_direct_request_fetches_mirrors_and_caches() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    let origin = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/mgid:file:gsp:assets:/cc/photo.jpg")
                .query_param("q", ".9");
            then.status(200).body(jpeg(1920, 1280));
        })
        .await;

    let prism = Prism::with_memory_store(config(&server, &mirror)).unwrap();
    let path = "/uri/rw=480:rh=320:q=50/mgid:file:gsp:assets:/cc/photo.jpg";

    let first = prism.render(&request(path)).await.unwrap();
    assert_eq!(first.format, "jpg");
    assert_eq!(first.content_type(), "image/jpg");
    assert!(!first.placeholder);
    assert!(!first.cached);
    assert_eq!(dimensions(&first.bytes), (480, 320));
    assert!(mirror
        .path()
        .join("mgid_file_gsp_assets_/cc/photo.jpg")
        .exists());

    let second = prism.render(&request(path)).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.bytes, first.bytes);
    assert_eq!(second.etag(), first.etag());
    assert_eq!(origin.hits_async().await, 1);
}

#[tokio::test]
async fn test_identifier_request_applies_matching_crop_set() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    let metadata = server
        .mock_async(|when, then| {
            when.method(GET).path("/jp/example.com");
            then.status(200).json_body(json!({
                "response": {"docs": [{
                    "Images": [
                        {"ImageAssetRefs": [{"Width": 1920, "Height": 1080, "URI": "mgid:file:/wide.jpg"}]},
                        {
                            "ImageAssetRefs": [{"Width": 1200, "Height": 900, "URI": "mgid:file:/square.jpg"}],
                            "VirtualImageParams": [{"CropSizeWidth": 800, "CropSizeHeight": 800, "TopLeftX": 200, "TopLeftY": 50}]
                        }
                    ]
                }]}
            }));
        })
        .await;
    let wide = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/wide.jpg");
            then.status(200).body(jpeg(1920, 1080));
        })
        .await;
    let square = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/square.jpg");
            then.status(200).body(jpeg(1200, 900));
        })
        .await;

    let prism = Prism::with_memory_store(config(&server, &mirror)).unwrap();
    let trace = Trace::collecting();
    let req = RenderRequest::from_path(
        "/oid/rw=500:rh=500/mgid:arc:video:example.com:item-1",
        trace.clone(),
    )
    .unwrap();

    let rendered = prism.render(&req).await.unwrap();
    assert!(!rendered.placeholder);
    assert_eq!(dimensions(&rendered.bytes), (500, 500));
    assert_eq!(metadata.hits_async().await, 1);
    assert_eq!(square.hits_async().await, 1);
    assert_eq!(wide.hits_async().await, 0);
    assert!(trace
        .lines()
        .iter()
        .any(|line| line.contains("crop: 800x800 at 200,50")));
}

#[tokio::test]
async fn test_crop_ratio_source_matches_on_crop_directive() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/jp/example.com");
            then.status(200).json_body(json!({
                "response": {"docs": [{
                    "Images": [
                        {"ImageAssetRefs": [{"Width": 1920, "Height": 1080, "URI": "mgid:file:/wide.jpg"}]},
                        {
                            "ImageAssetRefs": [{"Width": 1200, "Height": 900, "URI": "mgid:file:/square.jpg"}],
                            "VirtualImageParams": [{"CropSizeWidth": 800, "CropSizeHeight": 800, "TopLeftX": 200, "TopLeftY": 50}]
                        }
                    ]
                }]}
            }));
        })
        .await;
    let wide = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/wide.jpg");
            then.status(200).body(jpeg(1920, 1080));
        })
        .await;
    let square = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/square.jpg");
            then.status(200).body(jpeg(1200, 900));
        })
        .await;

    let mut config = config(&server, &mirror);
    config.variant.ratio_source = RatioSource::Crop;
    let prism = Prism::with_memory_store(config).unwrap();

    // 1600x900 targets the 16:9 candidate even though rw/rh are square
    let rendered = prism
        .render(&request(
            "/oid/rw=500:rh=500:cw=1600:ch=900/mgid:arc:video:example.com:item-1",
        ))
        .await
        .unwrap();
    assert!(!rendered.placeholder);
    assert_eq!(dimensions(&rendered.bytes), (500, 500));
    assert_eq!(wide.hits_async().await, 1);
    assert_eq!(square.hits_async().await, 0);
}

#[tokio::test]
async fn test_refresh_bypasses_caches_and_refetches() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    let metadata = server
        .mock_async(|when, then| {
            when.method(GET).path("/jp/example.com");
            then.status(200).json_body(json!({
                "response": {"docs": [{
                    "ImageAssetRefs": [{"Width": 40, "Height": 30, "URI": "mgid:file:/refresh.jpg"}]
                }]}
            }));
        })
        .await;
    let original = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/refresh.jpg");
            then.status(200).body(jpeg(40, 30));
        })
        .await;

    let prism = Prism::with_memory_store(config(&server, &mirror)).unwrap();
    let path = "/oid/mgid:arc:image:example.com:item-2";

    let first = prism.render(&request(path)).await.unwrap();
    assert_eq!(dimensions(&first.bytes), (40, 30));
    assert!(prism.render(&request(path)).await.unwrap().cached);
    assert_eq!(metadata.hits_async().await, 1);

    original.delete_async().await;
    let updated = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/refresh.jpg");
            then.status(200).body(jpeg(60, 20));
        })
        .await;

    let refreshed = prism
        .render(&request(path).with_refresh(true))
        .await
        .unwrap();
    assert!(!refreshed.cached);
    assert_eq!(dimensions(&refreshed.bytes), (60, 20));
    assert_eq!(metadata.hits_async().await, 2);
    assert_eq!(updated.hits_async().await, 1);

    let after = prism.render(&request(path)).await.unwrap();
    assert!(after.cached);
    assert_eq!(dimensions(&after.bytes), (60, 20));
}

#[tokio::test]
async fn test_unsupported_provider_serves_placeholder() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    seed_placeholder(&mirror);
    let metadata = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(json!({"response": {"docs": []}}));
        })
        .await;

    let prism = Prism::with_memory_store(config(&server, &mirror)).unwrap();
    let path = "/oid/mgid:other:video:example.com:item-3";

    let rendered = prism.render(&request(path)).await.unwrap();
    assert!(rendered.placeholder);
    assert_eq!(dimensions(&rendered.bytes), (16, 16));
    assert_eq!(metadata.hits_async().await, 0);

    let again = prism.render(&request(path)).await.unwrap();
    assert!(!again.cached);
}

#[tokio::test]
async fn test_empty_cached_format_is_a_miss() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    let origin = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/stale.jpg");
            then.status(200).body(jpeg(10, 10));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let path = "/uri/mgid:file:/stale.jpg";
    let ttl = Duration::from_secs(60);
    store
        .set(&format!("prism_cache_{path}"), Bytes::from_static(b"stale"), ttl)
        .await
        .unwrap();
    store
        .set(&format!("prism_cache_format_{path}"), Bytes::new(), ttl)
        .await
        .unwrap();

    let prism = Prism::new(config(&server, &mirror), store.clone()).unwrap();
    let rendered = prism.render(&request(path)).await.unwrap();
    assert!(!rendered.cached);
    assert_ne!(&rendered.bytes[..], b"stale");
    assert_eq!(origin.hits_async().await, 1);
    assert_eq!(
        store
            .get(&format!("prism_cache_format_{path}"))
            .await
            .unwrap()
            .unwrap(),
        Bytes::from_static(b"jpg")
    );
}

#[tokio::test]
async fn test_concurrent_misses_one_fetch_one_placeholder() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    seed_placeholder(&mirror);
    let origin = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/hot.jpg");
            then.status(200)
                .delay(Duration::from_millis(300))
                .body(jpeg(32, 32));
        })
        .await;

    let prism = Prism::with_memory_store(config(&server, &mirror)).unwrap();
    let path = "/uri/mgid:file:/hot.jpg";
    let (first, second) = (request(path), request(path));
    let (a, b) = tokio::join!(prism.render(&first), prism.render(&second));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.placeholder, b.placeholder);
    let fetched = if a.placeholder { &b } else { &a };
    assert_eq!(dimensions(&fetched.bytes), (32, 32));
    assert_eq!(origin.hits_async().await, 1);
}

/// Store whose writes or claims can be made to fail.
struct FlakyStore {
    inner: MemoryStore,
    fail_format_writes: bool,
    fail_claims: bool,
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        if self.fail_format_writes && key.contains("cache_format_") {
            return Err(StoreError::Unavailable("format write refused".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        if self.fail_claims {
            return Err(StoreError::Unavailable("claim refused".to_string()));
        }
        self.inner.claim(key, ttl).await
    }
}

#[tokio::test]
async fn test_payload_not_cached_when_format_write_fails() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    let origin = server
        .mock_async(|when, then| {
            when.method(GET).path("/mgid:file:/a.jpg");
            then.status(200).body(jpeg(8, 8));
        })
        .await;

    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        fail_format_writes: true,
        fail_claims: false,
    });
    let prism = Prism::new(config(&server, &mirror), store.clone()).unwrap();
    let path = "/uri/mgid:file:/a.jpg";

    prism.render(&request(path)).await.unwrap();
    assert!(store
        .get(&format!("prism_cache_{path}"))
        .await
        .unwrap()
        .is_none());

    let second = prism.render(&request(path)).await.unwrap();
    assert!(!second.cached);
    // Served from the mirror, not the origin
    assert_eq!(origin.hits_async().await, 1);
}

#[tokio::test]
async fn test_claim_failure_counts_as_denial() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    seed_placeholder(&mirror);
    let origin = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).body(jpeg(8, 8));
        })
        .await;

    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        fail_format_writes: false,
        fail_claims: true,
    });
    let prism = Prism::new(config(&server, &mirror), store).unwrap();

    let rendered = prism
        .render(&request("/uri/mgid:file:/b.jpg"))
        .await
        .unwrap();
    assert!(rendered.placeholder);
    assert_eq!(origin.hits_async().await, 0);
}

#[tokio::test]
async fn test_missing_placeholder_is_fatal() {
    let server = MockServer::start_async().await;
    let mirror = TempDir::new().unwrap();
    server
        .mock_async(|when, then| {
            when.any_request();
            then.status(404);
        })
        .await;

    let prism = Prism::with_memory_store(config(&server, &mirror)).unwrap();
    let err = prism
        .render(&request("/uri/mgid:file:/gone.jpg"))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        prism_core::RenderError::PlaceholderUnavailable { .. }
    ));
}

#[test]
fn test_unset_endpoint_is_config_error() {
    let mut config = Config::default();
    config.origin.base_url = "${PRISM_TEST_SURELY_UNSET_ORIGIN}".to_string();
    config.metadata.base_url = "http://meta/".to_string();
    config.mirror.base_dir = "/tmp".to_string();
    let err = Prism::with_memory_store(config).err().unwrap();
    assert!(err.to_string().contains("origin.base_url"));
}
