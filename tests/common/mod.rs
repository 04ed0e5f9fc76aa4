//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a temporary upload directory,
//! a config pointing at it, and a full [`AppContext`]. The [`with_server`]
//! constructors start Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ks_core::config::Config;
use ks_server::context::AppContext;
use ks_server::router::build_router;
use tempfile::TempDir;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary upload directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The upload dir is
    /// always replaced by a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create upload dir");
        config.storage.upload_dir = dir.path().to_path_buf();
        let ctx = AppContext::new(config, None).expect("failed to build context");
        Self { ctx, dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Root of the upload directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the upload root, creating parent directories.
    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture");
        path
    }
}

/// Deterministic, non-repeating-ish payload of `len` bytes.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
