//! Application context shared across route handlers.
//!
//! [`AppContext`] is cloned into every handler via Axum state. Everything it
//! holds is immutable after startup, so handlers never take a lock.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use ks_core::config::Config;
use ks_core::{MimeTable, StorageRoot};

use crate::middleware::access::AccessGate;

/// Central state for the HTTP server.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Canonical upload directory media paths resolve against.
    pub storage: Arc<StorageRoot>,
    /// Extension to MIME allow-list.
    pub mime: Arc<MimeTable>,
    pub gate: Arc<AccessGate>,
    /// Prometheus render handle; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppContext {
    /// Build the context from configuration. Fails if the upload directory
    /// cannot be canonicalized.
    pub fn new(config: Config, metrics: Option<PrometheusHandle>) -> ks_core::Result<Self> {
        let storage = StorageRoot::new(&config.storage.upload_dir)?;
        let gate = AccessGate::new(config.access.event_token.clone());

        tracing::info!(
            upload_dir = %storage.path().display(),
            token_required = gate.is_token_required(),
            verify_signatures = config.media.verify_signatures,
            "Media context ready"
        );

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            mime: Arc::new(MimeTable::new()),
            gate: Arc::new(gate),
            metrics,
        })
    }
}
