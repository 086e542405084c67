// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR backend abstraction and the shared, lazily initialized backend handle
//!
//! Model state is expensive to load, so a `SharedOcrBackend` is built once at
//! startup and cloned into every evaluation. The underlying backend is created
//! on first use through a `tokio::sync::OnceCell`: concurrent first callers
//! wait on the same initialization, and a failed initialization leaves the
//! cell empty so the next request retries. The backend is torn down when the
//! last clone of the handle is dropped.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use image::DynamicImage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn, Instrument};

/// Text recognized in an image region
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    /// Recognized text, lines separated by `\n`
    pub text: String,
    /// Mean per-token confidence (0.0-1.0)
    pub confidence: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl OcrOutput {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            processing_time_ms: 0,
        }
    }
}

/// A text recognition backend
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Short backend name reported alongside results
    fn name(&self) -> &str;

    /// Recognize all text in the image
    async fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput>;
}

type BackendFactory =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn OcrBackend>>> + Send + Sync>;

/// Shared handle to an OCR backend initialized at most once
#[derive(Clone)]
pub struct SharedOcrBackend {
    name: String,
    cell: Arc<OnceCell<Arc<dyn OcrBackend>>>,
    factory: Option<BackendFactory>,
}

impl std::fmt::Debug for SharedOcrBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedOcrBackend")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl SharedOcrBackend {
    /// Backend created by `factory` on first use
    pub fn lazy<F, Fut>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn OcrBackend>>> + Send + 'static,
    {
        let factory: BackendFactory = Arc::new(move || factory().boxed());
        Self {
            name: name.into(),
            cell: Arc::new(OnceCell::new()),
            factory: Some(factory),
        }
    }

    /// Wrap an already constructed backend
    pub fn ready(backend: Arc<dyn OcrBackend>) -> Self {
        Self {
            name: backend.name().to_string(),
            cell: Arc::new(OnceCell::new_with(Some(backend))),
            factory: None,
        }
    }

    /// Handle with no backend; every call fails
    pub fn disabled() -> Self {
        Self {
            name: "disabled".to_string(),
            cell: Arc::new(OnceCell::new()),
            factory: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the backend, initializing it if this is the first use
    ///
    /// Initialization runs in its own task, so a caller that is cancelled
    /// mid-load does not abandon it; later callers wait on the same load.
    pub async fn get(&self) -> Result<Arc<dyn OcrBackend>> {
        if let Some(backend) = self.cell.get() {
            return Ok(backend.clone());
        }

        let factory = self
            .factory
            .clone()
            .ok_or_else(|| anyhow!("OCR backend is disabled"))?;
        let cell = self.cell.clone();
        let name = self.name.clone();

        let init = tokio::spawn(
            async move {
                let backend = cell
                    .get_or_try_init(|| async {
                        info!("Initializing OCR backend '{}'", name);
                        match factory().await {
                            Ok(backend) => {
                                info!("✅ OCR backend '{}' ready", name);
                                Ok(backend)
                            }
                            Err(e) => {
                                warn!("⚠️ OCR backend '{}' failed to initialize: {}", name, e);
                                Err(e)
                            }
                        }
                    })
                    .await?
                    .clone();
                Ok::<_, anyhow::Error>(backend)
            }
            .in_current_span(),
        );

        init.await
            .map_err(|e| anyhow!("OCR backend initialization aborted: {}", e))?
    }
}
