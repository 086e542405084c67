// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Overlay manifests stored as `<root>/<uuid>.json`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use super::{OverlayError, OverlayManifest, OverlayStore, ResolvedOverlay};

#[derive(Debug, Clone)]
pub struct FileOverlayStore {
    root: PathBuf,
}

impl FileOverlayStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self, id: &Uuid) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}

#[async_trait]
impl OverlayStore for FileOverlayStore {
    async fn load(&self, id: &Uuid) -> Result<ResolvedOverlay, OverlayError> {
        let id = *id;
        let path = self.manifest_path(&id);
        let root = self.root.clone();
        debug!("Loading overlay manifest {}", path.display());

        // Image decoding is CPU-bound
        tokio::task::spawn_blocking(move || {
            let json = match std::fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(OverlayError::NotFound(id))
                }
                Err(e) => {
                    return Err(OverlayError::Unreadable {
                        id,
                        message: e.to_string(),
                    })
                }
            };
            OverlayManifest::from_json(id, &json)?.resolve(id, &root)
        })
        .await
        .map_err(|e| OverlayError::Unreadable {
            id,
            message: e.to_string(),
        })?
    }
}
