// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process overlay store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OverlayError, OverlayStore, ResolvedOverlay};

#[derive(Debug, Default)]
pub struct InMemoryOverlayStore {
    overlays: RwLock<HashMap<Uuid, ResolvedOverlay>>,
}

impl InMemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: Uuid, overlay: ResolvedOverlay) {
        self.overlays.write().await.insert(id, overlay);
    }

    pub async fn remove(&self, id: &Uuid) -> Option<ResolvedOverlay> {
        self.overlays.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.overlays.read().await.len()
    }
}

#[async_trait]
impl OverlayStore for InMemoryOverlayStore {
    async fn load(&self, id: &Uuid) -> Result<ResolvedOverlay, OverlayError> {
        self.overlays
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(OverlayError::NotFound(*id))
    }
}
