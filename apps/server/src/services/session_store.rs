// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory session store with idle expiry.
//!
//! Each session sits behind its own async mutex so requests on one session
//! run one at a time while other sessions proceed.

use crate::error::ApiError;
use ifc_report_processing::ReportSession;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

/// One stored session.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: Uuid,
    session: Arc<Mutex<ReportSession>>,
    /// Milliseconds since the store epoch
    last_used_ms: AtomicU64,
}

impl SessionHandle {
    /// Lock the session; the guard can move into a blocking task.
    pub async fn lock(&self) -> OwnedMutexGuard<ReportSession> {
        self.session.clone().lock_owned().await
    }
}

/// Process-local map of live sessions.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
    ttl: Duration,
    epoch: Instant,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Start a new empty session.
    pub async fn create(&self) -> Arc<SessionHandle> {
        let handle = Arc::new(SessionHandle {
            id: Uuid::new_v4(),
            session: Arc::new(Mutex::new(ReportSession::new())),
            last_used_ms: AtomicU64::new(self.now_ms()),
        });
        self.sessions.write().await.insert(handle.id, handle.clone());
        tracing::info!(session = %handle.id, "Session created");
        handle
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: Uuid) -> Result<Arc<SessionHandle>, ApiError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))?;
        handle.last_used_ms.store(self.now_ms(), Ordering::Relaxed);
        Ok(handle)
    }

    /// Drop a session. Returns `false` when it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "Session removed");
        }
        removed
    }

    /// Drop sessions idle longer than the TTL. Returns how many were dropped.
    pub async fn prune_expired(&self) -> usize {
        let now = self.now_ms();
        let ttl = self.ttl.as_millis() as u64;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| {
            now.saturating_sub(handle.last_used_ms.load(Ordering::Relaxed)) <= ttl
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Expired sessions dropped");
        }
        pruned
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
