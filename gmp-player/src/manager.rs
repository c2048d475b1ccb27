//! Tenant to session registry
//!
//! Sessions are created lazily on first use. A stopped session stays in the
//! registry (so its final status can still be read) until it is removed or
//! replaced by the next `get_or_create` for the same tenant.

use crate::collaborators::{SessionCollaborators, UiSurface};
use crate::config::PlayerConfig;
use crate::session::{PlaybackSession, SessionStatus};
use gmp_common::events::StopReason;
use gmp_common::TenantId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;

/// Builds the collaborators for a new tenant session
pub trait SessionFactory: Send + Sync {
    fn collaborators(&self, tenant: TenantId) -> SessionCollaborators;

    /// Surface attached to new sessions by the console, if any
    fn surface(&self, _tenant: TenantId) -> Option<Arc<dyn UiSurface>> {
        None
    }
}

/// Instance-wide status snapshot
#[derive(Debug, Clone, Serialize)]
pub struct InstanceStatus {
    pub instance: String,
    pub uptime_sec: u64,
    /// Ordered by tenant
    pub sessions: Vec<SessionStatus>,
}

pub struct SessionManager {
    instance_name: String,
    config: PlayerConfig,
    factory: Arc<dyn SessionFactory>,
    sessions: RwLock<HashMap<TenantId, Arc<PlaybackSession>>>,
    started_at: Instant,
}

impl SessionManager {
    pub fn new(
        instance_name: impl Into<String>,
        config: PlayerConfig,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            config,
            factory,
            sessions: RwLock::new(HashMap::new()),
            started_at: Instant::now(),
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Live session for `tenant`, creating one (or replacing a stopped one)
    pub async fn get_or_create(&self, tenant: TenantId) -> Arc<PlaybackSession> {
        if let Some(session) = self.sessions.read().await.get(&tenant) {
            if !session.is_stopped() {
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have created it while we waited for the write lock
        if let Some(session) = sessions.get(&tenant) {
            if !session.is_stopped() {
                return Arc::clone(session);
            }
        }

        let session = PlaybackSession::new(
            tenant,
            self.config.clone(),
            self.factory.collaborators(tenant),
        );
        info!(tenant, "Created playback session");
        sessions.insert(tenant, Arc::clone(&session));
        session
    }

    pub fn default_surface(&self, tenant: TenantId) -> Option<Arc<dyn UiSurface>> {
        self.factory.surface(tenant)
    }

    /// Existing session, stopped or not
    pub async fn get(&self, tenant: TenantId) -> Option<Arc<PlaybackSession>> {
        self.sessions.read().await.get(&tenant).cloned()
    }

    /// Stop (if needed) and forget the session for `tenant`
    pub async fn remove(&self, tenant: TenantId) -> Option<Arc<PlaybackSession>> {
        let session = self.sessions.write().await.remove(&tenant)?;
        session.stop(StopReason::Requested).await;
        Some(session)
    }

    /// Forget every stopped session; returns how many were dropped
    pub async fn prune_stopped(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_stopped());
        before - sessions.len()
    }

    pub async fn stop_all(&self, reason: StopReason) {
        let sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();
        info!("Stopping {} session(s)", sessions.len());
        for session in sessions {
            session.stop(reason).await;
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn instance_status(&self) -> InstanceStatus {
        let mut sessions: Vec<SessionStatus> = self
            .sessions
            .read()
            .await
            .values()
            .map(|session| session.status())
            .collect();
        sessions.sort_by_key(|status| status.tenant);

        InstanceStatus {
            instance: self.instance_name.clone(),
            uptime_sec: self.started_at.elapsed().as_secs(),
            sessions,
        }
    }
}
