//! Application state management

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DemoConfig;
use crate::workflow::Session;

use super::ServerConfig;

/// Session handle; the mutex is held for a whole request.
pub type SharedSession = Arc<Mutex<Session>>;

/// A registered session and when it was last used
struct SessionEntry {
    session: SharedSession,
    /// Milliseconds since [`AppState::started`]
    last_accessed: AtomicU64,
}

impl SessionEntry {
    fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.last_accessed.load(Ordering::Relaxed)) > ttl.as_millis() as u64
    }
}

fn prune_expired(sessions: &mut HashMap<String, SessionEntry>, now_ms: u64, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_expired(now_ms, ttl));
    before - sessions.len()
}

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub demo: DemoConfig,
    started: Instant,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl AppState {
    pub fn new(config: ServerConfig, demo: DemoConfig) -> Self {
        let demo = demo.with_model_dir(config.model_dir.clone());
        Self {
            config,
            demo,
            started: Instant::now(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn generate_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Look up a session by id and mark it as used.
    pub async fn session(&self, id: &str) -> Option<SharedSession> {
        let now = self.now_ms();
        let sessions = self.sessions.read().await;
        let entry = sessions.get(id)?;
        if entry.is_expired(now, self.config.session_ttl) {
            return None;
        }
        entry.last_accessed.store(now, Ordering::Relaxed);
        Some(Arc::clone(&entry.session))
    }

    /// Register a freshly set up session under `id`. Idle sessions are dropped first.
    pub async fn insert_session(&self, id: String, session: Session) -> SharedSession {
        let shared = Arc::new(Mutex::new(session));
        let now = self.now_ms();
        let mut sessions = self.sessions.write().await;

        let evicted = prune_expired(&mut sessions, now, self.config.session_ttl);
        if evicted > 0 {
            debug!(evicted, "Idle sessions evicted");
        }

        sessions.insert(
            id.clone(),
            SessionEntry {
                session: Arc::clone(&shared),
                last_accessed: AtomicU64::new(now),
            },
        );
        info!(session_id = %id, active_sessions = sessions.len(), "Session created");
        shared
    }

    /// Drop every session idle for longer than the configured TTL and return how many went.
    pub async fn evict_idle(&self) -> usize {
        let now = self.now_ms();
        let mut sessions = self.sessions.write().await;
        let evicted = prune_expired(&mut sessions, now, self.config.session_ttl);
        if evicted > 0 {
            info!(evicted, active_sessions = sessions.len(), "Idle sessions evicted");
        }
        evicted
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::ModelType;

    fn state_with_ttl(ttl: Duration) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            model_dir: dir.path().to_path_buf(),
            session_ttl: ttl,
        };
        let demo = DemoConfig::default().with_split_seed(4).with_model_type(ModelType::NaiveBayes);
        (AppState::new(config, demo), dir)
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let (state, _dir) = state_with_ttl(Duration::from_millis(50));
        let session = Session::new(&state.demo).unwrap();
        state.insert_session("a".to_string(), session).await;
        assert!(state.session("a").await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(state.session("a").await.is_none());
        assert_eq!(state.evict_idle().await, 1);
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_used_sessions_survive_eviction() {
        let (state, _dir) = state_with_ttl(Duration::from_secs(60));
        let session = Session::new(&state.demo).unwrap();
        state.insert_session("a".to_string(), session).await;

        assert_eq!(state.evict_idle().await, 0);
        assert!(state.session("a").await.is_some());
        assert_eq!(state.session_count().await, 1);
    }
}
