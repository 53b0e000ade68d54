use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::config::DEFAULT_SESSION_IDLE_SECS;
use crate::scorm::{CompletionData, RuntimeState, ScormRuntime, ScormVersion};

type CompletionSlot = Arc<Mutex<Option<CompletionData>>>;

#[derive(Debug)]
pub struct ScormSession {
    pub activity_id: Option<String>,
    pub runtime: ScormRuntime,
    completion: CompletionSlot,
    touched: Instant,
}

impl ScormSession {
    fn new(version: ScormVersion, activity_id: Option<String>) -> Self {
        let completion: CompletionSlot = Arc::default();
        let sink = completion.clone();
        let runtime = ScormRuntime::new(version).with_completion_callback(move |data| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(data.clone());
        });
        Self {
            activity_id,
            runtime,
            completion,
            touched: Instant::now(),
        }
    }

    /// Completion data delivered by the runtime's terminate callback, once.
    pub fn take_completion(&self) -> Option<CompletionData> {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Terminated and its completion data already handed out, or left idle.
    fn is_stale(&self, idle_timeout: Duration) -> bool {
        let delivered = self.runtime.state() == RuntimeState::Terminated
            && self
                .completion
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_none();
        delivered || self.touched.elapsed() >= idle_timeout
    }
}

/// Stale sessions are evicted whenever a new one is installed.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<AsyncMutex<HashMap<Uuid, ScormSession>>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SESSION_IDLE_SECS))
    }
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_timeout,
        }
    }

    pub async fn install(&self, version: ScormVersion, activity_id: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.inner.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_stale(self.idle_timeout));
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "stale scorm sessions evicted");
        }
        sessions.insert(id, ScormSession::new(version, activity_id));
        tracing::info!(session_id = %id, ?version, "scorm session installed");
        id
    }

    pub async fn uninstall(&self, id: Uuid) -> bool {
        let removed = self.inner.lock().await.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "scorm session uninstalled");
        }
        removed
    }

    /// Runs `f` against the session, or returns `None` if it is not installed.
    pub async fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut ScormSession) -> R) -> Option<R> {
        let mut sessions = self.inner.lock().await;
        sessions.get_mut(&id).map(|s| {
            s.touched = Instant::now();
            f(s)
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_drive_and_uninstall() {
        let registry = SessionRegistry::default();
        let id = registry.install(ScormVersion::Scorm12, Some("a1".into())).await;
        assert_eq!(registry.len().await, 1);

        let data = registry
            .with_session(id, |s| {
                s.runtime.initialize();
                s.runtime.set_value("cmi.core.lesson_status", "passed");
                s.runtime.terminate();
                s.take_completion()
            })
            .await
            .flatten()
            .unwrap();
        assert_eq!(data.completion_status, "completed");
        assert_eq!(data.success_status, "passed");

        let again = registry.with_session(id, |s| s.take_completion()).await;
        assert_eq!(again, Some(None));

        assert!(registry.uninstall(id).await);
        assert!(!registry.uninstall(id).await);
        assert!(registry.with_session(id, |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn delivered_sessions_are_evicted_on_next_install() {
        let registry = SessionRegistry::default();
        let done = registry.install(ScormVersion::Scorm2004, None).await;
        let pending = registry.install(ScormVersion::Scorm2004, None).await;
        let open = registry.install(ScormVersion::Scorm2004, None).await;

        for id in [done, pending] {
            registry
                .with_session(id, |s| {
                    s.runtime.initialize();
                    s.runtime.terminate();
                })
                .await;
        }
        registry.with_session(done, |s| s.take_completion()).await;

        registry.install(ScormVersion::Scorm12, None).await;
        assert_eq!(registry.len().await, 3);
        assert!(registry.with_session(done, |_| ()).await.is_none());
        // completion not yet collected
        assert!(registry.with_session(pending, |_| ()).await.is_some());
        assert!(registry.with_session(open, |_| ()).await.is_some());
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_on_next_install() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let idle = registry.install(ScormVersion::Scorm12, None).await;
        let fresh = registry.install(ScormVersion::Scorm12, None).await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.with_session(idle, |_| ()).await.is_none());
        assert!(registry.with_session(fresh, |_| ()).await.is_some());
    }
}
