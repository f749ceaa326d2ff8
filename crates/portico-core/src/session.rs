use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::{Error, Result};
use crate::surface::{SurfaceHandle, SurfaceProvider};

/// Lifecycle of the shared portal session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// Terminal; reached through `Session::close`
    Closed,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    surface: Option<SurfaceHandle>,
}

/// Owns the single surface and the login state for one portal account
///
/// The in-flight flag holds the id of the login attempt that claimed it, or
/// zero when no attempt is running.
pub struct Session {
    provider: Arc<dyn SurfaceProvider>,
    inner: Mutex<SessionInner>,
    in_flight: AtomicU64,
    next_attempt: AtomicU64,
}

impl Session {
    pub fn new(provider: Arc<dyn SurfaceProvider>) -> Self {
        Self {
            provider,
            inner: Mutex::new(SessionInner {
                state: SessionState::Unauthenticated,
                surface: None,
            }),
            in_flight: AtomicU64::new(0),
            next_attempt: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn provider(&self) -> &Arc<dyn SurfaceProvider> {
        &self.provider
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.lock().surface
    }

    pub fn auth_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) != 0
    }

    /// Authenticated and the surface is still open
    ///
    /// The surface can disappear without notice (user closed the window,
    /// browser crashed), so the handle is checked every time and the session
    /// is invalidated when it is gone.
    pub async fn is_authenticated(&self) -> bool {
        let (state, surface) = {
            let inner = self.lock();
            (inner.state, inner.surface)
        };
        let Some(handle) = surface else {
            return false;
        };
        if state != SessionState::Authenticated {
            return false;
        }
        if self.provider.is_open(handle).await {
            return true;
        }
        warn!("Surface {} closed underneath an authenticated session", handle);
        self.invalidate();
        false
    }

    /// Back to `Unauthenticated`, forgetting the surface and the in-flight claim
    pub fn invalidate(&self) {
        let mut inner = self.lock();
        if inner.state != SessionState::Closed {
            inner.state = SessionState::Unauthenticated;
        }
        inner.surface = None;
        self.in_flight.store(0, Ordering::SeqCst);
        debug!("Session invalidated");
    }

    /// Claim the in-flight flag for a new login attempt
    ///
    /// Returns `Ok(None)` when another attempt holds it.
    pub fn begin_attempt(&self) -> Result<Option<AttemptGuard<'_>>> {
        let mut inner = self.lock();
        if inner.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        let id = self.next_attempt.fetch_add(1, Ordering::SeqCst);
        if self
            .in_flight
            .compare_exchange(0, id, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }
        inner.state = SessionState::Authenticating;
        debug!("Login attempt {} started", id);
        Ok(Some(AttemptGuard { session: self, id }))
    }

    /// Drop whatever attempt holds the flag so a new one can start
    pub fn force_release(&self) {
        let stale = self.in_flight.swap(0, Ordering::SeqCst);
        if stale != 0 {
            warn!("Releasing login attempt {} that outlived the wait ceiling", stale);
        }
    }

    /// Current surface if it is still open, otherwise a freshly created one
    pub async fn acquire_surface(&self) -> Result<SurfaceHandle> {
        if let Some(handle) = self.surface() {
            if self.provider.is_open(handle).await {
                return Ok(handle);
            }
            debug!("Discarding closed {}", handle);
        }

        let handle = self.provider.create().await?;
        let closed = {
            let mut inner = self.lock();
            if inner.state != SessionState::Closed {
                inner.surface = Some(handle);
            }
            inner.state == SessionState::Closed
        };
        if closed {
            let _ = self.provider.destroy(handle).await;
            return Err(Error::SessionClosed);
        }
        info!("Created {}", handle);
        Ok(handle)
    }

    /// Destroy the surface if open and invalidate; safe to repeat
    pub async fn teardown(&self) {
        let surface = self.lock().surface.take();
        if let Some(handle) = surface {
            if self.provider.is_open(handle).await {
                if let Err(e) = self.provider.destroy(handle).await {
                    warn!("Failed to destroy {}: {}", handle, e);
                }
            }
        }
        self.invalidate();
    }

    /// Tear down and refuse any further logins
    pub async fn close(&self) {
        self.teardown().await;
        self.lock().state = SessionState::Closed;
        info!("Session closed");
    }
}

/// Held for the duration of one login attempt
///
/// Dropping it releases the in-flight flag, but only if this attempt still
/// owns it; an attempt that was forcibly released must not clear the claim
/// of the attempt that replaced it.
pub struct AttemptGuard<'a> {
    session: &'a Session,
    id: u64,
}

impl AttemptGuard<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn owns_flag(&self) -> bool {
        self.session.in_flight.load(Ordering::SeqCst) == self.id
    }

    pub fn succeed(&self) {
        let mut inner = self.session.lock();
        if inner.state != SessionState::Closed {
            inner.state = SessionState::Authenticated;
        }
    }

    pub fn fail(&self) {
        if !self.owns_flag() {
            debug!("Attempt {} superseded, leaving session state alone", self.id);
            return;
        }
        let mut inner = self.session.lock();
        if inner.state != SessionState::Closed {
            inner.state = SessionState::Unauthenticated;
        }
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.owns_flag() {
            let mut inner = self.session.lock();
            if inner.state == SessionState::Authenticating {
                inner.state = SessionState::Unauthenticated;
            }
        }
        let _ = self.session.in_flight.compare_exchange(
            self.id,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSurface;

    fn session() -> (Arc<ScriptedSurface>, Session) {
        let surface = Arc::new(ScriptedSurface::new());
        let session = Session::new(surface.clone());
        (surface, session)
    }

    #[tokio::test]
    async fn test_new_session_is_unauthenticated() {
        let (_, session) = session();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(!session.is_authenticated().await);
        assert!(!session.auth_in_flight());
    }

    #[tokio::test]
    async fn test_attempt_guard_claims_and_releases_flag() {
        let (_, session) = session();
        {
            let guard = session.begin_attempt().unwrap().unwrap();
            assert!(session.auth_in_flight());
            assert_eq!(session.state(), SessionState::Authenticating);
            assert!(session.begin_attempt().unwrap().is_none());
            guard.fail();
        }
        assert!(!session.auth_in_flight());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_superseded_guard_does_not_clear_successor() {
        let (_, session) = session();
        let first = session.begin_attempt().unwrap().unwrap();
        session.force_release();
        let second = session.begin_attempt().unwrap().unwrap();
        drop(first);
        assert!(session.auth_in_flight());
        assert_eq!(session.state(), SessionState::Authenticating);
        drop(second);
        assert!(!session.auth_in_flight());
    }

    #[tokio::test]
    async fn test_authenticated_requires_open_surface() {
        let (surface, session) = session();
        let handle = session.acquire_surface().await.unwrap();
        session.begin_attempt().unwrap().unwrap().succeed();
        assert!(session.is_authenticated().await);

        surface.close_externally(handle);
        assert!(!session.is_authenticated().await);
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.surface().is_none());
    }

    #[tokio::test]
    async fn test_acquire_surface_reuses_open_handle() {
        let (surface, session) = session();
        let first = session.acquire_surface().await.unwrap();
        let second = session.acquire_surface().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(surface.created(), 1);
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (surface, session) = session();
        session.acquire_surface().await.unwrap();
        session.teardown().await;
        session.teardown().await;
        assert_eq!(surface.destroyed(), 1);
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_closed_session_refuses_attempts() {
        let (_, session) = session();
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(session.begin_attempt(), Err(Error::SessionClosed)));
    }
}
