//! Login orchestration against the portal's form page.
//!
//! One attempt at a time per session: concurrent callers wait on the
//! in-flight flag, and take over if the holder outlives the wait ceiling.

mod classify;
mod discovery;
pub mod scripts;

pub use classify::{LoginOutcome, classify};
pub use discovery::{
    ControlInfo, FieldPair, FieldStrategy, FirstClickable, FormSubmitButton, InputCounts,
    InputInfo, LexiconButton, PageSnapshot, PositionalFields, ProgrammaticSubmit, SubmitStrategy,
    Submission, TypedFields, default_field_strategies, default_submit_strategies,
    matches_lexicon,
};

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{Error, Result};
use crate::codec::{CredentialCodec, Credentials};
use crate::config::{PortalConfig, Timings};
use crate::outcome::AuthResult;
use crate::script::decode;
use crate::session::{AttemptGuard, Session};
use crate::surface::SurfaceHandle;

/// Drives the login flow for one session
pub struct Authenticator {
    session: Arc<Session>,
    codec: Arc<dyn CredentialCodec>,
    config: Arc<PortalConfig>,
    timings: Timings,
    field_strategies: Vec<Box<dyn FieldStrategy>>,
    submit_strategies: Vec<Box<dyn SubmitStrategy>>,
}

impl Authenticator {
    pub fn new(
        session: Arc<Session>,
        codec: Arc<dyn CredentialCodec>,
        config: Arc<PortalConfig>,
        timings: Timings,
    ) -> Self {
        Self {
            session,
            codec,
            config,
            timings,
            field_strategies: default_field_strategies(),
            submit_strategies: default_submit_strategies(),
        }
    }

    /// Replace the username/password discovery order
    pub fn with_field_strategies(mut self, strategies: Vec<Box<dyn FieldStrategy>>) -> Self {
        self.field_strategies = strategies;
        self
    }

    /// Replace the submit-control discovery order
    pub fn with_submit_strategies(mut self, strategies: Vec<Box<dyn SubmitStrategy>>) -> Self {
        self.submit_strategies = strategies;
        self
    }

    /// Log in, or confirm the session already is
    ///
    /// Never fails with `Err`: every outcome is reported in the `AuthResult`.
    /// A failed attempt leaves the session unauthenticated.
    pub async fn login(&self, credentials: &Credentials) -> AuthResult {
        if self.session.is_authenticated().await {
            debug!("Already authenticated, skipping login");
            return AuthResult::ok();
        }

        let guard = match self.claim().await {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                debug!("Concurrent login finished first");
                return AuthResult::ok();
            }
            Err(e) => return AuthResult::failed(&e),
        };

        let result = self.attempt(credentials).await;
        match &result {
            Ok(()) => {
                info!("Logged in as {}", credentials.user_id.trim());
                guard.succeed();
            }
            Err(e) => {
                warn!("Login attempt {} failed: {}", guard.id(), e);
                guard.fail();
            }
        }
        AuthResult::from(result)
    }

    /// Take the in-flight flag, waiting out (or overriding) another attempt
    ///
    /// `Ok(None)` means the other attempt logged the session in meanwhile.
    async fn claim(&self) -> Result<Option<AttemptGuard<'_>>> {
        loop {
            if let Some(guard) = self.session.begin_attempt()? {
                return Ok(Some(guard));
            }

            info!("Another login is in progress, waiting for it");
            let deadline = Instant::now() + self.timings.auth_wait_ceiling.duration();
            loop {
                self.timings.auth_poll_interval.settle().await;
                if self.session.is_authenticated().await {
                    return Ok(None);
                }
                if !self.session.auth_in_flight() {
                    break;
                }
                if Instant::now() >= deadline {
                    self.session.force_release();
                    break;
                }
            }
        }
    }

    async fn attempt(&self, credentials: &Credentials) -> Result<()> {
        let user_id = credentials.user_id.trim();
        if user_id.is_empty() || credentials.secret.trim().is_empty() {
            return Err(Error::MissingCredentials);
        }
        let password = self
            .codec
            .decrypt(&credentials.secret)
            .filter(|p| !p.is_empty())
            .ok_or(Error::DecryptionFailed)?;

        let provider = self.session.provider();
        let handle = self.session.acquire_surface().await?;
        info!("Opening login page {}", self.config.entry_url);
        provider.navigate(handle, &self.config.entry_url).await?;

        self.wait_for_form(handle).await;

        let page: PageSnapshot = decode(provider.inject_script(handle, &scripts::snapshot()).await?)?;
        let counts = page.counts();
        debug!("Login page snapshot: {}", counts);

        let (strategy, fields) = self
            .field_strategies
            .iter()
            .find_map(|s| s.locate(&page, &self.config).map(|f| (s.name(), f)))
            .ok_or(Error::LoginFormNotFound(counts))?;
        debug!("Credential fields located by '{}' strategy", strategy);

        let filled = provider
            .inject_script(handle, &scripts::fill(fields, user_id, &password))
            .await?;
        drop(password);
        if filled.as_bool() == Some(false) {
            return Err(Error::LoginFormNotFound(counts));
        }

        let (strategy, submission) = self
            .submit_strategies
            .iter()
            .find_map(|s| s.locate(&page, fields, &self.config).map(|sub| (s.name(), sub)))
            .ok_or(Error::LoginButtonNotFound(counts))?;
        debug!("Submitting via '{}' strategy ({:?})", strategy, submission);

        let sent = provider.inject_script(handle, &scripts::submit(submission)).await?;
        if sent.as_bool() == Some(false) {
            return Err(Error::LoginButtonNotFound(counts));
        }

        self.timings.submit_settle.settle().await;

        let mut outcome: LoginOutcome =
            decode(provider.inject_script(handle, &scripts::outcome(&self.config)).await?)?;
        outcome.url = provider.current_url(handle).await?;
        debug!("Post-login URL: {}", outcome.url);

        classify(&outcome, &self.config)
    }

    /// Probe until the form shows up; proceed either way once out of attempts
    async fn wait_for_form(&self, handle: SurfaceHandle) {
        let probe = scripts::readiness(&self.config);
        let attempts = self.timings.readiness_attempts.max(1);
        for attempt in 1..=attempts {
            match self.session.provider().inject_script(handle, &probe).await {
                Ok(ready) if ready.as_bool() == Some(true) => {
                    debug!("Login form ready after {} probe(s)", attempt);
                    return;
                }
                Ok(_) => {}
                Err(e) => debug!("Readiness probe {} failed: {}", attempt, e),
            }
            if attempt < attempts {
                self.timings.readiness_interval.settle().await;
            }
        }
        warn!(
            "Login form not confirmed after {} probes, continuing anyway",
            attempts
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::codec::Base64Codec;
    use crate::session::SessionState;
    use crate::testing::ScriptedSurface;
    use serde_json::json;

    struct Harness {
        surface: Arc<ScriptedSurface>,
        session: Arc<Session>,
        auth: Authenticator,
    }

    fn harness(timings: Timings) -> Harness {
        let surface = Arc::new(ScriptedSurface::new());
        let session = Arc::new(Session::new(surface.clone()));
        let auth = Authenticator::new(
            session.clone(),
            Arc::new(Base64Codec),
            Arc::new(PortalConfig::default()),
            timings,
        );
        Harness {
            surface,
            session,
            auth,
        }
    }

    fn login_page() -> serde_json::Value {
        json!({
            "inputs": [
                {"index": 0, "type": "text", "name": "username", "visible": true, "form": 0},
                {"index": 1, "type": "password", "name": "password", "visible": true, "form": 0}
            ],
            "controls": [
                {"index": 0, "tag": "button", "type": "submit", "text": "Log in", "visible": true, "form": 0}
            ],
            "forms": 1
        })
    }

    fn portal_accepts(surface: &ScriptedSurface) {
        surface.respond(scripts::READY, vec![json!(true)]);
        surface.respond(scripts::SNAPSHOT, vec![login_page()]);
        surface.respond(scripts::FILL, vec![json!(true)]);
        surface.respond(scripts::SUBMIT, vec![json!(true)]);
        surface.respond(scripts::OUTCOME, vec![json!({"url": "", "errors": []})]);
        surface.redirect_on(scripts::SUBMIT, "https://portal.example.com/home");
    }

    fn creds() -> Credentials {
        Credentials::new("u1", Base64Codec.encrypt("s3cret"))
    }

    #[tokio::test]
    async fn test_successful_login() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);

        let result = h.auth.login(&creds()).await;

        assert!(result.success, "{:?}", result);
        assert_eq!(h.session.state(), SessionState::Authenticated);
        assert!(!h.session.auth_in_flight());
        assert_eq!(h.surface.navigations(), vec!["https://portal.example.com/login"]);
        let fill = h.surface.last_script(scripts::FILL).unwrap();
        assert!(fill.contains("\"u1\"") && fill.contains("\"s3cret\""));
    }

    #[tokio::test]
    async fn test_fast_path_touches_nothing() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);
        assert!(h.auth.login(&creds()).await.success);
        let before = h.surface.interactions();

        let result = h.auth.login(&creds()).await;

        assert!(result.success);
        assert_eq!(h.surface.interactions(), before);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_fast() {
        let h = harness(Timings::instant());
        let result = h.auth.login(&Credentials::new("  ", "abc")).await;
        assert_eq!(result.error_kind, Some(ErrorKind::MissingCredentials));

        let result = h.auth.login(&Credentials::new("u1", "")).await;
        assert_eq!(result.error_kind, Some(ErrorKind::MissingCredentials));
        assert_eq!(h.surface.interactions(), 0);
        assert!(!h.session.auth_in_flight());
    }

    #[tokio::test]
    async fn test_decryption_failure_never_navigates() {
        let h = harness(Timings::instant());
        let result = h.auth.login(&Credentials::new("u1", "bad")).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::DecryptionFailed));
        assert!(result.error.unwrap().starts_with("DecryptionFailed"));
        assert!(h.surface.navigations().is_empty());
        assert_eq!(h.session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_readiness_gives_up_and_continues() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);
        h.surface.respond(scripts::READY, vec![json!(false)]);

        let result = h.auth.login(&creds()).await;

        assert!(result.success);
        assert_eq!(h.surface.script_count(scripts::READY), 3);
    }

    #[tokio::test]
    async fn test_readiness_stops_on_first_positive() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);
        h.surface
            .respond(scripts::READY, vec![json!(false), json!(true), json!(false)]);

        h.auth.login(&creds()).await;

        assert_eq!(h.surface.script_count(scripts::READY), 2);
    }

    #[tokio::test]
    async fn test_missing_form_reports_counts() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);
        h.surface.respond(
            scripts::SNAPSHOT,
            vec![json!({"inputs": [{"index": 0, "type": "hidden", "visible": false}], "controls": [], "forms": 0})],
        );

        let result = h.auth.login(&creds()).await;

        assert_eq!(result.error_kind, Some(ErrorKind::LoginFormNotFound));
        let diagnostics = result.diagnostics.unwrap();
        assert_eq!(diagnostics["total"], 1);
        assert_eq!(diagnostics["visible"], 0);
        assert_eq!(h.surface.script_count(scripts::FILL), 0);
        assert_eq!(h.session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_missing_button() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);
        h.surface.respond(
            scripts::SNAPSHOT,
            vec![json!({
                "inputs": [
                    {"index": 0, "type": "text", "visible": true},
                    {"index": 1, "type": "password", "visible": true}
                ],
                "controls": [],
                "forms": 0
            })],
        );

        let result = h.auth.login(&creds()).await;

        assert_eq!(result.error_kind, Some(ErrorKind::LoginButtonNotFound));
        assert_eq!(h.surface.script_count(scripts::SUBMIT), 0);
    }

    #[tokio::test]
    async fn test_error_marker_rejects() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);
        h.surface.respond(
            scripts::OUTCOME,
            vec![json!({"url": "", "errors": ["Wrong username or password"]})],
        );

        let result = h.auth.login(&creds()).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Rejected));
        assert!(result.error.unwrap().contains("Wrong username or password"));
        assert_eq!(h.session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_staying_on_login_page_fails_closed() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);
        h.surface
            .redirect_on(scripts::SUBMIT, "https://portal.example.com/login?error");

        let result = h.auth.login(&creds()).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::AmbiguousFailure));
        assert!(!h.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_waits_for_in_flight_attempt_then_takes_over() {
        let h = harness(Timings::instant());
        portal_accepts(&h.surface);

        // A stuck attempt holding the flag forever
        let stuck = h.session.begin_attempt().unwrap().unwrap();
        std::mem::forget(stuck);
        assert!(h.session.auth_in_flight());

        let result = h.auth.login(&creds()).await;

        assert!(result.success, "{:?}", result);
        assert!(!h.session.auth_in_flight());
    }

    #[tokio::test]
    async fn test_concurrent_logins_share_one_attempt() {
        let h = harness(Timings {
            submit_settle: crate::config::SettleBudget::from_millis(30),
            auth_wait_ceiling: crate::config::SettleBudget::from_secs(5),
            ..Timings::instant()
        });
        portal_accepts(&h.surface);

        let (a, b) = (creds(), creds());
        let (first, second) = tokio::join!(h.auth.login(&a), h.auth.login(&b));

        assert!(first.success && second.success);
        assert_eq!(h.surface.script_count(scripts::SUBMIT), 1);
    }

    #[tokio::test]
    async fn test_closed_session_reports_closed() {
        let h = harness(Timings::instant());
        h.session.close().await;
        let result = h.auth.login(&creds()).await;
        assert_eq!(result.error_kind, Some(ErrorKind::SessionClosed));
    }
}
