use std::sync::Arc;
use tracing::{info, warn};

use crate::Error;
use crate::auth::{Authenticator, FieldStrategy, SubmitStrategy};
use crate::codec::{Base64Codec, CredentialCodec, CredentialStore, Credentials};
use crate::config::{PortalConfig, Timings};
use crate::extract::Extractor;
use crate::outcome::{AuthResult, FetchResult};
use crate::session::{Session, SessionState};
use crate::surface::SurfaceProvider;

/// Entry point for the application layer
///
/// Every operation reports failure in its return value; nothing here
/// returns `Err` or panics on a portal problem.
pub struct PortalClient {
    session: Arc<Session>,
    auth: Authenticator,
    extractor: Extractor,
    store: Option<Arc<dyn CredentialStore>>,
}

impl PortalClient {
    pub fn builder(provider: Arc<dyn SurfaceProvider>) -> PortalClientBuilder {
        PortalClientBuilder {
            provider,
            codec: Arc::new(Base64Codec),
            config: PortalConfig::default(),
            timings: Timings::default(),
            store: None,
            field_strategies: None,
            submit_strategies: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub async fn login(&self, user_id: &str, encrypted_secret: &str) -> AuthResult {
        self.auth
            .login(&Credentials::new(user_id, encrypted_secret))
            .await
    }

    /// Log in with whatever the credential store holds
    pub async fn login_with_stored_credentials(&self) -> AuthResult {
        let Some(store) = &self.store else {
            return AuthResult::failed(&Error::MissingCredentials);
        };
        match store.stored_credentials().await {
            Ok(Some(credentials)) => self.auth.login(&credentials).await,
            Ok(None) => AuthResult::failed(&Error::MissingCredentials),
            Err(e) => {
                warn!("Credential store unavailable: {}", e);
                AuthResult::failed(&e)
            }
        }
    }

    pub async fn fetch_records(&self, name: &str, partition: &str) -> FetchResult {
        let result = self.extractor.fetch_records(name, partition).await;
        if let Err(e) = &result {
            warn!("Fetch failed: {}", e);
        }
        FetchResult::from(result)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    /// Close the surface and forget the login; repeating it is harmless
    pub async fn logout(&self) {
        self.session.teardown().await;
        info!("Logged out");
    }

    /// Show the automation surface to the user, or hide it again
    pub async fn set_surface_visible(&self, visible: bool) {
        let handle = self.session.surface();
        if let Err(e) = self
            .session
            .provider()
            .set_visible(handle, visible)
            .await
        {
            warn!("Could not change surface visibility: {}", e);
        }
    }

    /// Logout for good: later logins report `SessionClosed`
    pub async fn shutdown(&self) {
        self.session.close().await;
    }
}

pub struct PortalClientBuilder {
    provider: Arc<dyn SurfaceProvider>,
    codec: Arc<dyn CredentialCodec>,
    config: PortalConfig,
    timings: Timings,
    store: Option<Arc<dyn CredentialStore>>,
    field_strategies: Option<Vec<Box<dyn FieldStrategy>>>,
    submit_strategies: Option<Vec<Box<dyn SubmitStrategy>>>,
}

impl PortalClientBuilder {
    pub fn codec(mut self, codec: Arc<dyn CredentialCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(mut self, config: PortalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn field_strategies(mut self, strategies: Vec<Box<dyn FieldStrategy>>) -> Self {
        self.field_strategies = Some(strategies);
        self
    }

    pub fn submit_strategies(mut self, strategies: Vec<Box<dyn SubmitStrategy>>) -> Self {
        self.submit_strategies = Some(strategies);
        self
    }

    pub fn build(self) -> PortalClient {
        let session = Arc::new(Session::new(self.provider));
        let config = Arc::new(self.config);

        let mut auth = Authenticator::new(
            session.clone(),
            self.codec,
            config.clone(),
            self.timings.clone(),
        );
        if let Some(strategies) = self.field_strategies {
            auth = auth.with_field_strategies(strategies);
        }
        if let Some(strategies) = self.submit_strategies {
            auth = auth.with_submit_strategies(strategies);
        }

        let extractor = Extractor::new(session.clone(), config, self.timings);

        PortalClient {
            session,
            auth,
            extractor,
            store: self.store,
        }
    }
}
