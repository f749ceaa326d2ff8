pub mod completion;
pub mod config;
pub mod encode_secret;
pub mod fetch;
pub mod login;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use portico_browser::{ChromeOptions, ChromeSurfaceProvider, ProfileChoice};
use portico_core::{AuthResult, PortalClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config::{JsonCredentialStore, Settings};

/// Options shared by every command that talks to the portal
#[derive(Args, Debug, Clone)]
pub struct PortalArgs {
    /// Portal login page (overrides the config file)
    #[arg(long, env = "PORTICO_URL")]
    pub url: Option<String>,

    /// Login user id
    #[arg(long, env = "PORTICO_USER")]
    pub user: Option<String>,

    /// Encoded secret, as printed by `portico encode-secret`
    #[arg(long, env = "PORTICO_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Saved login file used when --user/--secret are absent
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Path to Chrome/Chromium binary
    #[arg(long, env = "PORTICO_CHROME")]
    pub chrome_path: Option<PathBuf>,

    /// Named persistent browser profile (temporary if omitted)
    #[arg(long)]
    pub profile: Option<String>,

    /// Attach to a running Chrome instead of launching one
    #[arg(long, value_name = "URL")]
    pub connect: Option<String>,

    /// Show the browser window while working
    #[arg(long)]
    pub show_browser: bool,
}

impl PortalArgs {
    fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions {
            chrome_path: self.chrome_path.clone(),
            profile: match &self.profile {
                Some(name) => ProfileChoice::Named(name.clone()),
                None => ProfileChoice::Temporary,
            },
            connect_url: self.connect.clone(),
            visible: self.show_browser,
            ..ChromeOptions::default()
        }
    }
}

/// Build a client over a Chrome surface from flags and settings
pub fn build_client(args: &PortalArgs, settings: Settings) -> PortalClient {
    let Settings {
        mut portal,
        timings,
        credentials_file,
    } = settings;
    if let Some(url) = &args.url {
        portal.entry_url = url.clone();
    }

    let provider = Arc::new(ChromeSurfaceProvider::new(args.chrome_options()));
    let mut builder = PortalClient::builder(provider)
        .config(portal)
        .timings(timings);

    let store_path = args
        .credentials
        .clone()
        .or(credentials_file)
        .or_else(|| config::config_file("credentials.json"));
    if let Some(path) = store_path {
        tracing::debug!("Credential store: {}", path.display());
        builder = builder.credential_store(Arc::new(JsonCredentialStore::new(path)));
    }

    builder.build()
}

/// Log in with explicit flags when both are given, otherwise from the store
pub async fn authenticate(client: &PortalClient, args: &PortalArgs) -> AuthResult {
    let result = match (&args.user, &args.secret) {
        (Some(user), Some(secret)) => client.login(user, secret).await,
        _ => client.login_with_stored_credentials().await,
    };
    if result.success && args.show_browser {
        client.set_surface_visible(true).await;
    }
    result
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Runtime for the async engine, built per command
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
