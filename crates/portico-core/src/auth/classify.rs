use regex::Regex;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::{Error, Result};
use crate::config::PortalConfig;

/// Page state reported after the form was submitted
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoginOutcome {
    pub url: String,
    /// Visible text of every element matching an error selector
    pub errors: Vec<String>,
}

/// Decide whether the login went through
///
/// An error marker wins over everything. Success needs positive evidence:
/// the URL left the login page or matches a post-login pattern. Anything
/// else is `AmbiguousFailure`.
pub fn classify(outcome: &LoginOutcome, config: &PortalConfig) -> Result<()> {
    if let Some(message) = outcome
        .errors
        .iter()
        .map(|e| e.trim())
        .find(|e| !e.is_empty())
    {
        return Err(Error::Rejected(message.to_string()));
    }

    if matches_post_login(&outcome.url, &config.post_login_patterns)
        || left_login_page(&outcome.url, config)
    {
        return Ok(());
    }

    Err(Error::AmbiguousFailure(outcome.url.clone()))
}

fn left_login_page(current: &str, config: &PortalConfig) -> bool {
    let Ok(current) = Url::parse(current) else {
        return false;
    };
    if !matches!(current.scheme(), "http" | "https") {
        return false;
    }

    let marker = config.login_path_marker.to_lowercase();
    let on_login_path = !marker.is_empty() && current.path().to_lowercase().contains(&marker);
    if on_login_path {
        return false;
    }

    match Url::parse(&config.entry_url) {
        Ok(entry) => {
            entry.host_str() != current.host_str()
                || entry.path() != current.path()
                || entry.query() != current.query()
        }
        Err(_) => true,
    }
}

fn matches_post_login(current: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match Regex::new(pattern) {
        Ok(re) => re.is_match(current),
        Err(e) => {
            warn!("Ignoring invalid post-login pattern '{}': {}", pattern, e);
            false
        }
    })
}
