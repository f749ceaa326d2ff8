//! Pulls request rows out of the portal's embedded list widget.
//!
//! Menu, frame and grid are hard requirements. The query configuration
//! object, the handler checkbox and the search trigger are best effort:
//! some deployments filter server-side and render the grid pre-populated.

mod menu;
mod query;
pub mod scripts;

pub use menu::{MenuCandidate, pick_menu};
pub use query::{QueryParams, sanitize_partition, search_window};

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::{Error, Result};
use crate::config::{PortalConfig, Timings};
use crate::record::{ExtractedRecord, map_rows};
use crate::script::decode;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Function,
    Inline,
    Mouse,
}

/// What the trigger script ended up doing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TriggerReport {
    pub via: Option<TriggerKind>,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Harvest {
    found: bool,
    rows: Vec<Value>,
}

/// Runs the list extraction against an authenticated session
pub struct Extractor {
    session: Arc<Session>,
    config: Arc<PortalConfig>,
    timings: Timings,
    today: fn() -> NaiveDate,
}

impl Extractor {
    pub fn new(session: Arc<Session>, config: Arc<PortalConfig>, timings: Timings) -> Self {
        Self {
            session,
            config,
            timings,
            today: || Local::now().date_naive(),
        }
    }

    /// Pin the date the search window is computed from
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Records handled by `handler_name` within `partition`
    ///
    /// An empty vector is a valid answer. Concurrent calls are not
    /// serialized and would race on the shared surface.
    pub async fn fetch_records(
        &self,
        handler_name: &str,
        partition: &str,
    ) -> Result<Vec<ExtractedRecord>> {
        if !self.session.is_authenticated().await {
            return Err(Error::NotAuthenticated);
        }
        let handle = self.session.surface().ok_or(Error::NotAuthenticated)?;
        let provider = self.session.provider();

        let current = provider.current_url(handle).await?;
        if !same_view(&current, &self.config.list_view_url) {
            info!("Navigating to list view {}", self.config.list_view_url);
            provider.navigate(handle, &self.config.list_view_url).await?;
            self.timings.navigation_settle.settle().await;
        }

        let candidates: Vec<MenuCandidate> =
            decode(provider.inject_script(handle, &scripts::menu_candidates(&self.config)).await?)?;
        let entry = pick_menu(&candidates, &self.config.menu_label)
            .cloned()
            .ok_or_else(|| Error::MenuNotFound(self.config.menu_label.clone()))?;
        debug!("Menu entry '{}' at index {}", entry.text, entry.index);

        let clicked = provider
            .inject_script(handle, &scripts::activate_menu(entry.index))
            .await?;
        if clicked.as_bool() == Some(false) {
            return Err(Error::MenuNotFound(self.config.menu_label.clone()));
        }

        self.timings.menu_settle.settle().await;

        let tab = entry
            .tab
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::SubDocumentNotFound(format!(
                    "menu entry has no '{}' attribute",
                    self.config.tab_attribute
                ))
            })?;
        let attached = provider.inject_script(handle, &scripts::frame_probe(&tab)).await?;
        if attached.as_bool() != Some(true) {
            return Err(Error::SubDocumentNotFound(format!(
                "no accessible frame for tab '{}'",
                tab
            )));
        }

        let window = search_window((self.today)(), self.timings.search_window_months);
        let params = QueryParams::new(
            handler_name,
            partition,
            &self.config.partition_separator,
            &self.config.status_filters,
            window,
        );
        debug!(
            "Query window {} .. {}, partition '{}'",
            params.begin_date, params.end_date, params.partition
        );

        match provider
            .inject_script(handle, &scripts::configure(&tab, &params, &self.config))
            .await
        {
            Ok(configured) if configured.as_bool() == Some(true) => {}
            Ok(_) => debug!(
                "No '{}' object in frame, relying on server-side filters",
                self.config.config_api
            ),
            Err(e) => warn!("Query configuration failed, continuing: {}", e),
        }

        match provider
            .inject_script(handle, &scripts::toggle_handler(&tab, &self.config))
            .await
        {
            Ok(toggled) if toggled.as_bool() == Some(true) => {}
            Ok(_) => debug!("No '{}' checkbox in frame", self.config.handler_toggle_label),
            Err(e) => warn!("Handler toggle failed, continuing: {}", e),
        }

        let report = match provider
            .inject_script(handle, &scripts::trigger(&tab, &self.config))
            .await
        {
            Ok(value) => decode::<TriggerReport>(value).unwrap_or_else(|e| TriggerReport {
                via: None,
                detail: e.to_string(),
            }),
            Err(e) => TriggerReport {
                via: None,
                detail: e.to_string(),
            },
        };
        match report.via {
            Some(via) => debug!("Search triggered via {:?} ({})", via, report.detail),
            None if report.detail.is_empty() => {
                warn!("No search trigger found, harvesting whatever the grid shows")
            }
            None => warn!(
                "Search trigger failed ({}), harvesting whatever the grid shows",
                report.detail
            ),
        }

        self.timings.results_settle.settle().await;

        let harvest: Harvest =
            decode(provider.inject_script(handle, &scripts::harvest(&tab, &self.config)).await?)?;
        if !harvest.found {
            return Err(Error::GridNotFound(format!(
                "frame '{}' exposes no '{}' accessor",
                tab, self.config.grid_accessor
            )));
        }

        let records = map_rows(harvest.rows, &self.config.detail_url_base);
        info!("Fetched {} record(s) for '{}'", records.len(), handler_name.trim());
        Ok(records)
    }
}

/// Same host and path, ignoring query, fragment and a trailing slash
fn same_view(current: &str, target: &str) -> bool {
    match (Url::parse(current), Url::parse(target)) {
        (Ok(current), Ok(target)) => {
            current.host_str() == target.host_str()
                && current.path().trim_end_matches('/') == target.path().trim_end_matches('/')
        }
        _ => false,
    }
}
