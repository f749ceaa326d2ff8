use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// A fixed wait standing in for a completion signal the portal never sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SettleBudget(Duration);

impl SettleBudget {
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Yield to the runtime for the length of the budget
    pub async fn settle(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

impl Serialize for SettleBudget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0.as_millis() as u64)
    }
}

impl<'de> Deserialize<'de> for SettleBudget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(SettleBudget::from_millis)
    }
}

/// Every wait the engine performs, in milliseconds when serialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Poll period while another login holds the in-flight flag
    pub auth_poll_interval: SettleBudget,
    /// How long to wait on another login before taking over
    pub auth_wait_ceiling: SettleBudget,
    pub readiness_attempts: u32,
    pub readiness_interval: SettleBudget,
    /// After the login form is submitted
    pub submit_settle: SettleBudget,
    /// After navigating to the list view
    pub navigation_settle: SettleBudget,
    /// After clicking the menu entry, for its frame to attach
    pub menu_settle: SettleBudget,
    /// After triggering the search, for the grid to fill
    pub results_settle: SettleBudget,
    pub search_window_months: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            auth_poll_interval: SettleBudget::from_millis(500),
            auth_wait_ceiling: SettleBudget::from_secs(20),
            readiness_attempts: 15,
            readiness_interval: SettleBudget::from_secs(1),
            submit_settle: SettleBudget::from_secs(5),
            navigation_settle: SettleBudget::from_secs(3),
            menu_settle: SettleBudget::from_secs(3),
            results_settle: SettleBudget::from_secs(4),
            search_window_months: 6,
        }
    }
}

impl Timings {
    /// Near-zero budgets for driving the engine against scripted surfaces
    pub fn instant() -> Self {
        Self {
            auth_poll_interval: SettleBudget::from_millis(1),
            auth_wait_ceiling: SettleBudget::from_millis(20),
            readiness_attempts: 3,
            readiness_interval: SettleBudget::from_millis(0),
            submit_settle: SettleBudget::from_millis(0),
            navigation_settle: SettleBudget::from_millis(0),
            menu_settle: SettleBudget::from_millis(0),
            results_settle: SettleBudget::from_millis(0),
            search_window_months: 6,
        }
    }
}

/// What the engine knows about the portal's pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Page that renders the login form
    pub entry_url: String,
    /// Path fragment present in the URL while still on the login page
    pub login_path_marker: String,
    /// Regexes matched against the URL to confirm a successful login
    pub post_login_patterns: Vec<String>,
    /// Page hosting the menu and the embedded list widget
    pub list_view_url: String,
    pub menu_label: String,
    /// Attribute on the menu entry naming the frame it opens
    pub tab_attribute: String,
    /// Global in the frame used to preset the query
    pub config_api: String,
    /// Global in the frame returning the grid rows
    pub grid_accessor: String,
    /// Search functions tried in order on the frame's window
    pub search_functions: Vec<String>,
    /// Label of the "search by handler" checkbox
    pub handler_toggle_label: String,
    pub status_filters: Vec<String>,
    pub identity_hints: Vec<String>,
    pub login_lexicon: Vec<String>,
    pub search_lexicon: Vec<String>,
    /// CSS selectors whose visible text signals a rejected login
    pub error_selectors: Vec<String>,
    /// Kept when stripping punctuation out of a partition name
    pub partition_separator: String,
    /// Prefix joined with a record id to build its detail link
    pub detail_url_base: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            entry_url: "https://portal.example.com/login".to_string(),
            login_path_marker: "login".to_string(),
            post_login_patterns: vec![
                r"^https?://[^/]+/(home|index|main|dashboard|workbench)\b".to_string(),
                r"[?&#](ticket|token)=".to_string(),
            ],
            list_view_url: "https://portal.example.com/workbench".to_string(),
            menu_label: "Service Requests".to_string(),
            tab_attribute: "data-tab".to_string(),
            config_api: "queryConfig".to_string(),
            grid_accessor: "getGridData".to_string(),
            search_functions: vec![
                "doSearch".to_string(),
                "doQuery".to_string(),
                "search".to_string(),
                "query".to_string(),
            ],
            handler_toggle_label: "by handler".to_string(),
            status_filters: vec![
                "submitted".to_string(),
                "processing".to_string(),
                "completed".to_string(),
            ],
            identity_hints: vec![
                "user".to_string(),
                "login".to_string(),
                "account".to_string(),
                "email".to_string(),
                "uid".to_string(),
                "name".to_string(),
            ],
            login_lexicon: vec![
                "log in".to_string(),
                "login".to_string(),
                "sign in".to_string(),
                "signin".to_string(),
                "submit".to_string(),
            ],
            search_lexicon: vec![
                "search".to_string(),
                "query".to_string(),
                "find".to_string(),
            ],
            error_selectors: vec![
                ".error".to_string(),
                ".alert".to_string(),
                ".error-msg".to_string(),
                ".login-error".to_string(),
                "[role=alert]".to_string(),
            ],
            partition_separator: "-".to_string(),
            detail_url_base: "https://portal.example.com/request/detail?id=".to_string(),
        }
    }
}
