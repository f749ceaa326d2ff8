use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

/// One row of the portal's request list, in the shape callers consume
///
/// Every field is a plain string; anything the portal left out is `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    pub id: String,
    pub title: String,
    pub status: String,
    pub submitted_at: String,
    pub request_type: String,
    pub requestor: String,
    pub handler: String,
    pub detail_url: String,
}

/// A grid row as the portal's widget hands it out
///
/// Column names differ between widget versions, so each field lists the
/// keys it may arrive under; the first non-null one wins. Any JSON scalar is
/// accepted and rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub submitted_at: String,
    pub request_type: String,
    pub requestor: String,
    pub handler: String,
}

const ID_KEYS: &[&str] = &["id", "ID", "Id", "billId", "BILLID"];
const TITLE_KEYS: &[&str] = &["title", "TITLE", "Title", "subject", "SUBJECT"];
const STATUS_KEYS: &[&str] = &["status", "STATUS", "Status", "state", "STATE"];
const SUBMITTED_KEYS: &[&str] = &[
    "submittedAt",
    "submitTime",
    "SUBMIT_TIME",
    "createTime",
    "CREATE_TIME",
];
const TYPE_KEYS: &[&str] = &["requestType", "reqType", "REQ_TYPE", "type", "TYPE"];
const REQUESTOR_KEYS: &[&str] = &["requestor", "REQUESTOR", "applicant", "APPLICANT"];
const HANDLER_KEYS: &[&str] = &["handler", "HANDLER", "handlerName", "HANDLER_NAME"];

fn field(row: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
        .map(scalar_text)
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested structures carry nothing we display
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

impl RawRow {
    /// Decode a row, treating anything that is not an object as empty
    pub fn from_value(value: Value) -> Self {
        let Value::Object(row) = value else {
            return Self::default();
        };
        Self {
            id: field(&row, ID_KEYS),
            title: field(&row, TITLE_KEYS),
            status: field(&row, STATUS_KEYS),
            submitted_at: field(&row, SUBMITTED_KEYS),
            request_type: field(&row, TYPE_KEYS),
            requestor: field(&row, REQUESTOR_KEYS),
            handler: field(&row, HANDLER_KEYS),
        }
    }

    pub fn into_record(self, detail_url_base: &str) -> ExtractedRecord {
        let detail_url = if self.id.is_empty() {
            String::new()
        } else {
            let id: String = form_urlencoded::byte_serialize(self.id.as_bytes()).collect();
            format!("{}{}", detail_url_base, id)
        };
        ExtractedRecord {
            id: self.id,
            title: self.title,
            status: self.status,
            submitted_at: self.submitted_at,
            request_type: self.request_type,
            requestor: self.requestor,
            handler: self.handler,
            detail_url,
        }
    }
}

/// Map raw grid rows to records
pub fn map_rows(rows: Vec<Value>, detail_url_base: &str) -> Vec<ExtractedRecord> {
    rows.into_iter()
        .map(|row| RawRow::from_value(row).into_record(detail_url_base))
        .collect()
}
