use chrono::{Months, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
}

/// Values pushed into the frame's query configuration object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub status_list: Vec<String>,
    pub begin_date: String,
    pub end_date: String,
    pub search_mode: String,
    pub handler_name: String,
    pub partition: String,
}

impl QueryParams {
    pub fn new(
        handler_name: &str,
        partition: &str,
        separator: &str,
        statuses: &[String],
        window: (NaiveDate, NaiveDate),
    ) -> Self {
        let (begin, end) = window;
        Self {
            status_list: statuses.to_vec(),
            begin_date: begin.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            search_mode: "handler".to_string(),
            handler_name: handler_name.trim().to_string(),
            partition: sanitize_partition(partition, separator),
        }
    }
}

/// `(today - months, today)`, clamped to the end of shorter months
pub fn search_window(today: NaiveDate, months: u32) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// Strip everything but letters and digits from each `separator`-delimited
/// part; every separator token survives, even between empty parts
pub fn sanitize_partition(raw: &str, separator: &str) -> String {
    if separator.is_empty() {
        return NON_ALNUM.replace_all(raw, "").into_owned();
    }
    raw.split(separator)
        .map(|part| NON_ALNUM.replace_all(part, "").into_owned())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_spans_six_months() {
        assert_eq!(
            search_window(date(2026, 10, 19), 6),
            (date(2026, 4, 19), date(2026, 10, 19))
        );
    }

    #[test]
    fn test_window_crosses_year_and_clamps_day() {
        assert_eq!(search_window(date(2026, 2, 15), 6).0, date(2025, 8, 15));
        assert_eq!(search_window(date(2026, 8, 31), 6).0, date(2026, 2, 28));
    }

    #[test]
    fn test_sanitize_keeps_separator() {
        assert_eq!(sanitize_partition("Team A - Ops!", "-"), "TeamA-Ops");
        assert_eq!(sanitize_partition("TeamA", "-"), "TeamA");
        assert_eq!(sanitize_partition("(North)--East", "-"), "North--East");
    }

    #[test]
    fn test_sanitize_keeps_edge_and_repeated_separators() {
        assert_eq!(sanitize_partition("A--B", "-"), "A--B");
        assert_eq!(sanitize_partition("-Ops", "-"), "-Ops");
        assert_eq!(sanitize_partition("Ops - ", "-"), "Ops-");
    }

    #[test]
    fn test_sanitize_keeps_unicode_letters() {
        assert_eq!(sanitize_partition("Équipe_Nord/2", "/"), "ÉquipeNord/2");
    }

    #[test]
    fn test_sanitize_without_separator() {
        assert_eq!(sanitize_partition("a.b c", ""), "abc");
    }

    #[test]
    fn test_params_serialize_for_the_frame() {
        let params = QueryParams::new(
            " Alice ",
            "Team A",
            "-",
            &["processing".to_string()],
            (date(2026, 4, 19), date(2026, 10, 19)),
        );
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["handlerName"], "Alice");
        assert_eq!(value["partition"], "TeamA");
        assert_eq!(value["beginDate"], "2026-04-19");
        assert_eq!(value["endDate"], "2026-10-19");
        assert_eq!(value["searchMode"], "handler");
        assert_eq!(value["statusList"][0], "processing");
    }
}
