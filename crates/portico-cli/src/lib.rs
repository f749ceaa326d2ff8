use clap::ValueEnum;
use serde::Serialize;

pub mod commands;

/// How `login` and `fetch` print their results
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Styled, for a terminal
    #[default]
    Pretty,
    /// The engine's result value as pretty JSON
    Json,
    /// Comma-separated rows with a header line
    Table,
}

/// One comma-separated line; every field quoted, embedded quotes doubled
pub fn table_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| format!("\"{}\"", f.as_ref().replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Pretty JSON with a trailing newline
pub fn json_document<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let mut doc = serde_json::to_string_pretty(value)?;
    doc.push('\n');
    Ok(doc)
}
