use anyhow::{Result, bail};
use console::style;
use portico_core::{ExtractedRecord, FetchResult};
use std::io::Write;
use std::path::PathBuf;

use super::config::Settings;
use super::{PortalArgs, authenticate, build_client, runtime, spinner};
use crate::{OutputFormat, json_document, table_row};

/// Log in, pull the handler's request list and print it
pub fn execute(
    args: &PortalArgs,
    settings: Settings,
    name: &str,
    partition: &str,
    output_file: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let result = runtime()?.block_on(async {
        let client = build_client(args, settings);

        let pb = spinner("Logging in...");
        let login = authenticate(&client, args).await;
        if !login.success {
            pb.finish_and_clear();
            client.shutdown().await;
            return Err(anyhow::anyhow!(
                "login failed: {}",
                login.error.unwrap_or_default()
            ));
        }

        pb.set_message(format!("Fetching requests handled by {}...", name));
        let fetched = client.fetch_records(name, partition).await;
        pb.finish_and_clear();
        client.shutdown().await;
        Ok(fetched)
    })?;

    let output = render(&result, name, format)?;
    if let Some(path) = output_file {
        let mut f = std::fs::File::create(&path)?;
        f.write_all(output.as_bytes())?;
        println!("Records written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if !result.success {
        bail!("fetch failed");
    }
    Ok(())
}

fn render(result: &FetchResult, name: &str, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => json_document(result)?,
        OutputFormat::Table => format_table(&result.data),
        OutputFormat::Pretty => format_pretty(result, name),
    })
}

fn format_table(records: &[ExtractedRecord]) -> String {
    let mut output = table_row(&[
        "Id",
        "Title",
        "Status",
        "Submitted",
        "Type",
        "Requestor",
        "Handler",
        "Link",
    ]);
    for r in records {
        output.push_str(&table_row(&[
            &r.id,
            &r.title,
            &r.status,
            &r.submitted_at,
            &r.request_type,
            &r.requestor,
            &r.handler,
            &r.detail_url,
        ]));
    }
    output
}

fn format_pretty(result: &FetchResult, name: &str) -> String {
    if !result.success {
        return format!(
            "{} {}\n",
            style("✗").red().bold(),
            style(result.error.as_deref().unwrap_or("Fetch failed")).red()
        );
    }

    let mut output = format!(
        "\n{}\n\n",
        style(format!("{} request(s) for {}", result.data.len(), name))
            .bold()
            .cyan()
    );
    for r in &result.data {
        output.push_str(&format!(
            "  {} {}\n",
            style(&r.id).yellow(),
            style(&r.title).bold()
        ));
        output.push_str(&format!(
            "     {} | {} | {}\n",
            r.status, r.submitted_at, r.requestor
        ));
        if !r.detail_url.is_empty() {
            output.push_str(&format!("     {}\n", style(&r.detail_url).dim()));
        }
    }
    output
}
