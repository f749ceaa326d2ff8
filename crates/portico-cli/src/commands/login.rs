use anyhow::{Result, bail};
use console::style;
use portico_core::AuthResult;

use super::config::Settings;
use super::{PortalArgs, authenticate, build_client, runtime, spinner};
use crate::{OutputFormat, json_document, table_row};

/// Log into the portal once and report the outcome
pub fn execute(args: &PortalArgs, settings: Settings, format: OutputFormat) -> Result<()> {
    let entry_url = args
        .url
        .clone()
        .unwrap_or_else(|| settings.portal.entry_url.clone());

    let result = runtime()?.block_on(async {
        let client = build_client(args, settings);
        let pb = spinner(&format!("Logging into {}...", entry_url));
        let result = authenticate(&client, args).await;
        pb.finish_and_clear();
        client.shutdown().await;
        result
    });

    print!("{}", render(&result, format)?);
    if !result.success {
        bail!("login failed");
    }
    Ok(())
}

fn render(result: &AuthResult, format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Json => json_document(result)?,
        OutputFormat::Table => {
            let kind = result.error_kind.map(|k| k.to_string()).unwrap_or_default();
            let mut out = table_row(&["Success", "Kind", "Error"]);
            out.push_str(&table_row(&[
                result.success.to_string().as_str(),
                kind.as_str(),
                result.error.as_deref().unwrap_or(""),
            ]));
            out
        }
        OutputFormat::Pretty => {
            if result.success {
                format!("{} Logged in\n", style("✓").green().bold())
            } else {
                let mut out = format!(
                    "{} {}\n",
                    style("✗").red().bold(),
                    style(result.error.as_deref().unwrap_or("Login failed")).red()
                );
                if let Some(diagnostics) = &result.diagnostics {
                    out.push_str(&format!("  {}\n", style(diagnostics).dim()));
                }
                out
            }
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::Error;

    #[test]
    fn test_json_render_of_failure() {
        let result = AuthResult::failed(&Error::MissingCredentials);
        let json = render(&result, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["errorKind"], "MissingCredentials");
    }

    #[test]
    fn test_table_render_of_success() {
        let table = render(&AuthResult::ok(), OutputFormat::Table).unwrap();
        assert_eq!(
            table,
            "\"Success\",\"Kind\",\"Error\"\n\"true\",\"\",\"\"\n"
        );
    }
}
