/*!
shared.rs - helpers shared by the tool subcommands.

Focus:
  - CommandContext: api key + stored config + style for one invocation
  - FormatArg: the `--format` flag every tool command carries
  - lenient flag parsing (numbers, enumerated values, comma lists)
  - invoke: connect -> call -> close against any `ToolClient`
  - block_on: the single tokio runtime for the process

Flag values arrive as strings: an unknown `--type` or an unparsable `--num`
degrades to the command default with a warning.
*/

use std::future::Future;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Map, Value};

use crate::cmd::format::StyleOptions;
use crate::config::ExaConfig;
use crate::mcp::ToolClient;
use crate::output::{OutputFormat, RawResponse, format_crawl_result_with, format_output_with};

/* ---- Shared Flags ---- */

#[derive(Args, Debug, Clone, Default)]
pub struct FormatArg {
    /// Output format: text | json | markdown (default: config `output`, else text)
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<String>,
}

/* ---- Invocation Context ---- */

/// Everything a tool command needs besides its own flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    api_key: Option<String>,
    stored: ExaConfig,
    style: StyleOptions,
}

impl CommandContext {
    /// `api_key` is the flag / environment value; the stored `apiKey` is the fallback.
    pub fn new(api_key: Option<String>, stored: ExaConfig, style: StyleOptions) -> Self {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| stored.api_key.clone().filter(|k| !k.trim().is_empty()));
        CommandContext {
            api_key,
            stored,
            style,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    /// `--format` when given (unknown values degrade to text), else the stored
    /// `output`, else text.
    pub fn format(&self, flag: &FormatArg) -> OutputFormat {
        match flag.format.as_deref() {
            Some(raw) => OutputFormat::from_str_lossy(raw),
            None => self.stored.output_format().unwrap_or_default(),
        }
    }

    /// `--num` when given (unparsable values degrade to `default`), else the
    /// stored `defaultNum`, else `default`.
    pub fn num(&self, flag: Option<&str>, default: u32) -> u32 {
        match flag {
            Some(raw) => parse_count(raw, default),
            None => self.stored.default_num.filter(|n| *n >= 1).unwrap_or(default),
        }
    }

    pub fn render(&self, raw: &RawResponse, format: OutputFormat) -> String {
        format_output_with(raw, format, &self.style)
    }

    pub fn render_crawl(&self, raw: &RawResponse, format: OutputFormat) -> String {
        format_crawl_result_with(raw, format, &self.style)
    }
}

/* ---- Lenient Flag Parsing ---- */

/// Positive integer or `default`.
pub fn parse_count(raw: &str, default: u32) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => {
            tracing::warn!(value = raw, default, "not a positive number, using default");
            default
        }
    }
}

/// `value` when it is one of `allowed`, else `default`.
pub fn choice_or_default(
    flag: &str,
    value: &str,
    allowed: &[&str],
    default: &'static str,
) -> String {
    choice(flag, value, allowed).unwrap_or_else(|| default.to_string())
}

/// `value` when it is one of `allowed`; `None` (logged) otherwise.
pub fn choice(flag: &str, value: &str, allowed: &[&str]) -> Option<String> {
    let trimmed = value.trim();
    if allowed.contains(&trimmed) {
        return Some(trimmed.to_string());
    }
    tracing::warn!(flag, value, allowed = %allowed.join(", "), "ignoring unsupported value");
    None
}

/// `a.com, b.com,,c.com` -> `["a.com", "b.com", "c.com"]`
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/* ---- Tool Invocation ---- */

/// One round trip: connect, call, close. The client is closed whether the
/// call succeeded or not; results flagged `isError` become errors.
pub async fn invoke(
    client: &mut dyn ToolClient,
    api_key: Option<&str>,
    tool: &str,
    args: Map<String, Value>,
) -> Result<RawResponse> {
    client
        .connect(api_key)
        .await
        .context("Failed to connect to Exa MCP")?;
    let outcome = client.call_tool(tool, args).await;
    client.close().await;

    let raw = outcome?;
    if raw.is_error() {
        bail!("{tool} reported an error: {}", raw.extract_text().trim());
    }
    Ok(raw)
}

/// Run a command future to completion on a fresh multi-threaded runtime.
pub fn block_on<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(fut)
}

/* ---- Test Support ---- */


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_count_falls_back() {
        assert_eq!(parse_count("12", 8), 12);
        assert_eq!(parse_count(" 3 ", 8), 3);
        assert_eq!(parse_count("abc", 8), 8);
        assert_eq!(parse_count("0", 8), 8);
        assert_eq!(parse_count("-4", 8), 8);
    }

    #[test]
    fn choices() {
        assert_eq!(choice_or_default("type", "fast", &["auto", "fast"], "auto"), "fast");
        assert_eq!(choice_or_default("type", "slow", &["auto", "fast"], "auto"), "auto");
        assert_eq!(choice("category", "news", &["news", "tweet"]), Some("news".to_string()));
        assert_eq!(choice("category", "blogs", &["news", "tweet"]), None);
    }

    #[test]
    fn split_csv_trims_and_drops_empty() {
        assert_eq!(split_csv("a.com, b.com,,c.com "), vec!["a.com", "b.com", "c.com"]);
        assert!(split_csv(" , ").is_empty());
    }

    #[test]
    fn format_resolution_order() {
        assert_eq!(ctx().format(&FormatArg::default()), OutputFormat::Text);
        assert_eq!(ctx().format(&format("Markdown")), OutputFormat::Markdown);
        assert_eq!(ctx().format(&format("yaml")), OutputFormat::Text);

        let stored = ExaConfig {
            output: Some("json".into()),
            ..Default::default()
        };
        assert_eq!(ctx_with(stored.clone()).format(&FormatArg::default()), OutputFormat::Json);
        assert_eq!(ctx_with(stored).format(&format("text")), OutputFormat::Text);
    }

    #[test]
    fn num_resolution_order() {
        assert_eq!(ctx().num(None, 8), 8);
        assert_eq!(ctx().num(Some("4"), 8), 4);
        let stored = ExaConfig {
            default_num: Some(15),
            ..Default::default()
        };
        assert_eq!(ctx_with(stored.clone()).num(None, 8), 15);
        assert_eq!(ctx_with(stored).num(Some("x"), 8), 8);
    }

    #[test]
    fn api_key_flag_beats_config() {
        let stored = ExaConfig {
            api_key: Some("from-config".into()),
            ..Default::default()
        };
        let c = CommandContext::new(Some("from-flag".into()), stored.clone(), StyleOptions::plain());
        assert_eq!(c.api_key(), Some("from-flag"));
        let c = CommandContext::new(Some("  ".into()), stored, StyleOptions::plain());
        assert_eq!(c.api_key(), Some("from-config"));
        assert_eq!(ctx().api_key(), None);
    }

    #[tokio::test]
    async fn invoke_closes_after_call() {
        let mut client = FakeClient::replying_text("ok");
        let raw = invoke(&mut client, Some("k"), "web_search_exa", Map::new())
            .await
            .unwrap();
        assert_eq!(raw.extract_text(), "ok");
        assert_eq!(client.connected_with, Some(Some("k".to_string())));
        assert_eq!(client.calls[0].0, "web_search_exa");
        assert_eq!(client.closed, 1);
    }

    #[tokio::test]
    async fn invoke_closes_on_call_failure() {
        let mut client = FakeClient::default();
        assert!(invoke(&mut client, None, "crawling_exa", Map::new()).await.is_err());
        assert_eq!(client.closed, 1);
    }

    #[tokio::test]
    async fn invoke_reports_connect_failure() {
        let mut client = FakeClient {
            fail_connect: true,
            ..Default::default()
        };
        let err = invoke(&mut client, None, "crawling_exa", Map::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to connect to Exa MCP"));
        assert!(client.calls.is_empty());
    }

    #[tokio::test]
    async fn invoke_surfaces_tool_errors() {
        let mut client = FakeClient::replying(json!({
            "content": [{ "type": "text", "text": "Invalid API key" }],
            "isError": true
        }));
        let err = invoke(&mut client, None, "web_search_exa", Map::new()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
        assert_eq!(client.closed, 1);
    }

    #[test]
    fn block_on_runs_future() {
        assert_eq!(block_on(async { anyhow::Ok(2 + 2) }).unwrap(), 4);
        assert!(block_on(async { Err::<(), _>(anyhow::anyhow!("boom")) }).is_err());
    }
}
