//! `exa search <query>`: web search through `web_search_exa`.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value, json};

use crate::cmd::shared::{CommandContext, FormatArg, choice_or_default, invoke};
use crate::mcp::ToolClient;

pub const TOOL: &str = "web_search_exa";

const DEFAULT_NUM: u32 = 8;
const TYPES: &[&str] = &["auto", "fast"];
const LIVECRAWL: &[&str] = &["fallback", "preferred"];

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Number of results (default 8)
    #[arg(short = 'n', long = "num", value_name = "N")]
    pub num: Option<String>,

    /// Search type: auto | fast
    #[arg(long = "type", value_name = "TYPE", default_value = "auto")]
    pub search_type: String,

    /// Live crawl mode: fallback | preferred
    #[arg(long, value_name = "MODE", default_value = "fallback")]
    pub livecrawl: String,

    #[command(flatten)]
    pub format: FormatArg,
}

fn tool_arguments(args: &SearchArgs, ctx: &CommandContext) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("query".into(), json!(args.query));
    map.insert("numResults".into(), json!(ctx.num(args.num.as_deref(), DEFAULT_NUM)));
    map.insert(
        "type".into(),
        json!(choice_or_default("type", &args.search_type, TYPES, "auto")),
    );
    map.insert(
        "livecrawl".into(),
        json!(choice_or_default("livecrawl", &args.livecrawl, LIVECRAWL, "fallback")),
    );
    map
}

pub async fn run_search(
    args: &SearchArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let raw = invoke(client, ctx.api_key(), TOOL, tool_arguments(args, ctx))
        .await
        .context("Search failed")?;
    Ok(ctx.render(&raw, ctx.format(&args.format)))
}

pub async fn execute_search(
    args: SearchArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<()> {
    println!("{}", run_search(&args, ctx, client).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::shared::testing::*;

    fn args(query: &str) -> SearchArgs {
        SearchArgs {
            query: query.into(),
            num: None,
            search_type: "auto".into(),
            livecrawl: "fallback".into(),
            format: FormatArg::default(),
        }
    }

    #[tokio::test]
    async fn sends_defaults() {
        let mut client = FakeClient::replying_text("Title: A\nURL: https://a.example\nText: body");
        run_search(&args("rust async"), &ctx(), &mut client).await.unwrap();
        assert_eq!(client.calls[0].0, TOOL);
        assert_eq!(
            Value::Object(client.last_args().clone()),
            json!({ "query": "rust async", "numResults": 8, "type": "auto", "livecrawl": "fallback" })
        );
    }

    #[tokio::test]
    async fn invalid_values_fall_back() {
        let mut client = FakeClient::replying_text("nothing");
        let a = SearchArgs {
            num: Some("lots".into()),
            search_type: "neural".into(),
            livecrawl: "always".into(),
            ..args("q")
        };
        run_search(&a, &ctx(), &mut client).await.unwrap();
        let sent = client.last_args();
        assert_eq!(sent["numResults"], json!(8));
        assert_eq!(sent["type"], json!("auto"));
        assert_eq!(sent["livecrawl"], json!("fallback"));
    }

    #[tokio::test]
    async fn renders_blocks_as_text() {
        let mut client = FakeClient::replying_text(
            "Title: Test Article\nURL: https://example.com/article\nPublished Date: 2024-01-15T10:00:00Z\nText: Hello there",
        );
        let out = run_search(&args("q"), &ctx(), &mut client).await.unwrap();
        assert_eq!(
            out,
            "1. Test Article (2024-01-15)\n   https://example.com/article\n   Hello there"
        );
    }

    #[tokio::test]
    async fn failure_carries_context() {
        let mut client = FakeClient::default();
        let err = run_search(&args("q"), &ctx(), &mut client).await.unwrap_err();
        assert!(err.to_string().starts_with("Search failed"));
    }
}
