//! `exa crawl <url>`: fetch one page through `crawling_exa`.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value, json};

use crate::cmd::shared::{CommandContext, FormatArg, invoke, parse_count};
use crate::mcp::ToolClient;

pub const TOOL: &str = "crawling_exa";

const DEFAULT_MAX_CHARS: u32 = 3000;

#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// URL to crawl
    #[arg(value_name = "URL")]
    pub url: String,

    /// Maximum characters to extract
    #[arg(long = "max-chars", value_name = "N", default_value_t = DEFAULT_MAX_CHARS.to_string())]
    pub max_chars: String,

    #[command(flatten)]
    pub format: FormatArg,
}

fn tool_arguments(args: &CrawlArgs) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("url".into(), json!(args.url));
    map.insert(
        "maxCharacters".into(),
        json!(parse_count(&args.max_chars, DEFAULT_MAX_CHARS)),
    );
    map
}

pub async fn run_crawl(
    args: &CrawlArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let raw = invoke(client, ctx.api_key(), TOOL, tool_arguments(args))
        .await
        .context("Failed to crawl URL")?;
    Ok(ctx.render_crawl(&raw, ctx.format(&args.format)))
}

pub async fn execute_crawl(
    args: CrawlArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<()> {
    println!("{}", run_crawl(&args, ctx, client).await?);
    Ok(())
}
