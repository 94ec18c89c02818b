//! `exa code <query>`: code and documentation context through `get_code_context_exa`.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value, json};

use crate::cmd::shared::{CommandContext, FormatArg, invoke};
use crate::mcp::ToolClient;

pub const TOOL: &str = "get_code_context_exa";

const DEFAULT_TOKENS: u32 = 5000;
const MIN_TOKENS: u32 = 1000;
const MAX_TOKENS: u32 = 50_000;

#[derive(Args, Debug, Clone)]
pub struct CodeArgs {
    /// Code search query (include language / framework)
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Token budget for the returned context (1000-50000)
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_TOKENS.to_string(),
        allow_negative_numbers = true
    )]
    pub tokens: String,

    #[command(flatten)]
    pub format: FormatArg,
}

/// Unparsable or zero budgets use the default; anything else is clamped,
/// so a negative budget becomes the minimum.
fn token_budget(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(0) | Err(_) => {
            tracing::warn!(value = raw, default = DEFAULT_TOKENS, "not a token count, using default");
            DEFAULT_TOKENS
        }
        Ok(n) => n.clamp(MIN_TOKENS.into(), MAX_TOKENS.into()) as u32,
    }
}

fn tool_arguments(args: &CodeArgs) -> Map<String, Value> {
    let tokens = token_budget(&args.tokens);
    let mut map = Map::new();
    map.insert("query".into(), json!(args.query));
    map.insert("tokensNum".into(), json!(tokens));
    map
}

pub async fn run_code(
    args: &CodeArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let raw = invoke(client, ctx.api_key(), TOOL, tool_arguments(args))
        .await
        .context("Failed to search code")?;
    Ok(ctx.render(&raw, ctx.format(&args.format)))
}

pub async fn execute_code(
    args: CodeArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<()> {
    println!("{}", run_code(&args, ctx, client).await?);
    Ok(())
}
