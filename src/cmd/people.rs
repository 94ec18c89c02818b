//! `exa people <query>`: people search through `people_search_exa`.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, json};

use crate::cmd::shared::{CommandContext, FormatArg, invoke};
use crate::mcp::ToolClient;

pub const TOOL: &str = "people_search_exa";

const DEFAULT_NUM: u32 = 5;

#[derive(Args, Debug, Clone)]
pub struct PeopleArgs {
    /// Who to look for (name, role, company...)
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Number of results (default 5)
    #[arg(short = 'n', long = "num", value_name = "N")]
    pub num: Option<String>,

    #[command(flatten)]
    pub format: FormatArg,
}

pub async fn run_people(
    args: &PeopleArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let mut tool_args = Map::new();
    tool_args.insert("query".into(), json!(args.query));
    tool_args.insert("numResults".into(), json!(ctx.num(args.num.as_deref(), DEFAULT_NUM)));

    let raw = invoke(client, ctx.api_key(), TOOL, tool_args)
        .await
        .context("People search failed")?;
    Ok(ctx.render(&raw, ctx.format(&args.format)))
}

pub async fn execute_people(
    args: PeopleArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<()> {
    println!("{}", run_people(&args, ctx, client).await?);
    Ok(())
}
