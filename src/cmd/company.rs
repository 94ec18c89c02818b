//! `exa company <name>`: company research through `company_research_exa`.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, json};

use crate::cmd::shared::{CommandContext, FormatArg, invoke};
use crate::mcp::ToolClient;

pub const TOOL: &str = "company_research_exa";

const DEFAULT_NUM: u32 = 3;

#[derive(Args, Debug, Clone)]
pub struct CompanyArgs {
    /// Company name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Number of results (default 3)
    #[arg(short = 'n', long = "num", value_name = "N")]
    pub num: Option<String>,

    #[command(flatten)]
    pub format: FormatArg,
}

pub async fn run_company(
    args: &CompanyArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let mut tool_args = Map::new();
    tool_args.insert("companyName".into(), json!(args.name));
    tool_args.insert("numResults".into(), json!(ctx.num(args.num.as_deref(), DEFAULT_NUM)));

    let raw = invoke(client, ctx.api_key(), TOOL, tool_args)
        .await
        .context("Company research failed")?;
    Ok(ctx.render(&raw, ctx.format(&args.format)))
}

pub async fn execute_company(
    args: CompanyArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<()> {
    println!("{}", run_company(&args, ctx, client).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::shared::testing::*;
    use serde_json::Value;

    const PROFILE: &str = r#"{"results":[{"title":"Acme Corp","url":"https://acme.com","entities":[{"properties":{"name":"Acme Corporation","workforce":{"total":1000}}}]}]}"#;

    fn args(fmt: &str) -> CompanyArgs {
        CompanyArgs {
            name: "Acme".into(),
            num: None,
            format: format(fmt),
        }
    }

    #[tokio::test]
    async fn sends_company_name() {
        let mut client = FakeClient::replying_text(PROFILE);
        run_company(&args("text"), &ctx(), &mut client).await.unwrap();
        assert_eq!(
            Value::Object(client.last_args().clone()),
            json!({ "companyName": "Acme", "numResults": 3 })
        );
    }

    #[tokio::test]
    async fn renders_profile() {
        let mut client = FakeClient::replying_text(PROFILE);
        let out = run_company(&args("markdown"), &ctx(), &mut client).await.unwrap();
        assert!(out.starts_with("# Acme Corporation\n\n**URL:** https://acme.com"));
        assert!(out.contains("**Employees:** 1,000"));
    }

    #[tokio::test]
    async fn json_reemits_payload() {
        let mut client = FakeClient::replying_text(PROFILE);
        let out = run_company(&args("json"), &ctx(), &mut client).await.unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["results"][0]["title"], json!("Acme Corp"));
    }
}
