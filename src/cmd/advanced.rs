//! `exa search-advanced <query>`: filtered search through `web_search_advanced_exa`.
//!
//! Optional filters are only sent when set; an unknown `--category` is dropped
//! rather than sent.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value, json};

use crate::cmd::shared::{CommandContext, FormatArg, choice, choice_or_default, invoke, split_csv};
use crate::mcp::ToolClient;

pub const TOOL: &str = "web_search_advanced_exa";

const DEFAULT_NUM: u32 = 10;
const MAX_NUM: u32 = 100;
const TYPES: &[&str] = &["auto", "fast", "neural"];
const LIVECRAWL: &[&str] = &["never", "fallback", "preferred", "always"];
pub const CATEGORIES: &[&str] = &[
    "company",
    "research paper",
    "news",
    "tweet",
    "personal site",
    "people",
    "financial report",
];

#[derive(Args, Debug, Clone)]
pub struct AdvancedSearchArgs {
    /// Search query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Number of results (default 10, max 100)
    #[arg(short = 'n', long = "num", value_name = "N")]
    pub num: Option<String>,

    /// Search type: auto | fast | neural
    #[arg(long = "type", value_name = "TYPE", default_value = "auto")]
    pub search_type: String,

    /// Category filter (company, research paper, news, tweet, personal site, people, financial report)
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Comma-separated domains to include
    #[arg(long = "include-domains", value_name = "DOMAINS")]
    pub include_domains: Option<String>,

    /// Comma-separated domains to exclude
    #[arg(long = "exclude-domains", value_name = "DOMAINS")]
    pub exclude_domains: Option<String>,

    /// Earliest published date (YYYY-MM-DD)
    #[arg(long = "start-date", value_name = "DATE")]
    pub start_date: Option<String>,

    /// Latest published date (YYYY-MM-DD)
    #[arg(long = "end-date", value_name = "DATE")]
    pub end_date: Option<String>,

    /// Include highlights
    #[arg(long)]
    pub highlights: bool,

    /// Include summaries
    #[arg(long)]
    pub summary: bool,

    /// Live crawl mode: never | fallback | preferred | always
    #[arg(long, value_name = "MODE", default_value = "fallback")]
    pub livecrawl: String,

    #[command(flatten)]
    pub format: FormatArg,
}

fn tool_arguments(args: &AdvancedSearchArgs, ctx: &CommandContext) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("query".into(), json!(args.query));
    map.insert(
        "numResults".into(),
        json!(ctx.num(args.num.as_deref(), DEFAULT_NUM).min(MAX_NUM)),
    );
    map.insert(
        "type".into(),
        json!(choice_or_default("type", &args.search_type, TYPES, "auto")),
    );
    map.insert(
        "livecrawl".into(),
        json!(choice_or_default("livecrawl", &args.livecrawl, LIVECRAWL, "fallback")),
    );

    if let Some(category) = args
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .and_then(|c| choice("category", c, CATEGORIES))
    {
        map.insert("category".into(), json!(category));
    }
    for (key, raw) in [
        ("includeDomains", &args.include_domains),
        ("excludeDomains", &args.exclude_domains),
    ] {
        let domains = raw.as_deref().map(split_csv).unwrap_or_default();
        if !domains.is_empty() {
            map.insert(key.into(), json!(domains));
        }
    }
    for (key, raw) in [
        ("startPublishedDate", &args.start_date),
        ("endPublishedDate", &args.end_date),
    ] {
        if let Some(date) = raw.as_deref().filter(|d| !d.is_empty()) {
            map.insert(key.into(), json!(date));
        }
    }
    if args.highlights {
        map.insert("highlights".into(), json!(true));
    }
    if args.summary {
        map.insert("summary".into(), json!(true));
    }
    map
}

pub async fn run_advanced_search(
    args: &AdvancedSearchArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let raw = invoke(client, ctx.api_key(), TOOL, tool_arguments(args, ctx))
        .await
        .context("Search failed")?;
    Ok(ctx.render(&raw, ctx.format(&args.format)))
}

pub async fn execute_advanced_search(
    args: AdvancedSearchArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<()> {
    println!("{}", run_advanced_search(&args, ctx, client).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::shared::testing::*;

    fn args(query: &str) -> AdvancedSearchArgs {
        AdvancedSearchArgs {
            query: query.into(),
            num: None,
            search_type: "auto".into(),
            category: None,
            include_domains: None,
            exclude_domains: None,
            start_date: None,
            end_date: None,
            highlights: false,
            summary: false,
            livecrawl: "fallback".into(),
            format: FormatArg::default(),
        }
    }

    #[test]
    fn minimal_arguments() {
        let sent = tool_arguments(&args("llm evals"), &ctx());
        assert_eq!(
            Value::Object(sent),
            json!({ "query": "llm evals", "numResults": 10, "type": "auto", "livecrawl": "fallback" })
        );
    }

    #[test]
    fn all_filters() {
        let a = AdvancedSearchArgs {
            num: Some("250".into()),
            search_type: "neural".into(),
            category: Some("research paper".into()),
            include_domains: Some("arxiv.org, acm.org".into()),
            exclude_domains: Some("medium.com".into()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-12-31".into()),
            highlights: true,
            summary: true,
            livecrawl: "always".into(),
            ..args("transformers")
        };
        let sent = tool_arguments(&a, &ctx());
        assert_eq!(sent["numResults"], json!(100));
        assert_eq!(sent["type"], json!("neural"));
        assert_eq!(sent["category"], json!("research paper"));
        assert_eq!(sent["includeDomains"], json!(["arxiv.org", "acm.org"]));
        assert_eq!(sent["excludeDomains"], json!(["medium.com"]));
        assert_eq!(sent["startPublishedDate"], json!("2024-01-01"));
        assert_eq!(sent["endPublishedDate"], json!("2024-12-31"));
        assert_eq!(sent["highlights"], json!(true));
        assert_eq!(sent["summary"], json!(true));
        assert_eq!(sent["livecrawl"], json!("always"));
    }

    #[test]
    fn unknown_category_and_empty_lists_are_omitted() {
        let a = AdvancedSearchArgs {
            category: Some("blog".into()),
            include_domains: Some(" , ".into()),
            ..args("q")
        };
        let sent = tool_arguments(&a, &ctx());
        assert!(!sent.contains_key("category"));
        assert!(!sent.contains_key("includeDomains"));
    }

    #[tokio::test]
    async fn renders_json_results() {
        let mut client = FakeClient::replying_text(
            r#"{"results":[{"title":"Paper","url":"https://arxiv.org/abs/1","text":"abstract"}]}"#,
        );
        let a = AdvancedSearchArgs {
            format: format("json"),
            ..args("q")
        };
        let out = run_advanced_search(&a, &ctx(), &mut client).await.unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["title"], json!("Paper"));
        assert_eq!(client.calls[0].0, TOOL);
    }
}
