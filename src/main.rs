use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use exa_cli::cmd::format::StyleOptions;
use exa_cli::cmd::shared::block_on;
use exa_cli::cmd::{
    self, AdvancedSearchArgs, CodeArgs, CommandContext, CompanyArgs, CompletionArgs, ConfigArgs,
    CrawlArgs, PeopleArgs, ResearchArgs, SearchArgs,
};
use exa_cli::config::{ConfigStore, ExaConfig};
use exa_cli::mcp::{self, ExaClient, TargetSpec, ToolClient};
use exa_cli::utils;

/// Environment fallback for `--api-key`.
const API_KEY_ENV: &str = "EXA_API_KEY";

/// exa - Exa web search, crawling and deep research from the terminal.
///
/// Command layout:
///   exa search <query>            [--num N] [--type auto|fast] [--livecrawl MODE]
///   exa search-advanced <query>   [--category C] [--include-domains a,b] [--start-date D] ...
///   exa code <query>              [--tokens N]
///   exa crawl <url>               [--max-chars N]
///   exa company <name>            [--num N]
///   exa people <query>            [--num N]
///   exa research start <instructions> [--model M]
///   exa research check <id>
///   exa config <set|get|list|clear> [KEY] [VALUE]
///   exa completion <bash|zsh|fish>
///
/// Every tool command accepts --format text|json|markdown.
///
/// Global flags / env:
///   -v / -vv          Increase verbosity (RUST_LOG overrides)
///   -q / --quiet      Errors only
///   -t / --target     MCP endpoint override (or EXA_MCP_TARGET): URL or local server command
///   --api-key         Exa API key (or EXA_API_KEY, then config `apiKey`)
///
/// Examples:
///   exa search "rust async runtimes" --num 5
///   exa search-advanced "vector databases" --category news --start-date 2024-01-01
///   exa crawl https://example.com --format markdown
///   exa research start "compare tokio and smol" --model exa-research-pro
///   exa search "mcp servers" -t "npx -y exa-mcp-server"
#[derive(Parser, Debug)]
#[command(
    name = "exa",
    version,
    author,
    about = "exa - Exa web search, crawling and deep research from the terminal",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// MCP endpoint override (remote URL or local server command)
    #[arg(short = 't', long = "target", global = true, value_name = "TARGET")]
    target: Option<String>,

    /// Exa API key
    #[arg(long = "api-key", global = true, value_name = "KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the web using Exa
    Search(SearchArgs),

    /// Advanced web search with filters
    #[command(name = "search-advanced")]
    SearchAdvanced(AdvancedSearchArgs),

    /// Search for code examples and documentation
    Code(CodeArgs),

    /// Extract content from a URL
    Crawl(CrawlArgs),

    /// Research a company
    Company(CompanyArgs),

    /// Search for people
    People(PeopleArgs),

    /// Deep research using Exa AI
    Research(ResearchArgs),

    /// Manage CLI configuration (~/.exarc)
    Config(ConfigArgs),

    /// Generate shell completion scripts
    Completion(CompletionArgs),
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Stored config for flag fallbacks; an unusable config location is not fatal here.
fn stored_config() -> ExaConfig {
    match ConfigStore::locate() {
        Ok(store) => store.load_stored().unwrap_or_default(),
        Err(e) => {
            tracing::debug!("config unavailable: {e}");
            ExaConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    // Effective target (CLI flag > EXA_MCP_TARGET env > hosted endpoint)
    let target = match cli.target.clone().or_else(|| env_value(mcp::TARGET_ENV)) {
        Some(raw) => match mcp::parse_target(&raw) {
            Ok(spec) => spec,
            Err(e) => {
                eprintln!("Invalid target '{}': {e}", raw);
                std::process::exit(2);
            }
        },
        None => TargetSpec::hosted(),
    };
    tracing::debug!(mcp_target = %target, "resolved MCP target");

    let api_key = cli.api_key.clone().or_else(|| env_value(API_KEY_ENV));
    let ctx = CommandContext::new(api_key, stored_config(), StyleOptions::detect());
    let mut exa = ExaClient::new(target);
    let client: &mut dyn ToolClient = &mut exa;

    match cli.command {
        Commands::Search(args) => block_on(cmd::execute_search(args, &ctx, client)),
        Commands::SearchAdvanced(args) => {
            block_on(cmd::execute_advanced_search(args, &ctx, client))
        }
        Commands::Code(args) => block_on(cmd::execute_code(args, &ctx, client)),
        Commands::Crawl(args) => block_on(cmd::execute_crawl(args, &ctx, client)),
        Commands::Company(args) => block_on(cmd::execute_company(args, &ctx, client)),
        Commands::People(args) => block_on(cmd::execute_people(args, &ctx, client)),
        Commands::Research(args) => block_on(cmd::execute_research(args, &ctx, client)),
        Commands::Config(args) => cmd::execute_config(args),
        Commands::Completion(args) => cmd::execute_completion(args, &Cli::command()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_advanced() {
        let cli = Cli::try_parse_from([
            "exa",
            "search-advanced",
            "vector db",
            "--category",
            "news",
            "--include-domains",
            "a.com,b.com",
            "--highlights",
            "-f",
            "json",
        ])
        .unwrap();
        let Commands::SearchAdvanced(args) = cli.command else {
            panic!("expected search-advanced");
        };
        assert_eq!(args.query, "vector db");
        assert_eq!(args.category.as_deref(), Some("news"));
        assert!(args.highlights);
        assert_eq!(args.format.format.as_deref(), Some("json"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "exa", "research", "check", "abc-123", "--api-key", "k", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn config_key_is_validated_by_clap() {
        assert!(Cli::try_parse_from(["exa", "config", "get", "theme"]).is_err());
        assert!(Cli::try_parse_from(["exa", "config", "set", "defaultNum", "5"]).is_ok());
    }

    #[test]
    fn unknown_type_is_accepted_at_parse_time() {
        assert!(Cli::try_parse_from(["exa", "search", "q", "--type", "neural"]).is_ok());
    }

    #[test]
    fn negative_token_budget_reaches_the_command() {
        let cli = Cli::try_parse_from(["exa", "code", "q", "--tokens", "-5"]).unwrap();
        let Commands::Code(args) = cli.command else {
            panic!("expected code");
        };
        assert_eq!(args.tokens, "-5");
    }
}
