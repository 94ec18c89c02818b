/*!
research.rs - `exa research start|check`

  start <instructions> [--model M]  -> deep_researcher_start
  check <id>                        -> deep_researcher_check

`start` looks for a research id in the first text part and, when found,
prints the follow-up `check` command instead of the raw response. `check`
derives a status from the first text part (a JSON `"status"` field wins over
keyword detection) and prints it above the formatted response.
*/

use std::sync::LazyLock;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use regex::Regex;
use serde_json::{Map, json};

use crate::cmd::format::{Mark, Role, StyleOptions, color, status_line};
use crate::cmd::shared::{CommandContext, FormatArg, choice_or_default, invoke};
use crate::mcp::ToolClient;
use crate::output::RawResponse;

pub const START_TOOL: &str = "deep_researcher_start";
pub const CHECK_TOOL: &str = "deep_researcher_check";

pub const MODELS: &[&str] = &["exa-research-fast", "exa-research", "exa-research-pro"];
const DEFAULT_MODEL: &str = "exa-research-fast";

static RESEARCH_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:research[_-]?id|id)[:\s]*["']?([a-zA-Z0-9-]+)["']?"#)
        .expect("research id regex")
});

static JSON_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""status"\s*:\s*"([^"]+)""#).expect("status regex"));

/* ---- Arguments ---- */

#[derive(Args, Debug, Clone)]
pub struct ResearchArgs {
    #[command(subcommand)]
    pub action: ResearchAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ResearchAction {
    /// Start a new deep research task
    Start(StartArgs),
    /// Check the status of a deep research task
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Research instructions / question
    #[arg(value_name = "INSTRUCTIONS")]
    pub instructions: String,

    /// Research model: exa-research-fast | exa-research | exa-research-pro
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[command(flatten)]
    pub format: FormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Research id returned by `research start`
    #[arg(value_name = "ID")]
    pub id: String,

    #[command(flatten)]
    pub format: FormatArg,
}

/* ---- Status ---- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResearchStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Unknown,
    /// A `"status"` value outside the known set, kept as reported.
    Other(String),
}

impl ResearchStatus {
    fn from_label(label: &str) -> Self {
        match label {
            "pending" => ResearchStatus::Pending,
            "running" => ResearchStatus::Running,
            "completed" => ResearchStatus::Completed,
            "failed" => ResearchStatus::Failed,
            "unknown" => ResearchStatus::Unknown,
            other => ResearchStatus::Other(other.to_string()),
        }
    }

    /// Status from a `deep_researcher_check` response text.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("\"status\"") || lower.contains("'status'") {
            return JSON_STATUS
                .captures(&lower)
                .and_then(|c| c.get(1))
                .map(|m| Self::from_label(m.as_str()))
                .unwrap_or(ResearchStatus::Unknown);
        }
        let has = |words: [&str; 2]| words.iter().any(|w| lower.contains(w));
        if has(["completed", "finished"]) {
            ResearchStatus::Completed
        } else if has(["failed", "error"]) {
            ResearchStatus::Failed
        } else if has(["running", "processing"]) {
            ResearchStatus::Running
        } else if has(["pending", "queued"]) {
            ResearchStatus::Pending
        } else {
            ResearchStatus::Unknown
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ResearchStatus::Pending => "pending",
            ResearchStatus::Running => "running",
            ResearchStatus::Completed => "completed",
            ResearchStatus::Failed => "failed",
            ResearchStatus::Unknown => "unknown",
            ResearchStatus::Other(s) => s,
        }
    }

    fn role(&self) -> Role {
        match self {
            ResearchStatus::Pending => Role::Warning,
            ResearchStatus::Running => Role::Primary,
            ResearchStatus::Completed => Role::Success,
            ResearchStatus::Failed => Role::Error,
            _ => Role::Dim,
        }
    }

    fn closing_note(&self, style: &StyleOptions) -> Option<String> {
        match self {
            ResearchStatus::Completed => {
                Some(status_line(Mark::Done, Role::Success, "Research completed!", style))
            }
            ResearchStatus::Failed => {
                Some(status_line(Mark::Failed, Role::Error, "Research failed!", style))
            }
            ResearchStatus::Running | ResearchStatus::Pending => Some(status_line(
                Mark::Info,
                Role::Secondary,
                "Research is still in progress. Check again later.",
                style,
            )),
            _ => None,
        }
    }
}

/// Research id mentioned in a `deep_researcher_start` response, if any.
pub fn extract_research_id(text: &str) -> Option<String> {
    RESEARCH_ID
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/* ---- Commands ---- */

pub async fn run_research_start(
    args: &StartArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let mut tool_args = Map::new();
    tool_args.insert("instructions".into(), json!(args.instructions));
    tool_args.insert(
        "model".into(),
        json!(choice_or_default("model", &args.model, MODELS, DEFAULT_MODEL)),
    );

    let raw = invoke(client, ctx.api_key(), START_TOOL, tool_args)
        .await
        .context("Failed to start research")?;

    match raw.first_text().and_then(extract_research_id) {
        Some(id) => {
            let style = ctx.style();
            Ok(format!(
                "{}\n\nRun the following command to check the status:\n  {}",
                status_line(Mark::Info, Role::Secondary, format!("Research started with ID: {id}"), style),
                color(Role::Accent, format!("exa research check {id}"), style),
            ))
        }
        None => Ok(ctx.render(&raw, ctx.format(&args.format))),
    }
}

pub async fn run_research_check(
    args: &CheckArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<String> {
    let mut tool_args = Map::new();
    tool_args.insert("researchId".into(), json!(args.id));

    let raw = invoke(client, ctx.api_key(), CHECK_TOOL, tool_args)
        .await
        .context("Failed to check research")?;
    Ok(check_report(&raw, ctx, &args.format))
}

fn check_report(raw: &RawResponse, ctx: &CommandContext, format: &FormatArg) -> String {
    let style = ctx.style();
    let status = raw
        .first_text()
        .filter(|t| !t.is_empty())
        .map(ResearchStatus::detect)
        .unwrap_or(ResearchStatus::Unknown);

    let mut out = format!(
        "Status: {}\n\n{}",
        color(status.role(), status.label().to_uppercase(), style),
        ctx.render(raw, ctx.format(format)),
    );
    if let Some(note) = status.closing_note(style) {
        out.push('\n');
        out.push_str(&note);
    }
    out
}

pub async fn execute_research(
    args: ResearchArgs,
    ctx: &CommandContext,
    client: &mut dyn ToolClient,
) -> Result<()> {
    let out = match &args.action {
        ResearchAction::Start(start) => run_research_start(start, ctx, client).await?,
        ResearchAction::Check(check) => run_research_check(check, ctx, client).await?,
    };
    println!("{out}");
    Ok(())
}
