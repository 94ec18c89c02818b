/*!
Response normalization + rendering for Exa tool results.

Pipeline (strict priority order):
  1. extract a text payload from the raw response (`RawResponse::extract_text`)
  2. delimited `Title:` blocks        -> `Normalized::Results`
  3. JSON `results[0].entities`       -> `Normalized::Company`
     JSON `results`                   -> `Normalized::Results`
  4. anything else                    -> `Normalized::Raw` (printed verbatim)

Entry points:
  - format_output(raw, format)        : search-style responses
  - format_crawl_result(raw, format)  : single-document (crawl) responses

Both are total: every input produces a printable string. The `_with`
variants take `StyleOptions` so the text format can be colorized; the plain
variants never emit ANSI codes.
*/

mod blocks;
mod company;
mod render;

use std::fmt;

use serde_json::Value;

use crate::cmd::format::StyleOptions;

pub use blocks::parse_blocks;
pub use company::{CompanyProfile, Headquarters};
pub use render::truncate_text;

/// Snippet length for result lists.
pub const SNIPPET_LIMIT: usize = 200;
/// Description length for the text rendering of a company profile.
pub const DESCRIPTION_LIMIT: usize = 300;
/// Content length for crawl (single document) output.
pub const CRAWL_LIMIT: usize = 1000;

pub const NO_RESULTS: &str = "No results found.";

/* ---- Output Format ---- */

/// Rendering strategy selected by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl OutputFormat {
    pub const fn variants() -> &'static [OutputFormat] {
        &[OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    /// Case-insensitive parse; `None` for anything unrecognized.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase();
        OutputFormat::variants()
            .iter()
            .copied()
            .find(|f| f.as_str() == norm)
    }

    /// Parse at the command boundary: unknown values degrade to `Text`.
    pub fn from_str_lossy(s: &str) -> Self {
        Self::from_str_ci(s).unwrap_or_else(|| {
            tracing::warn!(value = s, "unknown output format, using text");
            OutputFormat::Text
        })
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* ---- Raw Response ---- */

/// Unprocessed value returned by a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Text(String),
    Json(Value),
}

impl From<String> for RawResponse {
    fn from(s: String) -> Self {
        RawResponse::Text(s)
    }
}

impl From<&str> for RawResponse {
    fn from(s: &str) -> Self {
        RawResponse::Text(s.to_string())
    }
}

impl From<Value> for RawResponse {
    fn from(v: Value) -> Self {
        RawResponse::Json(v)
    }
}

impl From<rmcp::model::CallToolResult> for RawResponse {
    fn from(result: rmcp::model::CallToolResult) -> Self {
        let value = serde_json::to_value(&result)
            .unwrap_or_else(|_| serde_json::json!({ "note": "unable to serialize result" }));
        RawResponse::Json(value)
    }
}

impl RawResponse {
    /// Single text payload for the response.
    ///
    /// - envelope with `content` parts: text of the first part of type `text`
    /// - plain string: unchanged
    /// - anything else: pretty-printed JSON
    pub fn extract_text(&self) -> String {
        match self {
            RawResponse::Text(s) => s.clone(),
            RawResponse::Json(Value::String(s)) => s.clone(),
            RawResponse::Json(value) => {
                if let Some(text) = content_parts(value)
                    .and_then(|parts| {
                        parts
                            .iter()
                            .find(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                    })
                    .and_then(|p| p.get("text"))
                    .and_then(Value::as_str)
                    .filter(|t| !t.is_empty())
                {
                    return text.to_string();
                }
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    /// Text of the first content part, when that part is a text part.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            RawResponse::Text(_) => None,
            RawResponse::Json(value) => {
                let first = content_parts(value)?.first()?;
                if first.get("type").and_then(Value::as_str) != Some("text") {
                    return None;
                }
                first.get("text").and_then(Value::as_str)
            }
        }
    }

    /// Whether the tool flagged its result as an error (`isError: true`).
    pub fn is_error(&self) -> bool {
        match self {
            RawResponse::Text(_) => false,
            RawResponse::Json(value) => value
                .get("isError")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

fn content_parts(value: &Value) -> Option<&Vec<Value>> {
    value.get("content")?.as_array()
}

/* ---- Normalized Shapes ---- */

/// A normalized search / crawl result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRecord {
    pub title: String,
    pub url: String,
    pub text: String,
    pub published_date: Option<String>,
    pub author: Option<String>,
}

/// The recognized shape of a response, decided before any rendering happens.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Results(Vec<ResultRecord>),
    /// Company profile plus the full payload it came from (json format re-emits the payload).
    Company {
        profile: CompanyProfile,
        payload: Value,
    },
    Raw(String),
}

impl Normalized {
    /// Classify an extracted text payload. Block markers always win over JSON.
    pub fn from_text(text: String) -> Self {
        let records = parse_blocks(&text);
        if !records.is_empty() {
            return Normalized::Results(records);
        }
        classify_json(&text).unwrap_or(Normalized::Raw(text))
    }

    pub fn render(&self, format: OutputFormat, style: &StyleOptions) -> String {
        match self {
            Normalized::Results(records) => render::render_results(records, format, style),
            Normalized::Company { profile, payload } => {
                if format == OutputFormat::Json {
                    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
                } else {
                    profile.render(format, style)
                }
            }
            Normalized::Raw(text) => text.clone(),
        }
    }
}

/// JSON fallback: `None` when the text is not JSON or has no `results` array.
fn classify_json(text: &str) -> Option<Normalized> {
    let payload: Value = serde_json::from_str(text).ok()?;
    let results = payload.get("results")?.as_array()?;

    let is_company = results
        .first()
        .and_then(|r| r.get("entities"))
        .is_some_and(Value::is_array);
    if is_company {
        let profile = CompanyProfile::from_result(&results[0]);
        return Some(Normalized::Company { profile, payload });
    }

    let records = results.iter().map(record_from_json).collect();
    Some(Normalized::Results(records))
}

fn record_from_json(result: &Value) -> ResultRecord {
    let field = |key: &str| {
        result
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    ResultRecord {
        title: field("title"),
        url: field("url"),
        text: field("text"),
        published_date: None,
        author: None,
    }
}

/* ---- Entry Points ---- */

pub fn format_output(raw: &RawResponse, format: OutputFormat) -> String {
    format_output_with(raw, format, &StyleOptions::plain())
}

pub fn format_output_with(raw: &RawResponse, format: OutputFormat, style: &StyleOptions) -> String {
    Normalized::from_text(raw.extract_text()).render(format, style)
}

pub fn format_crawl_result(raw: &RawResponse, format: OutputFormat) -> String {
    format_crawl_result_with(raw, format, &StyleOptions::plain())
}

/// Single-document variant: json passes the extracted text through, other
/// formats show only the first block (content capped at `CRAWL_LIMIT`).
pub fn format_crawl_result_with(
    raw: &RawResponse,
    format: OutputFormat,
    style: &StyleOptions,
) -> String {
    let text = raw.extract_text();
    if format == OutputFormat::Json {
        return text;
    }
    match parse_blocks(&text).first() {
        Some(record) => render::render_crawl(record, format, style),
        None => truncate_text(&text, CRAWL_LIMIT),
    }
}
