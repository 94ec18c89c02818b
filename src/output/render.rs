//! Per-format renderers for result lists and crawl documents.

use serde::Serialize;

use super::{CRAWL_LIMIT, NO_RESULTS, OutputFormat, ResultRecord, SNIPPET_LIMIT};
use crate::cmd::format::{Role, StyleOptions, color};

/// Collapse whitespace runs, trim, and cap at `max_chars` characters.
///
/// When the cleaned text is longer than the cap, the first `max_chars`
/// characters are kept, trailing whitespace is trimmed, and `...` appended.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let head: String = cleaned.chars().take(max_chars).collect();
    format!("{}...", head.trim_end())
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    title: &'a str,
    url: &'a str,
    #[serde(rename = "publishedDate", skip_serializing_if = "Option::is_none")]
    published_date: Option<&'a str>,
    text: &'a str,
}

pub(super) fn render_results(
    records: &[ResultRecord],
    format: OutputFormat,
    style: &StyleOptions,
) -> String {
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| render_record(idx + 1, record, format, style))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_record(
    index: usize,
    record: &ResultRecord,
    format: OutputFormat,
    style: &StyleOptions,
) -> String {
    let snippet = truncate_text(&record.text, SNIPPET_LIMIT);
    let date = record
        .published_date
        .as_deref()
        .map(|d| format!(" ({})", d.split('T').next().unwrap_or(d)))
        .unwrap_or_default();

    match format {
        OutputFormat::Markdown => {
            let heading = if record.url.is_empty() {
                record.title.clone()
            } else {
                format!("[{}]({})", record.title, record.url)
            };
            format!("{index}. {heading}{date}\n   {snippet}")
        }
        OutputFormat::Json => {
            let doc = JsonRecord {
                title: &record.title,
                url: &record.url,
                published_date: record.published_date.as_deref(),
                text: &snippet,
            };
            serde_json::to_string_pretty(&doc).unwrap_or_default()
        }
        OutputFormat::Text => {
            let title = if record.title.is_empty() {
                "Untitled"
            } else {
                record.title.as_str()
            };
            format!(
                "{} {}{}\n   {}\n   {}",
                color(Role::Primary, format!("{index}."), style),
                color(Role::Bold, title, style),
                color(Role::Dim, date, style),
                color(Role::Link, &record.url, style),
                color(Role::Dim, snippet, style),
            )
        }
    }
}

pub(super) fn render_crawl(record: &ResultRecord, format: OutputFormat, style: &StyleOptions) -> String {
    let content = truncate_text(&record.text, CRAWL_LIMIT);
    match format {
        OutputFormat::Markdown => format!("## {}\n\n{}\n\n{}", record.title, record.url, content),
        _ => format!(
            "{}\n{}\n\n{}",
            color(Role::Bold, &record.title, style),
            color(Role::Link, &record.url, style),
            content
        ),
    }
}
