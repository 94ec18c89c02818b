//! Parser for the delimited-block text format Exa tools emit:
//!
//! ```text
//! Title: Some page
//! URL: https://example.com/page
//! Published Date: 2024-01-15T10:00:00.000Z
//! Author: Jane Doe
//! Text: body ...
//! ```
//!
//! Records repeat; each one starts at a line beginning with `Title:`.

use std::sync::LazyLock;

use regex::Regex;

use super::ResultRecord;

static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Title:").expect("block start pattern"));
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Title:\s*(.+)$").expect("title pattern"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^URL:\s*(.+)$").expect("url pattern"));
static PUBLISHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Published Date:\s*(.+)$").expect("date pattern"));
static AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Author:\s*(.+)$").expect("author pattern"));
// Blocks never contain a second `Title:` line, so the body runs to the end of the block.
static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^Text:\s*(.+)").expect("text pattern"));

/// Parse `text` into records, in order of appearance.
///
/// Blocks without a `Title:` or `URL:` line are skipped. An empty result means
/// the text is not in this format at all.
pub fn parse_blocks(text: &str) -> Vec<ResultRecord> {
    split_blocks(text)
        .into_iter()
        .filter_map(parse_block)
        .collect()
}

fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    for m in BLOCK_START.find_iter(text) {
        if m.start() > start {
            blocks.push(&text[start..m.start()]);
            start = m.start();
        }
    }
    blocks.push(&text[start..]);
    blocks.retain(|b| !b.trim().is_empty());
    blocks
}

fn parse_block(block: &str) -> Option<ResultRecord> {
    let title = capture(&TITLE, block);
    let url = capture(&URL, block);
    if title.is_none() && url.is_none() {
        return None;
    }

    let text = capture(&BODY, block)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| block.trim().to_string());

    Some(ResultRecord {
        title: title.unwrap_or_default(),
        url: url.unwrap_or_default(),
        text,
        published_date: capture(&PUBLISHED, block).filter(|s| !s.is_empty()),
        author: capture(&AUTHOR, block).filter(|s| !s.is_empty()),
    })
}

fn capture(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
