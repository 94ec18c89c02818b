/*!
format.rs

Terminal styling for the human-readable output paths of `exa`.

  - StyleOptions::detect() / plain()
  - color(role, text, &StyleOptions) -> String
  - status_line(mark, role, msg, &StyleOptions) -> String
  - box_header(title, subtitle_opt, &StyleOptions) -> String
  - table(headers, rows, &StyleOptions) -> String

Helpers here only build strings; printing is left to the command modules.
JSON and markdown output never go through `color`.
*/

use std::borrow::Cow;
use std::io::IsTerminal;

const DEFAULT_WIDTH: usize = 100;

/* ---- Style Options ---- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self::detect()
    }
}

impl StyleOptions {
    /// Colors and marks only on a terminal; `NO_COLOR` / `NO_EMOJI` turn them off.
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal();
        let term_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .map_or(DEFAULT_WIDTH, |w| w.clamp(40, 220));

        StyleOptions {
            use_color: tty && std::env::var_os("NO_COLOR").is_none(),
            use_emoji: tty && std::env::var_os("NO_EMOJI").is_none(),
            term_width,
        }
    }

    pub fn plain() -> Self {
        StyleOptions {
            use_color: false,
            use_emoji: false,
            term_width: DEFAULT_WIDTH,
        }
    }
}

/* ---- Color ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Warning,
    Error,
    Dim,
    Link,
    Bold,
}

impl Role {
    fn sgr(self) -> &'static str {
        match self {
            Role::Primary => "1;36",
            Role::Secondary => "37",
            Role::Accent => "35",
            Role::Success => "32",
            Role::Warning => "33",
            Role::Error => "31",
            Role::Dim => "2",
            Role::Link => "4;34",
            Role::Bold => "1",
        }
    }
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    let text = text.as_ref();
    if !style.use_color || text.is_empty() {
        return text.to_string();
    }
    format!("\x1b[{}m{text}\x1b[0m", role.sgr())
}

/* ---- Status Lines ---- */

/// Leading symbol of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Done,
    Failed,
    Warn,
    Info,
}

impl Mark {
    fn symbol(self) -> &'static str {
        match self {
            Mark::Done => "✔",
            Mark::Failed => "✖",
            Mark::Warn => "⚠",
            Mark::Info => "ℹ",
        }
    }
}

pub fn status_line(mark: Mark, role: Role, msg: impl AsRef<str>, style: &StyleOptions) -> String {
    let body = color(role, msg, style);
    if style.use_emoji {
        format!("{} {body}", mark.symbol())
    } else {
        body
    }
}

/* ---- Box Header ---- */

/// Single-line framed header; text past the terminal width is cut with `…`.
pub fn box_header(
    title: impl AsRef<str>,
    subtitle: Option<impl AsRef<str>>,
    style: &StyleOptions,
) -> String {
    let plain = match &subtitle {
        Some(sub) => format!("{}  {}", title.as_ref(), sub.as_ref()),
        None => title.as_ref().to_string(),
    };
    let room = style.term_width.saturating_sub(4).max(10);
    let width = display_width(&plain).min(room);

    let inner = if display_width(&plain) > room {
        fit(&plain, room).into_owned()
    } else {
        let head = color(Role::Primary, title.as_ref(), style);
        match subtitle {
            Some(sub) => format!("{head}  {}", color(Role::Secondary, sub, style)),
            None => head,
        }
    };

    let rule = "─".repeat(width + 2);
    format!("┌{rule}┐\n│ {inner} │\n└{rule}┘")
}

/* ---- Table ---- */

/// Left-aligned columns separated by two spaces under a dashed rule. When
/// the table is wider than the terminal the last column gives way.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    let Some(last) = headers.len().checked_sub(1) else {
        return String::new();
    };
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(display_width(cell));
        }
    }
    let fixed: usize = widths[..last].iter().map(|w| w + 2).sum();
    widths[last] = widths[last].min(style.term_width.saturating_sub(fixed).max(4));

    let mut out = vec![
        color(Role::Accent, table_row(headers, &widths), style),
        color(
            Role::Dim,
            widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "),
            style,
        ),
    ];
    for row in rows {
        let cells: Vec<&str> = (0..headers.len())
            .map(|i| row.get(i).map_or("", String::as_str))
            .collect();
        out.push(table_row(&cells, &widths));
    }
    out.join("\n")
}

fn table_row(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", fit(cell, w)))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/* ---- Width Helpers ---- */

/// `s` cut to `width` characters, ending in `…` when shortened.
fn fit(s: &str, width: usize) -> Cow<'_, str> {
    let plain = strip_ansi(s);
    if plain.chars().count() <= width {
        return plain;
    }
    let mut cut: String = plain.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    Cow::Owned(cut)
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut buf = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // CSI: skip through the final letter
            chars.by_ref().find(|n| n.is_ascii_alphabetic());
            continue;
        }
        buf.push(c);
    }
    Cow::Owned(buf)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}
