//! Company profile distilled from `results[0].entities[0].properties`.

use serde_json::Value;

use super::{DESCRIPTION_LIMIT, OutputFormat};
use crate::cmd::format::{Role, StyleOptions, color};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headquarters {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Headquarters {
    fn label(&self) -> String {
        format!(
            "{}, {}",
            self.city.as_deref().unwrap_or_default(),
            self.country.as_deref().unwrap_or_default()
        )
    }
}

/// Every field except `name` may be absent; absent fields are not rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub employees: Option<f64>,
    pub headquarters: Option<Headquarters>,
    pub revenue: Option<f64>,
    pub funding: Option<f64>,
}

impl CompanyProfile {
    /// Build from one element of a `results` array.
    pub fn from_result(result: &Value) -> Self {
        let props = result
            .get("entities")
            .and_then(Value::as_array)
            .and_then(|e| e.first())
            .and_then(|e| e.get("properties"))
            .unwrap_or(&Value::Null);

        let name = non_empty_str(props.get("name"))
            .or_else(|| non_empty_str(result.get("title")))
            .unwrap_or_else(|| "Unknown Company".to_string());

        let headquarters = props
            .get("headquarters")
            .filter(|h| h.is_object())
            .map(|h| Headquarters {
                city: non_empty_str(h.get("city")),
                country: non_empty_str(h.get("country")),
            });

        let financials = props.get("financials");

        CompanyProfile {
            name,
            url: non_empty_str(result.get("url")),
            description: non_empty_str(props.get("description")),
            employees: non_zero(props.get("workforce").and_then(|w| w.get("total"))),
            headquarters,
            revenue: non_zero(financials.and_then(|f| f.get("revenueAnnual"))),
            funding: non_zero(financials.and_then(|f| f.get("fundingTotal"))),
        }
    }

    pub fn render(&self, format: OutputFormat, style: &StyleOptions) -> String {
        match format {
            OutputFormat::Markdown => self.render_markdown(),
            _ => self.render_text(style),
        }
    }

    fn render_markdown(&self) -> String {
        let mut md = format!("# {}\n\n", self.name);
        if let Some(url) = &self.url {
            md.push_str(&format!("**URL:** {url}\n\n"));
        }
        if let Some(desc) = &self.description {
            md.push_str(&format!("{desc}\n\n"));
        }
        if let Some(n) = self.employees {
            md.push_str(&format!("**Employees:** {}\n\n", group_thousands(n)));
        }
        if let Some(hq) = &self.headquarters {
            md.push_str(&format!("**HQ:** {}\n\n", hq.label()));
        }
        if let Some(r) = self.revenue {
            md.push_str(&format!("**Revenue:** {}\n\n", billions(r)));
        }
        if let Some(f) = self.funding {
            md.push_str(&format!("**Total Funding:** {}\n\n", billions(f)));
        }
        md
    }

    fn render_text(&self, style: &StyleOptions) -> String {
        let mut out = format!("{}\n", color(Role::Primary, &self.name, style));
        if let Some(url) = &self.url {
            out.push_str(&format!("{}\n", color(Role::Link, url, style)));
        }
        out.push('\n');
        if let Some(desc) = &self.description {
            let mut shown: String = desc.chars().take(DESCRIPTION_LIMIT).collect();
            if desc.chars().count() > DESCRIPTION_LIMIT {
                shown.push_str("...");
            }
            out.push_str(&format!("{}\n\n", color(Role::Dim, shown, style)));
        }
        let label = |l: &str| color(Role::Bold, l, style);
        if let Some(n) = self.employees {
            out.push_str(&format!("{} {}\n", label("Employees:"), group_thousands(n)));
        }
        if let Some(hq) = &self.headquarters {
            out.push_str(&format!("{} {}\n", label("HQ:"), hq.label()));
        }
        if let Some(r) = self.revenue {
            out.push_str(&format!("{} {}\n", label("Revenue:"), billions(r)));
        }
        if let Some(f) = self.funding {
            out.push_str(&format!("{} {}\n", label("Funding:"), billions(f)));
        }
        out
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_zero(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64).filter(|n| *n != 0.0)
}

/// `$X.YB`, halves rounded away from zero.
fn billions(amount: f64) -> String {
    let tenths = (amount / 1e8).round() / 10.0;
    format!("${tenths:.1}B")
}

/// en-US style grouping: `1234567` -> `1,234,567`, up to three fraction digits.
fn group_thousands(n: f64) -> String {
    let rounded = (n.abs() * 1000.0).round() / 1000.0;
    let whole = rounded.trunc();
    let digits = format!("{whole:.0}");

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 5);
    if n < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let frac = rounded - whole;
    if frac > 0.0 {
        let frac_str = format!("{frac:.3}");
        out.push_str(frac_str.trim_start_matches('0').trim_end_matches('0'));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn acme() -> Value {
        json!({
            "title": "Acme Corp",
            "url": "https://acme.com",
            "entities": [{
                "properties": {
                    "name": "Acme Corporation",
                    "description": "A test company",
                    "workforce": { "total": 1000 },
                    "headquarters": { "city": "San Francisco", "country": "USA" },
                    "financials": { "revenueAnnual": 5000000000u64, "fundingTotal": 100000000 }
                }
            }]
        })
    }

    #[test]
    fn extracts_fields() {
        let p = CompanyProfile::from_result(&acme());
        assert_eq!(p.name, "Acme Corporation");
        assert_eq!(p.url.as_deref(), Some("https://acme.com"));
        assert_eq!(p.employees, Some(1000.0));
        assert_eq!(
            p.headquarters,
            Some(Headquarters { city: Some("San Francisco".into()), country: Some("USA".into()) })
        );
        assert_eq!(p.revenue, Some(5e9));
    }

    #[test]
    fn markdown_rendering() {
        let md = CompanyProfile::from_result(&acme()).render(OutputFormat::Markdown, &StyleOptions::plain());
        assert_eq!(
            md,
            "# Acme Corporation\n\n**URL:** https://acme.com\n\nA test company\n\n**Employees:** 1,000\n\n**HQ:** San Francisco, USA\n\n**Revenue:** $5.0B\n\n**Total Funding:** $0.1B\n\n"
        );
    }

    #[test]
    fn text_rendering() {
        let text = CompanyProfile::from_result(&acme()).render(OutputFormat::Text, &StyleOptions::plain());
        assert_eq!(
            text,
            "Acme Corporation\nhttps://acme.com\n\nA test company\n\nEmployees: 1,000\nHQ: San Francisco, USA\nRevenue: $5.0B\nFunding: $0.1B\n"
        );
    }

    #[test]
    fn absent_fields_are_skipped() {
        let p = CompanyProfile::from_result(&json!({ "entities": [] }));
        assert_eq!(p.name, "Unknown Company");
        let md = p.render(OutputFormat::Markdown, &StyleOptions::plain());
        assert_eq!(md, "# Unknown Company\n\n");
        let text = p.render(OutputFormat::Text, &StyleOptions::plain());
        assert_eq!(text, "Unknown Company\n\n");
        assert!(!text.contains("N/A"));
    }

    #[test]
    fn name_falls_back_to_result_title() {
        let p = CompanyProfile::from_result(&json!({
            "title": "Globex",
            "entities": [{ "properties": { "workforce": { "total": 0 } } }]
        }));
        assert_eq!(p.name, "Globex");
        assert_eq!(p.employees, None);
    }

    #[test]
    fn partial_headquarters() {
        let p = CompanyProfile::from_result(&json!({
            "entities": [{ "properties": { "headquarters": { "country": "Japan" } } }]
        }));
        let text = p.render(OutputFormat::Text, &StyleOptions::plain());
        assert!(text.contains("HQ: , Japan\n"));
    }

    #[test]
    fn description_truncated_at_300_in_text_only() {
        let long = "d".repeat(350);
        let p = CompanyProfile {
            name: "Long".into(),
            description: Some(long.clone()),
            ..Default::default()
        };
        let text = p.render(OutputFormat::Text, &StyleOptions::plain());
        assert!(text.contains(&format!("{}...\n\n", "d".repeat(300))));
        assert!(!text.contains(&"d".repeat(301)));

        let md = p.render(OutputFormat::Markdown, &StyleOptions::plain());
        assert!(md.contains(&long));
    }

    #[test]
    fn grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
        assert_eq!(group_thousands(1234.5), "1,234.5");
        assert_eq!(group_thousands(-4200.0), "-4,200");
    }

    #[test]
    fn billions_one_decimal() {
        assert_eq!(billions(5_000_000_000.0), "$5.0B");
        assert_eq!(billions(1_250_000_000.0), "$1.3B");
        assert_eq!(billions(100_000_000.0), "$0.1B");
    }
}
