//! MCP transport for the Exa tools.
//!
//! parse_target -> TargetSpec { Local | Remote }
//! ExaClient    -> owned session: new -> connect -> call_tool* -> close
//!
//! Remote targets connect over Streamable HTTP and fall back to SSE; local
//! targets spawn an MCP server process and talk to it over stdio. Retries,
//! auth negotiation and framing are left to `rmcp`.
//!
use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use rmcp::service::{RoleClient, RunningService};
use serde_json::{Map, Value};
use shell_words::split as shell_split;
use tokio::process::Command;
use url::Url;

use crate::output::RawResponse;

/// Hosted Exa MCP endpoint.
pub const DEFAULT_SERVER_URL: &str = "https://mcp.exa.ai/mcp";

/// Environment fallback for `--target`.
pub const TARGET_ENV: &str = "EXA_MCP_TARGET";

/// Tools requested from the hosted server (`tools=` query parameter).
pub const ALL_TOOLS: &[&str] = &[
    "web_search_exa",
    "web_search_advanced_exa",
    "get_code_context_exa",
    "crawling_exa",
    "company_research_exa",
    "people_search_exa",
    "deep_researcher_start",
    "deep_researcher_check",
];

/// Where the Exa MCP server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// MCP server spawned as a child process, spoken to over stdio.
    Local { program: String, args: Vec<String> },
    /// http(s) endpoint.
    Remote(Url),
}

impl TargetSpec {
    pub fn hosted() -> Self {
        TargetSpec::Remote(Url::parse(DEFAULT_SERVER_URL).expect("hosted endpoint is a valid url"))
    }
}

/// Query strings may carry the API key, so only scheme, host and path are shown.
impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Local { program, args } => {
                f.write_str(program)?;
                args.iter().try_for_each(|a| write!(f, " {a}"))
            }
            TargetSpec::Remote(url) => write!(
                f,
                "{}://{}{}",
                url.scheme(),
                url.host_str().unwrap_or_default(),
                url.path()
            ),
        }
    }
}

/// `https://host/mcp` is a remote endpoint, `ws(s)://` is refused, and
/// anything else (`npx -y exa-mcp-server`) is split like a shell command line.
pub fn parse_target(raw: &str) -> Result<TargetSpec> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("target is empty");
    }

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            return Ok(TargetSpec::Remote(url));
        }
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => {
            bail!("websocket targets are not supported; use an http(s) MCP endpoint")
        }
        _ => {}
    }

    let mut words = shell_split(raw)
        .with_context(|| format!("could not split server command: {raw}"))?
        .into_iter();
    match words.next() {
        Some(program) if !program.is_empty() => Ok(TargetSpec::Local {
            program,
            args: words.collect(),
        }),
        _ => bail!("server command has no program name"),
    }
}

/// Remote endpoint with the `tools` and `exaApiKey` query parameters the
/// hosted server expects. Parameters already present on `base` are kept.
pub fn endpoint_url(base: &Url, api_key: Option<&str>) -> Url {
    let mut url = base.clone();
    let has = |key: &str| base.query_pairs().any(|(k, _)| k == key);
    let add_tools = !has("tools");
    let add_key = api_key.filter(|k| !k.is_empty() && !has("exaApiKey"));
    if add_tools || add_key.is_some() {
        let mut query = url.query_pairs_mut();
        if add_tools {
            query.append_pair("tools", &ALL_TOOLS.join(","));
        }
        if let Some(key) = add_key {
            query.append_pair("exaApiKey", key);
        }
    }
    url
}

/* ---- Client ---- */

/// The seam command handlers talk through. `ExaClient` is the real one;
/// tests substitute canned responses.
#[async_trait]
pub trait ToolClient: Send {
    async fn connect(&mut self, api_key: Option<&str>) -> Result<()>;
    async fn call_tool(&mut self, name: &str, args: Map<String, Value>) -> Result<RawResponse>;
    /// Idempotent; shutdown errors are swallowed.
    async fn close(&mut self);
}

type Session = RunningService<RoleClient, ()>;

/// Owned MCP session for one CLI invocation.
pub struct ExaClient {
    target: TargetSpec,
    session: Option<Session>,
}

impl ExaClient {
    pub fn new(target: TargetSpec) -> Self {
        ExaClient {
            target,
            session: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait]
impl ToolClient for ExaClient {
    async fn connect(&mut self, api_key: Option<&str>) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let session = match &self.target {
            TargetSpec::Local { program, args } => spawn_local(program, args, api_key).await?,
            TargetSpec::Remote(url) => connect_remote(&endpoint_url(url, api_key)).await?,
        };
        tracing::info!(mcp_target = %self.target, "connected");
        self.session = Some(session);
        Ok(())
    }

    async fn call_tool(&mut self, name: &str, args: Map<String, Value>) -> Result<RawResponse> {
        use rmcp::model::CallToolRequestParam;

        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("Not connected. Call connect() first."))?;

        tracing::debug!(tool = name, arguments = %serde_json::Value::Object(args.clone()), "calling tool");
        let result = session
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: if args.is_empty() { None } else { Some(args) },
            })
            .await
            .with_context(|| format!("tool invocation failed: {name}"))?;
        Ok(RawResponse::from(result))
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take()
            && let Err(e) = session.cancel().await
        {
            tracing::debug!("ignoring MCP shutdown error: {e}");
        }
    }
}

async fn spawn_local(program: &str, args: &[String], api_key: Option<&str>) -> Result<Session> {
    use rmcp::ServiceExt;
    use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};

    let transport = TokioChildProcess::new(Command::new(program).configure(|c| {
        for a in args {
            c.arg(a);
        }
        if let Some(key) = api_key {
            c.env("EXA_API_KEY", key);
        }
        // stdout carries the protocol; server banners on stderr are noise here
        c.stderr(std::process::Stdio::null());
    }))
    .with_context(|| format!("Failed to spawn MCP process: {program}"))?;

    ().serve(transport)
        .await
        .with_context(|| format!("Failed to initialize local MCP service: {program}"))
}

async fn connect_remote(url: &Url) -> Result<Session> {
    use rmcp::ServiceExt;
    use rmcp::transport::{SseClientTransport, StreamableHttpClientTransport};

    let http = StreamableHttpClientTransport::from_uri(url.as_str());
    match ().serve(http).await {
        Ok(session) => return Ok(session),
        Err(e) => tracing::warn!("StreamableHTTP failed, trying SSE: {e}"),
    }

    let sse = async {
        let transport = SseClientTransport::start(url.as_str()).await?;
        anyhow::Ok(().serve(transport).await?)
    }
    .await;

    match sse {
        Ok(session) => Ok(session),
        Err(e) => {
            tracing::warn!("SSE transport failed: {e}");
            bail!("Failed to connect with both transport types")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_remote_http() {
        let spec = parse_target(" https://mcp.exa.ai/mcp ").unwrap();
        assert_eq!(spec, TargetSpec::hosted());
    }

    #[test]
    fn websocket_rejected() {
        let err = parse_target("wss://mcp.example/ws").unwrap_err();
        assert!(err.to_string().contains("websocket"));
    }

    #[test]
    fn parse_local_simple() {
        let spec = parse_target("exa-mcp-server --stdio").unwrap();
        assert_eq!(
            spec,
            TargetSpec::Local {
                program: "exa-mcp-server".into(),
                args: vec!["--stdio".into()],
            }
        );
        assert_eq!(spec.to_string(), "exa-mcp-server --stdio");
    }

    #[test]
    fn parse_local_quoted() {
        let spec = parse_target(r#"node "/opt/my servers/exa.js""#).unwrap();
        let TargetSpec::Local { args, .. } = spec else {
            panic!("quoted command parsed as {spec:?}");
        };
        assert_eq!(args, vec!["/opt/my servers/exa.js"]);
    }

    #[test]
    fn unknown_scheme_falls_back_to_command() {
        assert!(matches!(
            parse_target("ftp://example.com/resource").unwrap(),
            TargetSpec::Local { .. }
        ));
    }

    #[test]
    fn empty_target_rejected() {
        let err = parse_target("   ").unwrap_err();
        assert!(err.to_string().contains("empty"));
        assert!(parse_target("''").is_err());
    }

    #[test]
    fn unbalanced_quotes_rejected() {
        assert!(parse_target(r#"server "unterminated"#).is_err());
    }

    #[test]
    fn endpoint_adds_tools_and_key() {
        let base = Url::parse(DEFAULT_SERVER_URL).unwrap();
        let url = endpoint_url(&base, Some("secret"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0].0, "tools");
        assert_eq!(pairs[0].1.split(',').count(), ALL_TOOLS.len());
        assert_eq!(pairs[1], ("exaApiKey".to_string(), "secret".to_string()));
    }

    #[test]
    fn endpoint_without_key_and_existing_params() {
        let base = Url::parse("https://proxy.example/mcp?tools=web_search_exa").unwrap();
        let url = endpoint_url(&base, None);
        assert_eq!(url.as_str(), "https://proxy.example/mcp?tools=web_search_exa");

        let keyless = endpoint_url(&Url::parse(DEFAULT_SERVER_URL).unwrap(), Some(""));
        assert!(!keyless.as_str().contains("exaApiKey"));
    }

    #[test]
    fn display_hides_query() {
        let spec =
            TargetSpec::Remote(Url::parse("https://mcp.exa.ai/mcp?exaApiKey=secret").unwrap());
        assert_eq!(spec.to_string(), "https://mcp.exa.ai/mcp");
    }

    #[tokio::test]
    async fn call_before_connect_fails() {
        let mut client = ExaClient::new(TargetSpec::hosted());
        assert!(!client.is_connected());
        let err = client.call_tool("web_search_exa", Map::new()).await.unwrap_err();
        assert!(err.to_string().contains("Not connected"));
    }

    #[tokio::test]
    async fn close_without_session_is_noop() {
        let mut client = ExaClient::new(TargetSpec::hosted());
        client.close().await;
        client.close().await;
        assert!(!client.is_connected());
    }
}
