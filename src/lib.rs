//! exa - command-line client for the Exa search tools served over MCP.
//!
//! Modules:
//!   output  : response normalization + text / markdown / json rendering
//!   mcp     : target parsing and the MCP transport client
//!   config  : `~/.exarc` persistence
//!   cmd     : subcommand handlers (one file per subcommand)
//!   utils   : logging setup

pub mod cmd;
pub mod config;
pub mod mcp;
pub mod output;
pub mod utils;

pub use output::{OutputFormat, RawResponse, format_crawl_result, format_output};
