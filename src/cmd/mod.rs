/*!
Command dispatcher module: declarations and re-exports only.

Layout:
  src/cmd/
    mod.rs          (this file)
    shared.rs       (CommandContext, lenient flag parsing, invoke, block_on)
    format.rs       (terminal styling helpers)
    search.rs       (SearchArgs         + execute_search)
    advanced.rs     (AdvancedSearchArgs + execute_advanced_search)
    code.rs         (CodeArgs           + execute_code)
    crawl.rs        (CrawlArgs          + execute_crawl)
    company.rs      (CompanyArgs        + execute_company)
    people.rs       (PeopleArgs         + execute_people)
    research.rs     (ResearchArgs       + execute_research)
    config.rs       (ConfigArgs         + execute_config)
    completion.rs   (CompletionArgs     + execute_completion)

Conventions:
  - Each subcommand module exposes one public `execute_*` entry point that
    prints and returns `anyhow::Result<()>`.
  - Tool commands also expose `run_*`, which returns the rendered string and
    takes the client as `&mut dyn ToolClient` so tests can swap it out.
  - Argument structs derive `clap::Args`.
*/

pub mod advanced;
pub mod code;
pub mod company;
pub mod completion;
pub mod config;
pub mod crawl;
pub mod format;
pub mod people;
pub mod research;
pub mod search;
pub mod shared;

pub use advanced::{AdvancedSearchArgs, execute_advanced_search};
pub use code::{CodeArgs, execute_code};
pub use company::{CompanyArgs, execute_company};
pub use completion::{CompletionArgs, execute_completion};
pub use config::{ConfigArgs, execute_config};
pub use crawl::{CrawlArgs, execute_crawl};
pub use people::{PeopleArgs, execute_people};
pub use research::{ResearchArgs, execute_research};
pub use search::{SearchArgs, execute_search};
pub use shared::CommandContext;
