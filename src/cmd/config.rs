//! `exa config set|get|list|clear`: manage the persisted configuration.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cmd::format::{Mark, Role, StyleOptions, box_header, color, status_line, table};
use crate::config::{ConfigKey, ConfigStore};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Set a config value (apiKey, output, defaultNum)
    Set {
        #[arg(value_enum, value_name = "KEY")]
        key: ConfigKey,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Show one config value
    Get {
        #[arg(value_enum, value_name = "KEY")]
        key: ConfigKey,
    },
    /// Show every config value
    List,
    /// Reset the config file to defaults
    Clear,
}

pub fn run_config(args: &ConfigArgs, store: &ConfigStore, style: &StyleOptions) -> Result<String> {
    let out = match &args.action {
        ConfigAction::Set { key, value } => {
            store.update(|config| config.set(*key, value))?;
            status_line(
                Mark::Done,
                Role::Success,
                format!("Set {} = {}", key.as_str(), value),
                style,
            )
        }
        ConfigAction::Get { key } => match store.load().get(*key) {
            Some(value) => format!("{}: {}", color(Role::Bold, key.as_str(), style), value),
            None => status_line(
                Mark::Warn,
                Role::Warning,
                format!("Config key \"{}\" is not set", key.as_str()),
                style,
            ),
        },
        ConfigAction::List => {
            let rows: Vec<Vec<String>> = store
                .load()
                .entries()
                .into_iter()
                .map(|(k, v)| vec![k, v])
                .collect();
            format!(
                "{}\n{}",
                box_header(
                    "Current configuration",
                    Some(store.path().display().to_string()),
                    style
                ),
                table(&["KEY", "VALUE"], &rows, style)
            )
        }
        ConfigAction::Clear => {
            store.clear()?;
            status_line(Mark::Done, Role::Success, "Config cleared and reset to defaults", style)
        }
    };
    Ok(out)
}

pub fn execute_config(args: ConfigArgs) -> Result<()> {
    let store = ConfigStore::locate()?;
    println!("{}", run_config(&args, &store, &StyleOptions::detect())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join(".exarc"));
        (dir, store)
    }

    fn run(action: ConfigAction, store: &ConfigStore) -> Result<String> {
        run_config(&ConfigArgs { action }, store, &StyleOptions::plain())
    }

    #[test]
    fn set_then_get() {
        let (_dir, store) = store();
        let out = run(
            ConfigAction::Set {
                key: ConfigKey::DefaultNum,
                value: "25".into(),
            },
            &store,
        )
        .unwrap();
        assert_eq!(out, "Set defaultNum = 25");

        let out = run(ConfigAction::Get { key: ConfigKey::DefaultNum }, &store).unwrap();
        assert_eq!(out, "defaultNum: 25");

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(saved["defaultNum"], serde_json::json!(25));
    }

    #[test]
    fn setting_api_key_leaves_tool_defaults_alone() {
        use crate::cmd::shared::{CommandContext, FormatArg};
        use crate::output::OutputFormat;

        let (_dir, store) = store();
        run(
            ConfigAction::Set {
                key: ConfigKey::ApiKey,
                value: "sk-1".into(),
            },
            &store,
        )
        .unwrap();

        let stored = store.load_stored().unwrap();
        let ctx = CommandContext::new(None, stored, StyleOptions::plain());
        assert_eq!(ctx.api_key(), Some("sk-1"));
        assert_eq!(ctx.format(&FormatArg::default()), OutputFormat::Text);
        assert_eq!(ctx.num(None, 8), 8);
    }

    #[test]
    fn set_rejects_invalid_values() {
        let (_dir, store) = store();
        let err = run(
            ConfigAction::Set {
                key: ConfigKey::Output,
                value: "yaml".into(),
            },
            &store,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid output value: yaml"));

        let err = run(
            ConfigAction::Set {
                key: ConfigKey::DefaultNum,
                value: "0".into(),
            },
            &store,
        )
        .unwrap_err();
        assert!(err.to_string().contains("positive number"));
        assert!(!store.path().exists());
    }

    #[test]
    fn get_unset_key_warns() {
        let (_dir, store) = store();
        let out = run(ConfigAction::Get { key: ConfigKey::ApiKey }, &store).unwrap();
        assert_eq!(out, "Config key \"apiKey\" is not set");

        let out = run(ConfigAction::Get { key: ConfigKey::Output }, &store).unwrap();
        assert_eq!(out, "output: json");
    }

    #[test]
    fn list_shows_unknown_keys() {
        let (_dir, store) = store();
        fs::write(store.path(), r#"{"output":"markdown","theme":"dark"}"#).unwrap();
        let out = run(ConfigAction::List, &store).unwrap();
        assert!(out.contains("Current configuration"));
        assert!(out.contains("output      markdown"));
        assert!(out.contains("defaultNum  10"));
        assert!(out.contains("theme       dark"));
    }

    #[test]
    fn clear_writes_defaults() {
        let (_dir, store) = store();
        fs::write(store.path(), r#"{"apiKey":"secret","defaultNum":3}"#).unwrap();
        let out = run(ConfigAction::Clear, &store).unwrap();
        assert_eq!(out, "Config cleared and reset to defaults");
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(saved, serde_json::json!({ "output": "json", "defaultNum": 10 }));
    }
}
