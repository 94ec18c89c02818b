/*!
completion.rs - `exa completion <bash|zsh|fish>`

Scripts are generated from the clap command tree, so new subcommands and
flags show up without touching this file:

  describe(&Command) -> Node     (subcommands, long flags, positional choices)
  bash(&Node) / zsh(&Node) / fish(&Node) -> String

Only two levels below the binary are walked (`exa research start`).
`--format` is a free-form string on every tool command; its completions come
from `OutputFormat::variants()`.
*/

use anyhow::Result;
use clap::{Args, Command, ValueEnum};

use crate::output::OutputFormat;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum, value_name = "SHELL")]
    pub shell: Shell,
}

/* ---- Command Tree ---- */

#[derive(Debug, Clone, Default)]
struct Flag {
    long: String,
    short: Option<char>,
    help: String,
    takes_value: bool,
    choices: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct Node {
    name: String,
    about: String,
    flags: Vec<Flag>,
    /// Possible values of positional arguments.
    values: Vec<String>,
    children: Vec<Node>,
}

impl Node {
    fn flag_words(&self) -> Vec<String> {
        self.flags.iter().map(|f| format!("--{}", f.long)).collect()
    }

    /// Words offered after the command name: flags plus positional choices.
    fn words(&self) -> String {
        let mut words = self.values.clone();
        words.extend(self.flag_words());
        words.join(" ")
    }
}

fn describe(cmd: &Command) -> Node {
    let mut flags = Vec::new();
    let mut values = Vec::new();

    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let takes_value = arg.get_action().takes_values();
        let choices: Vec<String> = if takes_value {
            arg.get_possible_values()
                .iter()
                .filter(|v| !v.is_hide_set())
                .map(|v| v.get_name().to_string())
                .collect()
        } else {
            Vec::new()
        };
        if arg.is_positional() {
            values.extend(choices);
            continue;
        }
        let Some(long) = arg.get_long() else {
            continue;
        };
        let choices = if choices.is_empty() && long == "format" {
            OutputFormat::variants()
                .iter()
                .map(|f| f.as_str().to_string())
                .collect()
        } else {
            choices
        };
        flags.push(Flag {
            long: long.to_string(),
            short: arg.get_short(),
            help: arg.get_help().map(|h| h.to_string()).unwrap_or_default(),
            takes_value,
            choices,
        });
    }

    Node {
        name: cmd.get_name().to_string(),
        about: cmd.get_about().map(|a| a.to_string()).unwrap_or_default(),
        flags,
        values,
        children: cmd
            .get_subcommands()
            .filter(|c| !c.is_hide_set())
            .map(describe)
            .collect(),
    }
}

/* ---- Bash ---- */

fn bash(root: &Node) -> String {
    let bin = &root.name;
    let mut s = format!("# {bin} bash completion\n_{bin}_completion() {{\n");
    s.push_str("  local cur prev\n  COMPREPLY=()\n");
    s.push_str("  cur=\"${COMP_WORDS[COMP_CWORD]}\"\n  prev=\"${COMP_WORDS[COMP_CWORD-1]}\"\n\n");

    let subcommands: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    s.push_str("  if [[ $COMP_CWORD -eq 1 ]]; then\n");
    s.push_str(&format!(
        "    COMPREPLY=($(compgen -W \"{} {}\" -- \"$cur\"))\n    return 0\n  fi\n\n",
        subcommands.join(" "),
        root.flag_words().join(" ")
    ));

    // flag values, keyed on the previous word
    let mut value_cases: Vec<(String, String)> = Vec::new();
    let all_flags = root
        .children
        .iter()
        .flat_map(|c| c.flags.iter().chain(c.children.iter().flat_map(|g| g.flags.iter())));
    for flag in all_flags.filter(|f| !f.choices.is_empty()) {
        let pattern = format!("--{}", flag.long);
        if !value_cases.iter().any(|(p, _)| *p == pattern) {
            value_cases.push((pattern, flag.choices.join(" ")));
        }
    }
    if !value_cases.is_empty() {
        s.push_str("  case \"$prev\" in\n");
        for (pattern, words) in &value_cases {
            s.push_str(&format!(
                "    {pattern})\n      COMPREPLY=($(compgen -W \"{words}\" -- \"$cur\"))\n      return 0\n      ;;\n"
            ));
        }
        s.push_str("  esac\n\n");
    }

    s.push_str("  case \"${COMP_WORDS[1]}\" in\n");
    for cmd in &root.children {
        s.push_str(&format!("    {})\n", cmd.name));
        if cmd.children.is_empty() {
            s.push_str(&format!(
                "      COMPREPLY=($(compgen -W \"{}\" -- \"$cur\"))\n",
                cmd.words()
            ));
        } else {
            let names: Vec<&str> = cmd.children.iter().map(|c| c.name.as_str()).collect();
            s.push_str("      if [[ $COMP_CWORD -eq 2 ]]; then\n");
            s.push_str(&format!(
                "        COMPREPLY=($(compgen -W \"{}\" -- \"$cur\"))\n      else\n",
                names.join(" ")
            ));
            s.push_str("        case \"${COMP_WORDS[2]}\" in\n");
            for sub in &cmd.children {
                s.push_str(&format!(
                    "          {})\n            COMPREPLY=($(compgen -W \"{}\" -- \"$cur\"))\n            ;;\n",
                    sub.name,
                    sub.words()
                ));
            }
            s.push_str("        esac\n      fi\n");
        }
        s.push_str("      ;;\n");
    }
    s.push_str("  esac\n}\n\n");
    s.push_str(&format!("complete -F _{bin}_completion {bin}\n"));
    s
}

/* ---- Zsh ---- */

fn zsh_escape(text: &str) -> String {
    text.replace('\'', "'\\''")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

fn zsh_flag_spec(flag: &Flag) -> String {
    let mut spec = format!("'--{}[{}]", flag.long, zsh_escape(&flag.help));
    if !flag.choices.is_empty() {
        spec.push_str(&format!(":{}:({})", flag.long, flag.choices.join(" ")));
    } else if flag.takes_value {
        spec.push_str(&format!(":{}:", flag.long));
    }
    spec.push('\'');
    spec
}

fn zsh_arguments(node: &Node, indent: &str) -> String {
    let mut specs: Vec<String> = node.flags.iter().map(zsh_flag_spec).collect();
    if !node.values.is_empty() {
        specs.push(format!("'1:value:({})'", node.values.join(" ")));
    }
    if specs.is_empty() {
        return format!("{indent}_message 'no more arguments'\n");
    }
    format!("{indent}_arguments {}\n", specs.join(" \\\n"))
}

fn zsh_describe(name: &str, nodes: &[Node], indent: &str) -> String {
    let mut s = format!("{indent}local -a {name}\n{indent}{name}=(\n");
    for node in nodes {
        s.push_str(&format!(
            "{indent}  '{}:{}'\n",
            node.name,
            zsh_escape(&node.about).replace(':', "\\:")
        ));
    }
    s.push_str(&format!("{indent})\n{indent}_describe '{name}' {name}\n"));
    s
}

fn zsh(root: &Node) -> String {
    let bin = &root.name;
    let mut s = format!("#compdef {bin}\n\n_{bin}() {{\n");
    s.push_str("  if (( CURRENT == 2 )); then\n");
    s.push_str(&zsh_describe("commands", &root.children, "    "));
    s.push_str("    return\n  fi\n\n");

    s.push_str("  case \"$words[2]\" in\n");
    for cmd in &root.children {
        s.push_str(&format!("    {})\n", cmd.name));
        if cmd.children.is_empty() {
            s.push_str("      shift words\n      (( CURRENT-- ))\n");
            s.push_str(&zsh_arguments(cmd, "      "));
        } else {
            s.push_str("      if (( CURRENT == 3 )); then\n");
            s.push_str(&zsh_describe("actions", &cmd.children, "        "));
            s.push_str("        return\n      fi\n");
            s.push_str("      shift 2 words\n      (( CURRENT -= 2 ))\n");
            s.push_str("      case \"$words[1]\" in\n");
            for sub in &cmd.children {
                s.push_str(&format!("        {})\n", sub.name));
                s.push_str(&zsh_arguments(sub, "          "));
                s.push_str("          ;;\n");
            }
            s.push_str("      esac\n");
        }
        s.push_str("      ;;\n");
    }
    s.push_str("  esac\n}\n\n");
    s.push_str(&format!("compdef _{bin} {bin}\n"));
    s
}

/* ---- Fish ---- */

fn fish_quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn fish_flag(bin: &str, condition: &str, flag: &Flag) -> String {
    let mut line = format!("complete -c {bin}");
    if !condition.is_empty() {
        line.push_str(&format!(" -n {}", fish_quote(condition)));
    }
    if let Some(short) = flag.short {
        line.push_str(&format!(" -s {short}"));
    }
    line.push_str(&format!(" -l {}", flag.long));
    if !flag.choices.is_empty() {
        line.push_str(&format!(" -xa {}", fish_quote(&flag.choices.join(" "))));
    } else if flag.takes_value {
        line.push_str(" -r");
    }
    if !flag.help.is_empty() {
        line.push_str(&format!(" -d {}", fish_quote(&flag.help)));
    }
    line
}

fn fish(root: &Node) -> String {
    let bin = &root.name;
    let mut lines = vec![format!("# {bin} fish completion"), format!("complete -c {bin} -f")];

    for flag in &root.flags {
        lines.push(fish_flag(bin, "", flag));
    }
    for cmd in &root.children {
        lines.push(format!(
            "complete -c {bin} -n '__fish_use_subcommand' -a {} -d {}",
            cmd.name,
            fish_quote(&cmd.about)
        ));
    }
    for cmd in &root.children {
        let seen = format!("__fish_seen_subcommand_from {}", cmd.name);
        for flag in &cmd.flags {
            lines.push(fish_flag(bin, &seen, flag));
        }
        if !cmd.values.is_empty() {
            lines.push(format!(
                "complete -c {bin} -n {} -a {}",
                fish_quote(&seen),
                fish_quote(&cmd.values.join(" "))
            ));
        }
        if cmd.children.is_empty() {
            continue;
        }
        let names: Vec<&str> = cmd.children.iter().map(|c| c.name.as_str()).collect();
        let fresh = format!("{seen}; and not __fish_seen_subcommand_from {}", names.join(" "));
        for sub in &cmd.children {
            lines.push(format!(
                "complete -c {bin} -n {} -a {} -d {}",
                fish_quote(&fresh),
                sub.name,
                fish_quote(&sub.about)
            ));
        }
        for sub in &cmd.children {
            let within = format!("{seen}; and __fish_seen_subcommand_from {}", sub.name);
            for flag in &sub.flags {
                lines.push(fish_flag(bin, &within, flag));
            }
            if !sub.values.is_empty() {
                lines.push(format!(
                    "complete -c {bin} -n {} -a {}",
                    fish_quote(&within),
                    fish_quote(&sub.values.join(" "))
                ));
            }
        }
    }
    lines.push(String::new());
    lines.join("\n")
}

/* ---- Entry ---- */

pub fn run_completion(args: &CompletionArgs, cmd: &Command) -> String {
    let root = describe(cmd);
    match args.shell {
        Shell::Bash => bash(&root),
        Shell::Zsh => zsh(&root),
        Shell::Fish => fish(&root),
    }
}

pub fn execute_completion(args: CompletionArgs, cmd: &Command) -> Result<()> {
    print!("{}", run_completion(&args, cmd));
    Ok(())
}
