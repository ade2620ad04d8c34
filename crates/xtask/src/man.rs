//! Markdown reference pages of the `virtctl create` commands
//!
//! The option lists are generated from the CLI structure dumped by the hidden
//! `virtctl internals dump-cli-json` command. Everything outside the
//! generation markers is hand-written and kept as is.

use std::fs;

use camino::Utf8Path;
use color_eyre::eyre::{eyre, Context, Result};
use serde::Deserialize;
use xshell::{cmd, Shell};

const MAN_DIR: &str = "docs/src/man";
const BEGIN_MARKER: &str = "<!-- BEGIN GENERATED OPTIONS -->";
const END_MARKER: &str = "<!-- END GENERATED OPTIONS -->";

#[derive(Debug, Deserialize)]
struct CliOption {
    long: String,
    short: Option<String>,
    value_name: Option<String>,
    default: Option<String>,
    help: String,
    possible_values: Vec<String>,
    required: bool,
    repeatable: bool,
}

#[derive(Debug, Deserialize)]
struct CliCommand {
    name: String,
    about: Option<String>,
    examples: Option<String>,
    options: Vec<CliOption>,
    subcommands: Vec<CliCommand>,
}

fn extract_cli_json(sh: &Shell) -> Result<CliCommand> {
    let json_output = cmd!(
        sh,
        "cargo run -q -p virtctl --features docgen -- internals dump-cli-json"
    )
    .read()
    .context("Running CLI JSON dump command")?;
    serde_json::from_str(&json_output).context("Parsing CLI JSON output")
}

fn format_options_as_markdown(options: &[CliOption]) -> String {
    let mut result = String::new();
    for opt in options {
        let mut flag_line = String::new();
        if let Some(short) = &opt.short {
            flag_line.push_str(&format!("**-{short}**, "));
        }
        flag_line.push_str(&format!("**--{}**", opt.long));
        if let Some(value_name) = &opt.value_name {
            flag_line.push_str(&format!("=*{value_name}*"));
        }
        result.push_str(&format!("{flag_line}\n\n"));

        for line in opt.help.lines() {
            result.push_str(&format!("    {line}\n"));
        }
        result.push('\n');

        if !opt.possible_values.is_empty() {
            result.push_str("    Possible values:\n");
            for value in &opt.possible_values {
                result.push_str(&format!("    - {value}\n"));
            }
            result.push('\n');
        }
        if let Some(default) = &opt.default {
            result.push_str(&format!("    Default: {default}\n\n"));
        }
        if opt.required {
            result.push_str("    This option is required.\n\n");
        }
        if opt.repeatable {
            result.push_str("    May be given multiple times.\n\n");
        }
    }
    result
}

/// Replace the text between the generation markers of `content`.
fn replace_generated(content: &str, generated: &str) -> Result<Option<String>> {
    let Some((before, rest)) = content.split_once(BEGIN_MARKER) else {
        return Ok(None);
    };
    let Some((_, after)) = rest.split_once(END_MARKER) else {
        return Err(eyre!("Found BEGIN marker but not END marker"));
    };
    let before = before.trim_end();
    Ok(Some(format!(
        "{before}\n\n{BEGIN_MARKER}\n{generated}{END_MARKER}{after}"
    )))
}

fn template(command: &str, cmd: &CliCommand) -> String {
    let about = cmd.about.as_deref().unwrap_or_default();
    let examples = cmd
        .examples
        .as_deref()
        .and_then(|e| e.strip_prefix("Examples:\n"))
        .unwrap_or_default();
    format!(
        "# NAME\n\n{} - {about}\n\n# SYNOPSIS\n\n**{command}** [*OPTIONS*]\n\n\
         # OPTIONS\n\n{BEGIN_MARKER}\n{END_MARKER}\n\n# EXAMPLES\n\n```\n{}\n```\n\n\
         # SEE ALSO\n\n**virtctl**(1)\n",
        command.replace(' ', "-"),
        examples.trim_end()
    )
}

/// Write or refresh `docs/src/man/virtctl-create-<kind>.md` for every
/// `create` subcommand.
pub(crate) fn update_manpages(sh: &Shell) -> Result<()> {
    let cli = extract_cli_json(sh)?;
    let create = cli
        .subcommands
        .iter()
        .find(|c| c.name == "create")
        .ok_or_else(|| eyre!("No create command in CLI structure"))?;

    sh.create_dir(MAN_DIR)?;
    for cmd in &create.subcommands {
        let command = format!("{} create {}", cli.name, cmd.name);
        let path = Utf8Path::new(MAN_DIR).join(format!("{}.md", command.replace(' ', "-")));
        let content = if path.exists() {
            fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
        } else {
            println!("Creating {path}");
            template(&command, cmd)
        };

        let generated = format_options_as_markdown(&cmd.options);
        let Some(new_content) =
            replace_generated(&content, &generated).with_context(|| format!("Updating {path}"))?
        else {
            continue;
        };
        if content != new_content {
            fs::write(&path, new_content).with_context(|| format!("Writing {path}"))?;
            println!("Updated {path}");
        }
    }
    Ok(())
}
