//! Export of the CLI structure as JSON, consumed by `cargo xtask manpages`.

use clap::{Arg, Command, CommandFactory};
use serde::Serialize;

/// A flag of a command.
#[derive(Debug, Serialize)]
pub struct CliOption {
    pub long: String,
    pub short: Option<String>,
    pub value_name: Option<String>,
    pub default: Option<String>,
    pub help: String,
    pub possible_values: Vec<String>,
    pub required: bool,
    pub repeatable: bool,
}

/// A command with its flags and visible subcommands.
#[derive(Debug, Serialize)]
pub struct CliCommand {
    pub name: String,
    pub about: Option<String>,
    pub examples: Option<String>,
    pub options: Vec<CliOption>,
    pub subcommands: Vec<CliCommand>,
}

fn option_to_json(arg: &Arg) -> CliOption {
    let id = arg.get_id().as_str();
    CliOption {
        long: arg.get_long().unwrap_or(id).to_owned(),
        short: arg.get_short().map(|c| c.to_string()),
        value_name: arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.to_string()),
        default: arg
            .get_default_values()
            .first()
            .and_then(|v| v.to_str())
            .map(ToOwned::to_owned),
        help: arg
            .get_long_help()
            .or_else(|| arg.get_help())
            .map(|h| h.to_string())
            .unwrap_or_default(),
        possible_values: arg
            .get_possible_values()
            .iter()
            .filter(|v| !v.is_hide_set())
            .map(|v| v.get_name().to_owned())
            .collect(),
        required: arg.is_required_set(),
        repeatable: matches!(arg.get_action(), clap::ArgAction::Append),
    }
}

/// Convert a clap command to its JSON representation.
pub fn command_to_json(cmd: &Command) -> CliCommand {
    let options = cmd
        .get_arguments()
        .filter(|arg| !arg.is_positional() && !arg.is_hide_set())
        .filter(|arg| !matches!(arg.get_id().as_str(), "help" | "version"))
        .map(option_to_json)
        .collect();
    let subcommands = cmd
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set())
        .map(command_to_json)
        .collect();

    CliCommand {
        name: cmd.get_name().to_owned(),
        about: cmd.get_about().map(|s| s.to_string()),
        examples: cmd.get_after_help().map(|s| s.to_string()),
        options,
        subcommands,
    }
}

/// Dump the complete CLI structure as JSON
pub fn dump_cli_json() -> color_eyre::Result<String> {
    let mut cmd = crate::Cli::command();
    // Propagate global args into the subcommands
    cmd.build();
    Ok(serde_json::to_string_pretty(&command_to_json(&cmd))?)
}
