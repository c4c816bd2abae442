use std::{env, path::PathBuf};

use anyhow::{anyhow, Result};

const DEFAULT_SEARCH_MAX: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CliCommand {
    Issue { key: String },
    Search { jql: String, max: u32 },
    Status { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub account: Option<String>,
    pub verbosity: u8,
    pub command: CliCommand,
}

#[derive(Debug)]
pub enum CliAction {
    Run(CliOptions),
    Help,
}

pub fn parse_cli_action() -> Result<CliAction> {
    parse_args(env::args().skip(1))
}

pub fn print_help() {
    println!("jira-issue");
    println!("Usage:");
    println!("  jira-issue [--config <path>] [--account <alias>] [-v...] <command>");
    println!("Commands:");
    println!("  issue <KEY>                 Fetch an issue with its inlined type icon");
    println!("  search <JQL> [--max <n>]    Run a JQL search (default max {DEFAULT_SEARCH_MAX})");
    println!("  status <NAME>               Resolve the category color of a status");
    println!("Options:");
    println!("  --config <path>    Config file (default $JIRA_ISSUE_CONFIG_FILE or ~/.config/jira-issue/config.yaml)");
    println!("  --account <alias>  Account alias (default: first configured account)");
    println!("  -v                 Increase log verbosity (repeatable)");
}

fn parse_args<I>(args: I) -> Result<CliAction>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut account = None;
    let mut verbosity = 0u8;
    let mut max = None;
    let mut positionals = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config = Some(PathBuf::from(
                    args.next()
                        .ok_or_else(|| anyhow!("--config requires a value"))?,
                ));
            }
            "--account" | "-a" => {
                account = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("--account requires a value"))?,
                );
            }
            "--max" | "-m" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--max requires a value"))?;
                max = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| anyhow!("--max expects a number, got '{value}'"))?,
                );
            }
            "--help" | "-h" => {
                return Ok(CliAction::Help);
            }
            flag if flag.len() > 1 && flag.starts_with('-') && flag[1..].chars().all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add(u8::try_from(flag.len() - 1).unwrap_or(u8::MAX));
            }
            other if other.starts_with('-') => return Err(anyhow!("Unknown argument: {other}")),
            _ => positionals.push(arg),
        }
    }

    let mut positionals = positionals.into_iter();
    let Some(name) = positionals.next() else {
        return Ok(CliAction::Help);
    };
    let operand = positionals.next();
    if let Some(extra) = positionals.next() {
        return Err(anyhow!("Unexpected argument: {extra}"));
    }

    let command = match name.as_str() {
        "issue" => CliCommand::Issue {
            key: operand.ok_or_else(|| anyhow!("issue requires an issue key"))?,
        },
        "search" => CliCommand::Search {
            jql: operand.ok_or_else(|| anyhow!("search requires a JQL query"))?,
            max: max.unwrap_or(DEFAULT_SEARCH_MAX),
        },
        "status" => CliCommand::Status {
            name: operand.ok_or_else(|| anyhow!("status requires a status name"))?,
        },
        other => return Err(anyhow!("Unknown command: {other}")),
    };

    if max.is_some() && !matches!(command, CliCommand::Search { .. }) {
        return Err(anyhow!("--max only applies to search"));
    }

    Ok(CliAction::Run(CliOptions {
        config,
        account,
        verbosity,
        command,
    }))
}
