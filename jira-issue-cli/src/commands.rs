use anyhow::{Context, Result};
use jira_issue_client::JiraClient;
use jira_issue_config::{JiraAccount, JiraIssueSettings};
use tracing::info;

use crate::cli_args::{CliCommand, CliOptions};

pub fn run(options: &CliOptions) -> Result<String> {
    let account = load_account(options)?;
    info!(
        account = %account.alias,
        host = %account.host,
        auth = account.authentication.kind(),
        "using Jira account"
    );
    let mut client = JiraClient::from_account(account)?;

    match &options.command {
        CliCommand::Issue { key } => {
            let issue = client
                .get_issue(key)
                .with_context(|| format!("failed to fetch issue {key}"))?;
            Ok(serde_json::to_string_pretty(issue.as_value())?)
        }
        CliCommand::Search { jql, max } => {
            let results = client
                .get_search_results(jql, *max)
                .with_context(|| "failed to run Jira search")?;
            Ok(serde_json::to_string_pretty(results.as_value())?)
        }
        CliCommand::Status { name } => {
            let color = client
                .update_status_color_cache(name)
                .with_context(|| format!("failed to resolve color of status '{name}'"))?;
            Ok(format_status(name, &color))
        }
    }
}

fn load_account(options: &CliOptions) -> Result<JiraAccount> {
    let settings = match options.config.as_deref() {
        Some(path) => JiraIssueSettings::load_from_path(path)?,
        None => JiraIssueSettings::load_default()?,
    };
    Ok(settings.resolve_account(options.account.as_deref())?.clone())
}

fn format_status(name: &str, color: &str) -> String {
    format!("{name}: {color}")
}
