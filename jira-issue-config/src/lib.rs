use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
pub use jira_issue_domain::StatusColorCache;
use serde::Deserialize;

pub const DEFAULT_ACCOUNT_ALIAS: &str = "Default";
pub const DEFAULT_API_BASE_PATH: &str = "/rest/api/latest";
pub const DEFAULT_HEADER_NAME: &str = "Authorization";
const CONFIG_FILE_ENV: &str = "JIRA_ISSUE_CONFIG_FILE";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authentication {
    Open,
    Basic { username: String, password: String },
    BearerToken { header_name: String, token: String },
    Custom { header_name: String, command: String },
}

impl Authentication {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Basic { .. } => "basic",
            Self::BearerToken { .. } => "bearer_token",
            Self::Custom { .. } => "custom",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JiraAccount {
    pub alias: String,
    pub host: String,
    pub api_base_path: String,
    pub authentication: Authentication,
    /// Accept invalid TLS certificates.
    pub insecure: bool,
    pub status_color_cache: StatusColorCache,
}

impl JiraAccount {
    pub fn new(alias: &str, host: &str, authentication: Authentication) -> Result<Self> {
        let host = normalize_host(host.to_string())
            .ok_or_else(|| anyhow!("host cannot be empty for account '{}'", alias))?;
        Ok(Self {
            alias: alias.to_string(),
            host,
            api_base_path: DEFAULT_API_BASE_PATH.to_string(),
            authentication,
            insecure: false,
            status_color_cache: StatusColorCache::new(),
        })
    }

    pub fn with_api_base_path(mut self, api_base_path: &str) -> Self {
        self.api_base_path = normalize_api_base_path(Some(api_base_path.to_string()));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JiraIssueSettings {
    pub accounts: Vec<JiraAccount>,
}

#[derive(Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    accounts: Vec<RawAccount>,
    #[serde(flatten)]
    legacy: RawAccount,
}

#[derive(Default, Deserialize)]
struct RawAccount {
    alias: Option<String>,
    host: Option<String>,
    #[serde(alias = "apiBasePath")]
    api_base_path: Option<String>,
    #[serde(alias = "authenticationType")]
    authentication_type: Option<String>,
    username: Option<String>,
    password: Option<String>,
    #[serde(alias = "bareToken", alias = "token")]
    bare_token: Option<String>,
    #[serde(alias = "headerName")]
    header_name: Option<String>,
    #[serde(alias = "customCommand")]
    custom_command: Option<String>,
    insecure: Option<bool>,
    #[serde(alias = "statusColorCache", default)]
    status_color_cache: StatusColorCache,
}

impl JiraIssueSettings {
    pub fn load_default() -> Result<Self> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let payload = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_yaml(&payload)
    }

    pub fn from_yaml(payload: &str) -> Result<Self> {
        if payload.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(payload).with_context(|| "invalid YAML config format")?;
        Self::from_raw(raw)
    }

    pub fn account_by_alias(&self, alias: &str) -> Result<&JiraAccount> {
        self.accounts
            .iter()
            .find(|account| account.alias == alias)
            .ok_or_else(|| anyhow!("No accounts found with alias: {}", alias))
    }

    pub fn account_by_host(&self, host: &str) -> Option<&JiraAccount> {
        let host = normalize_host(host.to_string())?;
        self.accounts.iter().find(|account| account.host == host)
    }

    pub fn resolve_account(&self, requested_alias: Option<&str>) -> Result<&JiraAccount> {
        if let Some(alias) = requested_alias {
            return self.account_by_alias(alias);
        }

        self.accounts
            .first()
            .ok_or_else(|| anyhow!("no accounts configured"))
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let entries = if raw.accounts.is_empty() {
            vec![raw.legacy]
        } else {
            raw.accounts
        };

        let mut accounts = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if let Some(account) = parse_account(entry)
                .with_context(|| format!("invalid account entry #{}", index + 1))?
            {
                accounts.push(account);
            }
        }

        Ok(Self { accounts })
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(override_path) = env::var_os(CONFIG_FILE_ENV) {
        return PathBuf::from(override_path);
    }

    let mut base = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.push(".config");
    base.push("jira-issue");
    base.push("config.yaml");
    base
}

fn parse_account(raw: RawAccount) -> Result<Option<JiraAccount>> {
    let Some(host) = raw.host.and_then(normalize_host) else {
        return Ok(None);
    };
    let alias = raw
        .alias
        .and_then(non_empty)
        .unwrap_or_else(|| DEFAULT_ACCOUNT_ALIAS.to_string());
    let header_name = raw
        .header_name
        .and_then(non_empty)
        .unwrap_or_else(|| DEFAULT_HEADER_NAME.to_string());

    let kind = raw
        .authentication_type
        .and_then(non_empty)
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_else(|| "open".to_string());

    let authentication = match kind.as_str() {
        "open" | "none" => Authentication::Open,
        "basic" => Authentication::Basic {
            username: raw
                .username
                .and_then(non_empty)
                .ok_or_else(|| anyhow!("username not configured for basic auth on '{}'", alias))?,
            password: raw
                .password
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("password not configured for basic auth on '{}'", alias))?,
        },
        "bearer" | "bearer_token" => Authentication::BearerToken {
            header_name,
            token: raw
                .bare_token
                .and_then(non_empty)
                .ok_or_else(|| anyhow!("bare_token not configured for bearer auth on '{}'", alias))?,
        },
        "custom" => Authentication::Custom {
            header_name,
            command: raw
                .custom_command
                .and_then(non_empty)
                .ok_or_else(|| anyhow!("custom_command not configured for custom auth on '{}'", alias))?,
        },
        other => bail!("unsupported authentication type '{}'", other),
    };

    Ok(Some(JiraAccount {
        alias,
        host,
        api_base_path: normalize_api_base_path(raw.api_base_path),
        authentication,
        insecure: raw.insecure.unwrap_or(false),
        status_color_cache: raw.status_color_cache,
    }))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_host(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.trim_end_matches('/').to_string())
    } else {
        Some(format!("https://{}", trimmed.trim_end_matches('/')))
    }
}

fn normalize_api_base_path(value: Option<String>) -> String {
    let Some(path) = value.and_then(non_empty) else {
        return DEFAULT_API_BASE_PATH.to_string();
    };

    let path = path.trim_end_matches('/');
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
