//! Jira REST client for issue, search and status lookups.
//!
//! [`JiraClient`] authenticates every request according to the account's
//! [`Authentication`](jira_issue_config::Authentication) mode, turns non-200
//! responses into [`JiraError`] values and post-processes issue payloads by
//! inlining the issue type icon as a data URI.

pub mod auth;
mod client;
mod error;
pub mod transport;

pub use client::JiraClient;
pub use error::{JiraError, Result, TransportError};
pub use jira_issue_domain::{JiraIssue, SearchResults, StatusColorCache};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
