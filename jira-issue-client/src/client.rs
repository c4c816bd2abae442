use base64::{engine::general_purpose::STANDARD, Engine as _};
use jira_issue_config::JiraAccount;
use jira_issue_domain::{JiraIssue, SearchResults};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth;
use crate::error::{JiraError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

const ICON_FALLBACK_CONTENT_TYPE: &str = "image/svg+xml;charset=UTF-8";

/// Jira REST client bound to a single account.
///
/// The account, including its status color cache, is owned by the client;
/// hand it back with [`JiraClient::into_account`] to persist cache updates.
pub struct JiraClient<T = ReqwestTransport> {
    account: JiraAccount,
    transport: T,
}

impl JiraClient<ReqwestTransport> {
    pub fn from_account(account: JiraAccount) -> Result<Self> {
        let transport = ReqwestTransport::new(account.insecure).map_err(JiraError::Request)?;
        Ok(Self::with_transport(account, transport))
    }
}

impl<T: HttpTransport> JiraClient<T> {
    pub fn with_transport(account: JiraAccount, transport: T) -> Self {
        Self { account, transport }
    }

    pub fn account(&self) -> &JiraAccount {
        &self.account
    }

    pub fn into_account(self) -> JiraAccount {
        self.account
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_url(&self, path: &str, query: Option<&[(&str, &str)]>) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}{}{}",
            self.account.host, self.account.api_base_path, path
        ))?;
        if let Some(pairs) = query {
            url.set_query(None);
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// `{resource}/{id}` under the API base path, with `id` encoded as one path segment.
    fn resource_url(&self, resource: &str, id: &str) -> Result<Url> {
        let mut url = self.build_url(resource, None)?;
        // http(s) URLs always have a path.
        url.path_segments_mut()
            .map_err(|()| JiraError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        Ok(url)
    }

    pub fn build_headers(&self) -> Result<Vec<(String, String)>> {
        auth::build_headers(&self.account.authentication)
    }

    /// Sends `request` and returns the JSON body of a 200 response untouched.
    pub fn send_request(&self, request: &HttpRequest) -> Result<Value> {
        let response = self.transport.get(request).map_err(|err| {
            error!(url = %request.url, error = %err, "Jira request failed");
            JiraError::Request(err)
        })?;
        debug!(url = %request.url, status = response.status, "Jira response");

        if response.status != 200 {
            return Err(status_error(&response));
        }

        Ok(response.json()?)
    }

    pub fn get_issue(&self, key: &str) -> Result<JiraIssue> {
        let headers = self.build_headers()?;
        let request = HttpRequest {
            url: self.resource_url("/issue", key)?,
            headers: headers.clone(),
        };
        let mut issue = JiraIssue::from_value(self.send_request(&request)?);

        let Some(icon_url) = issue.issue_type_icon_url().map(str::to_string) else {
            debug!(key, "issue has no issue type icon");
            return Ok(issue);
        };

        match self.fetch_icon(&icon_url, headers) {
            Ok(data_uri) => issue.set_icon(data_uri),
            Err(err) => warn!(key, icon_url = %icon_url, error = %err, "failed to inline issue type icon"),
        }

        Ok(issue)
    }

    pub fn get_search_results(&self, jql: &str, max: u32) -> Result<SearchResults> {
        let max = max.to_string();
        let request = HttpRequest {
            url: self.build_url(
                "/search",
                Some(&[("jql", jql), ("startAt", "0"), ("maxResults", max.as_str())]),
            )?,
            headers: self.build_headers()?,
        };
        Ok(SearchResults::from_value(self.send_request(&request)?))
    }

    /// Resolves the category color of `status`, asking Jira only the first time.
    pub fn update_status_color_cache(&mut self, status: &str) -> Result<String> {
        if let Some(color) = self.account.status_color_cache.get(status) {
            debug!(status, "status color cache hit");
            return Ok(color.to_string());
        }

        let request = HttpRequest {
            url: self.resource_url("/status", status)?,
            headers: self.build_headers()?,
        };
        let response = self.send_request(&request)?;
        let color = response
            .pointer("/statusCategory/colorName")
            .and_then(Value::as_str)
            .ok_or(JiraError::MissingField("statusCategory.colorName"))?;

        Ok(self
            .account
            .status_color_cache
            .insert_if_absent(status, color.to_string())
            .to_string())
    }

    pub fn status_color(&self, status: &str) -> Option<&str> {
        self.account.status_color_cache.get(status)
    }

    fn fetch_icon(&self, icon_url: &str, headers: Vec<(String, String)>) -> Result<String> {
        let url = Url::parse(&self.account.host)?.join(icon_url)?;
        let response = self
            .transport
            .get(&HttpRequest { url, headers })
            .map_err(JiraError::Request)?;
        if !response.is_success() {
            return Err(JiraError::HttpStatus(response.status));
        }

        let content_type = response
            .content_type()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(ICON_FALLBACK_CONTENT_TYPE);
        Ok(format!(
            "data:{content_type};base64,{}",
            STANDARD.encode(&response.body)
        ))
    }
}

fn status_error(response: &HttpResponse) -> JiraError {
    let is_json = response
        .content_type()
        .is_some_and(|value| value.contains("json"));
    if is_json {
        if let Some(messages) = response.json().ok().as_ref().and_then(error_messages) {
            return JiraError::Api(messages);
        }
    }
    debug!(status = response.status, body = %response.text(), "Jira error response");
    JiraError::HttpStatus(response.status)
}

fn error_messages(body: &Value) -> Option<String> {
    let messages = body
        .get("errorMessages")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>();
    if messages.is_empty() {
        return None;
    }
    Some(messages.join("\n"))
}
