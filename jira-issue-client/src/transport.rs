use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use url::Url;

use crate::error::TransportError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The single HTTP capability the client needs: an authenticated GET.
///
/// Non-2xx statuses are responses, not errors; only failures to obtain a
/// response at all are reported as [`TransportError`].
pub trait HttpTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(insecure: bool) -> Result<Self, TransportError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.http.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes()?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use url::Url;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

    fn blocking_get(request: HttpRequest) -> tokio::task::JoinHandle<HttpResponse> {
        tokio::task::spawn_blocking(move || {
            let transport = ReqwestTransport::new(false).expect("transport");
            transport.get(&request).expect("response")
        })
    }

    #[test]
    fn looks_up_headers_case_insensitively() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: b"{}".to_vec(),
        };
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
        assert!(response.header("x-missing").is_none());
        assert!(response.is_success());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sends_headers_and_query_over_http() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/latest/search"))
            .and(query_param("jql", "project = X"))
            .and(header("accept", "*/*"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"total": 0})),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!(
            "{}/rest/api/latest/search?jql=project+%3D+X",
            mock_server.uri()
        ))?;
        let response = blocking_get(HttpRequest {
            url,
            headers: vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("accept".to_string(), "*/*".to_string()),
            ],
        })
        .await?;

        assert_eq!(response.status, 200);
        assert!(response
            .content_type()
            .is_some_and(|value| value.contains("json")));
        assert_eq!(response.json()?, serde_json::json!({"total": 0}));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn returns_error_statuses_as_responses() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/missing", mock_server.uri()))?;
        let response = blocking_get(HttpRequest {
            url,
            headers: Vec::new(),
        })
        .await?;

        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "nope");
        Ok(())
    }
}
