use std::fmt;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("HTTP request error: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { url: Url, status: StatusCode },

    #[error("Failed to decode JSON response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Username and password for HTTP Basic authentication.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Append an absolute API path to a base URL.
///
/// The base may carry its own path prefix; one trailing slash is dropped so
/// `http://h/` and `http://h` resolve to the same endpoint.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, HttpError> {
    let base = base.strip_suffix('/').unwrap_or(base);
    let url = format!("{base}{path}");
    Url::parse(&url).map_err(|source| HttpError::InvalidUrl { url, source })
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(HttpError::BuildClient)?;
        Ok(HttpClient { client })
    }

    /// POST a JSON body with Basic auth and parse the JSON response.
    ///
    /// Any non-2xx status is an error, whatever the body says.
    pub async fn post_json<B>(
        &self,
        url: &Url,
        auth: &BasicAuth,
        body: &B,
    ) -> Result<Value, HttpError>
    where
        B: Serialize + ?Sized,
    {
        debug!(url = %url, username = auth.username(), "POST");

        let resp = self
            .client
            .post(url.clone())
            .basic_auth(&auth.username, Some(&auth.password))
            .json(body)
            .send()
            .await
            .map_err(HttpError::Request)?;

        let status = resp.status();
        debug!(url = %url, status = %status, "response");
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.clone(),
                status,
            });
        }

        resp.json::<Value>().await.map_err(HttpError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn auth() -> BasicAuth {
        BasicAuth::new("a", "b")
    }

    #[test]
    fn test_endpoint_url() {
        let url = endpoint_url("http://h", "/api/nutanix/v3/vms").unwrap();
        assert_eq!(url.as_str(), "http://h/api/nutanix/v3/vms");
    }

    #[test]
    fn test_endpoint_url_trailing_slash() {
        let url = endpoint_url("https://h:9440/", "/api/nutanix/v3/vms").unwrap();
        assert_eq!(url.as_str(), "https://h:9440/api/nutanix/v3/vms");
    }

    #[test]
    fn test_endpoint_url_with_prefix() {
        let url = endpoint_url("http://h/proxy", "/api/nutanix/v3/vms").unwrap();
        assert_eq!(url.as_str(), "http://h/proxy/api/nutanix/v3/vms");
    }

    #[test]
    fn test_endpoint_url_invalid() {
        let err = endpoint_url("not a url", "/api").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", BasicAuth::new("admin", "hunter2"));
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_post_json_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/items")
            .match_header("authorization", "Basic YTpi")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "hello": "world" })))
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"state":"PENDING"}}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let url = endpoint_url(&server.url(), "/items").unwrap();
        let value = client
            .post_json(&url, &auth(), &json!({ "hello": "world" }))
            .await
            .unwrap();

        assert_eq!(value, json!({ "status": { "state": "PENDING" } }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_json_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/items")
            .with_status(401)
            .with_body(r#"{"message":"unauthorized"}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let url = endpoint_url(&server.url(), "/items").unwrap();
        let err = client
            .post_json(&url, &auth(), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HttpError::Status { status, .. } if status == StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn test_post_json_invalid_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/items")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let url = endpoint_url(&server.url(), "/items").unwrap();
        let err = client
            .post_json(&url, &auth(), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Decode(_)));
    }

    #[tokio::test]
    async fn test_post_json_connection_refused() {
        let client = HttpClient::new().unwrap();
        let url = endpoint_url("http://127.0.0.1:1", "/items").unwrap();
        let err = client
            .post_json(&url, &auth(), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Request(_)));
    }
}
