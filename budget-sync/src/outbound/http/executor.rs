//! Single-attempt HTTP execution port and its reqwest adapter.
//!
//! An executor sends exactly one request and hands back whatever status the
//! server answered with. Retries, timeouts, and status classification belong
//! to [`super::HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Url};
use serde_json::Value;

use super::{HttpMethod, TransportError};

const DEFAULT_USER_AGENT: &str = "budget-sync/0.1";

/// One attempt ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl OutgoingRequest {
    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status, rate-limit hint, and body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed `Retry-After` header, in whole seconds.
    pub retry_after: Option<Duration>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Response with `status` and a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.to_string().into_bytes(),
        }
    }

    /// Response with `status` and no body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

/// Port that performs one network round trip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Send `request` once.
    ///
    /// Only failures that prevented a response are errors; every HTTP status
    /// comes back as a [`RawResponse`].
    async fn execute(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError>;
}

/// Executor backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Build an executor with the crate's user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(DEFAULT_USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url)
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(RawResponse {
            status,
            retry_after,
            body: body.to_vec(),
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        return TransportError::invalid_request(error.to_string());
    }
    TransportError::network(error.to_string())
}

/// Parse a `Retry-After` value given in delta-seconds.
///
/// HTTP-date values are ignored; the computed backoff applies instead.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2", Some(Duration::from_secs(2)))]
    #[case(" 120 ", Some(Duration::from_secs(120)))]
    #[case("Wed, 21 Oct 2015 07:28:00 GMT", None)]
    #[case("-1", None)]
    fn parses_delta_seconds_only(#[case] raw: &str, #[case] expected: Option<Duration>) {
        assert_eq!(parse_retry_after(raw), expected);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = OutgoingRequest {
            method: HttpMethod::Get,
            url: Url::parse("https://api.example.test/users/u1/transactions").expect("url"),
            headers: vec![("x-trace-id", "abc".to_owned())],
            body: None,
        };
        assert_eq!(request.header("X-Trace-Id"), Some("abc"));
        assert_eq!(request.header("Idempotency-Key"), None);
    }
}
