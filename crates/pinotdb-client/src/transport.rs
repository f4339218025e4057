use pinotdb_core::{PinotError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::future::Future;
use std::pin::Pin;

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Applied in order; a later header replaces an earlier one of the same
    /// name.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Carries one query request to the broker and brings back the full reply.
pub trait Transport: Send + Sync {
    fn post(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// [`Transport`] over HTTP(S) with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PinotError::Transport(format!("HTTP client: {e}")))?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let headers = header_map(&request.headers)?;
            let resp = self
                .http
                .post(&request.url)
                .headers(headers)
                .body(request.body)
                .send()
                .await
                .map_err(|e| PinotError::Transport(format!("POST {}: {e}", request.url)))?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            // A declared charset wins; without one the body is read as UTF-8.
            let body = resp
                .text_with_charset("utf-8")
                .await
                .map_err(|e| PinotError::Transport(format!("read {}: {e}", request.url)))?;
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| PinotError::Transport(format!("invalid header name `{name}`: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| PinotError::Transport(format!("invalid value for header `{name}`: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}
