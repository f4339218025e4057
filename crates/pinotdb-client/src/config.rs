use pinotdb_core::{PinotError, Result};
use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub connection: ConnectOptions,
}

/// Where and how to reach a broker's query endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Comma separated `key=value` pairs sent with every query.
    #[serde(default)]
    pub extra_request_headers: String,
    #[serde(default)]
    pub debug: bool,
}

fn default_port() -> u16 {
    8099
}

fn default_scheme() -> String {
    "http".into()
}

fn default_path() -> String {
    "/query".into()
}

impl ConnectOptions {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            scheme: default_scheme(),
            path: default_path(),
            extra_request_headers: String::new(),
            debug: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_extra_request_headers(mut self, headers: impl Into<String>) -> Self {
        self.extra_request_headers = headers.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }

    /// Parse `extra_request_headers` into ordered name/value pairs.
    pub fn extra_headers(&self) -> Result<Vec<(String, String)>> {
        if self.extra_request_headers.is_empty() {
            return Ok(Vec::new());
        }
        self.extra_request_headers
            .split(',')
            .map(|header| match header.split('=').collect::<Vec<_>>().as_slice() {
                [name, value] => checked_header(name, value),
                _ => Err(PinotError::Config(format!(
                    "extra request header `{header}` is not of the form key=value"
                ))),
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(PinotError::Config("host is empty".into()));
        }
        if self.scheme != "http" && self.scheme != "https" {
            return Err(PinotError::Config(format!(
                "unsupported scheme `{}`, expected http or https",
                self.scheme
            )));
        }
        if !self.path.starts_with('/') {
            return Err(PinotError::Config(format!(
                "path `{}` must start with `/`",
                self.path
            )));
        }
        self.extra_headers()?;
        Ok(())
    }
}

/// A pair must also be a legal HTTP header, or every later request fails.
fn checked_header(name: &str, value: &str) -> Result<(String, String)> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| PinotError::Config(format!("invalid extra header name `{name}`: {e}")))?;
    HeaderValue::from_str(value)
        .map_err(|e| PinotError::Config(format!("invalid value for extra header `{name}`: {e}")))?;
    Ok((name.to_string(), value.to_string()))
}

impl ClientConfig {
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        config.connection.validate()?;
        Ok(config)
    }
}
