use thiserror::Error;

pub type Result<T> = std::result::Result<T, PinotError>;

#[derive(Debug, Error)]
pub enum PinotError {
    /// Operation on a closed resource, or fetch before execute.
    #[error("usage error: {0}")]
    Usage(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("templating error: {0}")]
    Templating(String),
    #[error("error when querying {query} from {url}, raw response is:\n{body}")]
    TransportDecode {
        query: String,
        url: String,
        body: String,
    },
    /// Broker rejected the query, reported exceptions, or only part of the
    /// servers responded.
    #[error("server error: {0}")]
    Server(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("config error: {0}")]
    Config(String),
}

impl PinotError {
    pub fn is_usage(&self) -> bool {
        matches!(self, PinotError::Usage(_) | PinotError::NotSupported(_))
    }
}
