use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the host site or to local settings/export files.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON from {origin}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid endpoint URL")]
    Url(#[from] url::ParseError),
}
