use std::fmt;

/// Transport failure classes, as seen by the retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connect or read timeout.
    Timeout,
    /// Socket-level failure: reset, refused, aborted, broken pipe.
    ConnectionReset,
    /// I/O interrupted before completion (premature EOF, interrupted read).
    Interrupted,
    /// TLS handshake or certificate failure.
    Tls,
    /// Anything else (unknown host, malformed response, ...).
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::ConnectionReset => "connection reset",
            Self::Interrupted => "interrupted i/o",
            Self::Tls => "tls failure",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    /// Network or request execution error from `reqwest`, after retries.
    #[error("error when doing rest request {url} {method} ({kind}): {source}")]
    Transport {
        method: String,
        url: String,
        kind: TransportErrorKind,
        #[source]
        source: reqwest::Error,
    },
    /// The base URL and path did not form a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The request could not be assembled (bad header name or value, bad mime).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Non-success HTTP status on an endpoint that requires success.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body is not the expected JSON shape.
    #[error("unexpected result when decoding {context}: {message}; body: {body}")]
    Decode {
        context: String,
        message: String,
        body: String,
    },
    /// Server answered but signalled rejection (for example a zero id).
    #[error("{message}: {body}")]
    Rejected { message: String, body: String },
    /// A project setting the caller needs is absent or empty.
    #[error("no {key} setting in project {project}")]
    MissingSetting { project: String, key: String },
    /// Caller input rejected before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Malformed XML input.
    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),
    /// Local file or process I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// External command exited with a failure.
    #[error("command {program} failed with status {status}: {stderr}")]
    Command {
        program: String,
        status: i32,
        stderr: String,
    },
}

impl MatrixError {
    /// Failure class of a transport error, if this is one.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub(crate) fn decode(context: &str, err: serde_json::Error, body: &str) -> Self {
        Self::Decode {
            context: context.to_owned(),
            message: err.to_string(),
            body: body.to_owned(),
        }
    }

    pub(crate) fn rejected(message: impl Into<String>, body: &str) -> Self {
        Self::Rejected {
            message: message.into(),
            body: body.to_owned(),
        }
    }
}
