//! Retry decision table for failed request attempts.
//!
//! Only transport failures reach this module. HTTP status codes are never
//! retried: a 503 is a completed exchange as far as the executor is concerned.

use std::error::Error as StdError;
use std::io::ErrorKind;
use std::time::Duration;

use tracing::{debug, warn};

use crate::{ClientOptions, TransportErrorKind};

/// Fixed wait before retrying a socket-level failure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Outcome of [`RetryPolicy::decide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-issue the request after `delay`.
    Retry { delay: Duration },
    /// Stop and surface the last error.
    GiveUp,
}

/// Attempt-capped retry policy.
///
/// No exponential backoff and no distinction between idempotent and
/// non-idempotent methods. `max_duration_minutes` is only reported in the
/// give-up log line, it is not checked against elapsed time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    max_duration_minutes: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, max_duration_minutes: u32) -> Self {
        Self {
            max_retries,
            max_duration_minutes,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Policy that never retries.
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    pub fn from_options(options: &ClientOptions) -> Self {
        Self::new(options.max_retries, options.max_duration_minutes)
            .with_delay(Duration::from_millis(options.retry_delay_ms))
    }

    /// Overrides the socket-failure delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_duration_minutes(&self) -> u32 {
        self.max_duration_minutes
    }

    /// Pure decision for a failed attempt. `attempt` is 1-based.
    pub fn decide(&self, kind: TransportErrorKind, attempt: u32) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        match kind {
            TransportErrorKind::Timeout => RetryDecision::Retry {
                delay: Duration::ZERO,
            },
            TransportErrorKind::ConnectionReset
            | TransportErrorKind::Interrupted
            | TransportErrorKind::Tls => RetryDecision::Retry { delay: self.delay },
            TransportErrorKind::Other => RetryDecision::GiveUp,
        }
    }

    /// Applies [`decide`](Self::decide) and waits out the delay before
    /// returning `true`.
    pub async fn should_retry(&self, kind: TransportErrorKind, attempt: u32) -> bool {
        match self.decide(kind, attempt) {
            RetryDecision::Retry { delay } => {
                if !delay.is_zero() {
                    debug!(attempt, ?delay, %kind, "waiting before retry");
                    tokio::time::sleep(delay).await;
                }
                true
            }
            RetryDecision::GiveUp => {
                if attempt >= self.max_retries && self.max_retries > 0 {
                    warn!(
                        "request failed after {} retries in {} minute(s)",
                        attempt, self.max_duration_minutes
                    );
                }
                false
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Maps a `reqwest` failure onto the retry classes by walking its source
/// chain down to the innermost cause.
///
/// The walk starts below the top-level error: its message embeds the request
/// URL, which must not influence the class.
pub(crate) fn classify(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        return TransportErrorKind::Timeout;
    }

    let mut unknown_host = false;
    let mut closed = false;
    let mut current = err.source();

    while let Some(cause) = current {
        if cause.downcast_ref::<rustls::Error>().is_some() {
            return TransportErrorKind::Tls;
        }
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if let Some(kind) = classify_io(io) {
                return kind;
            }
        }

        let text = cause.to_string().to_ascii_lowercase();
        unknown_host |= text.starts_with("dns error") || text.contains("failed to lookup address");
        closed |= text.starts_with("connection closed");

        current = cause.source();
    }

    if unknown_host {
        TransportErrorKind::Other
    } else if closed || err.is_connect() {
        TransportErrorKind::ConnectionReset
    } else {
        TransportErrorKind::Other
    }
}

fn classify_io(io: &std::io::Error) -> Option<TransportErrorKind> {
    // rustls failures reach us wrapped in `InvalidData`, and `io::Error::source`
    // skips the wrapped value, so look at it directly.
    if io
        .get_ref()
        .is_some_and(|inner| inner.downcast_ref::<rustls::Error>().is_some())
    {
        return Some(TransportErrorKind::Tls);
    }
    match io.kind() {
        ErrorKind::TimedOut => Some(TransportErrorKind::Timeout),
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::ConnectionRefused
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected => Some(TransportErrorKind::ConnectionReset),
        ErrorKind::Interrupted | ErrorKind::UnexpectedEof => Some(TransportErrorKind::Interrupted),
        _ => None,
    }
}
