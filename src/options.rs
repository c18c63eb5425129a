/// Configures HTTP timeouts and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Connect and per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Attempt cap handed to the retry policy. `0` disables retries.
    pub max_retries: u32,
    /// Reported when giving up. Not enforced against the clock.
    pub max_duration_minutes: u32,
    /// Fixed wait before retrying a socket-level failure.
    pub retry_delay_ms: u64,
    /// Timeout applied to multipart file uploads.
    pub upload_timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 0,
            max_duration_minutes: 1,
            retry_delay_ms: 5_000,
            upload_timeout_ms: 120_000,
        }
    }
}

impl ClientOptions {
    /// Options with the given timeout in seconds and no retries.
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self {
            timeout_ms: timeout_secs.saturating_mul(1_000),
            ..Self::default()
        }
    }

    /// Sets the retry attempt cap.
    pub fn retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::ClientOptions;

    #[test]
    fn defaults_match_generic_client() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout_ms, 10_000);
        assert_eq!(options.max_retries, 0);
        assert_eq!(options.retry_delay_ms, 5_000);
    }

    #[test]
    fn timeout_secs_keeps_other_defaults() {
        let options = ClientOptions::with_timeout_secs(20).retries(3);
        assert_eq!(options.timeout_ms, 20_000);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.upload_timeout_ms, 120_000);
    }
}
