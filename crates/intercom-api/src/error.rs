use thiserror::Error;

/// Top-level error type for the `intercom-api` crate.
///
/// These are construction and transport-level failures. [`DeviceClient::call`]
/// never returns them: every expected failure is folded into a failed
/// [`DeviceResponse`] instead. They surface from client construction and
/// from the internal request path, where the retry policy inspects them.
///
/// [`DeviceClient::call`]: crate::DeviceClient::call
/// [`DeviceResponse`]: crate::DeviceResponse
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, aborted exchange, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failure.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// The device sent a digest challenge we could not parse or answer.
    #[error("Digest authentication failed: {message}")]
    Digest { message: String },
}

impl Error {
    /// Returns `true` for a malformed or aborted HTTP exchange.
    ///
    /// Only these are retried by [`DeviceClient::call`](crate::DeviceClient::call);
    /// refused connections, timeouts and TLS failures are surfaced immediately.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Transport(e) => {
                e.is_body() || (e.is_request() && !e.is_connect() && !e.is_timeout())
            }
            _ => false,
        }
    }

    /// Returns `true` if the device could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

impl From<digest_auth::Error> for Error {
    fn from(err: digest_auth::Error) -> Self {
        Self::Digest {
            message: err.to_string(),
        }
    }
}
