// Device HTTP client
//
// Wraps `reqwest::Client` with device URL construction, digest
// authentication, the one-retry policy for broken HTTP exchanges, and
// envelope validation. Endpoint helpers (system info, switch control)
// are inherent methods in sibling modules to keep this one focused on
// transport mechanics.

use std::sync::OnceLock;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use url::{Position, Url};

use crate::auth::{Credentials, DigestSession, digest_challenge};
use crate::error::Error;
use crate::response::DeviceResponse;
use crate::system::DeviceIdentity;
use crate::transport::TransportConfig;

/// Attempts per call when the HTTP exchange itself is broken.
const MAX_ATTEMPTS: u32 = 2;

/// Authenticated HTTPS session to a single intercom.
///
/// All calls are serialized through an internal gate, so scheduled polls
/// and control commands never race on the digest nonce count.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    auth: DigestSession,
    gate: Mutex<()>,
    pub(crate) identity: OnceLock<DeviceIdentity>,
}

impl DeviceClient {
    /// Create a client for `host` from a `TransportConfig`.
    ///
    /// A bare host (`192.168.1.50`) becomes `https://192.168.1.50`; a value
    /// that already carries a scheme is used verbatim.
    pub fn new(
        host: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = base_url_for(host)?;
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            auth: DigestSession::new(credentials),
            gate: Mutex::new(()),
            identity: OnceLock::new(),
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host part of the base URL, for logging and error messages.
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    pub fn username(&self) -> &str {
        self.auth.username()
    }

    // ── Calls ────────────────────────────────────────────────────────

    /// GET `path` (including any query string) and validate the response.
    ///
    /// Never fails: transport errors become a response with status 0, and
    /// a broken HTTP exchange is attempted a second time before giving up.
    pub async fn call(&self, path: &str) -> DeviceResponse {
        let url = match self.url(path) {
            Ok(url) => url,
            Err(e) => {
                error!(path, error = %e, "cannot build device URL");
                return DeviceResponse::transport_failure();
            }
        };

        let _serial = self.gate.lock().await;

        let mut attempt = 1;
        loop {
            match self.send(&url).await {
                Ok(resp) => {
                    debug!(
                        status = resp.status_code(),
                        failure = ?resp.failure(),
                        "<- {path}"
                    );
                    return resp;
                }
                Err(e) if e.is_protocol_violation() && attempt < MAX_ATTEMPTS => {
                    warn!(path, attempt, error = %e, "protocol error, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        path,
                        connect = e.is_connect(),
                        timeout = e.is_timeout(),
                        error = %e,
                        "request failed"
                    );
                    return DeviceResponse::transport_failure();
                }
            }
        }
    }

    /// GET `path` and report only whether it succeeded.
    pub async fn call_succeeded(&self, path: &str) -> bool {
        self.call(path).await.is_success()
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// One request/response exchange, answering a digest challenge once.
    async fn send(&self, url: &Url) -> Result<DeviceResponse, Error> {
        let uri = &url[Position::BeforePath..];
        debug!("-> GET {url}");

        let resp = self.get(url, self.auth.authorization(uri)?).await?;

        let challenge = if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            digest_challenge(resp.headers()).map(str::to_owned)
        } else {
            None
        };

        let resp = match challenge {
            Some(challenge) => {
                self.auth.accept_challenge(&challenge)?;
                debug!("digest challenge received, resending with credentials");
                self.get(url, self.auth.authorization(uri)?).await?
            }
            None => resp,
        };

        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        Ok(DeviceResponse::from_parts(status, &body))
    }

    async fn get(
        &self,
        url: &Url,
        authorization: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let mut builder = self.http.get(url.clone());
        if let Some(value) = authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, value);
        }
        Ok(builder.send().await?)
    }
}

fn base_url_for(host: &str) -> Result<Url, Error> {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        Ok(Url::parse(host)?)
    } else {
        Ok(Url::parse(&format!("https://{host}"))?)
    }
}
