// HTTP digest authentication state for one device session.
//
// The first request goes out bare; the device answers 401 with a
// `WWW-Authenticate: Digest ...` challenge which is cached here and answered
// pre-emptively on every later request (the nonce count advances each time).

use std::sync::{Mutex, PoisonError};

use digest_auth::{AuthContext, WwwAuthenticateHeader};
use secrecy::{ExposeSecret, SecretString};
use tracing::trace;

use crate::error::Error;

/// Username and password for a device.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

#[derive(Debug)]
pub(crate) struct DigestSession {
    credentials: Credentials,
    challenge: Mutex<Option<WwwAuthenticateHeader>>,
}

impl DigestSession {
    pub(crate) fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            challenge: Mutex::new(None),
        }
    }

    pub(crate) fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Build an `Authorization` header value for `uri` from the cached
    /// challenge, or `None` if no challenge has been seen yet.
    pub(crate) fn authorization(&self, uri: &str) -> Result<Option<String>, Error> {
        let mut guard = self.challenge.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(challenge) = guard.as_mut() else {
            return Ok(None);
        };
        let context = AuthContext::new(
            self.credentials.username.as_str(),
            self.credentials.password.expose_secret(),
            uri,
        );
        let answer = challenge.respond(&context)?;
        Ok(Some(answer.to_header_string()))
    }

    /// Replace the cached challenge with a fresh one from a 401 response.
    pub(crate) fn accept_challenge(&self, header: &str) -> Result<(), Error> {
        let parsed = digest_auth::parse(header)?;
        trace!("digest challenge cached");
        *self.challenge.lock().unwrap_or_else(PoisonError::into_inner) = Some(parsed);
        Ok(())
    }

    pub(crate) fn has_challenge(&self) -> bool {
        self.challenge
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Pick the digest challenge out of a `WWW-Authenticate` header set.
pub(crate) fn digest_challenge(headers: &reqwest::header::HeaderMap) -> Option<&str> {
    headers
        .get_all(reqwest::header::WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.trim_start().to_ascii_lowercase().starts_with("digest"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CHALLENGE: &str = r#"Digest realm="HTTP API", qop="auth", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;

    fn session() -> DigestSession {
        DigestSession::new(Credentials::new("admin", SecretString::from("2n")))
    }

    #[test]
    fn no_authorization_before_challenge() {
        let session = session();
        assert!(!session.has_challenge());
        assert_eq!(session.authorization("/api/io/status").unwrap(), None);
    }

    #[test]
    fn answers_cached_challenge() {
        let session = session();
        session.accept_challenge(CHALLENGE).unwrap();
        let header = session.authorization("/api/io/status").unwrap().unwrap();
        assert!(header.starts_with("Digest "));
        assert!(header.contains(r#"username="admin""#));
        assert!(header.contains(r#"uri="/api/io/status""#));
        assert!(header.contains("nc=00000001"));

        let second = session.authorization("/api/io/status").unwrap().unwrap();
        assert!(second.contains("nc=00000002"));
    }

    #[test]
    fn rejects_garbage_challenge() {
        let session = session();
        assert!(matches!(
            session.accept_challenge("Basic realm=\"x\""),
            Err(Error::Digest { .. })
        ));
        assert!(!session.has_challenge());
    }

    #[test]
    fn picks_digest_among_challenges() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.append(
            reqwest::header::WWW_AUTHENTICATE,
            "Basic realm=\"x\"".parse().unwrap(),
        );
        headers.append(reqwest::header::WWW_AUTHENTICATE, CHALLENGE.parse().unwrap());
        assert_eq!(digest_challenge(&headers), Some(CHALLENGE));
    }
}
