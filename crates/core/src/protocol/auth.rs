//! RTSP authentication (RFC 2326 §D.1, RFC 2617).
//!
//! RTSP reuses HTTP's challenge/response schemes. The server answers the
//! first protected request with `401 Unauthorized` and a challenge:
//!
//! ```text
//! WWW-Authenticate: Digest realm="IP Camera", nonce="a8f3c1"
//! WWW-Authenticate: Basic realm="IP Camera"
//! ```
//!
//! Once a realm has been captured, every later request carries an
//! `Authorization` header: Digest when a nonce is known, Basic otherwise.

use base64::prelude::{BASE64_STANDARD, Engine as _};
use md5::{Digest, Md5};

use crate::error::{Result, RtspError};
use crate::protocol::response::STATUS_UNAUTHORIZED;

/// Length of a lowercase hex MD5 digest.
pub const MD5_HEX_LEN: usize = 32;

/// A challenge parsed from a `WWW-Authenticate` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Digest { realm: String, nonce: String },
    Basic { realm: String },
}

impl Challenge {
    /// Parse a single `WWW-Authenticate: <scheme> <params>` header line.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (name, value) = line.split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("WWW-Authenticate") {
            return None;
        }
        let value = value.trim();
        let (scheme, params) = value.split_once(char::is_whitespace)?;

        if scheme.eq_ignore_ascii_case("Digest") {
            let realm = auth_param(params, "realm")?;
            let nonce = auth_param(params, "nonce")?;
            Some(Challenge::Digest { realm, nonce })
        } else if scheme.eq_ignore_ascii_case("Basic") {
            let realm = auth_param(params, "realm")?;
            Some(Challenge::Basic { realm })
        } else {
            None
        }
    }

    /// First challenge found among the header lines of a response.
    pub fn find(response: &str) -> Option<Self> {
        response.lines().find_map(Self::parse_line)
    }
}

/// Extract `key="value"` (or an unquoted token) from a comma-separated
/// auth-param list.
fn auth_param(params: &str, key: &str) -> Option<String> {
    let mut rest = params.trim();
    while !rest.is_empty() {
        let (name, after) = rest.split_once('=')?;
        let after = after.trim_start();
        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted.find('"')?;
            (&quoted[..end], &quoted[end + 1..])
        } else {
            let end = after.find(',').unwrap_or(after.len());
            (after[..end].trim(), &after[end..])
        };

        if name.trim().eq_ignore_ascii_case(key) {
            return Some(value.to_string());
        }

        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }
    None
}

fn md5_hex(data: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Digest response per RFC 2617 §3.2.2 without `qop`:
/// `MD5(MD5(user:realm:pass):nonce:MD5(method:uri))`.
pub fn make_digest_response(
    realm: &str,
    method: &str,
    uri: &str,
    nonce: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let ha1 = md5_hex(&format!("{username}:{realm}:{password}"));
    let ha2 = md5_hex(&format!("{method}:{uri}"));
    let response = md5_hex(&format!("{ha1}:{nonce}:{ha2}"));

    if response.len() != MD5_HEX_LEN {
        tracing::error!(len = response.len(), "malformed MD5 digest");
        return Err(RtspError::AuthNegotiationFailed(STATUS_UNAUTHORIZED));
    }
    Ok(response)
}

/// Basic credentials: `base64(user:pass)`.
pub fn make_basic_response(username: &str, password: &str) -> String {
    BASE64_STANDARD.encode(format!("{username}:{password}"))
}

/// Credentials from the URI plus the realm/nonce learned from the server.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub username: String,
    pub password: String,
    pub realm: String,
    pub nonce: String,
}

impl AuthContext {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Self {
        Self {
            username: username.unwrap_or_default().to_string(),
            password: password.unwrap_or_default().to_string(),
            realm: String::new(),
            nonce: String::new(),
        }
    }

    pub fn has_username(&self) -> bool {
        !self.username.is_empty()
    }

    /// Whether a challenge has been captured and headers must be attached.
    pub fn is_negotiated(&self) -> bool {
        !self.realm.is_empty()
    }

    /// Capture realm and nonce from a challenge.
    pub fn apply(&mut self, challenge: &Challenge) {
        match challenge {
            Challenge::Digest { realm, nonce } => {
                self.realm = realm.clone();
                self.nonce = nonce.clone();
            }
            Challenge::Basic { realm } => {
                self.realm = realm.clone();
                self.nonce.clear();
            }
        }
        tracing::debug!(realm = %self.realm, digest = !self.nonce.is_empty(), "auth challenge captured");
    }

    /// `Authorization` header value for a request, or `None` before any
    /// challenge has been seen.
    pub fn authorization(&self, method: &str, uri: &str) -> Result<Option<String>> {
        if !self.is_negotiated() {
            return Ok(None);
        }

        if self.nonce.is_empty() {
            return Ok(Some(format!(
                "Basic {}",
                make_basic_response(&self.username, &self.password)
            )));
        }

        let response = make_digest_response(
            &self.realm,
            method,
            uri,
            &self.nonce,
            &self.username,
            &self.password,
        )?;
        Ok(Some(format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
            self.username, self.realm, self.nonce, uri, response
        )))
    }
}
