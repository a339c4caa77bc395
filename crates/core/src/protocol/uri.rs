use crate::error::{Result, RtspError};

/// Default RTSP control port (RFC 2326 §3.2).
pub const DEFAULT_RTSP_PORT: u16 = 554;

const SCHEME: &str = "rtsp://";

/// A parsed `rtsp://[user:password@]host[:port][/path]` URI.
///
/// Embedded credentials are split off during parsing; [`uri`](Self::uri) is
/// the credential-free form used on request lines and in Digest `uri=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspUri {
    /// Credential-free URI, path and query preserved verbatim.
    pub uri: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    /// Everything after the authority, including the leading `/` (may be empty).
    pub path: String,
}

impl RtspUri {
    /// Parse with the standard default port of 554.
    pub fn parse(uri: &str) -> Result<Self> {
        Self::parse_with_default_port(uri, DEFAULT_RTSP_PORT)
    }

    pub fn parse_with_default_port(uri: &str, default_port: u16) -> Result<Self> {
        let rest = uri
            .strip_prefix(SCHEME)
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| RtspError::InvalidUri(uri.to_string()))?;

        // Credentials live in the authority only; an `@` in the path is data.
        let authority_end = rest.find('/').unwrap_or(rest.len());
        let (username, password, rest) = match rest[..authority_end].rfind('@') {
            Some(at) => match rest[..at].split_once(':') {
                Some((user, pass)) if !user.is_empty() => (
                    Some(user.to_string()),
                    Some(pass.to_string()),
                    &rest[at + 1..],
                ),
                _ => (None, None, rest),
            },
            None => (None, None, rest),
        };

        let (authority, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, ""),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| RtspError::InvalidUri(uri.to_string()))?;
                (host, port)
            }
            None => (authority, default_port),
        };

        if host.is_empty() {
            return Err(RtspError::InvalidUri(uri.to_string()));
        }

        Ok(Self {
            uri: format!("{SCHEME}{rest}"),
            username,
            password,
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// Request path for the HTTP tunnel GET/POST lines (`/` when empty).
    pub fn resource(&self) -> &str {
        if self.path.is_empty() { "/" } else { &self.path }
    }
}
