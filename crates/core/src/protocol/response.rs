/// Status returned by [`check_response`] when the status line is unreadable.
pub const STATUS_NOT_IMPLEMENTED: u16 = 501;
pub const STATUS_OK: u16 = 200;
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// A received RTSP response head (RFC 2326 §7).
///
/// ```text
/// RTSP/1.0 200 OK\r\n
/// CSeq: 3\r\n
/// Session: 12345678;timeout=60\r\n
/// \r\n
/// ```
///
/// The head is parsed here; a body announced by `Content-Length` is read
/// separately by the control connection and attached to
/// [`body`](Self::body). Header lookup is case-insensitive per RFC 2326 §4.2.
#[derive(Debug, Clone)]
pub struct RtspResponse {
    pub status_code: u16,
    pub reason: String,
    /// Headers as ordered (name, value) pairs, names stored as received.
    pub headers: Vec<(String, String)>,
    /// The raw head text, status line through the blank line.
    pub raw: String,
    pub body: Vec<u8>,
}

impl RtspResponse {
    /// Parse a response head. Never fails: an unreadable status line yields
    /// [`STATUS_NOT_IMPLEMENTED`], and lines without a colon are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut lines = raw.lines();
        let (status_code, reason) = lines
            .next()
            .and_then(parse_status_line)
            .unwrap_or_else(|| {
                tracing::warn!(
                    line = raw.lines().next().unwrap_or(""),
                    "unreadable RTSP status line"
                );
                (STATUS_NOT_IMPLEMENTED, String::new())
            });

        let headers = lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        RtspResponse {
            status_code,
            reason,
            headers,
            raw: raw.to_string(),
            body: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == STATUS_OK
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body length announced by `Content-Length` (RFC 2326 §12.14).
    pub fn content_length(&self) -> Option<usize> {
        self.get_header("Content-Length")?.parse().ok()
    }

    pub fn cseq(&self) -> Option<u32> {
        self.get_header("CSeq")?.parse().ok()
    }
}

/// Extract the status code from `RTSP/<major>.<minor> <code> <reason>`.
///
/// Returns [`STATUS_NOT_IMPLEMENTED`] when the text does not start with a
/// well-formed status line; callers compare against the codes they need.
pub fn check_response(text: &str) -> u16 {
    text.lines()
        .next()
        .and_then(parse_status_line)
        .map(|(code, _)| code)
        .unwrap_or(STATUS_NOT_IMPLEMENTED)
}

fn parse_status_line(line: &str) -> Option<(u16, String)> {
    let rest = line.strip_prefix("RTSP/")?;
    let (version, rest) = rest.split_once(char::is_whitespace)?;
    let (major, minor) = version.split_once('.')?;
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_number(major) || !is_number(minor) {
        return None;
    }

    let rest = rest.trim_start();
    let (code, reason) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if !is_number(code) {
        return None;
    }
    Some((code.parse().ok()?, reason.trim().to_string()))
}
