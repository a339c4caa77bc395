//! SDP (Session Description Protocol) parsing (RFC 4566 / RFC 8866).
//!
//! Turns the body of a DESCRIBE response into a [`SessionDescription`]:
//!
//! ```text
//! v=0                                          ← protocol version
//! o=<user> <sess-id> <sess-ver> IN IP4 <addr>  ← origin
//! s=<session-name>                              ← session name
//! t=0 0                                         ← timing
//! a=control:*                                   ← session control URL
//! m=video 0 RTP/AVP 96                          ← media description
//! c=IN IP4 0.0.0.0                              ← media connection
//! a=rtpmap:96 H264/90000                        ← codec/clock rate
//! a=control:trackID=1                           ← track control URL
//! ```
//!
//! Parsing is tolerant: unknown keys and lines that do not fit the
//! `<letter>=<value>` grammar are skipped, never rejected.

use crate::session::DEFAULT_SESSION_TIMEOUT_SECS;
use crate::session::transport::{Endpoint, TransportHeader, TransportMode};

/// `<nettype> <addrtype> <address>` triple from `o=` and `c=` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    pub net_type: String,
    pub addr_type: String,
    pub address: String,
}

/// Origin (`o=`) and contact email (`e=`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    pub owner: String,
    pub id: String,
    pub version: String,
    pub email: String,
    pub network: Network,
}

/// Session active time from `t=<start> <stop>`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActiveTime {
    pub start: f64,
    pub stop: f64,
}

/// One `m=` section plus the state SETUP attaches to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescription {
    /// `audio`, `video`, `application`, ...
    pub media_type: String,
    pub port: u16,
    /// Transport profile, e.g. `RTP/AVP`.
    pub transport: String,
    /// First payload type listed on the `m=` line.
    pub format: u8,
    pub codec: String,
    /// RTP clock rate in Hz, 0 until an `a=rtpmap` provides it.
    pub time_rate: u32,
    /// `a=control` value, relative or absolute.
    pub control: String,
    pub connection: Network,
    /// Server-assigned session id, empty until SETUP succeeds.
    pub session: String,
    pub timeout: u64,
    pub client: Endpoint,
    pub server: Endpoint,
    /// `interleaved=<rtp>-<rtcp>` channels confirmed by the server.
    pub interleaved: Option<(u8, u8)>,
    /// Transport negotiated by SETUP.
    pub negotiated: Option<TransportMode>,
}

impl MediaDescription {
    fn new(media_type: &str) -> Self {
        Self {
            media_type: media_type.to_string(),
            port: 0,
            transport: String::new(),
            format: 0,
            codec: String::new(),
            time_rate: 0,
            control: String::new(),
            connection: Network::default(),
            session: String::new(),
            timeout: DEFAULT_SESSION_TIMEOUT_SECS,
            client: Endpoint::default(),
            server: Endpoint::default(),
            interleaved: None,
            negotiated: None,
        }
    }

    pub fn is_setup(&self) -> bool {
        !self.session.is_empty()
    }

    /// Record session id, timeout and server transport from a SETUP reply.
    ///
    /// The first `Session:` header sets the id and timeout (30s when no
    /// `;timeout=` is given); the first `Transport:` header sets the server
    /// endpoint and interleaved channels. Later duplicates are ignored.
    pub fn apply_setup_response(&mut self, setup_response: &str) {
        let mut session_seen = false;
        let mut transport_seen = false;

        for line in setup_response.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();

            if !session_seen && name.eq_ignore_ascii_case("Session") {
                session_seen = true;
                let mut parts = value.split(';');
                self.session = parts.next().unwrap_or_default().trim().to_string();
                self.timeout = parts
                    .filter_map(|p| p.trim().strip_prefix("timeout="))
                    .find_map(|t| t.parse().ok())
                    .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS);
            } else if !transport_seen && name.eq_ignore_ascii_case("Transport") {
                transport_seen = true;
                let header = TransportHeader::parse(value);
                if let Some(source) = header.source {
                    self.server.address = source;
                }
                if let Some((rtp, rtcp)) = header.server_ports {
                    self.server.rtp_port = rtp;
                    self.server.rtcp_port = rtcp;
                }
                if header.interleaved.is_some() {
                    self.interleaved = header.interleaved;
                }
            }

            if session_seen && transport_seen {
                break;
            }
        }

        tracing::debug!(
            media_type = %self.media_type,
            session = %self.session,
            timeout = self.timeout,
            server_rtp = self.server.rtp_port,
            "media session info"
        );
    }
}

/// A parsed SDP session: session-level fields and media in `m=` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDescription {
    pub version: i32,
    pub owner: Owner,
    pub name: String,
    pub information: String,
    pub tool: String,
    pub session_type: String,
    pub control: String,
    pub connection: Network,
    pub time: ActiveTime,
    pub media: Vec<MediaDescription>,
}

/// Split `<letter>=<value>`; `None` for lines outside that grammar.
fn key_value(line: &str) -> Option<(u8, &str)> {
    let bytes = line.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b'=' {
        Some((bytes[0], &line[2..]))
    } else {
        None
    }
}

fn parse_network(value: &str) -> Network {
    let mut tokens = value.split_whitespace();
    Network {
        net_type: tokens.next().unwrap_or_default().to_string(),
        addr_type: tokens.next().unwrap_or_default().to_string(),
        address: tokens.next().unwrap_or_default().to_string(),
    }
}

/// Join a control attribute onto a base URI with exactly one `/`.
/// Absolute `rtsp://` controls pass through; `*` means the base itself.
pub fn join_control_uri(base: &str, control: &str) -> String {
    if control.starts_with("rtsp://") || control.starts_with("rtsps://") {
        return control.to_string();
    }
    if control.is_empty() || control == "*" {
        return base.to_string();
    }
    let control = control.trim_start_matches('/');
    if base.ends_with('/') {
        format!("{base}{control}")
    } else {
        format!("{base}/{control}")
    }
}

impl SessionDescription {
    /// Parse raw SDP text. Never fails; an SDP without `m=` lines yields an
    /// empty media list.
    pub fn parse(sdp: &str) -> Self {
        let mut session = SessionDescription::default();

        for line in sdp.lines() {
            let Some((key, value)) = key_value(line) else {
                continue;
            };

            match key {
                b'v' => session.version = value.trim().parse().unwrap_or(0),
                b'o' => session.parse_owner(value),
                b'e' => session.owner.email = value.to_string(),
                b's' => session.name = value.to_string(),
                b'i' => session.information = value.to_string(),
                b't' => {
                    let mut times = value.split_whitespace().map(|t| t.parse().unwrap_or(0.0));
                    session.time.start = times.next().unwrap_or(0.0);
                    session.time.stop = times.next().unwrap_or(0.0);
                }
                b'm' => session.parse_media_line(value),
                b'a' => session.parse_attribute(value),
                b'c' => match session.media.last_mut() {
                    Some(media) => media.connection = parse_network(value),
                    None => session.connection = parse_network(value),
                },
                _ => {}
            }
        }

        tracing::debug!(
            name = %session.name,
            media = session.media.len(),
            "parsed SDP"
        );
        session
    }

    /// Populate only the prefix of owner fields actually present.
    fn parse_owner(&mut self, value: &str) {
        let owner = &mut self.owner;
        for (i, token) in value.split_whitespace().take(6).enumerate() {
            let field = match i {
                0 => &mut owner.owner,
                1 => &mut owner.id,
                2 => &mut owner.version,
                3 => &mut owner.network.net_type,
                4 => &mut owner.network.addr_type,
                _ => &mut owner.network.address,
            };
            *field = token.to_string();
        }
    }

    fn parse_media_line(&mut self, value: &str) {
        let mut tokens = value.split_whitespace();
        let mut media = MediaDescription::new(tokens.next().unwrap_or_default());
        if let Some(port) = tokens.next() {
            // `<port>/<count>` is allowed; only the base port is kept.
            let port = port.split('/').next().unwrap_or(port);
            media.port = port.parse().unwrap_or(0);
        }
        if let Some(transport) = tokens.next() {
            media.transport = transport.to_string();
        }
        if let Some(format) = tokens.next() {
            media.format = format.parse().unwrap_or(0);
        }
        self.media.push(media);
    }

    fn parse_attribute(&mut self, value: &str) {
        let Some(media) = self.media.last_mut() else {
            if let Some(control) = value.strip_prefix("control:") {
                self.control = control.to_string();
            } else if let Some(tool) = value.strip_prefix("tool:") {
                self.tool = tool.to_string();
            } else if let Some(session_type) = value.strip_prefix("type:") {
                self.session_type = session_type.to_string();
            }
            return;
        };

        if let Some(rtpmap) = value.strip_prefix("rtpmap:") {
            // rtpmap:<fmt> <codec>/<clock>[/<channels>]
            if let Some(encoding) = rtpmap.split_whitespace().nth(1) {
                let mut parts = encoding.split('/');
                media.codec = parts.next().unwrap_or_default().to_string();
                if let Some(rate) = parts.next() {
                    media.time_rate = rate.parse().unwrap_or(0);
                }
            }
        } else if let Some(control) = value.strip_prefix("control:") {
            media.control = control.to_string();
        }
    }

    pub fn media(&self) -> &[MediaDescription] {
        &self.media
    }

    /// First media whose type matches.
    pub fn find_media(&self, media_type: &str) -> Option<&MediaDescription> {
        self.media.iter().find(|m| m.media_type == media_type)
    }

    pub fn find_media_mut(&mut self, media_type: &str) -> Option<&mut MediaDescription> {
        self.media.iter_mut().find(|m| m.media_type == media_type)
    }

    /// Position of the first media whose type matches.
    pub fn media_index(&self, media_type: &str) -> Option<usize> {
        self.media.iter().position(|m| m.media_type == media_type)
    }

    /// Record the locally probed client RTP/RTCP ports for a media.
    pub fn parse_media_rtp_port(&mut self, media_type: &str, rtp_port: u16, rtcp_port: u16) {
        if let Some(index) = self.media_index(media_type) {
            self.parse_media_rtp_port_at(index, rtp_port, rtcp_port);
        }
    }

    pub fn parse_media_rtp_port_at(&mut self, index: usize, rtp_port: u16, rtcp_port: u16) {
        if let Some(media) = self.media.get_mut(index) {
            media.client.rtp_port = rtp_port;
            media.client.rtcp_port = rtcp_port;
        }
    }

    /// Extract `Session` and `Transport` from a SETUP response head into
    /// the first media of `media_type`. See
    /// [`MediaDescription::apply_setup_response`].
    pub fn parse_media_session_info(&mut self, media_type: &str, setup_response: &str) {
        if let Some(index) = self.media_index(media_type) {
            self.parse_media_session_info_at(index, setup_response);
        }
    }

    /// Same as [`parse_media_session_info`](Self::parse_media_session_info)
    /// for the media at `index`, so repeated media types stay distinct.
    pub fn parse_media_session_info_at(&mut self, index: usize, setup_response: &str) {
        if let Some(media) = self.media.get_mut(index) {
            media.apply_setup_response(setup_response);
        }
    }

    /// Aggregate control URI for session-wide requests.
    pub fn session_control_uri(&self, base: &str) -> String {
        join_control_uri(base, &self.control)
    }

    /// Control URI for SETUP of a media, or `None` if the type is unknown.
    pub fn media_control_uri(&self, media_type: &str, base: &str) -> Option<String> {
        self.find_media(media_type)
            .map(|media| join_control_uri(base, &media.control))
    }

    pub fn media_session_id(&self, media_type: &str) -> Option<&str> {
        self.find_media(media_type)
            .map(|m| m.session.as_str())
            .filter(|s| !s.is_empty())
    }
}
