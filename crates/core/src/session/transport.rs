/// One side of an RTP/RTCP transport pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub rtp_port: u16,
    pub rtcp_port: u16,
}

/// How RTP travels for a media (RFC 2326 §10.12, §12.39).
///
/// Chosen once per SETUP and consulted afterwards for the `Transport`
/// request header, whether local ports must be probed, and which socket
/// the RTP receiver reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// RTP/RTCP over a client UDP port pair.
    Udp,
    /// `$`-framed RTP on the RTSP TCP connection.
    Interleaved,
    /// `$`-framed RTP on the GET half of an HTTP tunnel.
    HttpTunnel,
}

/// RTP and RTCP channels requested for interleaved transports.
pub const INTERLEAVED_CHANNELS: (u8, u8) = (0, 1);

impl TransportMode {
    /// Tunnelling wins over the per-call TCP preference.
    pub fn select(tunnelled: bool, rtp_over_tcp: bool) -> Self {
        if tunnelled {
            Self::HttpTunnel
        } else if rtp_over_tcp {
            Self::Interleaved
        } else {
            Self::Udp
        }
    }

    pub fn needs_port_negotiation(&self) -> bool {
        matches!(self, Self::Udp)
    }

    /// Value of the SETUP `Transport` header.
    ///
    /// ```
    /// use rtsp::session::transport::{Endpoint, TransportMode};
    ///
    /// let client = Endpoint { address: String::new(), rtp_port: 5000, rtcp_port: 5001 };
    /// assert_eq!(
    ///     TransportMode::Udp.setup_header("RTP/AVP", &client),
    ///     "RTP/AVP;unicast;client_port=5000-5001"
    /// );
    /// assert_eq!(
    ///     TransportMode::Interleaved.setup_header("RTP/AVP", &client),
    ///     "RTP/AVP/TCP;interleaved=0-1"
    /// );
    /// ```
    pub fn setup_header(&self, profile: &str, client: &Endpoint) -> String {
        match self {
            Self::Udp => format!(
                "{profile};unicast;client_port={}-{}",
                client.rtp_port, client.rtcp_port
            ),
            Self::Interleaved | Self::HttpTunnel => {
                let (rtp, rtcp) = INTERLEAVED_CHANNELS;
                format!("{profile}/TCP;interleaved={rtp}-{rtcp}")
            }
        }
    }
}

/// Server-side parameters from a SETUP response `Transport` header.
///
/// ```text
/// Transport: RTP/AVP;unicast;client_port=5000-5001;source=10.0.0.5;server_port=6970-6971
/// Transport: RTP/AVP/TCP;unicast;interleaved=0-1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportHeader {
    pub source: Option<String>,
    /// `(rtp, rtcp)`; a single `server_port=N` yields `(N, N + 1)`.
    pub server_ports: Option<(u16, u16)>,
    pub interleaved: Option<(u8, u8)>,
}

impl TransportHeader {
    /// Parse the semicolon-separated `Transport` header value.
    ///
    /// Unknown or malformed parameters are ignored.
    ///
    /// ```
    /// use rtsp::session::transport::TransportHeader;
    ///
    /// let th = TransportHeader::parse("RTP/AVP;unicast;server_port=6970-6971");
    /// assert_eq!(th.server_ports, Some((6970, 6971)));
    /// assert!(th.source.is_none());
    /// ```
    pub fn parse(header: &str) -> Self {
        let mut parsed = TransportHeader::default();

        for part in header.split(';') {
            let part = part.trim();
            if let Some(source) = part.strip_prefix("source=") {
                parsed.source = Some(source.to_string());
            } else if let Some(ports) = part.strip_prefix("server_port=") {
                parsed.server_ports = parse_pair(ports, |rtp: u16| rtp.checked_add(1));
            } else if let Some(channels) = part.strip_prefix("interleaved=") {
                parsed.interleaved = parse_pair(channels, |channel: u8| channel.checked_add(1));
            }
        }
        parsed
    }
}

/// Parse `a-b`, or a lone `a` completed by `second(a)`.
fn parse_pair<T: std::str::FromStr + Copy>(
    value: &str,
    second: impl Fn(T) -> Option<T>,
) -> Option<(T, T)> {
    match value.split_once('-') {
        Some((first, last)) => Some((first.trim().parse().ok()?, last.trim().parse().ok()?)),
        None => {
            let first = value.trim().parse().ok()?;
            Some((first, second(first)?))
        }
    }
}
