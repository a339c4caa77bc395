//! Error types for the RTSP client library.

use std::fmt;

/// Errors that can occur in the RTSP client library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **URI**: [`InvalidUri`](Self::InvalidUri).
/// - **Control socket**: [`SocketInit`](Self::SocketInit),
///   [`SocketConnect`](Self::SocketConnect), [`Send`](Self::Send),
///   [`Receive`](Self::Receive), [`BodyReceive`](Self::BodyReceive).
/// - **Authentication**: [`MissingCredentials`](Self::MissingCredentials),
///   [`AuthNegotiationFailed`](Self::AuthNegotiationFailed).
/// - **Protocol**: [`SdpBodyLengthMissing`](Self::SdpBodyLengthMissing),
///   [`UnexpectedStatus`](Self::UnexpectedStatus), [`Parse`](Self::Parse).
/// - **Session**: [`InvalidMediaSession`](Self::InvalidMediaSession),
///   [`NotConnected`](Self::NotConnected),
///   [`UnknownClockRate`](Self::UnknownClockRate).
/// - **RTP**: [`PortRangeExhausted`](Self::PortRangeExhausted),
///   [`Rtp`](Self::Rtp).
#[derive(Debug, thiserror::Error)]
pub enum RtspError {
    /// The URI does not match `rtsp://[user:password@]host[:port][/path]`.
    #[error("invalid RTSP URI: {0}")]
    InvalidUri(String),

    /// Address resolution or socket creation failed before connecting.
    #[error("socket init failed: {0}")]
    SocketInit(#[source] std::io::Error),

    /// TCP connect to the RTSP server (or HTTP tunnel) failed.
    #[error("connect failed: {0}")]
    SocketConnect(#[source] std::io::Error),

    /// Hard socket error while writing a request.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    /// Hard socket error while reading a response head.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    /// Short or failed read of a `Content-Length` body.
    #[error("body receive failed: {0}")]
    BodyReceive(#[source] std::io::Error),

    /// The server asked for credentials but the URI carried no username.
    #[error("server requires authentication but no username was given")]
    MissingCredentials,

    /// The request was still not accepted after attaching credentials.
    #[error("authentication negotiation failed (status {0})")]
    AuthNegotiationFailed(u16),

    /// DESCRIBE succeeded but the response had no `Content-Length`.
    #[error("DESCRIBE response has no Content-Length")]
    SdpBodyLengthMissing,

    /// Unknown media type, or a media that has not been SETUP yet.
    #[error("invalid media session: {0}")]
    InvalidMediaSession(String),

    /// No even/odd UDP port pair could be bound below 65535.
    #[error("no free RTP/RTCP port pair left")]
    PortRangeExhausted,

    /// The server answered with a status other than the one required.
    #[error("unexpected RTSP status {0}")]
    UnexpectedStatus(u16),

    /// A control request was issued before OPTIONS opened the connection.
    #[error("not connected to an RTSP server")]
    NotConnected,

    /// The media's `a=rtpmap` did not carry a clock rate.
    #[error("clock rate unknown for media: {0}")]
    UnknownClockRate(String),

    /// RTP receiver socket setup or teardown failure.
    #[error("RTP transport error: {0}")]
    Rtp(#[source] std::io::Error),

    /// Malformed RTP packet or tunnel reply.
    #[error("parse error: {kind}")]
    Parse { kind: ParseErrorKind },
}

/// Specific kind of parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Fewer bytes than the RTP fixed header plus declared CSRCs/extension.
    TruncatedRtpPacket,
    /// RTP version field was not 2.
    BadRtpVersion,
    /// Padding length exceeded the payload.
    BadRtpPadding,
    /// HTTP tunnel GET reply was not `HTTP/1.x 200`.
    TunnelRejected,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedRtpPacket => write!(f, "truncated RTP packet"),
            Self::BadRtpVersion => write!(f, "RTP version is not 2"),
            Self::BadRtpPadding => write!(f, "invalid RTP padding"),
            Self::TunnelRejected => write!(f, "HTTP tunnel rejected"),
        }
    }
}

/// Convenience alias for `Result<T, RtspError>`.
pub type Result<T> = std::result::Result<T, RtspError>;
