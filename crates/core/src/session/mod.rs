//! Client-side RTSP session bookkeeping (RFC 2326 §3, §12.37).
//!
//! The server creates a session on SETUP and returns its id in the
//! `Session` header, optionally with a timeout:
//!
//! ```text
//! Session: 1F3A2B;timeout=60
//! ```
//!
//! The id and timeout are stored on each media of the parsed SDP (see
//! [`crate::protocol::sdp::MediaDescription`]). Every later PLAY, PAUSE,
//! GET_PARAMETER and TEARDOWN for that media echoes the id back, and the
//! client must issue some request before the timeout expires.
//!
//! ## Client lifecycle (RFC 2326 §A.1)
//!
//! ```text
//! OPTIONS   Unconnected -> Connected
//! DESCRIBE  Connected   -> Described
//! SETUP     Described   -> Ready
//! PLAY      Ready       -> Playing
//! PAUSE     Playing     -> Paused
//! PLAY      Paused      -> Playing
//! TEARDOWN  *           -> TornDown
//! ```

pub mod transport;

pub use transport::{Endpoint, TransportHeader, TransportMode};

/// Session timeout assumed when `Session` carries no `;timeout=` (RFC 2326 §12.37).
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30;

/// Where the client stands in the RTSP handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    /// Control connection open and OPTIONS answered.
    Connected,
    /// SDP received and parsed.
    Described,
    /// At least one media has a session id.
    Ready,
    Playing,
    Paused,
    TornDown,
}
