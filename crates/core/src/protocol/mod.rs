//! RTSP protocol implementation (RFC 2326), client side.
//!
//! Text-level building blocks: URIs, outgoing requests, incoming response
//! heads, authentication challenges and SDP bodies. Nothing here touches a
//! socket; [`crate::client::RtspClient`] wires them to the transport layer.
//!
//! ## RTSP message format (RFC 2326 §4)
//!
//! ```text
//! DESCRIBE rtsp://server/stream RTSP/1.0\r\n
//! CSeq: 2\r\n
//! User-Agent: rtsp-rs-client/0.1\r\n
//! Accept: application/sdp\r\n
//! \r\n
//! ```
//!
//! ## Methods issued
//!
//! | Method | RFC section | Purpose |
//! |--------|-------------|---------|
//! | OPTIONS | §10.1 | Open the connection, capability probe |
//! | DESCRIBE | §10.2 | Retrieve the SDP session description |
//! | SETUP | §10.4 | Negotiate transport per media |
//! | PLAY | §10.5 | Start media delivery |
//! | PAUSE | §10.6 | Suspend media delivery |
//! | GET_PARAMETER | §10.8 | Keepalive |
//! | TEARDOWN | §10.7 | Destroy the session |

pub mod auth;
pub mod request;
pub mod response;
pub mod sdp;
pub mod uri;

pub use auth::{AuthContext, Challenge};
pub use request::{Method, RtspRequest};
pub use response::{RtspResponse, check_response};
pub use sdp::{MediaDescription, SessionDescription};
pub use uri::RtspUri;
