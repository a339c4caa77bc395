pub mod client;
pub mod error;
pub mod media;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::{ALL_MEDIA, ClientConfig, RtspClient};
pub use error::{ParseErrorKind, Result, RtspError};
pub use media::{PayloadQueue, RtpReceiver};
pub use protocol::{MediaDescription, SessionDescription};
pub use session::SessionState;
