use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use base64::prelude::{BASE64_STANDARD, Engine as _};

use crate::error::{ParseErrorKind, Result, RtspError};

/// Socket options shared by the control connection and both tunnel halves.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub max_header_len: usize,
}

/// Write half of the control channel.
///
/// Plain connections write RTSP text as-is; the POST half of an HTTP
/// tunnel carries it base64-encoded.
#[derive(Debug)]
pub struct ControlWriter {
    stream: TcpStream,
    tunnelled: bool,
}

impl ControlWriter {
    pub fn new(stream: TcpStream, tunnelled: bool) -> Self {
        Self { stream, tunnelled }
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let result = if self.tunnelled {
            write_all_retrying(&mut self.stream, BASE64_STANDARD.encode(bytes).as_bytes())
        } else {
            write_all_retrying(&mut self.stream, bytes)
        };
        result.map_err(RtspError::Send)
    }

    pub fn is_tunnelled(&self) -> bool {
        self.tunnelled
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            stream: self.stream.try_clone().map_err(RtspError::SocketInit)?,
            tunnelled: self.tunnelled,
        })
    }

    fn shutdown(&self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}

/// The RTSP control channel: a TCP connection, or a GET/POST tunnel pair.
///
/// Requests go out through the [`ControlWriter`]; response heads are read
/// line by line from a buffered reader until the blank line. The reader
/// can be handed to an interleaved RTP receiver with
/// [`detach_reader`](Self::detach_reader), after which requests are still
/// sent but responses are no longer read here.
#[derive(Debug)]
pub struct ControlConnection {
    reader: Option<BufReader<TcpStream>>,
    writer: ControlWriter,
    peer_addr: SocketAddr,
    max_header_len: usize,
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(RtspError::SocketInit)?
        .next()
        .ok_or_else(|| {
            RtspError::SocketInit(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address for {host}:{port}"),
            ))
        })
}

fn open_stream(addr: SocketAddr, options: &ConnectOptions) -> Result<TcpStream> {
    let stream = match options.connect_timeout {
        Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
        None => TcpStream::connect(addr),
    }
    .map_err(RtspError::SocketConnect)?;

    stream
        .set_read_timeout(options.read_timeout)
        .map_err(RtspError::SocketInit)?;
    stream.set_nodelay(true).map_err(RtspError::SocketInit)?;
    Ok(stream)
}

impl ControlConnection {
    /// Open a plain RTSP control connection.
    pub fn connect(host: &str, port: u16, options: &ConnectOptions) -> Result<Self> {
        let addr = resolve(host, port)?;
        let stream = open_stream(addr, options)?;
        let reader = stream.try_clone().map_err(RtspError::SocketInit)?;

        tracing::info!(%addr, "RTSP connection established");

        Ok(Self {
            reader: Some(BufReader::new(reader)),
            writer: ControlWriter::new(stream, false),
            peer_addr: addr,
            max_header_len: options.max_header_len,
        })
    }

    /// Open an RTSP-over-HTTP tunnel.
    ///
    /// ```text
    /// GET  <resource> HTTP/1.1   server -> client: responses and RTP
    /// POST <resource> HTTP/1.1   client -> server: base64 requests
    /// ```
    ///
    /// Both halves share a random `x-sessioncookie`. The GET reply head must
    /// be `HTTP/1.x 200`; the POST is never answered.
    pub fn tunnel(
        host: &str,
        port: u16,
        resource: &str,
        user_agent: &str,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let addr = resolve(host, port)?;
        let cookie = format!("{:032x}", rand::random::<u128>());

        let mut get = open_stream(addr, options)?;
        let get_request = format!(
            "GET {resource} HTTP/1.1\r\n\
             User-Agent: {user_agent}\r\n\
             x-sessioncookie: {cookie}\r\n\
             Accept: application/x-rtsp-tunnelled\r\n\
             Pragma: no-cache\r\n\
             Cache-Control: no-cache\r\n\r\n"
        );
        write_all_retrying(&mut get, get_request.as_bytes()).map_err(RtspError::Send)?;

        let mut reader = BufReader::new(get);
        let reply = read_head(&mut reader, options.max_header_len)?;
        if !tunnel_accepted(&reply) {
            tracing::warn!(
                status_line = reply.lines().next().unwrap_or(""),
                "HTTP tunnel refused"
            );
            return Err(RtspError::Parse {
                kind: ParseErrorKind::TunnelRejected,
            });
        }

        let mut post = open_stream(addr, options)?;
        let post_request = format!(
            "POST {resource} HTTP/1.1\r\n\
             User-Agent: {user_agent}\r\n\
             x-sessioncookie: {cookie}\r\n\
             Content-Type: application/x-rtsp-tunnelled\r\n\
             Pragma: no-cache\r\n\
             Cache-Control: no-cache\r\n\
             Content-Length: 32767\r\n\
             Expires: Sun, 9 Jan 1972 00:00:00 GMT\r\n\r\n"
        );
        write_all_retrying(&mut post, post_request.as_bytes()).map_err(RtspError::Send)?;

        tracing::info!(%addr, "RTSP over HTTP tunnel established");

        Ok(Self {
            reader: Some(reader),
            writer: ControlWriter::new(post, true),
            peer_addr: addr,
            max_header_len: options.max_header_len,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn is_tunnelled(&self) -> bool {
        self.writer.tunnelled
    }

    pub fn send(&mut self, request: &str) -> Result<()> {
        self.writer.send(request.as_bytes())
    }

    /// Read one response head, status line through the blank line.
    pub fn receive_head(&mut self) -> Result<String> {
        let reader = self.reader.as_mut().ok_or_else(|| {
            RtspError::Receive(io::Error::new(
                io::ErrorKind::NotConnected,
                "control stream is owned by an RTP receiver",
            ))
        })?;
        skip_interleaved_frames(reader).map_err(RtspError::Receive)?;
        read_head(reader, self.max_header_len)
    }

    /// Read exactly `len` body bytes following a response head.
    pub fn receive_body(&mut self, len: usize) -> Result<Vec<u8>> {
        let reader = self.reader.as_mut().ok_or_else(|| {
            RtspError::BodyReceive(io::Error::new(
                io::ErrorKind::NotConnected,
                "control stream is owned by an RTP receiver",
            ))
        })?;
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).map_err(RtspError::BodyReceive)?;
        Ok(body)
    }

    pub fn is_reader_attached(&self) -> bool {
        self.reader.is_some()
    }

    /// Hand the read side to an RTP receiver.
    ///
    /// Returns bytes already buffered past the last response head together
    /// with the stream, whose read timeout is set to `poll_interval`.
    pub fn detach_reader(&mut self, poll_interval: Duration) -> Option<(Vec<u8>, TcpStream)> {
        let reader = self.reader.take()?;
        let buffered = reader.buffer().to_vec();
        let stream = reader.into_inner();
        if let Err(e) = stream.set_read_timeout(Some(poll_interval)) {
            tracing::warn!(error = %e, "could not set interleaved read timeout");
        }
        tracing::debug!(buffered = buffered.len(), "control stream handed to RTP receiver");
        Some((buffered, stream))
    }

    pub fn try_clone_writer(&self) -> Result<ControlWriter> {
        self.writer.try_clone()
    }

    pub fn shutdown(&mut self) {
        self.writer.shutdown();
        if let Some(reader) = self.reader.take() {
            let _ = reader.get_ref().shutdown(std::net::Shutdown::Both);
        }
        tracing::info!(peer = %self.peer_addr, "RTSP connection closed");
    }
}

fn tunnel_accepted(reply: &str) -> bool {
    let mut parts = reply.split_whitespace();
    matches!(
        (parts.next(), parts.next()),
        (Some(version), Some("200")) if version.starts_with("HTTP/1.")
    )
}

/// Write the whole buffer, retrying interrupted and would-block writes.
pub fn write_all_retrying(stream: &mut impl Write, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match stream.write(buf) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => buf = &buf[n..],
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) => {}
            Err(e) => return Err(e),
        }
    }
    stream.flush()
}

/// Accumulate lines until the blank line ending a head.
fn read_head(reader: &mut impl BufRead, max_len: usize) -> Result<String> {
    let mut head = String::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                return Err(RtspError::Receive(io::ErrorKind::UnexpectedEof.into()));
            }
            Ok(_) => {
                // Tolerate stray line breaks between messages.
                if head.is_empty() && line.trim().is_empty() {
                    continue;
                }
                head.push_str(&line);
                if line == "\r\n" || line == "\n" {
                    return Ok(head);
                }
                if head.len() > max_len {
                    return Err(RtspError::Receive(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "response head too long",
                    )));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(RtspError::Receive(e)),
        }
    }
}

/// Discard `$`-framed data that arrives ahead of a response head.
fn skip_interleaved_frames(reader: &mut impl BufRead) -> io::Result<()> {
    loop {
        if reader.fill_buf()?.first() != Some(&b'$') {
            return Ok(());
        }
        let mut header = [0u8; 4];
        reader.read_exact(&mut header)?;
        let len = u16::from_be_bytes([header[2], header[3]]) as u64;
        io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
        tracing::trace!(channel = header[1], len, "skipped interleaved frame");
    }
}
