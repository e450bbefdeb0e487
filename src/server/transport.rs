//! TCP transport: the listener, the one-shot exchange, and the bounded
//! request-head reader.
//!
//! Every accepted connection carries exactly one request and one
//! response. The head is read and validated on the accept thread; only a
//! request whose head parses reaches the simulation thread, so handler
//! code never sees a protocol fault.

use crate::http::response::{self, Status};
use memchr::memmem;
use serde_json::json;
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    error, fmt, io,
    io::{Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::atomic::{AtomicBool, Ordering},
};

// EXCHANGE

/// One request/response round trip, abstracted away from the socket.
///
/// The request line fields are available up front; the body is pulled on
/// demand by the handler that needs it. `send` consumes the response
/// side; an exchange is done after one send.
pub trait Exchange: Send {
    /// The raw request method token, when the transport conveyed one.
    fn method(&self) -> Option<&str>;

    /// The raw request path, when the transport conveyed one.
    fn path(&self) -> Option<&str>;

    /// The raw query string; empty when the request target had none.
    fn query(&self) -> &str;

    /// Reads the next chunk of the request body. A return of `0` means
    /// the body is exhausted.
    fn read_body(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes the complete encoded response.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
}

// REQUEST HEAD

/// The parsed request line and the one header this API cares about,
/// read within a fixed byte bound.
pub(crate) struct RequestHead {
    method: String,
    path: String,
    query: String,
    content_length: usize,
    /// Body bytes that arrived in the same reads as the head.
    leftover: Vec<u8>,
}

impl RequestHead {
    /// Reads from `stream` until the blank line that ends the head, then
    /// parses the request line and `content-length`.
    ///
    /// At most `head_size` bytes are consumed; a head that fills the
    /// whole bound is rejected rather than parsed from a truncation.
    pub(crate) fn read(stream: &mut TcpStream, head_size: usize) -> Result<Self, HeadError> {
        let mut data = vec![0u8; head_size];
        let mut len = 0usize;
        let finder = memmem::Finder::new(b"\r\n\r\n");

        let boundary = loop {
            if let Some(pos) = finder.find(&data[..len]) {
                break pos;
            }
            if len == head_size {
                return Err(HeadError::TooLarge);
            }

            let read = stream.read(&mut data[len..])?;
            if read == 0 {
                return Err(HeadError::Truncated);
            }
            len += read;
        };

        let head = simdutf8::basic::from_utf8(&data[..boundary])
            .map_err(|_| HeadError::Malformed)?;
        let mut lines = head.split("\r\n");

        // request-line = method SP request-target SP HTTP-version
        let request_line = lines.next().unwrap_or("");
        let mut words = request_line.split(' ');
        let (method, target, version) = match (words.next(), words.next(), words.next()) {
            (Some(method), Some(target), Some(version)) if words.next().is_none() => {
                (method, target, version)
            }
            _ => return Err(HeadError::Malformed),
        };
        if !version.starts_with("HTTP/1.") {
            return Err(HeadError::UnsupportedVersion);
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        let mut content_length = 0usize;
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value
                    .trim()
                    .parse()
                    .map_err(|_| HeadError::InvalidContentLength)?;
            }
        }

        Ok(Self {
            method: method.to_owned(),
            path: path.to_owned(),
            query: query.to_owned(),
            content_length,
            leftover: data[boundary + 4..len].to_vec(),
        })
    }
}

/// Why a request head could not be read off the wire.
#[derive(Debug)]
pub(crate) enum HeadError {
    /// The connection closed before the head-terminating blank line.
    Truncated,
    /// The head reached the configured size bound.
    TooLarge,
    /// The head is not UTF-8 or the request line has the wrong shape.
    Malformed,
    /// The request line named an HTTP version other than 1.x.
    UnsupportedVersion,
    /// `content-length` is present but not a non-negative integer.
    InvalidContentLength,
    /// The socket failed mid-read.
    Io(io::Error),
}

impl HeadError {
    /// The canned response answered directly from the accept thread.
    pub(crate) fn to_response(&self) -> Vec<u8> {
        let (status, message) = match self {
            HeadError::TooLarge => (
                Status::HeaderFieldsTooLarge,
                "The request head is too large.",
            ),
            _ => (Status::BadRequest, "Unable to parse the request head."),
        };

        response::encode(status, Some(&json!({ "message": message })))
    }
}

impl error::Error for HeadError {}

impl fmt::Display for HeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadError::Truncated => write!(f, "connection closed before the head ended"),
            HeadError::TooLarge => write!(f, "request head reached the size bound"),
            HeadError::Malformed => write!(f, "request head is malformed"),
            HeadError::UnsupportedVersion => write!(f, "unsupported protocol version"),
            HeadError::InvalidContentLength => write!(f, "invalid content-length header"),
            HeadError::Io(err) => write!(f, "failed reading the request head: {err}"),
        }
    }
}

impl From<io::Error> for HeadError {
    fn from(err: io::Error) -> Self {
        HeadError::Io(err)
    }
}

// HTTP EXCHANGE

/// A live TCP connection with its head already parsed.
pub(crate) struct HttpExchange {
    stream: TcpStream,
    head: RequestHead,
    consumed: usize,
}

impl HttpExchange {
    pub(crate) fn new(stream: TcpStream, head: RequestHead) -> Self {
        Self {
            stream,
            head,
            consumed: 0,
        }
    }
}

impl Exchange for HttpExchange {
    fn method(&self) -> Option<&str> {
        Some(&self.head.method)
    }

    fn path(&self) -> Option<&str> {
        Some(&self.head.path)
    }

    fn query(&self) -> &str {
        &self.head.query
    }

    fn read_body(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.head.content_length.saturating_sub(self.consumed);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = remaining.min(buf.len());

        // bytes past the head boundary were already read off the socket
        let read = if self.consumed < self.head.leftover.len() {
            let available = &self.head.leftover[self.consumed..];
            let take = want.min(available.len());
            buf[..take].copy_from_slice(&available[..take]);
            take
        } else {
            self.stream.read(&mut buf[..want])?
        };

        self.consumed += read;
        Ok(read)
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;

        // consume the unread remainder of the declared body, otherwise
        // closing the socket can reset the connection under a response
        // the client has not read yet
        let mut sink = [0u8; 512];
        while self.consumed < self.head.content_length {
            match self.read_body(&mut sink) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }

        Ok(())
    }
}

/// Answers a connection that never produced a valid head, then closes
/// it. How much unread input is pending is unknown here, so the drain
/// is capped by a read timeout instead of a byte count.
pub(crate) fn reject(mut stream: TcpStream, response: &[u8]) {
    let _ = stream.write_all(response);
    let _ = stream.flush();
    let _ = stream.shutdown(std::net::Shutdown::Write);

    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let mut sink = [0u8; 512];
    while matches!(stream.read(&mut sink), Ok(read) if read > 0) {}
}

// ACCEPTOR

/// The listening socket plus the flag that lets another thread break a
/// blocked `accept` call.
pub(crate) struct HttpAcceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
    stopping: AtomicBool,
}

impl HttpAcceptor {
    /// Binds and starts listening on `addr`.
    pub(crate) fn bind(addr: SocketAddr, backlog: i32) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(backlog)?;

        let listener: TcpListener = socket.into();
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            stopping: AtomicBool::new(false),
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Blocks until the next connection arrives.
    pub(crate) fn accept(&self) -> io::Result<TcpStream> {
        let (stream, _) = self.listener.accept()?;
        Ok(stream)
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Raises the stop flag and pokes the listener so a blocked `accept`
    /// returns. The woken accept loop sees the flag and exits instead of
    /// treating the poke as a request.
    pub(crate) fn interrupt(&self) {
        self.stopping.store(true, Ordering::Release);
        // a local connection is the portable way to wake accept(); if it
        // fails the loop still exits on the next arrival
        let _ = TcpStream::connect(self.local_addr);
    }
}

// TESTING
