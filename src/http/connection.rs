//! Per-connection reader/writer pair.
//!
//! A connection owns the pushback reader the request parser and body
//! readers share, plus the writer responses go out on. When backed by a
//! real socket it also keeps the [`TcpStream`] handle so static-file
//! serving can hand the raw fd to `sendfile(2)` and `close()` can shut the
//! write side down. Tests build connections over in-memory streams
//! instead.

use std::net::Shutdown;
use std::os::unix::io::{AsRawFd, RawFd};

use async_std::io::{self, BufRead, BufReader, Write};
use async_std::net::TcpStream;
use async_std::prelude::*;
use log::debug;

use crate::io::BufferedReader;

pub type ConnReader = Box<dyn BufRead + Unpin + Send>;
pub type ConnWriter = Box<dyn Write + Unpin + Send>;

pub struct HttpConnection {
    reader: BufferedReader<ConnReader>,
    writer: ConnWriter,
    stream: Option<TcpStream>,
    closed: bool,
}

impl HttpConnection {
    /// Connection over arbitrary streams, not backed by a socket.
    pub fn new(reader: ConnReader, writer: ConnWriter) -> Self {
        Self {
            reader: BufferedReader::new(reader),
            writer,
            stream: None,
            closed: false,
        }
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let reader: ConnReader = Box::new(BufReader::new(stream.clone()));
        let writer: ConnWriter = Box::new(stream.clone());
        Self {
            reader: BufferedReader::new(reader),
            writer,
            stream: Some(stream),
            closed: false,
        }
    }

    pub fn reader(&mut self) -> &mut BufferedReader<ConnReader> {
        &mut self.reader
    }

    /// Writes `data` and flushes the writer.
    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await?;
        self.writer.flush().await
    }

    /// The socket fd, when this connection is backed by one.
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.stream.as_ref().map(|s| s.as_raw_fd())
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Shuts the write side down and marks the connection closed. Calling
    /// it again has no further effect.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.writer.flush().await {
            debug!("flush on close failed: {}", err);
        }
        if let Some(stream) = &self.stream {
            let _ = stream.shutdown(Shutdown::Write);
        }
        self.closed = true;
    }
}
