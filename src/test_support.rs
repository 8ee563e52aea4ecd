//! Shared helpers for the test modules: in-memory connections and a
//! process-wide config guard.

use std::pin::Pin;
use std::sync::{Arc, Mutex, Once};

use async_std::io::{self, Cursor, Write};
use async_std::task::{Context, Poll};

use crate::config::{ServerConfig, set_config};
use crate::http::connection::{ConnReader, ConnWriter, HttpConnection};

static INIT: Once = Once::new();

pub fn init_config() {
    INIT.call_once(|| set_config(ServerConfig::default()));
}

/// Writer that hands everything written to it back to the test.
#[derive(Clone, Default)]
pub struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl SharedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// An in-memory connection reading from `data`, capturing all output.
pub fn mem_conn(data: &[u8]) -> (HttpConnection, SharedWriter) {
    init_config();
    let writer = SharedWriter::new();
    let reader: ConnReader = Box::new(Cursor::new(data.to_vec()));
    let conn = HttpConnection::new(reader, Box::new(writer.clone()) as ConnWriter);
    (conn, writer)
}
