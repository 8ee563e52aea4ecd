//! TCP listener and per-connection request loop.
//!
//! The server binds a listening socket, accepts connections and spawns
//! one task per client. Each task parses requests off the connection and
//! hands them to the shared [`RequestDispatcher`] until the peer stops
//! being eligible for keep-alive or a parse fails.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;

use async_std::net::TcpListener;
use async_std::task;
use log::{debug, info};

use crate::config::config;
use crate::handler::RequestDispatcher;
use crate::http::connection::HttpConnection;
use crate::http::request::HttpRequest;

pub struct Server {
    dispatcher: Arc<RequestDispatcher>,
}

impl Server {
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = bind_listener()?;
        info!("serving at {}:{}", config().address, config().port);

        while let Ok((stream, addr)) = listener.accept().await {
            debug!("accepted connection from {}", addr);
            let dispatcher = Arc::clone(&self.dispatcher);
            task::spawn(async move {
                let conn = HttpConnection::from_stream(stream);
                connection_loop(conn, &dispatcher).await;
            });
        }
        Ok(())
    }
}

/// Parses and dispatches requests until the connection closes. A parse
/// failure closes the connection without a response.
async fn connection_loop(mut conn: HttpConnection, dispatcher: &RequestDispatcher) {
    while !conn.closed() {
        let mut req = match HttpRequest::parse(&mut conn).await {
            Ok(req) => req,
            Err(err) => {
                debug!("request parse failed: {}", err);
                conn.close().await;
                break;
            }
        };

        dispatcher.dispatch(&mut req, &mut conn).await;

        if !should_keep_alive(&req) {
            conn.close().await;
        }
    }
}

/// Pre-1.1 connections always close. On 1.1 the `Connection` header
/// closes the socket unless absent or `keep-alive`.
fn should_keep_alive(req: &HttpRequest) -> bool {
    if req.version < (1, 1) {
        return false;
    }
    match req.headers.get_first("Connection") {
        None => true,
        Some(value) => value.eq_ignore_ascii_case("keep-alive"),
    }
}

fn bind_listener() -> std::io::Result<TcpListener> {
    let listener = std::net::TcpListener::bind((config().address, config().port))?;
    // listen(2) on a listening socket updates its backlog.
    let res = unsafe { libc::listen(listener.as_raw_fd(), config().backlog) };
    if res != 0 {
        return Err(std::io::Error::last_os_error());
    }
    listener.set_nonblocking(true)?;
    Ok(TcpListener::from(listener))
}
