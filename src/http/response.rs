//! HTTP response framing and sending.

use std::fmt;
use std::time::SystemTime;

use async_std::io;

use crate::config::config;
use crate::http::connection::HttpConnection;
use crate::http::headers::HttpHeaders;
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;

pub struct HttpResponse {
    pub status: HttpStatus,
    pub protocol: String,
    pub version: (u8, u8),
    pub headers: HttpHeaders,
}

impl HttpResponse {
    /// A response with the default `Server` and `Date` headers set.
    pub fn new(status: HttpStatus) -> Self {
        let mut headers = HttpHeaders::new();
        headers.add("Server", &config().server_name);
        headers.add(
            "Date",
            &httpdate::fmt_http_date(SystemTime::now()),
        );
        Self {
            status,
            protocol: "HTTP".to_string(),
            version: (1, 1),
            headers,
        }
    }

    /// A response mirroring the request's protocol and version.
    pub(crate) fn for_request(status: HttpStatus, req: &HttpRequest) -> Self {
        let mut resp = Self::new(status);
        if !req.protocol.is_empty() {
            resp.protocol = req.protocol.clone();
        }
        resp.version = req.version;
        resp
    }

    /// Writes the status line and header block, flushes, and marks the
    /// request as responded to.
    pub async fn send(&self, conn: &mut HttpConnection, req: &mut HttpRequest) -> io::Result<()> {
        req.responded = true;
        conn.write_all(self.to_string().as_bytes()).await
    }

    /// Writes a chunk of the body and flushes.
    pub async fn send_body(&self, conn: &mut HttpConnection, data: &[u8]) -> io::Result<()> {
        conn.write_all(data).await
    }
}

impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}.{} {} {}\r\n{}\r\n",
            self.protocol,
            self.version.0,
            self.version.1,
            self.status.code(),
            self.status.reason(),
            self.headers.stringify(),
        )
    }
}
