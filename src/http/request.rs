//! HTTP/1.x request parsing.
//!
//! Parsing is line-oriented over the connection's [`BufferedReader`]: one
//! request line, then header lines until a blank line or EOF. A malformed
//! request line is fatal to the connection; a malformed header line is
//! logged and skipped.

use std::fmt;
use std::io;
use std::str;

use log::debug;

use crate::http::connection::{ConnReader, HttpConnection};
use crate::http::headers::{HttpHeader, HttpHeaders};
use crate::http::response::HttpResponse;
use crate::http::status::HttpStatus;
use crate::io::LengthReader;

/// Errors that end request parsing and, with it, the connection.
#[derive(Debug)]
pub enum ParseError {
    BadRequest(String),
    Io(io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadRequest(msg) => write!(f, "{}", msg),
            ParseError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        ParseError::Io(err)
    }
}

/// Malformed header line; the parser tolerates these.
#[derive(Debug)]
struct BadHeaderError(String);

impl fmt::Display for BadHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub protocol: String,
    pub version: (u8, u8),
    pub headers: HttpHeaders,
    /// Set once the first response byte has been committed; the error
    /// handler checks it to avoid responding twice.
    pub responded: bool,
}

impl HttpRequest {
    fn new() -> Self {
        Self {
            method: String::new(),
            path: String::new(),
            query: None,
            protocol: String::new(),
            version: (1, 1),
            headers: HttpHeaders::new(),
            responded: false,
        }
    }

    /// Reads and parses one request from the connection.
    pub async fn parse(conn: &mut HttpConnection) -> Result<HttpRequest, ParseError> {
        let req_line = conn.reader().read_line().await?;
        debug!("req_line = {:?}", String::from_utf8_lossy(&req_line));

        let mut req = HttpRequest::new();
        req.parse_request_line(&req_line)?;

        loop {
            let header_line = conn.reader().read_line().await?;
            if header_line.is_empty() || header_line == b"\r\n" {
                break;
            }
            match parse_header(&header_line) {
                Ok(header) => req.headers.push(header),
                Err(err) => debug!("skipping header: {}", err),
            }
        }
        Ok(req)
    }

    fn parse_request_line(&mut self, line: &[u8]) -> Result<(), ParseError> {
        let line = str::from_utf8(line)
            .map_err(|_| ParseError::BadRequest(format!("bad request line: {:?}", line)))?
            .trim();

        // An empty line right after connect means the client went away.
        if line.is_empty() {
            return Err(ParseError::BadRequest("empty request line".to_string()));
        }

        let comps: Vec<&str> = line.split(' ').collect();
        if comps.len() != 3 {
            return Err(ParseError::BadRequest(format!(
                "bad request line: {:?}",
                line
            )));
        }

        self.method = comps[0].to_uppercase();

        match comps[1].split_once('?') {
            Some((path, query)) => {
                self.path = path.to_string();
                self.query = Some(query.to_string());
            }
            None => {
                self.path = comps[1].to_string();
                self.query = None;
            }
        }

        let Some((protocol, version)) = comps[2].split_once('/') else {
            return Err(ParseError::BadRequest(format!(
                "bad protocol token: {:?}",
                comps[2]
            )));
        };
        self.protocol = protocol.to_uppercase();
        self.version = match version.split_once('.') {
            Some((major, minor)) => (
                parse_version_part(major, line)?,
                parse_version_part(minor, line)?,
            ),
            None => (parse_version_part(version, line)?, 0),
        };
        Ok(())
    }

    /// Builds a response mirroring this request's protocol and version.
    pub fn respond(&self, status: HttpStatus) -> HttpResponse {
        HttpResponse::for_request(status, self)
    }

    pub fn content_length(&self) -> Option<usize> {
        self.headers.get_first("Content-Length")?.trim().parse().ok()
    }

    /// A reader over the request body, bounded by `Content-Length`.
    pub fn body_reader<'a>(
        &self,
        conn: &'a mut HttpConnection,
    ) -> Option<LengthReader<'a, ConnReader>> {
        let length = self.content_length()?;
        Some(LengthReader::new(conn.reader(), length))
    }

    /// The boundary parameter of a `multipart/form-data` Content-Type,
    /// ready to hand to a [`BoundaryReader`](crate::io::BoundaryReader).
    pub fn multipart_boundary(&self) -> Option<String> {
        let ctype = self.headers.get_first("Content-Type")?;
        let (kind, params) = ctype.split_once(';')?;
        if !kind.trim().eq_ignore_ascii_case("multipart/form-data") {
            return None;
        }
        for param in params.split(';') {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("boundary") {
                    return Some(value.trim().trim_matches('"').to_string());
                }
            }
        }
        None
    }
}

fn parse_version_part(part: &str, line: &str) -> Result<u8, ParseError> {
    part.parse()
        .map_err(|_| ParseError::BadRequest(format!("bad request line: {:?}", line)))
}

fn parse_header(line: &[u8]) -> Result<HttpHeader, BadHeaderError> {
    let text = str::from_utf8(line)
        .map_err(|_| BadHeaderError(format!("bad header: {:?}", line)))?
        .trim();
    match text.find(':') {
        Some(idx) if idx >= 1 => Ok(HttpHeader::new(&text[..idx], text[idx + 1..].trim())),
        _ => Err(BadHeaderError(format!("bad header: {:?}", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mem_conn;
    use async_std::task;

    fn parse_req_line(line: &[u8]) -> Result<HttpRequest, ParseError> {
        let mut req = HttpRequest::new();
        req.parse_request_line(line)?;
        Ok(req)
    }

    mod request_line {
        use super::*;

        #[test]
        fn plain_path() {
            let req = parse_req_line(b"POST / HTTP/1.1\r\n").unwrap();
            assert_eq!(req.method, "POST");
            assert_eq!(req.path, "/");
            assert_eq!(req.query, None);
            assert_eq!(req.protocol, "HTTP");
            assert_eq!(req.version, (1, 1));
        }

        #[test]
        fn path_with_query() {
            let req =
                parse_req_line(b"GET /some/path?some=query&some_other=query HTTP/1.1\r\n").unwrap();
            assert_eq!(req.method, "GET");
            assert_eq!(req.path, "/some/path");
            assert_eq!(req.query.as_deref(), Some("some=query&some_other=query"));
        }

        #[test]
        fn empty_line_is_fatal() {
            assert!(matches!(
                parse_req_line(b""),
                Err(ParseError::BadRequest(_))
            ));
        }

        #[test]
        fn wrong_token_count_is_fatal() {
            assert!(matches!(
                parse_req_line(b"GET /\r\n"),
                Err(ParseError::BadRequest(_))
            ));
        }

        #[test]
        fn protocol_without_version_is_fatal() {
            assert!(matches!(
                parse_req_line(b"GET / GARBAGE\r\n"),
                Err(ParseError::BadRequest(_))
            ));
        }

        #[test]
        fn missing_minor_version_defaults_to_zero() {
            let req = parse_req_line(b"GET / HTTP/1\r\n").unwrap();
            assert_eq!(req.version, (1, 0));
        }
    }

    mod header_line {
        use super::*;

        #[test]
        fn plain_header() {
            let header = parse_header(b"Server: rustle\r\n").unwrap();
            assert_eq!(header, HttpHeader::new("Server", "rustle"));
        }

        #[test]
        fn empty_value_is_kept() {
            assert_eq!(
                parse_header(b"Server:\r\n").unwrap(),
                HttpHeader::new("Server", "")
            );
            assert_eq!(
                parse_header(b"Server: \r\n").unwrap(),
                HttpHeader::new("Server", "")
            );
        }

        #[test]
        fn value_may_contain_colons() {
            assert_eq!(
                parse_header(b"Host: some.badasshost.com:8080\r\n").unwrap(),
                HttpHeader::new("Host", "some.badasshost.com:8080")
            );
        }

        #[test]
        fn missing_or_empty_key_is_rejected() {
            assert!(parse_header(b"Server\r\n").is_err());
            assert!(parse_header(b": rustle\r\n").is_err());
            assert!(parse_header(b" : rustle").is_err());
            assert!(parse_header(b" \t : rustle").is_err());
        }
    }

    #[test]
    fn parse_full_request() {
        task::block_on(async {
            let (mut conn, _writer) = mem_conn(
                b"GET /?q=p&s=t HTTP/1.1\r\n\
                  Host: localhost\r\n\
                  Connection: Keep-Alive\r\n\
                  Pragma: Test\r\n \
                  : Test\r\n\
                  \r\n",
            );

            let req = HttpRequest::parse(&mut conn).await.unwrap();
            assert_eq!(req.method, "GET");
            assert_eq!(req.path, "/");
            assert_eq!(req.query.as_deref(), Some("q=p&s=t"));
            assert_eq!(req.protocol, "HTTP");
            assert_eq!(req.version, (1, 1));
            assert_eq!(req.headers.len(), 3);
            assert_eq!(req.headers.get_first("Host"), Some("localhost"));
            assert_eq!(req.headers.get_first("Connection"), Some("Keep-Alive"));
            assert_eq!(req.headers.get_first("Pragma"), Some("Test"));
        });
    }

    #[test]
    fn respond_mirrors_the_request_version() {
        let mut req = parse_req_line(b"GET / HTTP/1.1\r\n").unwrap();
        crate::test_support::init_config();

        let resp = req.respond(HttpStatus::Ok);
        assert_eq!(resp.status, HttpStatus::Ok);
        assert_eq!(resp.version, (1, 1));

        req.version = (1, 0);
        let resp = req.respond(HttpStatus::BadRequest);
        assert_eq!(resp.status, HttpStatus::BadRequest);
        assert_eq!(resp.version, (1, 0));
    }

    #[test]
    fn body_reader_is_bounded_by_content_length() {
        task::block_on(async {
            let (mut conn, _writer) = mem_conn(
                b"POST /upload HTTP/1.1\r\n\
                  Content-Length: 5\r\n\
                  \r\n\
                  helloGET / HTTP/1.1\r\n",
            );

            let req = HttpRequest::parse(&mut conn).await.unwrap();
            let mut body = req.body_reader(&mut conn).unwrap();
            assert_eq!(body.read_to_end().await.unwrap(), b"hello");

            // The next pipelined request is untouched.
            assert_eq!(conn.reader().read_line().await.unwrap(), b"GET / HTTP/1.1\r\n");
        });
    }

    #[test]
    fn multipart_boundary_is_extracted() {
        let mut req = parse_req_line(b"POST /upload HTTP/1.1\r\n").unwrap();
        req.headers.add(
            "Content-Type",
            "multipart/form-data; boundary=--thisistheboundary",
        );
        assert_eq!(
            req.multipart_boundary().as_deref(),
            Some("--thisistheboundary")
        );

        let mut req = parse_req_line(b"POST /upload HTTP/1.1\r\n").unwrap();
        req.headers.add("Content-Type", "text/plain; charset=utf-8");
        assert_eq!(req.multipart_boundary(), None);
    }
}
