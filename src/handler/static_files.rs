//! Static file serving rooted at a local directory.

use std::path::{Path, PathBuf};

use log::debug;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;

use crate::handler::HandlerError;
use crate::handler::resource::{Dispatch, HandlerFuture, MethodTable, UrlResource};
use crate::http::HttpError;
use crate::http::connection::HttpConnection;
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;
use crate::io::{AsyncFile, sendfile_async};

const BLOCK_SIZE: usize = 8192;

static DISPATCH: Lazy<Dispatch<StaticRootResource>> =
    Lazy::new(|| Dispatch::Table(MethodTable::new().with("GET", get_file)));

fn get_file<'a>(
    res: &'a mut StaticRootResource,
    req: &'a mut HttpRequest,
    conn: &'a mut HttpConnection,
) -> HandlerFuture<'a> {
    Box::pin(res.serve(req, conn))
}

/// Maps a URL path onto files under a local root directory. Traversal
/// accumulates decoded path segments; `..` pops one and never rises above
/// the root.
pub struct StaticRootResource {
    root: PathBuf,
    path: Vec<String>,
}

impl StaticRootResource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            path: Vec::new(),
        }
    }

    /// Folds one traversal segment into the accumulated path. A single
    /// segment may decode into several sub-segments.
    fn descend(&mut self, key: &str) {
        let unquoted = percent_decode_str(key).decode_utf8_lossy();
        for seg in unquoted.split('/') {
            if seg == ".." {
                self.path.pop();
            } else {
                self.path.push(seg.to_string());
            }
        }
    }

    fn real_path(&self) -> PathBuf {
        let mut full = self.root.clone();
        for seg in self.path.iter().filter(|s| !s.is_empty()) {
            full.push(seg);
        }
        full
    }

    async fn serve(
        &mut self,
        req: &mut HttpRequest,
        conn: &mut HttpConnection,
    ) -> Result<(), HandlerError> {
        let path = self.real_path();
        debug!("path = {:?}", path);

        let meta = match async_std::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            _ => {
                return Err(HttpError::new(
                    HttpStatus::NotFound,
                    format!("{:?} not found", path),
                )
                .into());
            }
        };

        let mut file = AsyncFile::open(&path).await?;
        let size = meta.len();

        let mut resp = req.respond(HttpStatus::Ok);
        resp.headers.add("Content-Length", &size.to_string());
        if let Some(mime) = guess_mime(&path) {
            resp.headers.add("Content-Type", mime);
        }
        resp.send(conn, req).await?;

        match conn.raw_fd() {
            Some(fd) => {
                sendfile_async(&fd, &file, None, size as usize).await?;
            }
            None => {
                // Not socket-backed: stream blocks through the writer.
                let mut block = file.read(BLOCK_SIZE).await?;
                while !block.is_empty() {
                    resp.send_body(conn, &block).await?;
                    block = file.read(BLOCK_SIZE).await?;
                }
            }
        }
        Ok(())
    }
}

impl UrlResource for StaticRootResource {
    fn get_child(mut self: Box<Self>, key: &str) -> Result<Box<dyn UrlResource>, HttpError> {
        self.descend(key);
        Ok(self)
    }

    fn handle_request<'a>(
        &'a mut self,
        req: &'a mut HttpRequest,
        conn: &'a mut HttpConnection,
    ) -> HandlerFuture<'a> {
        DISPATCH.handle(self, req, conn)
    }
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("htm") | Some("html") => Some("text/html"),
        Some("css") => Some("text/css"),
        Some("js") => Some("application/javascript"),
        Some("png") => Some("image/png"),
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("json") => Some("application/json"),
        Some("xml") => Some("application/xml"),
        Some("txt") => Some("text/plain"),
        Some("pdf") => Some("application/pdf"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mem_conn;
    use async_std::task;

    fn walk(res: &mut StaticRootResource, path: &str) {
        for seg in path.split('/').filter(|s| !s.is_empty()) {
            res.descend(seg);
        }
    }

    #[test]
    fn real_path_joins_accumulated_segments() {
        let mut res = StaticRootResource::new("local_root");
        walk(&mut res, "/some/long/path/where/ever/it/leads/");
        assert_eq!(
            res.real_path(),
            PathBuf::from("local_root/some/long/path/where/ever/it/leads")
        );
    }

    #[test]
    fn parent_segments_cancel_out() {
        let mut res = StaticRootResource::new("local_root");
        walk(&mut res, "/some/../dangerous/path");
        assert_eq!(res.real_path(), PathBuf::from("local_root/dangerous/path"));
    }

    #[test]
    fn parent_segments_never_escape_the_root() {
        let mut res = StaticRootResource::new("local_root");
        walk(&mut res, "/some/../../dangerous/path");
        assert_eq!(res.real_path(), PathBuf::from("local_root/dangerous/path"));
    }

    #[test]
    fn encoded_parent_segments_are_decoded_before_popping() {
        let mut res = StaticRootResource::new("local_root");
        walk(&mut res, "/some/%2e%2e%2f%2e%2e/dangerous/path");
        assert_eq!(res.real_path(), PathBuf::from("local_root/dangerous/path"));
    }

    #[test]
    fn empty_traversal_stays_at_the_root() {
        let mut res = StaticRootResource::new(".");
        walk(&mut res, "/");
        assert_eq!(res.real_path(), PathBuf::from("."));
    }

    #[test]
    fn serves_a_regular_file() {
        task::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("hello.txt"), b"hello from disk").unwrap();

            let (mut conn, writer) = mem_conn(b"GET /hello.txt HTTP/1.1\r\n\r\n");
            let mut req = HttpRequest::parse(&mut conn).await.unwrap();

            let mut res = StaticRootResource::new(dir.path());
            res.descend("hello.txt");
            res.handle_request(&mut req, &mut conn).await.unwrap();

            let contents = writer.contents();
            let text = String::from_utf8(contents).unwrap();
            assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
            assert!(text.contains("Content-Length: 15\r\n"));
            assert!(text.contains("Content-Type: text/plain\r\n"));
            assert!(text.ends_with("\r\n\r\nhello from disk"));
        });
    }

    #[test]
    fn missing_file_is_not_found() {
        task::block_on(async {
            let dir = tempfile::tempdir().unwrap();

            let (mut conn, _writer) = mem_conn(b"GET /nope HTTP/1.1\r\n\r\n");
            let mut req = HttpRequest::parse(&mut conn).await.unwrap();

            let mut res = StaticRootResource::new(dir.path());
            res.descend("nope");
            let err = res.handle_request(&mut req, &mut conn).await.unwrap_err();
            match err {
                HandlerError::Http(err) => assert_eq!(err.status, HttpStatus::NotFound),
                HandlerError::Io(err) => panic!("unexpected io error: {}", err),
            }
        });
    }

    #[test]
    fn directories_are_not_served() {
        task::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir(dir.path().join("sub")).unwrap();

            let (mut conn, _writer) = mem_conn(b"GET /sub HTTP/1.1\r\n\r\n");
            let mut req = HttpRequest::parse(&mut conn).await.unwrap();

            let mut res = StaticRootResource::new(dir.path());
            res.descend("sub");
            assert!(res.handle_request(&mut req, &mut conn).await.is_err());
        });
    }

    #[test]
    fn mime_type_follows_the_extension() {
        assert_eq!(guess_mime(Path::new("a/b.html")), Some("text/html"));
        assert_eq!(guess_mime(Path::new("a/b.json")), Some("application/json"));
        assert_eq!(guess_mime(Path::new("a/b.weird")), None);
        assert_eq!(guess_mime(Path::new("a/noext")), None);
    }
}
