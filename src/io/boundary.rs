//! Reader that stops at a multipart boundary marker.
//!
//! [`BoundaryReader`] yields bytes from an inner [`BufferedReader`] up to,
//! but not including, the next boundary marker. Per RFC 2046 the CRLF
//! preceding the delimiter belongs to it, so the marker is stored as
//! `\r\n--` followed by the caller-supplied boundary bytes. Both the
//! inter-part trailer (`\r\n`) and the final trailer (`--\r\n`) are
//! consumed along with the marker; whatever follows is pushed back onto
//! the inner reader. Once the boundary has been hit every further read
//! returns empty.

use async_std::io::{self, BufRead};

use crate::io::buffered::BufferedReader;

const BLOCK_SIZE: usize = 8192;

pub struct BoundaryReader<'a, R: BufRead + Unpin> {
    inner: &'a mut BufferedReader<R>,
    marker: Vec<u8>,
    hit_boundary: bool,
}

impl<'a, R: BufRead + Unpin> BoundaryReader<'a, R> {
    pub fn new(inner: &'a mut BufferedReader<R>, boundary: &[u8]) -> Self {
        let mut marker = Vec::with_capacity(boundary.len() + 4);
        marker.extend_from_slice(b"\r\n--");
        marker.extend_from_slice(boundary);
        Self {
            inner,
            marker,
            hit_boundary: false,
        }
    }

    pub fn hit_boundary(&self) -> bool {
        self.hit_boundary
    }

    fn find_marker(haystack: &[u8], marker: &[u8]) -> Option<usize> {
        haystack.windows(marker.len()).position(|w| w == marker)
    }

    pub async fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.read_upto(Some(n)).await
    }

    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        self.read_upto(None).await
    }

    async fn read_upto(&mut self, limit: Option<usize>) -> io::Result<Vec<u8>> {
        if self.hit_boundary {
            return Ok(Vec::new());
        }
        let mut buf: Vec<u8> = Vec::new();
        loop {
            // Overread past the requested length by at least one marker so
            // a marker straddling the limit is still seen whole.
            let want = match limit {
                Some(n) => {
                    (n.saturating_sub(buf.len()) + self.marker.len()).max(self.marker.len() * 2)
                }
                None => BLOCK_SIZE,
            };
            let chunk = self.inner.read(want).await?;
            let chunk_len = chunk.len();
            buf.extend_from_slice(&chunk);

            // Resume the scan where the previous block's tail could first
            // hold a split marker; the head is never rescanned.
            let start = buf.len().saturating_sub(chunk_len + self.marker.len() - 1);
            if let Some(pos) =
                Self::find_marker(&buf[start..], &self.marker).map(|found| found + start)
            {
                if limit.is_none_or(|n| pos <= n) {
                    return self.consume_boundary(buf, pos).await;
                }
            }
            if chunk_len == 0 {
                // EOF before any boundary.
                return Ok(buf);
            }
            if let Some(n) = limit {
                if buf.len() > n {
                    let rest = buf.split_off(n);
                    self.inner.put(rest);
                    return Ok(buf);
                }
            }
        }
    }

    /// Strips the marker and its trailer from `buf`, pushes the surplus
    /// back to the inner reader and latches `hit_boundary`.
    async fn consume_boundary(&mut self, mut buf: Vec<u8>, pos: usize) -> io::Result<Vec<u8>> {
        let mut after = pos + self.marker.len();
        while buf.len() < after + 4 {
            let more = self.inner.read(4).await?;
            if more.is_empty() {
                break;
            }
            buf.extend_from_slice(&more);
        }
        let tail = &buf[after..];
        if tail.starts_with(b"--\r\n") {
            after += 4;
        } else if tail.starts_with(b"\r\n") {
            after += 2;
        }
        self.inner.put(buf[after..].to_vec());
        self.hit_boundary = true;
        buf.truncate(pos);
        Ok(buf)
    }

    /// Reads one line. The boundary always starts on a line of its own, so
    /// two inner lines are enough to decide whether it has been reached.
    pub async fn read_line(&mut self) -> io::Result<Vec<u8>> {
        if self.hit_boundary {
            return Ok(Vec::new());
        }
        let mut buf = self.inner.read_line().await?;
        let first_len = buf.len();
        let second = self.inner.read_line().await?;
        buf.extend_from_slice(&second);
        if let Some(pos) = Self::find_marker(&buf, &self.marker) {
            return self.consume_boundary(buf, pos).await;
        }
        let rest = buf.split_off(first_len);
        self.inner.put(rest);
        Ok(buf)
    }

    pub async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        while out.len() < n {
            let chunk = self.read(n - out.len()).await?;
            if chunk.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "boundary or EOF before the requested length",
                ));
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Pushes `data` back onto the inner reader. Unlike
    /// [`LengthReader::put`](crate::io::length::LengthReader::put) this
    /// grows no budget: a boundary-bounded stream derives its extent from
    /// the content itself.
    pub fn put(&mut self, data: Vec<u8>) {
        self.inner.put(data);
    }
}
