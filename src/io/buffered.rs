//! Pushback layer over a line-capable byte source.
//!
//! [`BufferedReader`] wraps any async source implementing
//! [`BufRead`](async_std::io::BufRead) and adds a LIFO pushback stack:
//! bytes returned with [`put`](BufferedReader::put) are re-yielded by the
//! next read, most recently pushed chunk first. The length-bounded and
//! boundary readers are built on top of this layer and rely on the
//! whole-chunk LIFO order to reposition the stream after overreading.

use async_std::io::{self, BufRead};
use async_std::prelude::*;

pub struct BufferedReader<R> {
    inner: R,
    pending: Vec<Vec<u8>>,
}

impl<R: BufRead + Unpin> BufferedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Pushes `data` back onto the reader; the next read yields it first.
    pub fn put(&mut self, data: Vec<u8>) {
        if !data.is_empty() {
            self.pending.push(data);
        }
    }

    /// Drains up to `n` bytes from the pushback stack, most recent chunk
    /// first, re-pushing the remainder of a partially consumed chunk.
    fn pop_pending(&mut self, n: usize) -> Vec<u8> {
        let mut out = Vec::new();
        while out.len() < n {
            let Some(mut chunk) = self.pending.pop() else {
                break;
            };
            let need = n - out.len();
            if chunk.len() > need {
                let rest = chunk.split_off(need);
                self.pending.push(rest);
            }
            out.append(&mut chunk);
        }
        out
    }

    /// Reads up to `n` bytes, consuming the pushback stack before asking
    /// the inner source for the remainder.
    pub async fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut out = self.pop_pending(n);
        if out.len() < n {
            let mut buf = vec![0u8; n - out.len()];
            let m = self.inner.read(&mut buf).await?;
            out.extend_from_slice(&buf[..m]);
        }
        Ok(out)
    }

    /// Reads to EOF: the flattened pushback stack followed by everything
    /// the inner source still yields.
    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(mut chunk) = self.pending.pop() {
            out.append(&mut chunk);
        }
        self.inner.read_to_end(&mut out).await?;
        Ok(out)
    }

    /// Reads one line including its trailing `\n`. At EOF the final bytes
    /// are returned without a newline; an empty result means EOF.
    pub async fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        while let Some(mut chunk) = self.pending.pop() {
            line.append(&mut chunk);
        }
        if let Some(idx) = line.iter().position(|&b| b == b'\n') {
            let rest = line.split_off(idx + 1);
            self.put(rest);
            return Ok(line);
        }
        self.inner.read_until(b'\n', &mut line).await?;
        Ok(line)
    }

    /// Reads exactly `n` bytes, failing with
    /// [`UnexpectedEof`](io::ErrorKind::UnexpectedEof) if the source ends
    /// early.
    pub async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut out = self.pop_pending(n);
        if out.len() < n {
            let start = out.len();
            out.resize(n, 0);
            self.inner.read_exact(&mut out[start..]).await?;
        }
        Ok(out)
    }
}
