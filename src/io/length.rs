//! Reader capped to a fixed byte budget.
//!
//! [`LengthReader`] bounds an inner [`BufferedReader`] to at most
//! `length` further bytes, which is how `Content-Length` request bodies
//! are read without ever consuming the next pipelined request. Once the
//! budget reaches zero every read returns empty. Pushing data back with
//! [`put`](LengthReader::put) grows the budget again: the bytes count
//! against the same budget when re-read.

use async_std::io::{self, BufRead};

use crate::io::buffered::BufferedReader;

pub struct LengthReader<'a, R: BufRead + Unpin> {
    inner: &'a mut BufferedReader<R>,
    remaining: usize,
}

impl<'a, R: BufRead + Unpin> LengthReader<'a, R> {
    pub fn new(inner: &'a mut BufferedReader<R>, length: usize) -> Self {
        Self {
            inner,
            remaining: length,
        }
    }

    /// Bytes this reader is still allowed to return.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub async fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let take = n.min(self.remaining);
        if take == 0 {
            return Ok(Vec::new());
        }
        let data = self.inner.read(take).await?;
        self.remaining -= data.len();
        Ok(data)
    }

    /// Reads until the budget is spent or the inner source ends.
    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        while self.remaining > 0 {
            let chunk = self.inner.read(self.remaining).await?;
            if chunk.is_empty() {
                break;
            }
            self.remaining -= chunk.len();
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Reads one line; a line crossing the budget is split, with the
    /// overflow pushed back onto the inner reader.
    pub async fn read_line(&mut self) -> io::Result<Vec<u8>> {
        if self.remaining == 0 {
            return Ok(Vec::new());
        }
        let mut line = self.inner.read_line().await?;
        if line.len() > self.remaining {
            let rest = line.split_off(self.remaining);
            self.inner.put(rest);
            self.remaining = 0;
        } else {
            self.remaining -= line.len();
        }
        Ok(line)
    }

    pub async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        if self.remaining < n {
            self.read_to_end().await?;
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read past length budget",
            ));
        }
        let data = self.inner.read_exact(n).await?;
        self.remaining -= n;
        Ok(data)
    }

    /// Pushes `data` back and grows the budget by its length.
    pub fn put(&mut self, data: Vec<u8>) {
        self.remaining += data.len();
        self.inner.put(data);
    }
}
