//! Async local-file access and zero-copy file-to-socket transfer.
//!
//! [`AsyncFile`] wraps [`async_std::fs::File`]: the runtime already owns
//! the non-blocking machinery, so this layer only adds the accumulating
//! read loop and the raw-fd access that [`sendfile_async`] needs. The
//! handle is released when the value is dropped, on every exit path.

use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use async_std::fs::{File, Metadata};
use async_std::io::{self, SeekFrom};
use async_std::prelude::*;
use async_std::task;

const BLOCK_SIZE: usize = 8192;

pub struct AsyncFile {
    file: File,
}

impl AsyncFile {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<AsyncFile> {
        Ok(AsyncFile {
            file: File::open(path.as_ref()).await?,
        })
    }

    /// Wraps an already opened file, e.g. one built from
    /// [`OpenOptions`](async_std::fs::OpenOptions).
    pub fn from_file(file: File) -> AsyncFile {
        AsyncFile { file }
    }

    /// Reads up to `n` bytes in [`BLOCK_SIZE`] chunks; fewer than `n` are
    /// returned only at EOF.
    pub async fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(BLOCK_SIZE));
        while out.len() < n {
            let want = (n - out.len()).min(BLOCK_SIZE);
            let mut block = vec![0u8; want];
            let m = self.file.read(&mut block).await?;
            if m == 0 {
                break;
            }
            out.extend_from_slice(&block[..m]);
        }
        Ok(out)
    }

    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let mut block = vec![0u8; BLOCK_SIZE];
            let m = self.file.read(&mut block).await?;
            if m == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&block[..m]);
        }
    }

    /// Writes all of `data` and returns the number of bytes written.
    pub async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write_all(data).await?;
        self.file.flush().await?;
        Ok(data.len())
    }

    pub async fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos).await
    }

    pub async fn tell(&mut self) -> io::Result<u64> {
        self.file.seek(SeekFrom::Current(0)).await
    }

    pub async fn stat(&self) -> io::Result<Metadata> {
        self.file.metadata().await
    }

    pub fn fileno(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl AsRawFd for AsyncFile {
    fn as_raw_fd(&self) -> RawFd {
        self.fileno()
    }
}

/// Transfers `count` bytes from `src` to `dst` with `sendfile(2)`,
/// reissuing the syscall after partial transfers. `offset` picks the
/// starting position in `src`; `None` continues from the source's current
/// file position. Would-block waits for `dst` writability; any other OS
/// error fails the transfer.
pub async fn sendfile_async(
    dst: &impl AsRawFd,
    src: &impl AsRawFd,
    offset: Option<u64>,
    count: usize,
) -> io::Result<usize> {
    let dst_fd = dst.as_raw_fd();
    let src_fd = src.as_raw_fd();
    task::spawn_blocking(move || sendfile_loop(dst_fd, src_fd, offset, count)).await
}

fn sendfile_loop(
    dst_fd: RawFd,
    src_fd: RawFd,
    offset: Option<u64>,
    count: usize,
) -> io::Result<usize> {
    let mut off = offset.unwrap_or(0) as libc::off_t;
    let mut sent = 0usize;
    while sent < count {
        let off_ptr = match offset {
            Some(_) => &mut off as *mut libc::off_t,
            None => std::ptr::null_mut(),
        };
        let res = unsafe { libc::sendfile(dst_fd, src_fd, off_ptr, count - sent) };
        if res < 0 {
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::WouldBlock => wait_writable(dst_fd)?,
                io::ErrorKind::Interrupted => {}
                _ => return Err(err),
            }
            continue;
        }
        if res == 0 {
            // Source exhausted before `count` bytes.
            break;
        }
        sent += res as usize;
    }
    Ok(sent)
}

fn wait_writable(fd: RawFd) -> io::Result<()> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let res = unsafe { libc::poll(&mut pfd, 1, -1) };
        if res >= 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
