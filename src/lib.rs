//! Asynchronous HTTP/1.x server core.
//!
//! The crate accepts TCP connections, parses pipelined requests
//! (honoring keep-alive), dispatches each request through a URL resource
//! tree and streams responses back, with static files going out through
//! `sendfile(2)`. The [`io`] module holds the layered stream readers the
//! request and multipart layers are built on.

pub mod config;
pub mod handler;
pub mod http;
pub mod io;
pub mod net;

#[cfg(test)]
pub(crate) mod test_support;
