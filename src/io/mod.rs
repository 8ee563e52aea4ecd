//! Layered byte-stream readers and async file primitives.
//!
//! The request parser and multipart handling read from a composable stack
//! built here: raw socket bytes flow through a [`BufferedReader`] (pushback
//! and lookahead), which a [`LengthReader`] (fixed byte budget) or a
//! [`BoundaryReader`] (multipart delimiter detection) can borrow to bound a
//! body. [`AsyncFile`] and [`sendfile_async`] cover the static-file side.

pub mod boundary;
pub mod buffered;
pub mod file;
pub mod length;

pub use boundary::BoundaryReader;
pub use buffered::BufferedReader;
pub use file::{AsyncFile, sendfile_async};
pub use length::LengthReader;
