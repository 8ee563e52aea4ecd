pub mod connection;
pub mod headers;
pub mod request;
pub mod response;
pub mod status;

use std::fmt;

use status::HttpStatus;

/// Application-signaled HTTP failure, rendered to the client as an error
/// page when the request has not been responded to yet.
#[derive(Debug)]
pub struct HttpError {
    pub status: HttpStatus,
    pub msg: String,
}

impl HttpError {
    pub fn new(status: HttpStatus, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.status.code(),
            self.status.reason(),
            self.msg
        )
    }
}
