//! Request dispatch: resource resolution, handler invocation and the
//! catch-all error handling around both.

pub mod resource;
pub mod responses;
pub mod static_files;

use std::io;

use log::{debug, error};

use crate::http::HttpError;
use crate::http::connection::HttpConnection;
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;
use resource::{UrlResource, traverse};
use responses::{ErrorPageFn, error_page, send_error};

/// What a handler can fail with: an application-signaled status, or an
/// unexpected I/O failure that becomes a 500 and force-closes the
/// connection.
#[derive(Debug)]
pub enum HandlerError {
    Http(HttpError),
    Io(io::Error),
}

impl From<HttpError> for HandlerError {
    fn from(err: HttpError) -> Self {
        HandlerError::Http(err)
    }
}

impl From<io::Error> for HandlerError {
    fn from(err: io::Error) -> Self {
        HandlerError::Io(err)
    }
}

/// Builds the resource root for a request.
pub type RootFactory = Box<dyn Fn(&HttpRequest) -> Box<dyn UrlResource> + Send + Sync>;

/// The request-level wrapper between the connection loop and the resource
/// tree. All errors from resource resolution and handler execution are
/// localized here.
pub struct RequestDispatcher {
    root_factory: RootFactory,
    error_page: ErrorPageFn,
}

impl RequestDispatcher {
    pub fn new<F>(root_factory: F) -> Self
    where
        F: Fn(&HttpRequest) -> Box<dyn UrlResource> + Send + Sync + 'static,
    {
        Self {
            root_factory: Box::new(root_factory),
            error_page,
        }
    }

    pub fn with_error_page(mut self, page: ErrorPageFn) -> Self {
        self.error_page = page;
        self
    }

    /// Resolves `req` through the resource tree and runs its handler.
    pub async fn dispatch(&self, req: &mut HttpRequest, conn: &mut HttpConnection) {
        let root = (self.root_factory)(req);
        let mut resource = match traverse(root, &req.path) {
            Ok(resource) => resource,
            Err(err) => return self.send_http_error(req, conn, &err).await,
        };

        match resource.handle_request(req, conn).await {
            Ok(()) => {}
            Err(HandlerError::Http(err)) => self.send_http_error(req, conn, &err).await,
            Err(HandlerError::Io(err)) => self.fail_and_close(req, conn, &err).await,
        }
    }

    async fn send_http_error(&self, req: &mut HttpRequest, conn: &mut HttpConnection, err: &HttpError) {
        debug!("request for {:?} failed: {}", req.path, err);
        if req.responded {
            return;
        }
        if let Err(send_err) = send_error(req, conn, err.status, self.error_page).await {
            debug!("error handler failed: {}", send_err);
            conn.close().await;
        }
    }

    async fn fail_and_close(&self, req: &mut HttpRequest, conn: &mut HttpConnection, err: &io::Error) {
        error!("unexpected error while handling {:?}: {}", req.path, err);
        if !req.responded {
            if let Err(send_err) =
                send_error(req, conn, HttpStatus::InternalError, self.error_page).await
            {
                debug!("error handler failed: {}", send_err);
            }
        }
        conn.close().await;
    }
}
