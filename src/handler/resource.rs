//! URL resource tree: traversal and per-method dispatch.
//!
//! A request path is resolved segment by segment through
//! [`UrlResource::get_child`]; the node that remains handles the request.
//! Traversal consumes each node and returns the next, so no traversal
//! state can leak from one request into another.
//!
//! A resource routes requests through a [`Dispatch`]: either one catch-all
//! handler or a [`MethodTable`] keyed by uppercase method name, where a
//! miss answers `501 Not Implemented`.

use std::future::Future;
use std::pin::Pin;

use indexmap::IndexMap;
use log::debug;

use crate::handler::HandlerError;
use crate::http::HttpError;
use crate::http::connection::HttpConnection;
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'a>>;

/// Handler for requests reaching a resource of type `T`.
pub type MethodHandler<T> =
    for<'a> fn(&'a mut T, &'a mut HttpRequest, &'a mut HttpConnection) -> HandlerFuture<'a>;

pub struct MethodTable<T> {
    handlers: IndexMap<&'static str, MethodHandler<T>>,
}

impl<T> MethodTable<T> {
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    pub fn with(mut self, method: &'static str, handler: MethodHandler<T>) -> Self {
        self.handlers.insert(method, handler);
        self
    }
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// How a resource handles requests: one handler for every method, or a
/// per-method table.
pub enum Dispatch<T> {
    Single(MethodHandler<T>),
    Table(MethodTable<T>),
}

impl<T> Dispatch<T> {
    pub fn handle<'a>(
        &self,
        resource: &'a mut T,
        req: &'a mut HttpRequest,
        conn: &'a mut HttpConnection,
    ) -> HandlerFuture<'a> {
        match self {
            Dispatch::Single(handler) => handler(resource, req, conn),
            Dispatch::Table(table) => match table.handlers.get(req.method.as_str()) {
                Some(handler) => handler(resource, req, conn),
                None => {
                    let msg = format!("method {} not implemented", req.method);
                    Box::pin(async move {
                        Err(HttpError::new(HttpStatus::NotImplemented, msg).into())
                    })
                }
            },
        }
    }
}

pub trait UrlResource: Send {
    /// Resolves one path segment, consuming this node.
    fn get_child(self: Box<Self>, key: &str) -> Result<Box<dyn UrlResource>, HttpError>;

    fn handle_request<'a>(
        &'a mut self,
        req: &'a mut HttpRequest,
        conn: &'a mut HttpConnection,
    ) -> HandlerFuture<'a>;
}

/// Walks `path` from `root`, one non-empty segment at a time.
pub fn traverse(
    root: Box<dyn UrlResource>,
    path: &str,
) -> Result<Box<dyn UrlResource>, HttpError> {
    let mut res = root;
    for seg in path.split('/').filter(|s| !s.is_empty()) {
        debug!("traversing to resource {:?}", seg);
        res = res.get_child(seg)?;
    }
    Ok(res)
}
