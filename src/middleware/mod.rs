//! Middleware layer.
//!
//! Middleware wraps every request on a [`Router`](crate::Router), matched or
//! not, and is the place for cross-cutting concerns such as diagnostic-context
//! injection ([`ContextInjector`]).
//!
//! Layers run in the order they were added: the first [`Router::layer`] call
//! is the outermost.
//!
//! ```text
//! request ─▶ layer 0 ─▶ layer 1 ─▶ … ─▶ route handler (or 404)
//!                                          │
//! response ◀─ layer 0 ◀─ layer 1 ◀─ … ◀────┘
//! ```
//!
//! [`Router::layer`]: crate::Router::layer

mod context;

use std::sync::Arc;

pub use context::{ContextInjector, DEFAULT_PREFIX, RequestAttribute};

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;

/// A request interceptor.
///
/// Call [`Next::run`] to continue down the chain, or return a response
/// directly to short-circuit it.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

/// The rest of the chain after the current middleware.
pub struct Next {
    stack: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[Arc<dyn Middleware>]>, endpoint: BoxedHandler) -> Self {
        Self { stack, index: 0, endpoint }
    }

    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.stack.get(self.index).cloned() {
            Some(middleware) => {
                self.index += 1;
                middleware.call(req, self)
            }
            None => self.endpoint.call(req),
        }
    }
}
