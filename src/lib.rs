//! # reqctx
//!
//! Request-scoped diagnostic context for HTTP services behind a reverse proxy.
//!
//! While a request is being handled, every log line should be able to say
//! *which* request it belongs to: who sent it, what they asked for, through
//! which proxy. reqctx puts those attributes into a per-request key/value
//! store (the [`mdc`]) before your handler runs and takes them out again
//! afterwards, on every exit path.
//!
//! ## The pieces
//!
//! - [`mdc`]: the diagnostic context itself. Task-local inside a request,
//!   thread-local outside one, behind the [`DiagnosticContext`] trait.
//! - [`middleware::ContextInjector`]: copies remote host, method, URI, query
//!   string, URL, `User-Agent` and `X-Forwarded-For` into the context under a
//!   configurable prefix (`req_` by default).
//! - [`Router`] and [`Server`]: a small hyper-based framework to run it in.
//!   Each request gets its own context scope.
//! - [`marker`]: `ALERT` and `AUDIT` tags for log lines.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use reqctx::middleware::ContextInjector;
//! use reqctx::{DiagnosticContext, Mdc, Method, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqctx::Error> {
//!     let app = Router::new()
//!         .layer(ContextInjector::new())
//!         .on(Method::GET, "/users/{id}", get_user);
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     let peer = Mdc.get("req_remoteHost").unwrap_or_default();
//!     tracing::info!(%id, %peer, "fetching user");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod marker;
pub mod mdc;
pub mod middleware;

pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use http::{Method, StatusCode};
pub use marker::Marker;
pub use mdc::{DiagnosticContext, Mdc};
pub use request::{HttpRequestSource, Request, RequestSource};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
