//! Request attributes in the diagnostic context.
//!
//! [`ContextInjector`] copies seven well-known request attributes into a
//! [`DiagnosticContext`] for exactly as long as the downstream handler runs,
//! so every log line emitted while serving the request can carry them.
//!
//! | Attribute        | Default key          | Source                       |
//! |------------------|----------------------|------------------------------|
//! | `RemoteHost`     | `req_remoteHost`     | peer address                 |
//! | `UserAgent`      | `req_userAgent`      | `User-Agent` header          |
//! | `RequestUri`     | `req_requestURI`     | path                         |
//! | `QueryString`    | `req_queryString`    | query string                 |
//! | `RequestUrl`     | `req_requestURL`     | `scheme://authority/path`    |
//! | `Method`         | `req_method`         | HTTP method                  |
//! | `XForwardedFor`  | `req_xForwardedFor`  | `X-Forwarded-For` header     |
//!
//! Everything except `RemoteHost` requires an HTTP request. Absent and empty
//! values are never written. Whitespace-only values are written as-is.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::trace;

use crate::handler::BoxFuture;
use crate::mdc::{self, DiagnosticContext, Mdc};
use crate::middleware::{Middleware, Next};
use crate::request::{Request, RequestSource};

/// Prefix applied to every key unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "req_";

/// A request attribute copied into the diagnostic context.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RequestAttribute {
    RemoteHost,
    UserAgent,
    RequestUri,
    QueryString,
    RequestUrl,
    Method,
    XForwardedFor,
}

impl RequestAttribute {
    pub const ALL: [Self; 7] = [
        Self::RemoteHost,
        Self::UserAgent,
        Self::RequestUri,
        Self::QueryString,
        Self::RequestUrl,
        Self::Method,
        Self::XForwardedFor,
    ];

    /// The unprefixed key.
    pub fn key(self) -> &'static str {
        match self {
            Self::RemoteHost    => "remoteHost",
            Self::UserAgent     => "userAgent",
            Self::RequestUri    => "requestURI",
            Self::QueryString   => "queryString",
            Self::RequestUrl    => "requestURL",
            Self::Method        => "method",
            Self::XForwardedFor => "xForwardedFor",
        }
    }

    fn extract<R>(self, request: &R) -> Option<Cow<'_, str>>
    where
        R: RequestSource + ?Sized,
    {
        match self {
            Self::RemoteHost    => request.remote_host(),
            Self::UserAgent     => request.http()?.header("user-agent").map(Cow::Borrowed),
            Self::RequestUri    => request.http().map(|http| Cow::Borrowed(http.request_uri())),
            Self::QueryString   => request.http()?.query_string().map(Cow::Borrowed),
            Self::RequestUrl    => request.http()?.request_url().map(Cow::Owned),
            Self::Method        => request.http().map(|http| Cow::Borrowed(http.method())),
            Self::XForwardedFor => request.http()?.header("x-forwarded-for").map(Cow::Borrowed),
        }
    }
}

impl fmt::Display for RequestAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── ContextInjector ───────────────────────────────────────────────────────────

/// Populates the diagnostic context from the request, runs the next handler,
/// then removes every key it may have written.
///
/// Removal is tied to a drop guard created before the first write, so it
/// happens on every exit path: normal return, `Err` results, panics, and the
/// request future being dropped mid-flight. The downstream outcome is returned
/// untouched.
///
/// On a [`Router`](crate::Router), install it as a layer:
///
/// ```rust
/// use reqctx::middleware::ContextInjector;
/// use reqctx::{Method, Request, Router};
///
/// async fn index(_req: Request) -> &'static str { "ok" }
///
/// let app = Router::new()
///     .layer(ContextInjector::new().with_prefix("http_"))
///     .on(Method::GET, "/", index);
/// ```
///
/// Any other code path can call [`handle`](Self::handle) or
/// [`handle_sync`](Self::handle_sync) directly.
#[derive(Clone, Debug)]
pub struct ContextInjector<C = Mdc> {
    prefix: Arc<str>,
    context: C,
}

impl ContextInjector {
    /// Writes to the process-wide [`Mdc`] under [`DEFAULT_PREFIX`].
    pub fn new() -> Self {
        Self::with_context(Mdc)
    }
}

impl Default for ContextInjector {
    fn default() -> Self { Self::new() }
}

impl<C: DiagnosticContext> ContextInjector<C> {
    pub fn with_context(context: C) -> Self {
        Self { prefix: Arc::from(DEFAULT_PREFIX), context }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Changes the key prefix for requests handled from now on. Not meant to
    /// be called while requests are in flight.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = Arc::from(prefix.into());
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.set_prefix(prefix);
        self
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// The full, prefixed key for `attribute`.
    pub fn key(&self, attribute: RequestAttribute) -> String {
        format!("{}{}", self.prefix, attribute.key())
    }

    /// Runs `next(request)` with the request's attributes in the context.
    ///
    /// If the context is not already private to the current task (the
    /// default [`Mdc`] outside [`mdc::scope`]), the whole call runs inside a
    /// fresh scope, so the entries follow the task across worker threads.
    pub async fn handle<R, N, Fut>(&self, request: R, next: N) -> Fut::Output
    where
        R: RequestSource,
        N: FnOnce(R) -> Fut,
        Fut: Future,
    {
        if self.context.is_task_scoped() {
            self.run(request, next).await
        } else {
            mdc::scope(self.run(request, next)).await
        }
    }

    async fn run<R, N, Fut>(&self, request: R, next: N) -> Fut::Output
    where
        R: RequestSource,
        N: FnOnce(R) -> Fut,
        Fut: Future,
    {
        let _entries = self.populate(&request);
        next(request).await
    }

    /// Blocking counterpart of [`handle`](Self::handle).
    pub fn handle_sync<R, N, T>(&self, request: R, next: N) -> T
    where
        R: RequestSource,
        N: FnOnce(R) -> T,
    {
        let _entries = self.populate(&request);
        next(request)
    }

    fn populate<R>(&self, request: &R) -> ContextEntries<'_, C>
    where
        R: RequestSource + ?Sized,
    {
        // The guard exists before the first write so a failed extraction
        // still removes whatever was already written.
        let entries = ContextEntries {
            context: &self.context,
            keys: RequestAttribute::ALL.map(|attribute| self.key(attribute)),
        };

        let mut written = 0;
        for (attribute, key) in RequestAttribute::ALL.into_iter().zip(&entries.keys) {
            match attribute.extract(request) {
                Some(value) if !value.is_empty() => {
                    self.context.put(key, &value);
                    written += 1;
                }
                _ => {}
            }
        }
        trace!(prefix = %self.prefix, written, "request attributes added to diagnostic context");

        entries
    }
}

impl<C> Middleware for ContextInjector<C>
where
    C: DiagnosticContext + Clone + Send + Sync + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let injector = self.clone();
        Box::pin(async move { injector.handle(req, |req| next.run(req)).await })
    }
}

/// Removes all seven keys when dropped, whether or not they were written.
struct ContextEntries<'a, C: DiagnosticContext> {
    context: &'a C,
    keys: [String; 7],
}

impl<C: DiagnosticContext> Drop for ContextEntries<'_, C> {
    fn drop(&mut self) {
        for key in &self.keys {
            self.context.remove(key);
        }
    }
}
