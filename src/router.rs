//! Radix-tree request router with a middleware stack.
//!
//! One tree per HTTP method, O(path-length) lookup. Middleware added with
//! [`Router::layer`] wraps every request, including the ones that end in 404.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Every builder method returns `self` so registrations chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middleware: Arc<[Arc<dyn Middleware>]>,
    not_found: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: Arc::from(Vec::new()),
            not_found: not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Wrap every request in `middleware`. The first layer added runs first.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut stack = self.middleware.to_vec();
        stack.push(Arc::new(middleware));
        self.middleware = stack.into();
        self
    }

    /// Runs one request through the middleware stack and its route.
    pub(crate) fn dispatch(&self, mut req: Request) -> BoxFuture {
        let endpoint = match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.params = params;
                handler
            }
            None => Arc::clone(&self.not_found),
        };
        Next::new(Arc::clone(&self.middleware), endpoint).run(req)
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::mdc::{self, DiagnosticContext, Mdc};
    use crate::middleware::ContextInjector;

    fn get(uri: &str) -> Request {
        let req = http::Request::get(uri)
            .header("host", "localhost")
            .body(Bytes::new())
            .unwrap();
        Request::from(req).with_remote_addr("192.0.2.0:40000".parse().unwrap())
    }

    async fn user(req: Request) -> String {
        format!("user {}", req.param("id").unwrap_or("?"))
    }

    async fn context(_req: Request) -> String {
        Mdc.snapshot()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Records its name on the way in and out.
    struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

    impl Middleware for Tag {
        fn call(&self, req: Request, next: Next) -> BoxFuture {
            let (name, log) = (self.0, Arc::clone(&self.1));
            Box::pin(async move {
                log.lock().unwrap().push(format!("{name} in"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{name} out"));
                res
            })
        }
    }

    #[tokio::test]
    async fn routes_with_params() {
        let router = Router::new().on(Method::GET, "/users/{id}", user);

        let res = router.dispatch(get("/users/42")).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"user 42");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let router = Router::new().on(Method::GET, "/users/{id}", user);

        assert_eq!(router.dispatch(get("/nope")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn layers_run_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .layer(Tag("a", Arc::clone(&log)))
            .layer(Tag("b", Arc::clone(&log)))
            .on(Method::GET, "/users/{id}", user);

        router.dispatch(get("/users/1")).await;
        router.dispatch(get("/missing")).await;

        let log = log.lock().unwrap().clone();
        assert_eq!(log, ["a in", "b in", "b out", "a out", "a in", "b in", "b out", "a out"]);
    }

    #[tokio::test]
    async fn injector_layer_exposes_request_to_handler() {
        let router = Router::new()
            .layer(ContextInjector::new())
            .on(Method::GET, "/ctx", context);

        let res = mdc::scope(router.dispatch(get("/ctx?x=1"))).await;

        let body = String::from_utf8(res.body().to_vec()).unwrap();
        assert_eq!(
            body,
            "req_method=GET\n\
             req_queryString=x=1\n\
             req_remoteHost=192.0.2.0\n\
             req_requestURI=/ctx\n\
             req_requestURL=http://localhost/ctx",
        );
        assert_eq!(Mdc.get("req_method"), None);
    }
}
