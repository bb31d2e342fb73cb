//! Minimal reqctx example: request attributes in every log line.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42?expand=profile
//!   curl -H 'X-Forwarded-For: 198.51.100.7' http://localhost:3000/context
//!   curl -X DELETE http://localhost:3000/users/42

use reqctx::marker::AUDIT;
use reqctx::middleware::ContextInjector;
use reqctx::{DiagnosticContext, Mdc, Method, Request, Response, Router, Server, StatusCode};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), reqctx::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .layer(ContextInjector::new())
        .on(Method::GET,    "/users/{id}", get_user)
        .on(Method::DELETE, "/users/{id}", delete_user)
        .on(Method::GET,    "/context",    context);

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    let remote = Mdc.get("req_remoteHost").unwrap_or_default();
    let ua = Mdc.get("req_userAgent").unwrap_or_default();
    info!(%id, %remote, %ua, "fetching user");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// DELETE /users/{id} → 204, with an audit trail entry
async fn delete_user(req: Request) -> StatusCode {
    let id = req.param("id").unwrap_or("unknown");
    let forwarded_for = Mdc.get("req_xForwardedFor").unwrap_or_default();
    info!(marker = %AUDIT, %id, %forwarded_for, "user deleted");
    StatusCode::NO_CONTENT
}

// GET /context → everything the middleware put in the diagnostic context
async fn context(_req: Request) -> String {
    Mdc.snapshot()
        .into_iter()
        .map(|(k, v)| format!("{k}={v}\n"))
        .collect()
}
