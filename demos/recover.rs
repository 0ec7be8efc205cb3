//! Panic recovery in front of a few routes.
//!
//! Run with:
//!   cargo run --example recover
//!
//! Try:
//!   curl -i http://localhost:3000/users/42     # 200, untouched
//!   curl -i http://localhost:3000/boom         # 500, empty body, trace in the log
//!   curl -i http://localhost:3000/debug/boom   # 500, message + trace in a JSON body
//!   curl -i http://localhost:3000/raw/boom     # no guard: connection closes

use parapet::middleware::recover::{error_handler, recover, stack_size, Recover};
use parapet::{Method, Request, Response, Router, Server, Status};

#[tokio::main]
async fn main() {
    // The default recovery logger emits tracing events; this subscriber
    // timestamps them and writes to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let guard = Recover::new();

    // Exposes the diagnostic to the client. Fine for a local build, not for
    // anything public.
    let debug_guard = recover([
        stack_size(16 << 10),
        error_handler(|_config, res, panic| {
            let body = serde_json::json!({
                "error": panic.message(),
                "trace": panic.trace(),
            });
            res.status(Status::InternalServerError)
                .json(serde_json::to_vec(&body).unwrap_or_default())
        }),
    ]);

    let app = Router::new()
        .on(Method::Get, "/users/{id}", guard.wrap(get_user))
        .on(Method::Get, "/boom",       guard.wrap(boom))
        .on(Method::Get, "/debug/boom", debug_guard.wrap(boom))
        .on(Method::Get, "/raw/boom",   boom);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

async fn boom(req: Request) -> Response {
    let users: Vec<&str> = Vec::new();
    Response::text(users[req.path().len()])
}
