//! # parapet
//!
//! A minimal HTTP framework for Rust services, with a panic-recovery guard
//! around the handlers you choose.
//!
//! ## The contract
//!
//! A handler is an `async fn(Request) -> impl IntoResponse`. If it panics and
//! is wrapped in [`Recover`](middleware::recover::Recover), the client gets a
//! well-formed response (by default `500` with an empty body) and one log
//! record carries the panic message and a bounded stack trace. Without the
//! guard, the panic ends that connection and nothing else.
//!
//! Out of scope: retries, repairing handler state, and
//! rate-limiting diagnostics across requests. A recovered request is always a
//! hard failure for that one request.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use parapet::{Method, Request, Response, Router, Server, Status};
//! use parapet::middleware::recover::Recover;
//!
//! #[tokio::main]
//! async fn main() {
//!     let recover = Recover::new();
//!
//!     let app = Router::new()
//!         .on(Method::Get,  "/users/{id}", recover.wrap(get_user))
//!         .on(Method::Post, "/users",      recover.wrap(create_user));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(Status::BadRequest);
//!     }
//!     Response::builder()
//!         .status(Status::Created)
//!         .header("location", "/users/99")
//!         .json(br#"{"id":"99"}"#.to_vec())
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
