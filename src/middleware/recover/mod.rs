//! Panic recovery.
//!
//! [`Recover`] wraps a handler so that a panic escaping it becomes a normal
//! HTTP response instead of a dropped connection. Per recovered panic the
//! guard:
//!
//! 1. builds a [`Panic`]: a message (`"panic: <value>"` for string and error
//!    payloads, `"unknown panic"` otherwise) and a stack trace captured at the
//!    panic site, with the panic runtime's own frames removed and the text
//!    bounded by the configured stack size;
//! 2. hands it to the configured [`ErrorHandler`] together with a response
//!    that has not been written yet.
//!
//! The default handler logs the message and trace as one record and answers
//! `500` with `content-type: application/json` and an empty body, so nothing
//! about the failure leaks to the client.
//!
//! Records go to [`TracingLogger`] unless another [`Logger`] is configured.
//! It needs a `tracing` subscriber in the host: without one, recovered panics
//! are still answered but their records are dropped. Pass
//! `logger(WriterLogger::stderr())` to write them to stderr with no
//! subscriber at all.
//!
//! ```rust,no_run
//! use parapet::{Method, Request, Response, Router, Status};
//! use parapet::middleware::recover::{content_type, recover, response_status, stack_size};
//!
//! async fn flaky(_req: Request) -> Response {
//!     panic!("!!!")
//! }
//!
//! let recover = recover([
//!     content_type("application/problem+json"),
//!     response_status(Status::ServiceUnavailable),
//!     stack_size(16 << 10),
//! ]);
//!
//! let app = Router::new().on(Method::Get, "/flaky", recover.wrap(flaky));
//! ```
//!
//! A panic raised by the error handler itself is not caught. Handler-local
//! state is not repaired, and the request is not retried.

mod config;
mod guard;
mod logger;
mod trace;

use std::sync::Arc;

use crate::handler::Handler;
use crate::request::Request;

pub use config::{
    content_type, default_error_handler, error_handler, logger, response_status, stack_size,
    Config, ErrorHandler, RecoverOption, MIN_STACK_SIZE,
};
pub use guard::{Guarded, Panic};
pub use logger::{Logger, TracingLogger, WriterLogger};

/// Builds a [`Recover`] guard from options applied in order; for any field
/// the last option wins.
pub fn recover(options: impl IntoIterator<Item = RecoverOption>) -> Recover {
    let mut config = Config::new();
    for option in options {
        option.apply(&mut config);
    }
    Recover::from_config(config)
}

/// A panic-recovery guard. Cheap to clone; clones share one [`Config`].
#[derive(Clone, Debug)]
pub struct Recover {
    config: Arc<Config>,
}

impl Recover {
    /// A guard with the default [`Config`].
    pub fn new() -> Self {
        Self::from_config(Config::new())
    }

    pub fn from_config(config: Config) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Wraps `handler`. The result registers like any other handler.
    pub fn wrap<H: Handler>(&self, handler: H) -> impl Handler + use<H> {
        let inner = handler.into_boxed_handler();
        let config = Arc::clone(&self.config);
        move |req: Request| Guarded::new(Arc::clone(&inner), req, Arc::clone(&config))
    }
}

impl Default for Recover {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    #[test]
    fn recover_applies_options_in_order() {
        let recover = recover([
            content_type("application/xml"),
            response_status(Status::Ok),
            stack_size(1),
            stack_size(MIN_STACK_SIZE * 2),
        ]);

        let config = recover.config();
        assert_eq!(config.content_type(), "application/xml");
        assert_eq!(config.response_status(), 200);
        assert_eq!(config.stack_size(), MIN_STACK_SIZE * 2);
    }

    #[test]
    fn clones_share_config() {
        let a = Recover::new();
        let b = a.clone();
        assert!(std::ptr::eq(a.config(), b.config()));
    }
}
