//! Recovery policy: what the client sees and what gets logged.

use std::fmt;
use std::sync::Arc;

use crate::response::{Response, ResponseBuilder};
use crate::status::Status;

use super::guard::Panic;
use super::logger::{Logger, TracingLogger};

/// Smallest stack-capture budget in bytes. Smaller requests are ignored.
pub const MIN_STACK_SIZE: usize = 4 << 10;

/// Turns a recovered panic into the response for that request.
///
/// Receives the guard's configuration, a response that has not been written
/// yet, and the diagnostic payload. It is free to ignore the configuration,
/// write a body, or log nothing at all. A panic raised here is not caught.
pub type ErrorHandler = Arc<dyn Fn(&Config, ResponseBuilder, &Panic) -> Response + Send + Sync>;

/// Configuration of a [`Recover`](super::Recover) guard.
///
/// Built once from [`RecoverOption`]s and shared read-only by every request
/// the guard handles.
pub struct Config {
    content_type: String,
    response_status: u16,
    stack_size: usize,
    logger: Arc<dyn Logger>,
    error_handler: ErrorHandler,
}

impl Config {
    /// Defaults:
    ///
    /// | field | value |
    /// |---|---|
    /// | content type | `application/json` |
    /// | response status | `500 Internal Server Error` |
    /// | stack size | [`MIN_STACK_SIZE`] |
    /// | logger | [`TracingLogger`] |
    /// | error handler | [`default_error_handler`] |
    ///
    /// [`TracingLogger`] emits a `tracing` event; the host's subscriber adds
    /// the timestamp and picks the stream. Without a subscriber installed
    /// those records are dropped. [`WriterLogger::stderr`] needs no
    /// subscriber:
    ///
    /// ```rust
    /// use parapet::middleware::recover::{Config, WriterLogger};
    ///
    /// let config = Config::with_logger(WriterLogger::stderr());
    /// assert_eq!(config.response_status(), 500);
    /// ```
    ///
    /// [`WriterLogger::stderr`]: super::WriterLogger::stderr
    pub fn new() -> Self {
        Self::with_logger(TracingLogger)
    }

    /// Defaults, logging to `logger`.
    pub fn with_logger(logger: impl Logger + 'static) -> Self {
        Self {
            content_type: "application/json".to_owned(),
            response_status: Status::InternalServerError.code(),
            stack_size: MIN_STACK_SIZE,
            logger: Arc::new(logger),
            error_handler: Arc::new(default_error_handler),
        }
    }

    pub fn content_type(&self) -> &str { &self.content_type }
    pub fn response_status(&self) -> u16 { self.response_status }
    pub fn stack_size(&self) -> usize { self.stack_size }
    pub fn logger(&self) -> &dyn Logger { &*self.logger }

    pub(crate) fn handle(&self, panic: &Panic) -> Response {
        (self.error_handler)(self, Response::builder(), panic)
    }
}

impl Default for Config {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("content_type", &self.content_type)
            .field("response_status", &self.response_status)
            .field("stack_size", &self.stack_size)
            .finish_non_exhaustive()
    }
}

/// Logs the message and trace as one record, then answers with the
/// configured status and `content-type` and no body.
///
/// Nothing about the panic reaches the client.
pub fn default_error_handler(config: &Config, res: ResponseBuilder, panic: &Panic) -> Response {
    config.logger().log(&panic.to_string());
    res.status(config.response_status())
        .header("content-type", config.content_type())
        .no_body()
}

// ── Options ───────────────────────────────────────────────────────────────────

/// One override of a [`Config`] field, consumed by [`recover`](super::recover).
pub struct RecoverOption(Setting);

enum Setting {
    ContentType(String),
    ResponseStatus(u16),
    StackSize(usize),
    Logger(Arc<dyn Logger>),
    ErrorHandler(ErrorHandler),
}

impl RecoverOption {
    pub(crate) fn apply(self, config: &mut Config) {
        match self.0 {
            Setting::ContentType(v) => config.content_type = v,
            Setting::ResponseStatus(v) => config.response_status = v,
            Setting::StackSize(v) if v > MIN_STACK_SIZE => config.stack_size = v,
            Setting::StackSize(_) => {}
            Setting::Logger(v) => config.logger = v,
            Setting::ErrorHandler(v) => config.error_handler = v,
        }
    }
}

impl fmt::Debug for RecoverOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Setting::ContentType(v) => f.debug_tuple("ContentType").field(v).finish(),
            Setting::ResponseStatus(v) => f.debug_tuple("ResponseStatus").field(v).finish(),
            Setting::StackSize(v) => f.debug_tuple("StackSize").field(v).finish(),
            Setting::Logger(_) => f.write_str("Logger(..)"),
            Setting::ErrorHandler(_) => f.write_str("ErrorHandler(..)"),
        }
    }
}

/// `content-type` of the recovery response.
pub fn content_type(value: impl Into<String>) -> RecoverOption {
    RecoverOption(Setting::ContentType(value.into()))
}

/// Status of the recovery response.
pub fn response_status(value: impl Into<u16>) -> RecoverOption {
    RecoverOption(Setting::ResponseStatus(value.into()))
}

/// Byte budget for the captured trace. Values up to and including
/// [`MIN_STACK_SIZE`] leave the current budget unchanged.
pub fn stack_size(value: usize) -> RecoverOption {
    RecoverOption(Setting::StackSize(value))
}

/// Sink for diagnostic records.
pub fn logger(value: impl Logger + 'static) -> RecoverOption {
    RecoverOption(Setting::Logger(Arc::new(value)))
}

/// Replaces [`default_error_handler`].
pub fn error_handler<F>(handler: F) -> RecoverOption
where
    F: Fn(&Config, ResponseBuilder, &Panic) -> Response + Send + Sync + 'static,
{
    RecoverOption(Setting::ErrorHandler(Arc::new(handler)))
}
