//! The per-request interception boundary.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::Response;

use super::config::Config;
use super::trace::CaptureScope;

// ── Diagnostic payload ────────────────────────────────────────────────────────

/// What a guard knows about one recovered panic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Panic {
    message: String,
    trace: Vec<String>,
}

impl Panic {
    /// Builds a payload by hand, e.g. to unit-test an error handler.
    pub fn from_parts(message: impl Into<String>, trace: Vec<String>) -> Self {
        Self { message: message.into(), trace }
    }

    fn recovered(payload: &(dyn Any + Send), trace: Vec<String>) -> Self {
        Self { message: PanicValue::classify(payload).message(), trace }
    }

    /// `"panic: <value>"` for string and error payloads, `"unknown panic"`
    /// otherwise.
    pub fn message(&self) -> &str { &self.message }

    /// Innermost frame first, panic runtime frames removed, bounded by the
    /// configured stack size.
    pub fn trace(&self) -> &[String] { &self.trace }
}

/// The message, then each trace line, newline-separated.
impl fmt::Display for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.message, self.trace.join("\n"))
    }
}

/// The three shapes a panic payload is told apart by.
enum PanicValue<'a> {
    Str(&'a str),
    Error(&'a dyn StdError),
    Other,
}

impl<'a> PanicValue<'a> {
    fn classify(payload: &'a (dyn Any + Send)) -> Self {
        if let Some(s) = payload.downcast_ref::<&'static str>() {
            Self::Str(s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Self::Str(s)
        } else if let Some(e) = payload.downcast_ref::<Box<dyn StdError + Send + Sync>>() {
            Self::Error(&**e)
        } else if let Some(e) = payload.downcast_ref::<Box<dyn StdError + Send>>() {
            Self::Error(&**e)
        } else if let Some(e) = payload.downcast_ref::<std::io::Error>() {
            Self::Error(e)
        } else if let Some(e) = payload.downcast_ref::<crate::Error>() {
            Self::Error(e)
        } else {
            Self::Other
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Str(s) => format!("panic: {s}"),
            Self::Error(e) => format!("panic: {e}"),
            Self::Other => "unknown panic".to_owned(),
        }
    }
}

// ── Guarded future ────────────────────────────────────────────────────────────

enum State {
    Start { handler: BoxedHandler, req: Request },
    Running(BoxFuture),
    Done,
}

/// Response future of a guarded handler.
///
/// Calling the inner handler and every poll of its future run inside the
/// capture scope. Resolves exactly once: either with the inner response,
/// untouched, or with whatever the error handler returns.
pub struct Guarded {
    state: State,
    config: Arc<Config>,
}

impl Guarded {
    pub(crate) fn new(handler: BoxedHandler, req: Request, config: Arc<Config>) -> Self {
        Self { state: State::Start { handler, req }, config }
    }

    fn step(&mut self, cx: &mut Context<'_>) -> Poll<Response> {
        if let State::Start { .. } = self.state {
            let State::Start { handler, req } = mem::replace(&mut self.state, State::Done) else {
                unreachable!()
            };
            self.state = State::Running(handler.call(req));
        }
        match &mut self.state {
            State::Running(fut) => {
                let out = fut.as_mut().poll(cx);
                if out.is_ready() {
                    self.state = State::Done;
                }
                out
            }
            State::Start { .. } | State::Done => unreachable!(),
        }
    }
}

impl Future for Guarded {
    type Output = Response;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Response> {
        let this = self.get_mut();
        assert!(!matches!(this.state, State::Done), "`Guarded` polled after completion");

        let scope = CaptureScope::enter(this.config.stack_size());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| this.step(cx)));
        let trace = scope.exit();

        match outcome {
            Ok(poll) => poll,
            Err(payload) => {
                // The inner future may be half-unwound; never poll it again.
                this.state = State::Done;
                let panic = Panic::recovered(&*payload, trace);
                drop(payload);
                Poll::Ready(this.config.handle(&panic))
            }
        }
    }
}
