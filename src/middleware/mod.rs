//! Middleware layer.
//!
//! Middleware wraps a [`Handler`](crate::Handler) and returns another handler
//! of the same shape, so it composes by plain function application before a
//! route is registered.
//!
//! Built-in middleware:
//! - [`recover`] turns a panicking handler into a well-formed error response
//!   plus one diagnostic log record.

pub mod recover;
