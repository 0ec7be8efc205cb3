//! HTTP method as a typed enum.
//!
//! Only the RFC 9110 methods are routable. Anything else is answered with
//! `405 Method Not Allowed` before routing.

use std::fmt;
use std::str::FromStr;

/// A routable HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

const ALL: [(Method, &str); 9] = [
    (Method::Connect, "CONNECT"),
    (Method::Delete,  "DELETE"),
    (Method::Get,     "GET"),
    (Method::Head,    "HEAD"),
    (Method::Options, "OPTIONS"),
    (Method::Patch,   "PATCH"),
    (Method::Post,    "POST"),
    (Method::Put,     "PUT"),
    (Method::Trace,   "TRACE"),
];

impl Method {
    /// Uppercase wire form, e.g. `"GET"`.
    pub fn as_str(self) -> &'static str {
        ALL.iter()
            .find(|(m, _)| *m == self)
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }
}

/// Case-sensitive, per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.iter().find(|(_, name)| *name == s).map(|(m, _)| *m).ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
