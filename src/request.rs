//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;

use crate::method::Method;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: Vec<(String, String)>,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        Self { method, path, headers, body, params }
    }

    /// Builds a request from the pieces hyper hands the server. Header values
    /// that are not visible ASCII are skipped.
    pub(crate) fn from_parts(
        method: Method,
        path: String,
        headers: &HeaderMap,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        let headers = headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        Self::new(method, path, headers, body, params)
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
impl Request {
    pub(crate) fn get(path: &str) -> Self {
        Self::new(Method::Get, path.to_owned(), Vec::new(), Bytes::new(), HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn from_parts_keeps_readable_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        headers.insert("x-bin", HeaderValue::from_bytes(b"\xff").unwrap());

        let req = Request::from_parts(
            Method::Post,
            "/users".to_owned(),
            &headers,
            Bytes::from_static(b"{}"),
            HashMap::from([("id".to_owned(), "7".to_owned())]),
        );

        assert_eq!(req.header("X-Trace"), Some("abc"));
        assert_eq!(req.header("x-bin"), None);
        assert_eq!(req.param("id"), Some("7"));
        assert_eq!(req.body(), b"{}");
        assert_eq!(req.method(), Method::Post);
    }
}
