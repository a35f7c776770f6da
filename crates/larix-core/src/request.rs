//! The incoming request descriptor.
//!
//! The router consumes method and path only; body fields, the CSRF token,
//! and anything else the embedding process parsed out of the wire request
//! travel in the request's [`ParamBag`]. Middleware communicates with
//! handlers through typed extensions.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::params::ParamBag;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
}

impl Method {
    /// The canonical upper-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an HTTP method name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown HTTP method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "OPTIONS" => Ok(Self::Options),
            "HEAD" => Ok(Self::Head),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Request headers (case-insensitive names).
#[derive(Debug, Default)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    /// Create empty headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Insert a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Iterate over all headers as (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// One incoming request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    params: ParamBag,
    headers: Headers,
    // Typed blackboard for middleware -> handler communication.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Request {
    /// Create a new request with an empty parameter bag.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: ParamBag::new(),
            headers: Headers::new(),
            extensions: HashMap::new(),
        }
    }

    /// Builder-style parameter insert.
    #[must_use]
    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.params.set(key, value);
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The full parameter bag.
    #[must_use]
    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    /// A raw parameter value.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    /// A string parameter value.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.str_value(key)
    }

    /// A string parameter with HTML metacharacters escaped.
    ///
    /// Escapes `&`, `<`, `>`, `"`, and `'` so the value is safe to embed
    /// in server-rendered markup.
    #[must_use]
    pub fn sanitized_param(&self, key: &str) -> Option<String> {
        self.params.str_value(key).map(escape_html)
    }

    /// Set a parameter value.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.params.set(key, value);
    }

    /// The headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Insert a typed extension value.
    pub fn insert_extension<T: Any + Send + Sync>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a typed extension value.
    #[must_use]
    pub fn get_extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Remove a typed extension value.
    pub fn remove_extension<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trip() {
        for name in ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD"] {
            let method: Method = name.parse().expect("known method");
            assert_eq!(method.as_str(), name);
        }
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn headers_are_case_insensitive() {
        let mut request = Request::new(Method::Get, "/");
        request.headers_mut().insert("X-Request-Id", "abc");
        assert_eq!(request.headers().get("x-request-id"), Some("abc"));
        assert_eq!(request.headers().get("X-REQUEST-ID"), Some("abc"));
    }

    #[test]
    fn params_round_trip() {
        let request = Request::new(Method::Post, "/users")
            .with_param("name", "ada")
            .with_param("age", 36);
        assert_eq!(request.param_str("name"), Some("ada"));
        assert_eq!(request.params().i64_value("age"), Some(36));
        assert_eq!(request.param("missing"), None);
    }

    #[test]
    fn sanitized_param_escapes_markup() {
        let request =
            Request::new(Method::Post, "/posts").with_param("title", "<b>\"hi\" & 'bye'</b>");
        assert_eq!(
            request.sanitized_param("title").as_deref(),
            Some("&lt;b&gt;&quot;hi&quot; &amp; &#039;bye&#039;&lt;/b&gt;")
        );
    }

    #[test]
    fn extensions_are_typed() {
        #[derive(Debug, PartialEq)]
        struct UserId(u64);

        let mut request = Request::new(Method::Get, "/profile");
        request.insert_extension(UserId(7));
        assert_eq!(request.get_extension::<UserId>(), Some(&UserId(7)));
        assert_eq!(request.remove_extension::<UserId>(), Some(UserId(7)));
        assert!(request.get_extension::<UserId>().is_none());
    }
}
