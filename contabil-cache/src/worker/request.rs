//! Intercepted requests and responses.

use bytes::Bytes;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// URL schemes owned by browser extensions; never intercepted.
const EXTENSION_SCHEMES: [&str; 3] = ["chrome-extension:", "moz-extension:", "safari-extension:"];

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown HTTP method name.
#[derive(Debug, Error)]
#[error("Unknown HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// A request seen by the interception layer.
///
/// `url` is either absolute (`https://host/path?q`) or origin-relative
/// (`/path?q`). Cache Storage is keyed by the URL as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Top-level page navigation
    pub navigate: bool,
}

impl Request {
    /// A GET sub-resource request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            navigate: false,
        }
    }

    /// A GET page navigation.
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            navigate: true,
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Whether the URL belongs to a browser extension.
    pub fn is_extension(&self) -> bool {
        let url = self.url.to_ascii_lowercase();
        EXTENSION_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
    }

    /// Path component: scheme, authority, query and fragment removed.
    pub fn path(&self) -> &str {
        let mut rest = self.url.as_str();
        if let Some(idx) = rest.find("://") {
            let authority_and_path = &rest[idx + 3..];
            rest = match authority_and_path.find('/') {
                Some(slash) => &authority_and_path[slash..],
                None => "/",
            };
        }
        let end = rest.find(['?', '#']).unwrap_or(rest.len());
        let path = &rest[..end];
        if path.is_empty() {
            "/"
        } else {
            path
        }
    }

    /// Whether the last path segment has no file extension.
    pub fn is_path_like(&self) -> bool {
        let path = self.path();
        let last = path.rsplit('/').next().unwrap_or("");
        !last.contains('.')
    }

    /// Whether a failure should be answered with the offline page.
    pub fn wants_document(&self) -> bool {
        self.navigate || self.is_path_like()
    }
}

/// A response as stored in, or served from, Cache Storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 200 with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Bare 503 used when nothing better can be served.
    pub fn service_unavailable() -> Self {
        Self::new(503, "Service Unavailable").with_header("Content-Type", "text/plain")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_path_of_relative_url() {
        assert_eq!(Request::get("/api/empresas?page=2").path(), "/api/empresas");
        assert_eq!(Request::get("/dashboard#resumo").path(), "/dashboard");
        assert_eq!(Request::get("").path(), "/");
    }

    #[test]
    fn test_path_of_absolute_url() {
        let request = Request::get("https://abc.supabase.co/rest/v1/empresas?select=*");
        assert_eq!(request.path(), "/rest/v1/empresas");
        assert_eq!(Request::get("https://app.example.com").path(), "/");
    }

    #[test]
    fn test_extension_scheme() {
        assert!(Request::get("chrome-extension://abc/script.js").is_extension());
        assert!(Request::get("moz-extension://abc/").is_extension());
        assert!(!Request::get("/app.js").is_extension());
    }

    #[test]
    fn test_path_like() {
        assert!(Request::get("/dashboard").is_path_like());
        assert!(Request::get("/").is_path_like());
        assert!(!Request::get("/app.js").is_path_like());
        assert!(!Request::get("/data.json").wants_document());
        assert!(Request::navigation("/report.pdf").wants_document());
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::ok("x").is_ok());
        assert!(Response::new(204, "").is_ok());
        assert!(!Response::new(304, "").is_ok());
        assert!(!Response::service_unavailable().is_ok());
    }

    #[test]
    fn test_response_header_lookup() {
        let response = Response::ok("{}").with_header("Content-Type", "application/json");
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("etag"), None);
    }
}
