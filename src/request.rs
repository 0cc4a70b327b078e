//! Per-request environment snapshot.
//!
//! [`RequestEnv`] is what the dispatcher sees of an incoming request: the raw
//! method and path plus decoded query, form, header and cookie maps. It is
//! built once per request by the HTTP adapter (or by hand in tests) and is
//! read-only afterwards.

use crate::cascade::{condition::USER_WARNING, Notice, NoticeLog};
use crate::router::is_supported_method;
use crate::static_files;
use http::Method;
use std::collections::HashMap;
use tracing::debug;

/// Form field that overrides the method of a POST request.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";
/// Header that overrides the method of a POST request.
pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parse a `Cookie` header into a map.
#[must_use]
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((name.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Parse the query string of `uri` (everything after `?`).
#[must_use]
pub fn parse_query(uri: &str) -> HashMap<String, String> {
    uri.split_once('?')
        .map(|(_, query)| parse_urlencoded(query.as_bytes()))
        .unwrap_or_default()
}

/// Decode an `application/x-www-form-urlencoded` payload.
#[must_use]
pub fn parse_urlencoded(bytes: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(bytes)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Immutable view of one request.
#[derive(Debug, Clone, Default)]
pub struct RequestEnv {
    method: String,
    path: String,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    payload: HashMap<String, String>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Vec<u8>,
}

impl RequestEnv {
    /// Start building a request for `method` and `uri` (path plus optional
    /// query string).
    #[must_use]
    pub fn builder(method: &str, uri: &str) -> RequestEnvBuilder {
        RequestEnvBuilder::new(method, uri)
    }

    /// Method as received on the wire.
    #[must_use]
    pub fn raw_method(&self) -> &str {
        &self.method
    }

    /// Path as received on the wire, query string removed.
    #[must_use]
    pub fn raw_path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// POST form fields.
    #[must_use]
    pub fn form(&self) -> &HashMap<String, String> {
        &self.form
    }

    /// Decoded PUT or DELETE payload. Empty for other methods.
    #[must_use]
    pub fn payload(&self) -> &HashMap<String, String> {
        &self.payload
    }

    /// Headers, lowercase names.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The method after POST overrides, uppercased.
    ///
    /// # Errors
    ///
    /// Returns the uppercased token when it is not one of the supported
    /// verbs.
    pub fn effective_method(&self) -> Result<Method, String> {
        effective_method(&self.method, &self.form, &self.headers)
    }

    /// Like [`RequestEnv::effective_method`], recording a `USER_WARNING`
    /// notice for an unsupported method.
    #[track_caller]
    pub fn request_method(&self, notices: &mut NoticeLog) -> Option<Method> {
        match self.effective_method() {
            Ok(method) => Some(method),
            Err(token) => {
                notices.push(Notice::here(
                    USER_WARNING,
                    format!("'{token}' request method is unknown or unavailable."),
                ));
                None
            }
        }
    }

    #[must_use]
    pub fn is_get(&self) -> bool {
        self.effective_method().is_ok_and(|m| m == Method::GET)
    }

    #[must_use]
    pub fn is_post(&self) -> bool {
        self.effective_method().is_ok_and(|m| m == Method::POST)
    }

    #[must_use]
    pub fn is_put(&self) -> bool {
        self.effective_method().is_ok_and(|m| m == Method::PUT)
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.effective_method().is_ok_and(|m| m == Method::DELETE)
    }

    #[must_use]
    pub fn is_head(&self) -> bool {
        self.effective_method().is_ok_and(|m| m == Method::HEAD)
    }

    /// The path routes are matched against.
    ///
    /// A `uri` or `u` query parameter wins over the request path. Trailing
    /// slashes are trimmed, a leading slash is added, an empty path becomes
    /// `/`, and the result is percent-decoded.
    #[must_use]
    pub fn request_uri(&self) -> String {
        let source = self
            .query
            .get("uri")
            .or_else(|| self.query.get("u"))
            .map_or(self.path.as_str(), String::as_str);

        let trimmed = source.trim_end_matches('/');
        let uri = if trimmed.is_empty() {
            "/".to_owned()
        } else if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{trimmed}")
        };

        match urlencoding::decode(&uri) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => uri,
        }
    }

    /// Whether the `Accept` header admits `kind`.
    ///
    /// No header or `*/*` accepts everything. `kind` may be a bare extension
    /// (`html`), which is mapped through the MIME table first. An exact
    /// match is tried, then `type/*`.
    #[must_use]
    pub fn ua_accepts(&self, kind: &str) -> bool {
        let accept = match self.header("accept") {
            None | Some("") | Some("*/*") => return true,
            Some(accept) => accept,
        };
        if kind.is_empty() {
            return false;
        }

        let mime = if kind.contains('/') {
            kind
        } else {
            match static_files::mime_type(kind) {
                Some(mime) => mime,
                None => return false,
            }
        };
        if accept.contains(mime) {
            return true;
        }
        let major = mime.split('/').next().unwrap_or(mime);
        accept.contains(&format!("{major}/*"))
    }
}

fn effective_method(
    method: &str,
    form: &HashMap<String, String>,
    headers: &HashMap<String, String>,
) -> Result<Method, String> {
    let mut token = method.to_ascii_uppercase();
    if token == Method::POST.as_str() {
        if let Some(over) = form
            .get(METHOD_OVERRIDE_FIELD)
            .or_else(|| headers.get(METHOD_OVERRIDE_HEADER))
        {
            token = over.to_ascii_uppercase();
        }
    }
    match Method::from_bytes(token.as_bytes()) {
        Ok(m) if is_supported_method(&m) => Ok(m),
        _ => Err(token),
    }
}

/// Builder for [`RequestEnv`].
#[derive(Debug, Clone)]
pub struct RequestEnvBuilder {
    env: RequestEnv,
    form_overrides: Vec<(String, String)>,
}

impl RequestEnvBuilder {
    fn new(method: &str, uri: &str) -> Self {
        let path = uri.split('?').next().unwrap_or("/");
        Self {
            env: RequestEnv {
                method: method.to_owned(),
                path: if path.is_empty() { "/".to_owned() } else { path.to_owned() },
                query: parse_query(uri),
                ..RequestEnv::default()
            },
            form_overrides: Vec::new(),
        }
    }

    /// Add a header. Names are stored lowercase; a later value replaces an
    /// earlier one.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.env
            .headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set a POST form field directly.
    #[must_use]
    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_overrides.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.env.body = body.into();
        self
    }

    /// Finish: parse cookies, the POST form and the PUT/DELETE payload.
    #[must_use]
    pub fn build(mut self) -> RequestEnv {
        let env = &mut self.env;
        if let Some(cookie) = env.headers.get("cookie") {
            env.cookies = parse_cookies(cookie);
        }

        let is_form = env
            .headers
            .get("content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE));
        if env.method.eq_ignore_ascii_case("POST") && is_form {
            env.form = parse_urlencoded(&env.body);
        }
        env.form.extend(self.form_overrides);

        if let Ok(method) = effective_method(&env.method, &env.form, &env.headers) {
            if method == Method::PUT || method == Method::DELETE {
                let overridden = env
                    .form
                    .get(METHOD_OVERRIDE_FIELD)
                    .is_some_and(|m| m.eq_ignore_ascii_case(method.as_str()));
                env.payload = if overridden {
                    env.form
                        .iter()
                        .filter(|(k, _)| k.as_str() != METHOD_OVERRIDE_FIELD)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                } else {
                    parse_urlencoded(&env.body)
                };
            }
        }

        debug!(
            method = %env.method,
            path = %env.path,
            query_count = env.query.len(),
            form_count = env.form.len(),
            header_count = env.headers.len(),
            cookie_count = env.cookies.len(),
            body_size_bytes = env.body.len(),
            "Request environment built"
        );
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("a=b; c=d; ;flag");
        assert_eq!(cookies.get("a").map(String::as_str), Some("b"));
        assert_eq!(cookies.get("c").map(String::as_str), Some("d"));
        assert_eq!(cookies.get("flag").map(String::as_str), Some(""));
        assert_eq!(cookies.len(), 3);
    }

    #[test]
    fn test_parse_query() {
        let q = parse_query("/p?x=1&y=a%20b");
        assert_eq!(q.get("x").map(String::as_str), Some("1"));
        assert_eq!(q.get("y").map(String::as_str), Some("a b"));
        assert!(parse_query("/p").is_empty());
    }

    #[test]
    fn test_post_method_override_by_field() {
        let env = RequestEnv::builder("POST", "/items/3")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("_method=put&name=widget")
            .build();
        assert_eq!(env.effective_method(), Ok(Method::PUT));
        assert_eq!(env.payload().get("name").map(String::as_str), Some("widget"));
        assert!(!env.payload().contains_key("_method"));
    }

    #[test]
    fn test_post_method_override_by_header() {
        let env = RequestEnv::builder("POST", "/items/3")
            .header("X-HTTP-Method-Override", "delete")
            .body("reason=spam")
            .build();
        assert!(env.is_delete());
        assert_eq!(env.payload().get("reason").map(String::as_str), Some("spam"));
    }

    #[test]
    fn test_override_only_applies_to_post() {
        let env = RequestEnv::builder("GET", "/")
            .header("X-HTTP-Method-Override", "DELETE")
            .build();
        assert!(env.is_get());
    }

    #[test]
    fn test_unknown_method_records_warning() {
        let env = RequestEnv::builder("PATCH", "/").build();
        let mut notices = NoticeLog::new();
        assert_eq!(env.request_method(&mut notices), None);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices.entries()[0].number, USER_WARNING);
        assert!(notices.entries()[0].message.contains("PATCH"));
    }

    #[test]
    fn test_put_body_is_decoded() {
        let env = RequestEnv::builder("PUT", "/items/1")
            .body("name=a%2Bb&qty=2")
            .build();
        assert_eq!(env.payload().get("name").map(String::as_str), Some("a+b"));
        assert_eq!(env.payload().get("qty").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_request_uri_normalization() {
        assert_eq!(RequestEnv::builder("GET", "/").build().request_uri(), "/");
        assert_eq!(RequestEnv::builder("GET", "").build().request_uri(), "/");
        assert_eq!(
            RequestEnv::builder("GET", "/posts/7///").build().request_uri(),
            "/posts/7"
        );
        assert_eq!(
            RequestEnv::builder("GET", "/caf%C3%A9?x=1").build().request_uri(),
            "/café"
        );
    }

    #[test]
    fn test_request_uri_from_query() {
        let env = RequestEnv::builder("GET", "/index?uri=hello/world/").build();
        assert_eq!(env.request_uri(), "/hello/world");
        let env = RequestEnv::builder("GET", "/index?u=short").build();
        assert_eq!(env.request_uri(), "/short");
    }

    #[test]
    fn test_ua_accepts() {
        let any = RequestEnv::builder("GET", "/").build();
        assert!(any.ua_accepts("json"));

        let env = RequestEnv::builder("GET", "/")
            .header("Accept", "text/*, application/json")
            .build();
        assert!(env.ua_accepts("application/json"));
        assert!(env.ua_accepts("html"));
        assert!(env.ua_accepts("text/csv"));
        assert!(!env.ua_accepts("image/png"));
        assert!(!env.ua_accepts("no-such-extension"));
    }
}
