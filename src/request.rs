use std::path::PathBuf;

use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{MatrixError, Params, Result, SessionCookie};

/// Content type set on raw payloads that look like a JSON object.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Parameter that is moved from query/form into an `Authorization: JWT` header.
pub const JWT_PARAM: &str = "jwt";

/// Request body. At most one kind per request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` pairs.
    Form(Params),
    /// Raw string. JSON content type only when it starts with `{`.
    Raw(String),
    /// Multipart upload with a single part named `file`.
    File(PathBuf),
}

/// One logical request: method, path below the base URL, query and body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: Params,
    body: RequestBody,
}

impl RequestSpec {
    /// `path` is appended verbatim to the base URL and may already carry a
    /// query string.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Params::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, query: impl Into<Params>) -> Self {
        self.query = query.into();
        self
    }

    pub fn form(mut self, form: impl Into<Params>) -> Self {
        self.body = RequestBody::Form(form.into());
        self
    }

    pub fn raw(mut self, payload: impl Into<String>) -> Self {
        self.body = RequestBody::Raw(payload.into());
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.body = RequestBody::File(path.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &Params {
        &self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Resolves the final URL and strips any `jwt` parameter, wherever it
    /// was given: inline in the path, in the query or in the form. A later
    /// source wins over an earlier one.
    pub(crate) fn prepare(&self, base_url: &str) -> Result<PreparedRequest> {
        let raw_url = format!("{base_url}{}", self.path);
        let mut url = Url::parse(&raw_url).map_err(|err| {
            MatrixError::InvalidUrl(format!("{raw_url}: {err}"))
        })?;
        let mut jwt = take_inline_jwt(&mut url);

        let mut query = self.query.clone();
        if let Some(token) = query.take(JWT_PARAM) {
            jwt = Some(token);
        }

        let body = match &self.body {
            RequestBody::Form(form) => {
                let mut form = form.clone();
                if let Some(token) = form.take(JWT_PARAM) {
                    jwt = Some(token);
                }
                RequestBody::Form(form)
            }
            other => other.clone(),
        };

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        Ok(PreparedRequest {
            method: self.method.clone(),
            url,
            jwt,
            body,
        })
    }
}

/// Removes `jwt` from a query string written into the path. The remaining
/// pairs are re-encoded only when a token was found.
fn take_inline_jwt(url: &mut Url) -> Option<String> {
    let mut jwt = None;
    let mut kept = Vec::new();
    for (name, value) in url.query_pairs() {
        if name == JWT_PARAM {
            jwt = Some(value.into_owned());
        } else {
            kept.push((name.into_owned(), value.into_owned()));
        }
    }
    if jwt.is_none() {
        return None;
    }
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    jwt
}

/// Request with its URL resolved and the `jwt` quirk applied.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub jwt: Option<String>,
    pub body: RequestBody,
}

/// Content type override for a raw payload, if any.
pub fn raw_content_type(payload: &str) -> Option<&'static str> {
    payload.starts_with('{').then_some(JSON_CONTENT_TYPE)
}

/// Result of a completed HTTP exchange, whatever its status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub status: u16,
    pub reason: String,
    pub body: String,
    /// Cookies set by this response.
    pub cookies: Vec<SessionCookie>,
}

impl ResponseOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON, `context` naming what was expected.
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| MatrixError::decode(context, err, &self.body))
    }

    /// Fails with [`MatrixError::Http`] unless the status is exactly 200.
    pub fn require_ok(self) -> Result<Self> {
        if self.status == 200 {
            Ok(self)
        } else {
            Err(MatrixError::Http {
                status: self.status,
                body: self.body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{raw_content_type, RequestBody, RequestSpec, JSON_CONTENT_TYPE};
    use crate::{MatrixError, Params};

    #[test]
    fn json_content_type_only_for_object_payloads() {
        assert_eq!(raw_content_type("{\"a\":1}"), Some(JSON_CONTENT_TYPE));
        assert_eq!(raw_content_type("a=1"), None);
        assert_eq!(raw_content_type("[1,2]"), None);
    }

    #[test]
    fn prepare_appends_query_in_order() {
        let spec = RequestSpec::get("/p/audit").query(Params::new().with("b", 2).with("a", 1));
        let prepared = spec.prepare("https://x.matrixreq.com/rest/1").unwrap();
        assert_eq!(
            prepared.url.as_str(),
            "https://x.matrixreq.com/rest/1/p/audit?b=2&a=1"
        );
    }

    #[test]
    fn prepare_keeps_inline_query_and_extends_it() {
        let spec = RequestSpec::get("/p/needle?search=x").query([("extra", "y")]);
        let prepared = spec.prepare("https://x/rest/1").unwrap();
        assert_eq!(prepared.url.query(), Some("search=x&extra=y"));
    }

    #[test]
    fn jwt_moves_out_of_query_and_form() {
        let spec = RequestSpec::delete("/g")
            .query([("jwt", "from-query"), ("reason", "r")])
            .form([("confirm", "yes"), ("jwt", "from-form")]);
        let prepared = spec.prepare("https://x/rest/1").unwrap();
        assert_eq!(prepared.jwt.as_deref(), Some("from-form"));
        assert_eq!(prepared.url.query(), Some("reason=r"));
        match prepared.body {
            RequestBody::Form(form) => {
                assert_eq!(form.get("jwt"), None);
                assert_eq!(form.get("confirm"), Some("yes"));
            }
            other => panic!("expected form body, got {other:?}"),
        }
    }

    #[test]
    fn jwt_alone_leaves_no_query() {
        let spec = RequestSpec::post("/hook").query([("jwt", "t")]);
        let prepared = spec.prepare("https://x/rest/1").unwrap();
        assert_eq!(prepared.url.query(), None);
        assert_eq!(prepared.jwt.as_deref(), Some("t"));
    }

    #[test]
    fn jwt_written_into_the_path_is_stripped() {
        let prepared = RequestSpec::get("/p/item/REQ-1?a=1&jwt=X&b=2")
            .prepare("https://x/rest/1")
            .unwrap();
        assert_eq!(prepared.jwt.as_deref(), Some("X"));
        assert_eq!(prepared.url.query(), Some("a=1&b=2"));

        let prepared = RequestSpec::get("/p?jwt=X").prepare("https://x/rest/1").unwrap();
        assert_eq!(prepared.jwt.as_deref(), Some("X"));
        assert_eq!(prepared.url.as_str(), "https://x/rest/1/p");
    }

    #[test]
    fn query_jwt_wins_over_inline_jwt() {
        let prepared = RequestSpec::get("/p?jwt=inline")
            .query([("jwt", "query")])
            .prepare("https://x/rest/1")
            .unwrap();
        assert_eq!(prepared.jwt.as_deref(), Some("query"));
        assert_eq!(prepared.url.query(), None);
    }

    #[test]
    fn inline_query_without_jwt_is_untouched() {
        let prepared = RequestSpec::get("/p/tree?fancy")
            .prepare("https://x/rest/1")
            .unwrap();
        assert_eq!(prepared.jwt, None);
        assert_eq!(prepared.url.query(), Some("fancy"));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let err = RequestSpec::get("/x").prepare("not a url").unwrap_err();
        assert!(matches!(err, MatrixError::InvalidUrl(_)));
    }
}
