use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::{
    executor::HttpExecutor,
    session::{CSRF_COOKIE, CSRF_HEADER, SESSION_COOKIE},
    util::{fix_instance, url_encode},
    ClientOptions, MatrixError, Params, RequestSpec, ResponseOutcome, Result, RetryPolicy,
    Session,
};

/// Timeout used by [`MatrixClient::new`].
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Path of the REST service below an instance URL.
pub const REST_PATH: &str = "/rest/1";

/// Builds the REST base URL of an instance.
///
/// Example: `"myorg"` → `"https://myorg.matrixreq.com/rest/1"`
pub fn instance_rest_url(instance: &str) -> String {
    format!("{}{REST_PATH}", fix_instance(instance.trim()))
}

/// Client for the Matrix requirements-management REST API.
///
/// Request methods take `&self`; anything that changes the session
/// (authorization, headers, login) takes `&mut self`.
#[derive(Clone)]
pub struct MatrixClient {
    executor: HttpExecutor,
    session: Session,
    silent: bool,
    server_version: OnceLock<String>,
}

impl fmt::Debug for MatrixClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixClient")
            .field("session", &self.session)
            .field("options", self.executor.options())
            .field("silent", &self.silent)
            .finish()
    }
}

impl MatrixClient {
    /// Creates a client for a REST base URL (ending in `/rest/1`) with a
    /// 20 second timeout and no retries.
    pub fn new(rest_url: impl Into<String>) -> Result<Self> {
        Self::with_options(rest_url, ClientOptions::with_timeout_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with explicit timeout and retry settings.
    pub fn with_options(rest_url: impl Into<String>, options: ClientOptions) -> Result<Self> {
        Ok(Self {
            executor: HttpExecutor::new(options)?,
            session: Session::new(rest_url),
            silent: false,
            server_version: OnceLock::new(),
        })
    }

    /// Creates a client from an instance name or URL.
    ///
    /// `"myorg"` resolves to `https://myorg.matrixreq.com/rest/1`.
    pub fn from_instance(instance: &str, options: ClientOptions) -> Result<Self> {
        Self::with_options(instance_rest_url(instance), options)
    }

    /// Creates a token-authenticated client from environment variables.
    ///
    /// Reads:
    /// - `MATRIX_INSTANCE` — instance name or full URL
    /// - `MATRIX_TOKEN` — API token, sent as `Authorization: Token <value>`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use matrixreq_client::MatrixClient;
    ///
    /// let client = MatrixClient::from_env().expect("missing MATRIX_* env vars");
    /// ```
    pub fn from_env() -> Result<Self> {
        let instance = required_env("MATRIX_INSTANCE")?;
        let token = required_env("MATRIX_TOKEN")?;
        let mut client = Self::from_instance(
            &instance,
            ClientOptions::with_timeout_secs(DEFAULT_TIMEOUT_SECS),
        )?;
        client.set_token_authorization(token.trim());
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        self.session.base_url()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn options(&self) -> &ClientOptions {
        self.executor.options()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.executor.retry_policy()
    }

    /// Adds `Authorization: Basic base64(user:pwd)` to every request.
    pub fn set_authorization(&mut self, user: &str, pwd: &str) {
        self.session.set_authorization(user, pwd);
    }

    /// Adds `Authorization: Bearer <token>` to every request.
    pub fn set_bearer_authorization(&mut self, token: &str) {
        self.session.set_bearer_authorization(token);
    }

    /// Adds `Authorization: Token <token>` to every request.
    pub fn set_token_authorization(&mut self, token: &str) {
        self.session.set_token_authorization(token);
    }

    /// Appends a header sent with every request. Existing headers with the
    /// same name are kept.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.session.add_header(name, value);
    }

    /// When set, date queries ask the server not to log the call.
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Logs in with a server-side session.
    ///
    /// A fresh cookie jar replaces any previous one. The `csrf` cookie, when
    /// present, is echoed on every later request as an `x-csrf` header.
    /// Returns the `JSESSIONID` cookie value, or `None` if the server did
    /// not set one.
    pub async fn login_with_session(&mut self, user: &str, pwd: &str) -> Result<Option<String>> {
        let jar = self.executor.new_cookie_jar()?;
        self.session.set_cookie_jar(jar);

        let spec =
            RequestSpec::post(format!("/user/{}/login", url_encode(user))).form([("password", pwd)]);
        let outcome = self.executor.execute(&spec, &self.session).await?;

        let (csrf, session_id) = match self.session.cookie_jar_mut() {
            Some(jar) => {
                jar.record(&outcome.cookies);
                (
                    jar.get(CSRF_COOKIE).map(str::to_owned),
                    jar.get(SESSION_COOKIE).map(str::to_owned),
                )
            }
            None => (None, None),
        };
        if let Some(csrf) = csrf {
            self.session.add_header(CSRF_HEADER, csrf);
        }

        debug!(
            status = outcome.status,
            has_session = session_id.is_some(),
            "session login finished"
        );
        Ok(session_id)
    }

    /// Sends any request. HTTP error statuses are returned, not raised.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<ResponseOutcome> {
        self.executor.execute(spec, &self.session).await
    }

    /// `GET` returning the body whatever the status.
    pub async fn rest_get(&self, path: &str) -> Result<String> {
        self.text(RequestSpec::get(path)).await
    }

    /// `GET` carrying a form or raw body. `payload` wins over `form`.
    pub async fn rest_get_with_body(
        &self,
        path: &str,
        form: impl Into<Params>,
        payload: Option<&str>,
    ) -> Result<ResponseOutcome> {
        self.execute(&with_body(RequestSpec::get(path), form, payload))
            .await
    }

    /// `GET` streamed into `dest`, replacing it. Returns the HTTP status.
    pub async fn rest_get_to_file(&self, path: &str, dest: impl AsRef<Path>) -> Result<u16> {
        self.execute_to_file(&RequestSpec::get(path), dest.as_ref())
            .await
    }

    /// Sends any request and streams the response body into `dest`.
    pub async fn execute_to_file(&self, spec: &RequestSpec, dest: &Path) -> Result<u16> {
        self.executor.download(spec, &self.session, dest).await
    }

    /// `POST` with an url-encoded form.
    pub async fn rest_post(&self, path: &str, form: impl Into<Params>) -> Result<String> {
        self.text(RequestSpec::post(path).form(form)).await
    }

    /// `POST` with a raw body; `query` goes to the query string.
    pub async fn rest_post_payload(
        &self,
        path: &str,
        query: impl Into<Params>,
        payload: &str,
    ) -> Result<String> {
        self.text(RequestSpec::post(path).query(query).raw(payload))
            .await
    }

    /// Multipart `POST` of one file, under the upload timeout.
    pub async fn rest_post_file(&self, path: &str, file: impl AsRef<Path>) -> Result<String> {
        self.text(RequestSpec::post(path).file(file.as_ref())).await
    }

    pub async fn rest_put(&self, path: &str, form: impl Into<Params>) -> Result<String> {
        self.text(RequestSpec::put(path).form(form)).await
    }

    /// `PUT` with a raw body; `query` goes to the query string.
    pub async fn rest_put_payload(
        &self,
        path: &str,
        query: impl Into<Params>,
        payload: &str,
    ) -> Result<String> {
        self.text(RequestSpec::put(path).query(query).raw(payload))
            .await
    }

    /// `PATCH` carrying a form or raw body. `payload` wins over `form`.
    pub async fn rest_patch(
        &self,
        path: &str,
        form: impl Into<Params>,
        payload: Option<&str>,
    ) -> Result<ResponseOutcome> {
        self.execute(&with_body(RequestSpec::patch(path), form, payload))
            .await
    }

    pub async fn rest_delete(&self, path: &str) -> Result<String> {
        self.text(RequestSpec::delete(path)).await
    }

    /// `DELETE` carrying a form or raw body. `payload` wins over `form`.
    pub async fn rest_delete_with_body(
        &self,
        path: &str,
        form: impl Into<Params>,
        payload: Option<&str>,
    ) -> Result<ResponseOutcome> {
        self.execute(&with_body(RequestSpec::delete(path), form, payload))
            .await
    }

    /// Runs the request and returns its body. A 403 is logged, not raised.
    pub(crate) async fn text(&self, spec: RequestSpec) -> Result<String> {
        let outcome = self.execute(&spec).await?;
        if outcome.status == 403 {
            error!(
                "403 Forbidden: failed to get result from {}{} ({})",
                self.base_url(),
                spec.path(),
                spec.method()
            );
        }
        Ok(outcome.body)
    }

    /// Runs the request and decodes its body as `T`.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
        context: &str,
    ) -> Result<T> {
        let body = self.text(spec).await?;
        decode(&body, context)
    }

    pub(crate) fn cached_server_version(&self) -> Option<&str> {
        self.server_version.get().map(String::as_str)
    }

    pub(crate) fn cache_server_version(&self, version: String) -> &str {
        self.server_version.get_or_init(|| version)
    }
}

/// Decodes a JSON body, `context` naming what was expected.
pub(crate) fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|err| MatrixError::decode(context, err, body))
}

fn with_body(spec: RequestSpec, form: impl Into<Params>, payload: Option<&str>) -> RequestSpec {
    match payload {
        Some(payload) => spec.raw(payload),
        None => spec.form(form),
    }
}

fn required_env(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .map_err(|_| MatrixError::Config(format!("missing {name} environment variable")))?;
    if value.trim().is_empty() {
        return Err(MatrixError::Config(format!("{name} is set but empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{instance_rest_url, MatrixClient};

    #[test]
    fn instance_rest_url_appends_rest_path() {
        assert_eq!(
            instance_rest_url("myorg"),
            "https://myorg.matrixreq.com/rest/1"
        );
        assert_eq!(
            instance_rest_url("http://localhost:8080"),
            "http://localhost:8080/rest/1"
        );
    }

    #[test]
    fn new_uses_twenty_second_timeout() {
        let client = MatrixClient::new("https://x.matrixreq.com/rest/1").unwrap();
        assert_eq!(client.options().timeout_ms, 20_000);
        assert_eq!(client.options().max_retries, 0);
        assert!(client.session().cookie_jar().is_none());
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let mut client = MatrixClient::new("https://x.matrixreq.com/rest/1").unwrap();
        client.set_token_authorization("secret-token");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn server_version_is_cached_once() {
        let client = MatrixClient::new("https://x.matrixreq.com/rest/1").unwrap();
        assert_eq!(client.cached_server_version(), None);
        assert_eq!(client.cache_server_version("2.4.0".to_owned()), "2.4.0");
        assert_eq!(client.cache_server_version("9.9.9".to_owned()), "2.4.0");
    }
}
