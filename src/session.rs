use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Header name echoed back from the `csrf` login cookie.
pub const CSRF_HEADER: &str = "x-csrf";
/// Cookie carrying the server-side session id.
pub const SESSION_COOKIE: &str = "JSESSIONID";
/// Cookie whose value is echoed as [`CSRF_HEADER`].
pub const CSRF_COOKIE: &str = "csrf";

/// One cookie captured from a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// Cookies captured at login, plus the transport whose store replays them.
#[derive(Clone)]
pub struct CookieJar {
    pub(crate) transport: reqwest::Client,
    cookies: Vec<SessionCookie>,
}

impl CookieJar {
    pub(crate) fn new(transport: reqwest::Client) -> Self {
        Self {
            transport,
            cookies: Vec::new(),
        }
    }

    /// Cookies seen so far, in arrival order.
    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|cookie| cookie.name == name)
            .map(|cookie| cookie.value.as_str())
    }

    /// Merges cookies, replacing any with the same name and domain.
    pub(crate) fn record(&mut self, cookies: &[SessionCookie]) {
        for cookie in cookies {
            self.cookies
                .retain(|known| !(known.name == cookie.name && known.domain == cookie.domain));
            self.cookies.push(cookie.clone());
        }
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.cookies.iter().map(|c| c.name.as_str()).collect();
        f.debug_struct("CookieJar").field("cookies", &names).finish()
    }
}

/// Auth and header state shared by every request of one client.
#[derive(Clone)]
pub struct Session {
    base_url: String,
    headers: Vec<(String, String)>,
    cookie_jar: Option<CookieJar>,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Vec::new(),
            cookie_jar: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers in insertion order, duplicates included.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Appends a header. Calling twice with the same name sends both.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Stores `Authorization: Basic base64(user:pwd)`.
    pub fn set_authorization(&mut self, user: &str, pwd: &str) {
        let encoded = BASE64.encode(format!("{user}:{pwd}"));
        self.add_header("Authorization", format!("Basic {encoded}"));
    }

    /// Stores `Authorization: Bearer <token>`.
    pub fn set_bearer_authorization(&mut self, token: &str) {
        self.add_header("Authorization", format!("Bearer {token}"));
    }

    /// Stores `Authorization: Token <token>`.
    pub fn set_token_authorization(&mut self, token: &str) {
        self.add_header("Authorization", format!("Token {token}"));
    }

    /// First `Authorization` header value, if any.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.as_str())
    }

    pub fn cookie_jar(&self) -> Option<&CookieJar> {
        self.cookie_jar.as_ref()
    }

    pub(crate) fn cookie_jar_mut(&mut self) -> Option<&mut CookieJar> {
        self.cookie_jar.as_mut()
    }

    /// Replaces the active cookie jar. At most one is attached.
    pub(crate) fn set_cookie_jar(&mut self, jar: CookieJar) {
        self.cookie_jar = Some(jar);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if is_sensitive(name) {
                    "<redacted>"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("headers", &headers)
            .field("cookie_jar", &self.cookie_jar)
            .finish()
    }
}

fn is_sensitive(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization") || name.eq_ignore_ascii_case(CSRF_HEADER)
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn basic_authorization_is_base64_of_user_colon_password() {
        let mut session = Session::new("https://x/rest/1");
        session.set_authorization("Aladdin", "open sesame");
        assert_eq!(
            session.authorization(),
            Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
    }

    #[test]
    fn bearer_and_token_schemes_differ() {
        let mut session = Session::new("https://x/rest/1");
        session.set_bearer_authorization("abc");
        session.set_token_authorization("def");
        let values: Vec<&str> = session.headers().iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["Bearer abc", "Token def"]);
    }

    #[test]
    fn add_header_appends_duplicates_in_order() {
        let mut session = Session::new("https://x/rest/1");
        session.add_header("A", "1");
        session.add_header("A", "2");
        assert_eq!(
            session.headers(),
            &[
                ("A".to_owned(), "1".to_owned()),
                ("A".to_owned(), "2".to_owned())
            ]
        );
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let mut session = Session::new("https://x/rest/1");
        session.set_token_authorization("secret-token");
        let debug = format!("{session:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
