//! `matrixreq-client` is an async client for the Matrix requirements
//! management REST API (`https://<instance>.matrixreq.com/rest/1`).
//!
//! [`MatrixClient`] carries the session (base URL, auth headers, optional
//! cookie jar) and exposes:
//! - raw verbs such as [`MatrixClient::rest_get`] and [`MatrixClient::execute`]
//! - one typed method per endpoint, decoding into the [`dto`] types
//!
//! Transport failures go through a small [`RetryPolicy`]; HTTP error
//! statuses are returned as data, not raised.

mod api;
mod client;
mod error;
mod executor;
mod options;
mod params;
mod request;
mod retry;
mod session;

pub mod dto;
pub mod exec;
pub mod polarion;
pub mod util;

pub use api::ItemDraft;
pub use client::{instance_rest_url, MatrixClient, DEFAULT_TIMEOUT_SECS, REST_PATH};
pub use error::{MatrixError, TransportErrorKind};
pub use options::ClientOptions;
pub use params::Params;
pub use request::{RequestBody, RequestSpec, ResponseOutcome, JSON_CONTENT_TYPE};
pub use retry::{RetryDecision, RetryPolicy, DEFAULT_RETRY_DELAY};
pub use session::{CookieJar, Session, SessionCookie, CSRF_COOKIE, CSRF_HEADER, SESSION_COOKIE};

pub type Result<T> = std::result::Result<T, MatrixError>;
