use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::{
    request::{raw_content_type, PreparedRequest},
    retry::classify,
    util::mime_type_of_file,
    ClientOptions, CookieJar, MatrixError, RequestBody, RequestSpec, ResponseOutcome, Result,
    RetryPolicy, Session, SessionCookie,
};

/// Sends [`RequestSpec`]s on behalf of a [`Session`], retrying transport
/// failures according to a [`RetryPolicy`].
#[derive(Clone)]
pub(crate) struct HttpExecutor {
    http: reqwest::Client,
    options: ClientOptions,
    retry: RetryPolicy,
}

impl HttpExecutor {
    pub(crate) fn new(options: ClientOptions) -> Result<Self> {
        let http = build_transport(&options, None)?;
        let retry = RetryPolicy::from_options(&options);
        Ok(Self {
            http,
            options,
            retry,
        })
    }

    pub(crate) fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fresh, empty cookie jar with a transport that replays it.
    pub(crate) fn new_cookie_jar(&self) -> Result<CookieJar> {
        let transport = build_transport(&self.options, Some(Arc::new(Jar::default())))?;
        Ok(CookieJar::new(transport))
    }

    /// Performs the exchange and reads the whole body as text.
    pub(crate) async fn execute(
        &self,
        spec: &RequestSpec,
        session: &Session,
    ) -> Result<ResponseOutcome> {
        let response = self.send(spec, session).await?;
        let status = response.status();
        let host = response.url().host_str().unwrap_or_default().to_owned();
        let cookies: Vec<SessionCookie> = response
            .cookies()
            .map(|cookie| SessionCookie {
                name: cookie.name().to_owned(),
                value: cookie.value().to_owned(),
                domain: cookie
                    .domain()
                    .map(str::to_owned)
                    .unwrap_or_else(|| host.clone()),
            })
            .collect();
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(spec.method().as_str(), &url, err))?;

        Ok(ResponseOutcome {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
            cookies,
        })
    }

    /// Streams the response body into `dest`, replacing any existing file.
    /// Returns the HTTP status.
    pub(crate) async fn download(
        &self,
        spec: &RequestSpec,
        session: &Session,
        dest: &Path,
    ) -> Result<u16> {
        let mut response = self.send(spec, session).await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| transport_error(spec.method().as_str(), &url, err))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if status != 200 {
            warn!(status, %url, dest = %dest.display(), "downloaded a non-200 response");
        }
        Ok(status)
    }

    /// Sends the request, retrying transport failures. Any HTTP status is a
    /// success here.
    pub(crate) async fn send(
        &self,
        spec: &RequestSpec,
        session: &Session,
    ) -> Result<reqwest::Response> {
        let prepared = spec.prepare(session.base_url())?;
        let http = session
            .cookie_jar()
            .map(|jar| &jar.transport)
            .unwrap_or(&self.http);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let request = self.build(http, &prepared, session).await?;
            debug!(attempt, method = %prepared.method, url = %prepared.url, "sending request");

            match http.execute(request).await {
                Ok(response) => {
                    debug!(attempt, status = %response.status(), url = %prepared.url, "received response");
                    return Ok(response);
                }
                Err(err) => {
                    let kind = classify(&err);
                    warn!(attempt, %kind, error = %err, "request attempt failed");
                    if self.retry.should_retry(kind, attempt).await {
                        continue;
                    }
                    error!(
                        "Error when doing a rest request {} {}",
                        prepared.url, prepared.method
                    );
                    return Err(MatrixError::Transport {
                        method: prepared.method.to_string(),
                        url: prepared.url.to_string(),
                        kind,
                        source: err,
                    });
                }
            }
        }
    }

    async fn build(
        &self,
        http: &reqwest::Client,
        prepared: &PreparedRequest,
        session: &Session,
    ) -> Result<reqwest::Request> {
        let mut builder = http
            .request(prepared.method.clone(), prepared.url.clone())
            .timeout(Duration::from_millis(self.options.timeout_ms));

        for (name, value) in session.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &prepared.jwt {
            debug!("switching the JWT parameter to an Authorization header");
            builder = builder.header(AUTHORIZATION, format!("JWT {token}"));
        }

        builder = match &prepared.body {
            RequestBody::Empty => builder,
            RequestBody::Form(form) if form.is_empty() => builder,
            RequestBody::Form(form) => builder.form(form.as_slice()),
            RequestBody::Raw(payload) => match raw_content_type(payload) {
                Some(content_type) => builder
                    .header(CONTENT_TYPE, content_type)
                    .body(payload.clone()),
                None => builder.body(payload.clone()),
            },
            RequestBody::File(path) => builder
                .multipart(file_form(path).await?)
                .timeout(Duration::from_millis(self.options.upload_timeout_ms)),
        };

        builder
            .build()
            .map_err(|err| MatrixError::InvalidRequest(err.to_string()))
    }
}

fn build_transport(options: &ClientOptions, jar: Option<Arc<Jar>>) -> Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().connect_timeout(Duration::from_millis(options.timeout_ms));
    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }
    builder
        .build()
        .map_err(|err| MatrixError::Config(format!("failed to build HTTP client: {err}")))
}

/// Single `file` part, MIME type from the extension.
async fn file_form(path: &Path) -> Result<Form> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file")
        .to_owned();
    let mime = mime_type_of_file(&file_name);
    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|err| MatrixError::InvalidRequest(format!("bad mime type {mime}: {err}")))?;
    Ok(Form::new().part("file", part))
}

fn transport_error(method: &str, url: &str, err: reqwest::Error) -> MatrixError {
    MatrixError::Transport {
        method: method.to_owned(),
        url: url.to_owned(),
        kind: classify(&err),
        source: err,
    }
}
