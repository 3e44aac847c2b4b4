//! Authenticated transport to the workspace and platform Slack APIs.
//!
//! Both endpoint families share one credential set: the token travels in the
//! form body and every session cookie is sent in a single `Cookie` header.
//! Workspace-scoped methods (`client.*`) need the base URL discovered by
//! [`ApiGateway::verify`]; platform methods go to a fixed base URL.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::credentials::Credentials;
use crate::slack::api::{AuthIdentity, Page};
use crate::{AppError, Result};

/// Base URL of the platform API.
pub const PLATFORM_BASE_URL: &str = "https://slack.com/api/";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Page size requested from paginated methods.
pub const PAGE_LIMIT: &str = "200";

/// Which endpoint family a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiScope {
    /// `https://<workspace>.slack.com/api/`, known after verification.
    Workspace,
    /// `https://slack.com/api/`.
    Platform,
}

/// Authenticated Slack API transport.
pub struct ApiGateway {
    http: reqwest::Client,
    credentials: Credentials,
    platform_url: String,
    workspace_url: Option<String>,
    cancel: CancellationToken,
}

impl ApiGateway {
    /// Build a gateway for `credentials`; calls abort when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, cancel: CancellationToken) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AppError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            credentials,
            platform_url: PLATFORM_BASE_URL.to_owned(),
            workspace_url: None,
            cancel,
        })
    }

    /// Override the platform base URL.
    #[must_use]
    pub fn with_platform_url(mut self, url: impl Into<String>) -> Self {
        self.platform_url = normalize_base(url.into());
        self
    }

    /// Set the workspace base URL (as `auth.test` would report it) without
    /// calling `auth.test`.
    #[must_use]
    pub fn with_workspace_url(mut self, url: impl Into<String>) -> Self {
        self.workspace_url = Some(workspace_api_base(url.into()));
        self
    }

    /// Credentials in use (team ID may have been refreshed by `verify`).
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Workspace API base URL (`<workspace url>/api/`), once known.
    #[must_use]
    pub fn workspace_url(&self) -> Option<&str> {
        self.workspace_url.as_deref()
    }

    /// Verify the session with `auth.test`, recording the workspace base URL
    /// and adopting the server-reported team ID.
    ///
    /// # Errors
    ///
    /// Returns transport or envelope errors from `auth.test`, or
    /// `AppError::Config` if the response carries no workspace URL.
    pub async fn verify(&mut self) -> Result<AuthIdentity> {
        let identity: AuthIdentity = self.call(ApiScope::Platform, "auth.test", &[]).await?;
        if identity.url.is_empty() {
            return Err(AppError::Config(
                "auth.test returned no workspace url".into(),
            ));
        }

        self.workspace_url = Some(workspace_api_base(identity.url.clone()));
        self.credentials = self.credentials.clone().with_team_id(&identity.team_id);

        info!(
            team = %identity.team,
            team_id = %identity.team_id,
            user_id = %identity.user_id,
            "verified workspace session"
        );
        Ok(identity)
    }

    /// Call a workspace-scoped method.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` before verification, otherwise transport
    /// and envelope errors.
    pub async fn call_workspace<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        self.call(ApiScope::Workspace, method, params).await
    }

    /// Call a platform-scoped method.
    ///
    /// # Errors
    ///
    /// Returns transport and envelope errors.
    pub async fn call_platform<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        self.call(ApiScope::Platform, method, params).await
    }

    /// Call `method` and decode its envelope into `T`.
    ///
    /// # Errors
    ///
    /// - `AppError::Cancelled` if the cancellation token fires first.
    /// - `AppError::Http` for non-2xx responses.
    /// - `AppError::Api` for `ok: false` envelopes.
    /// - `AppError::Transport` for network or decoding failures.
    pub async fn call<T: DeserializeOwned>(
        &self,
        scope: ApiScope,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let value = self.post(scope, method, params).await?;
        serde_json::from_value(value)
            .map_err(|err| AppError::Transport(format!("{method}: unexpected response: {err}")))
    }

    /// Fetch every page of a cursor-paginated method.
    ///
    /// The same request is reissued with `cursor` set to the previous page's
    /// `next_cursor` until the server returns an empty cursor.
    ///
    /// # Errors
    ///
    /// Any page failure (including cancellation) aborts the loop; partial
    /// results are discarded. A server handing back the cursor it was just
    /// given is an `AppError::Transport` error.
    pub async fn paginate<P: Page>(
        &self,
        scope: ApiScope,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();
        let mut cursor = String::new();
        let mut pages = 0_usize;

        loop {
            let mut page_params: Vec<(&str, &str)> = params.to_vec();
            if !cursor.is_empty() {
                page_params.push(("cursor", cursor.as_str()));
            }

            let page: P = self.call(scope, method, &page_params).await?;
            pages += 1;
            let next = page.next_cursor().unwrap_or_default().to_owned();
            items.extend(page.into_items());

            if next.is_empty() {
                break;
            }
            if next == cursor {
                return Err(AppError::Transport(format!(
                    "{method}: server repeated cursor {next:?} after {pages} pages"
                )));
            }
            cursor = next;
        }

        debug!(method, pages, items = items.len(), "pagination complete");
        Ok(items)
    }

    fn endpoint_url(&self, scope: ApiScope, method: &str) -> Result<String> {
        match scope {
            ApiScope::Platform => Ok(format!("{}{method}", self.platform_url)),
            ApiScope::Workspace => self
                .workspace_url
                .as_ref()
                .map(|base| format!("{base}{method}"))
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "{method}: workspace url unknown; verify the session first"
                    ))
                }),
        }
    }

    async fn post(&self, scope: ApiScope, method: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.endpoint_url(scope, method)?;

        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        form.push(("token", self.credentials.token.as_str()));
        form.extend_from_slice(params);
        let body = serde_urlencoded::to_string(&form)
            .map_err(|err| AppError::Transport(format!("{method}: cannot encode form: {err}")))?;

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);
        if !self.credentials.cookies.is_empty() {
            request = request.header(COOKIE, self.credentials.cookie_header());
        }

        let response = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(AppError::Cancelled(method.to_owned())),
            result = request.send() => result
                .map_err(|err| AppError::Transport(format!("{method}: request failed: {err}")))?,
        };

        let status = response.status();
        let text = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(AppError::Cancelled(method.to_owned())),
            result = response.text() => result
                .map_err(|err| AppError::Transport(format!("{method}: cannot read body: {err}")))?,
        };

        if !status.is_success() {
            return Err(AppError::Http {
                endpoint: method.to_owned(),
                status: status.as_u16(),
                body: text,
            });
        }

        check_envelope(method, &text)
    }
}

/// Decode a response body and reject `ok: false` envelopes.
///
/// # Errors
///
/// Returns `AppError::Transport` for non-JSON bodies and `AppError::Api`
/// when `ok` is false or absent.
pub fn check_envelope(method: &str, body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| AppError::Transport(format!("{method}: response is not json: {err}")))?;

    if value.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(value);
    }

    let code = value
        .get("error")
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .unwrap_or("unknown_error")
        .to_owned();
    Err(AppError::Api {
        endpoint: method.to_owned(),
        code,
    })
}

fn workspace_api_base(url: String) -> String {
    format!("{}api/", normalize_base(url))
}

fn normalize_base(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
