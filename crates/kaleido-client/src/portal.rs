use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::COOKIE;
use url::Url;

use kaleido_core::error::AppError;
use kaleido_core::models::{ChangeOutcome, EffectListPage};
use kaleido_core::retry::{RetryConfig, retry_transient};
use kaleido_core::traits::Portal;

use crate::config::{PortalConfig, render};
use crate::extract;

/// Name of the portal's session cookie.
pub const SESSION_COOKIE: &str = "JSESSIONID";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Kaleido/0.1";

/// HTTP client for the effect portal.
///
/// Login runs against a throwaway cookie jar so concurrent logins cannot
/// cross-contaminate; every other request replays the caller-supplied
/// session cookie explicitly.
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
    timeout: Duration,
    retry: RetryConfig,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self, AppError> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: PortalConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            timeout,
            retry: RetryConfig::default(),
        })
    }

    /// GET a portal page, optionally replaying a session cookie.
    ///
    /// `label` names the request in errors; login passes a fixed label so
    /// credential-bearing URLs never reach error messages or logs.
    async fn get_html(
        &self,
        url: &str,
        label: &str,
        session_id: Option<&str>,
    ) -> Result<String, AppError> {
        let mut request = self.client.get(url);
        if let Some(session_id) = session_id {
            request = request.header(COOKIE, format!("{SESSION_COOKIE}={session_id}"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout.as_secs())
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(format!("{label}: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {label}",
                status.as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read {label} body: {e}")))
    }
}

impl Portal for PortalClient {
    async fn login(&self, mail: &str, password: &str) -> Result<String, AppError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        let url = render(
            &self.config.login_url,
            &[("mail", mail), ("password", password)],
        );

        let response = client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout.as_secs())
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(format!("login request: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} during login",
                status.as_u16()
            )));
        }
        // The body is irrelevant; the session cookie is set while following
        // the login redirect chain.
        let _ = response.text().await;

        let top_url = Url::parse(&self.config.top_url)
            .map_err(|e| AppError::ConfigError(format!("invalid top URL: {e}")))?;

        let session_id = jar
            .cookies(&top_url)
            .and_then(|header| header.to_str().ok().map(str::to_owned))
            .and_then(|cookies| cookie_value(&cookies, SESSION_COOKIE))
            .unwrap_or_default();

        if session_id.is_empty() {
            tracing::warn!("login completed without a {SESSION_COOKIE} cookie");
        } else {
            tracing::info!("portal login succeeded");
        }

        Ok(session_id)
    }

    async fn effect_list(&self, session_id: &str, page: u32) -> Result<EffectListPage, AppError> {
        let url = render(&self.config.list_url, &[("page", &page.to_string())]);

        let html = retry_transient(&self.retry, "effect list fetch", || {
            self.get_html(&url, &url, Some(session_id))
        })
        .await?;

        let parsed = extract::parse_effect_list(&html);
        tracing::info!(
            page,
            items = parsed.effects.len(),
            has_next = parsed.has_next,
            "scraped effect list"
        );
        Ok(parsed)
    }

    async fn change_effect(
        &self,
        session_id: &str,
        hash_id: &str,
        sec_key: &str,
    ) -> Result<ChangeOutcome, AppError> {
        let url = render(
            &self.config.change_url,
            &[("hash", hash_id), ("slot", "0"), ("key", sec_key)],
        );

        let html = retry_transient(&self.retry, "change effect", || {
            self.get_html(&url, "change endpoint", Some(session_id))
        })
        .await?;

        Ok(extract::parse_change_result(&html, session_id))
    }
}

/// Find a cookie's value in a `name=value; name2=value2` header string.
fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
