//! Outbound calls to other services.
//!
//! Every request carries a freshly minted Access-Key. URIs matching the
//! configured async list are dispatched in the background and never
//! awaited; everything else is awaited with a bounded timeout and fails with
//! one transport error on timeout or connection failure. Nothing is retried
//! here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::access_key::{AccessKeyMinter, ACCESS_KEY_HEADER};
use crate::error::{GateError, GateResult};
use crate::locale::AppLocale;

const ACCESS_FROM: HeaderName = HeaderName::from_static("access-from");
const APP_LOCALE: HeaderName = HeaderName::from_static("app-locale");

/// How [`ServiceClient::request`] finished.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Awaited call; the parsed JSON body.
    Completed(Map<String, Value>),
    /// Background call; no response will ever be observed.
    Dispatched,
}

#[derive(Clone)]
pub struct ServiceClient {
    base_uri: String,
    async_uris: Vec<String>,
    http: reqwest::Client,
    minter: Arc<AccessKeyMinter>,
    locale: AppLocale,
}

impl ServiceClient {
    pub fn new(
        base_uri: &str,
        async_uris: Vec<String>,
        minter: Arc<AccessKeyMinter>,
        locale: AppLocale,
        timeout: Duration,
    ) -> GateResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_uri: format!("{}/", base_uri.trim_end_matches('/')),
            async_uris,
            http,
            minter,
            locale,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn url(&self, uri: &str) -> String {
        format!("{}{}", self.base_uri, uri.trim_start_matches('/'))
    }

    /// True when `uri` contains any configured async fragment.
    pub fn is_async(&self, uri: &str) -> bool {
        self.async_uris.iter().any(|a| uri.contains(a.as_str()))
    }

    /// Headers sent on every outbound call. Mints a new Access-Key each time.
    pub fn headers(&self, bearer: Option<&str>) -> GateResult<HeaderMap> {
        let access_key = self.minter.mint()?;

        let authorization = match bearer.filter(|t| !t.is_empty()) {
            Some(token) => format!("Bearer {}", token),
            None => String::new(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, header_value(&authorization, "Authorization")?);
        headers.insert(ACCESS_FROM, HeaderValue::from_static("service"));
        headers.insert(
            HeaderName::from_static(ACCESS_KEY_HEADER),
            header_value(&access_key, "Access-Key")?,
        );
        headers.insert(APP_LOCALE, header_value(&self.locale.get(), "App-Locale")?);
        Ok(headers)
    }

    fn build(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> GateResult<reqwest::RequestBuilder> {
        let headers = self.headers(bearer)?;
        let mut builder = self.http.request(method, self.url(uri)).headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder)
    }

    /// Send and wait for the response.
    ///
    /// A 200 yields the JSON object body. Any other status is an
    /// [`GateError::Upstream`] carrying the body's `errors` field, if any.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> GateResult<Map<String, Value>> {
        let response = self.build(method, uri, body, bearer)?.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status != StatusCode::OK {
            let errors = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("errors").cloned());
            return Err(GateError::Upstream {
                status: status.as_u16(),
                message: status.to_string(),
                errors,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fire and forget. The request is spawned onto the runtime and its
    /// outcome is only logged; there is no ordering guarantee relative to
    /// the caller. Must be called from within a tokio runtime.
    pub fn dispatch(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> GateResult<()> {
        let builder = self.build(method, uri, body, bearer)?;
        let url = self.url(uri);
        tokio::spawn(async move {
            match builder.send().await {
                Ok(resp) => log::debug!("Dispatched {} status={}", url, resp.status().as_u16()),
                Err(e) => log::warn!("Dispatch to {} failed: {}", url, e),
            }
        });
        Ok(())
    }

    /// Route by the async list: background dispatch or awaited send.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> GateResult<RequestOutcome> {
        if self.is_async(uri) {
            self.dispatch(method, uri, body, bearer)?;
            return Ok(RequestOutcome::Dispatched);
        }
        self.send(method, uri, body, bearer)
            .await
            .map(RequestOutcome::Completed)
    }
}

fn header_value(value: &str, name: &str) -> GateResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| GateError::Config(format!("{} is not a valid header value", name)))
}
