use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::auth::AuthConfig;
use crate::error::{ApiError, ApiResult};
use crate::model::{Trigger, WriteResponse};
use crate::traits::{TriggerReader, TriggerWriter};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the trigger endpoints of the Moira API.
pub struct MoiraClient {
    http: reqwest::Client,
    base_url: Url,
    basic: Option<(String, String)>,
}

impl MoiraClient {
    /// Creates a client for the API rooted at `api_url` (e.g. `http://moira/api/`).
    pub fn new(api_url: &str, auth: &AuthConfig, timeout: Duration) -> ApiResult<Self> {
        let base_url =
            Url::parse(api_url).map_err(|e| ApiError::InvalidUrl(format!("{api_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(api_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .default_headers(auth.headers()?)
            .timeout(timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;
        let basic = auth
            .basic()
            .map(|(user, password)| (user.to_string(), password.to_string()));

        Ok(Self {
            http,
            base_url,
            basic,
        })
    }

    fn trigger_url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("trigger")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some((user, password)) = &self.basic {
            req = req.basic_auth(user, Some(password));
        }
        req.header("Accept", "application/json")
    }

    async fn send(&self, req: RequestBuilder, url: &Url) -> ApiResult<(StatusCode, String)> {
        let resp = req.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(%url, status = status.as_u16(), "Moira API response");
        Ok((status, body))
    }

    async fn write(&self, method: Method, url: Url, trigger: &Trigger) -> ApiResult<WriteResponse> {
        let req = self.request(method, url.clone()).json(trigger);
        let (status, body) = self.send(req, &url).await?;
        let body = ensure_success(&url, status, body)?;
        let response: WriteResponse = parse_json(&body)?;
        if response.id.is_none() {
            return Err(ApiError::response_structure("missing key `id`", body));
        }
        Ok(response)
    }
}

#[async_trait]
impl TriggerReader for MoiraClient {
    async fn fetch_by_id(&self, id: &str) -> ApiResult<Option<Trigger>> {
        let state_url = self.trigger_url(&[id, "state"])?;
        let (status, body) = self
            .send(self.request(Method::GET, state_url.clone()), &state_url)
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = ensure_success(&state_url, status, body)?;
        let state: Value = parse_json(&body)?;

        if state.get("state").is_none() {
            if state.get("trigger_id").is_some() {
                return Ok(None);
            }
            return Err(ApiError::response_structure(
                "expected `state` or `trigger_id` in trigger state",
                body,
            ));
        }

        let url = self.trigger_url(&[id])?;
        let (status, body) = self.send(self.request(Method::GET, url.clone()), &url).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = ensure_success(&url, status, body)?;
        let mut trigger: Trigger = parse_json(&body)?;
        if trigger.id.is_empty() {
            trigger.id = id.to_string();
        }
        Ok(Some(trigger))
    }
}

#[async_trait]
impl TriggerWriter for MoiraClient {
    async fn create(&self, trigger: &Trigger) -> ApiResult<WriteResponse> {
        let url = self.trigger_url(&[])?;
        self.write(Method::PUT, url, trigger).await
    }

    async fn update(&self, trigger: &Trigger) -> ApiResult<WriteResponse> {
        let url = self.trigger_url(&[trigger.id.as_str()])?;
        self.write(Method::PUT, url, trigger).await
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        let url = self.trigger_url(&[id])?;
        let (status, body) = self
            .send(self.request(Method::DELETE, url.clone()), &url)
            .await?;
        ensure_success(&url, status, body)?;
        Ok(())
    }
}

fn ensure_success(url: &Url, status: StatusCode, body: String) -> ApiResult<String> {
    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn parse_json<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::invalid_json(e.to_string(), body))
}
