use std::time::Duration;

use monitor_logging::monitor_debug;
use queue_core::{JobId, JobRecord};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ChannelError, FailureKind};

const QUEUE_PATH: &str = "admin/queue";

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Overall request timeout. `None` leaves a hung request hanging; the
    /// poller just skips ticks until it resolves.
    pub request_timeout: Option<Duration>,
    /// Sent verbatim as the `Authorization` header.
    pub authorization: Option<String>,
}

impl ChannelSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            authorization: None,
        }
    }
}

/// The remote side of the queue: list jobs, delete one.
#[async_trait::async_trait]
pub trait QueueChannel: Send + Sync {
    async fn fetch_queue(&self) -> Result<Vec<JobRecord>, ChannelError>;

    async fn delete_job(&self, id: JobId) -> Result<(), ChannelError>;
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    result: Option<Vec<JobRecord>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    id: JobId,
}

#[derive(Debug, Clone)]
pub struct ReqwestChannel {
    client: reqwest::Client,
    queue_url: Url,
    authorization: Option<String>,
}

impl ReqwestChannel {
    pub fn new(settings: ChannelSettings) -> Result<Self, ChannelError> {
        let queue_url = queue_url(&settings.base_url)?;

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ChannelError::new(FailureKind::Transport, err.to_string()))?;

        Ok(Self {
            client,
            queue_url,
            authorization: settings.authorization,
        })
    }

    pub fn queue_url(&self) -> &Url {
        &self.queue_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl QueueChannel for ReqwestChannel {
    async fn fetch_queue(&self) -> Result<Vec<JobRecord>, ChannelError> {
        let response = self
            .authorize(self.client.get(self.queue_url.clone()))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: QueueResponse = serde_json::from_slice(&body)
            .map_err(|err| ChannelError::new(FailureKind::Decode, err.to_string()))?;
        let records = parsed.result.unwrap_or_default();
        monitor_debug!("Fetched {} queue items", records.len());
        Ok(records)
    }

    async fn delete_job(&self, id: JobId) -> Result<(), ChannelError> {
        let body = serde_json::to_vec(&DeleteRequest { id })
            .map_err(|err| ChannelError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .authorize(self.client.delete(self.queue_url.clone()))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Joins the queue path onto the base, keeping any path prefix the base has.
fn queue_url(base: &Url) -> Result<Url, ChannelError> {
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ChannelError::new(
            FailureKind::InvalidUrl,
            format!("unsupported scheme {}", base.scheme()),
        ));
    }
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(QUEUE_PATH)
        .map_err(|err| ChannelError::new(FailureKind::InvalidUrl, err.to_string()))
}

/// Non-2xx answers become `Rejected`, carrying the server's `error` text
/// when the body has one.
async fn ensure_success(response: Response) -> Result<Response, ChannelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());
    Err(ChannelError::new(
        FailureKind::Rejected {
            status: status.as_u16(),
        },
        message,
    ))
}

fn map_reqwest_error(err: reqwest::Error) -> ChannelError {
    if err.is_timeout() {
        return ChannelError::new(FailureKind::Timeout, err.to_string());
    }
    ChannelError::new(FailureKind::Transport, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn queue_url_keeps_base_prefix() {
        assert_eq!(
            queue_url(&url("http://localhost:8077")).unwrap().as_str(),
            "http://localhost:8077/admin/queue"
        );
        assert_eq!(
            queue_url(&url("https://example.com/api")).unwrap().as_str(),
            "https://example.com/api/admin/queue"
        );
        assert_eq!(
            queue_url(&url("https://example.com/api/")).unwrap().as_str(),
            "https://example.com/api/admin/queue"
        );
    }

    #[test]
    fn queue_url_rejects_non_http() {
        let err = queue_url(&url("ftp://example.com")).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
