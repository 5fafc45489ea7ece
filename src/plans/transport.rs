use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, warn};
use url::Url;

use super::model::{DeletedPlan, NewPlan, PlanItem, PlanPatch};
use super::params::{ListParams, PlanPage};
use crate::error::ClientError;
use crate::session::Session;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Wire access to the plan collection. No caching at this level.
#[async_trait]
pub trait PlanTransport: Send + Sync + 'static {
    async fn fetch_page(&self, params: &ListParams) -> Result<PlanPage, ClientError>;

    async fn create(&self, draft: &NewPlan) -> Result<PlanItem, ClientError>;

    async fn update(&self, id: &str, patch: &PlanPatch) -> Result<PlanItem, ClientError>;

    async fn delete(&self, id: &str) -> Result<DeletedPlan, ClientError>;
}

/// `PlanTransport` over HTTP/JSON against `{base}/plans`
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpTransport {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::invalid_request(format!("invalid plans base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::invalid_request(format!(
                "plans base url '{base_url}' cannot carry a path"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/plans[/{id}]` with the id percent-encoded as a single segment
    fn plans_url(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("plans");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = match self.session.access_token() {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "failed to read rejected response body");
                String::new()
            }
        };
        let err = ClientError::from_status(status.as_u16(), &body);
        warn!(status = status.as_u16(), "plans request rejected: {}", err);
        Err(err)
    }
}

#[async_trait]
impl PlanTransport for HttpTransport {
    async fn fetch_page(&self, params: &ListParams) -> Result<PlanPage, ClientError> {
        let url = self.plans_url(None);
        debug!(%url, page = params.page, limit = params.page_size, "GET plans");

        let response = self
            .send(self.client.get(url).query(&params.to_query_pairs()))
            .await?;

        let header_total = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let items: Vec<PlanItem> = response.json().await?;
        Ok(PlanPage::from_batch(items, header_total, params.page_size))
    }

    async fn create(&self, draft: &NewPlan) -> Result<PlanItem, ClientError> {
        let response = self.send(self.client.post(self.plans_url(None)).json(draft)).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, id: &str, patch: &PlanPatch) -> Result<PlanItem, ClientError> {
        let response = self
            .send(self.client.patch(self.plans_url(Some(id))).json(patch))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<DeletedPlan, ClientError> {
        let response = self.send(self.client.delete(self.plans_url(Some(id)))).await?;
        let body = response.text().await?;

        // Some backends answer `{}` or nothing at all.
        let deleted = serde_json::from_str::<DeletedPlan>(&body)
            .ok()
            .filter(|d| !d.id.is_empty())
            .unwrap_or_else(|| DeletedPlan { id: id.to_string() });
        Ok(deleted)
    }
}
