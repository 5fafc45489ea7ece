use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::model::{DeletedPlan, NewPlan, PlanItem, PlanPatch, PlanStatus};
use super::params::{ListParams, PlanPage};
use super::transport::{HttpTransport, PlanTransport};
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::query::{QueryCache, Tag};
use crate::session::Session;
use crate::types::Operation;

/// Tag kind for everything this client caches
pub const PLAN_TAG: &str = "Plans";

pub type PlanCache = QueryCache<ListParams, PlanPage, ClientError>;

/// Each page is filed under its items' ids plus the collection sentinel
fn page_tags(page: &PlanPage) -> Vec<Tag> {
    let mut tags: Vec<Tag> = page.ids().map(|id| Tag::item(PLAN_TAG, id)).collect();
    tags.push(Tag::list(PLAN_TAG));
    tags
}

/// Cache-aware access to the plan collection.
///
/// Lists are cached per parameter tuple and coalesced; mutations go straight
/// to the transport and, only on success, invalidate the tags they affect.
pub struct PlanClient<T: PlanTransport> {
    transport: Arc<T>,
    cache: PlanCache,
}

impl PlanClient<HttpTransport> {
    pub fn from_config(config: &AppConfig, session: Session) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(
            &config.api.plans_base_url,
            session,
            Duration::from_secs(config.api.request_timeout_secs),
        )?;
        Ok(Self::new(transport, config.cache.max_entries))
    }
}

impl<T: PlanTransport> PlanClient<T> {
    pub fn new(transport: T, max_entries: usize) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: QueryCache::new(max_entries, page_tags),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &PlanCache {
        &self.cache
    }

    /// Announcements of list keys dropped by invalidation
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<ListParams>> {
        self.cache.subscribe()
    }

    pub async fn list(&self, params: ListParams) -> Result<PlanPage, ClientError> {
        params.validate()?;

        debug!(operation = %Operation::Select, ?params, "plan list requested");
        let transport = Arc::clone(&self.transport);
        let request = params.clone();
        self.cache
            .query(params, move || async move { transport.fetch_page(&request).await })
            .await
    }

    pub async fn create(&self, draft: NewPlan) -> Result<PlanItem, ClientError> {
        draft.validate().into_result()?;

        let created = self.transport.create(&draft).await?;
        info!(operation = %Operation::Create, id = %created.id, "plan created");

        self.cache
            .invalidate(&[Tag::item(PLAN_TAG, created.id.clone()), Tag::list(PLAN_TAG)])
            .await;
        Ok(created)
    }

    /// Membership is unchanged, so only queries holding this item refetch
    pub async fn update(&self, id: &str, patch: PlanPatch) -> Result<PlanItem, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::invalid_request("plan id is required"));
        }
        if patch.is_empty() {
            return Err(ClientError::invalid_request("update needs at least one field"));
        }
        patch.validate().into_result()?;

        let updated = self.transport.update(id, &patch).await?;
        info!(operation = %Operation::Update, id, fields = ?patch.touched(), "plan updated");

        self.cache.invalidate(&[Tag::item(PLAN_TAG, id)]).await;
        Ok(updated)
    }

    pub async fn set_status(&self, id: &str, status: PlanStatus) -> Result<PlanItem, ClientError> {
        self.update(id, PlanPatch::status(status)).await
    }

    pub async fn delete(&self, id: &str) -> Result<DeletedPlan, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::invalid_request("plan id is required"));
        }

        let deleted = self.transport.delete(id).await?;
        info!(operation = %Operation::Delete, id, "plan deleted");

        self.cache
            .invalidate(&[Tag::item(PLAN_TAG, id), Tag::list(PLAN_TAG)])
            .await;
        Ok(deleted)
    }
}
