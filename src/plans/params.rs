use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{PlanItem, PlanStatus, VolumeDivision};
use crate::error::ClientError;

/// Parameters of one list request; doubles as the cache key.
///
/// Filter values live in ordered sets so the same selection made in a
/// different order hits the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ListParams {
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub statuses: BTreeSet<PlanStatus>,
    pub volumes: BTreeSet<VolumeDivision>,
}

impl ListParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            search: None,
            statuses: BTreeSet::new(),
            volumes: BTreeSet::new(),
        }
    }

    /// Blank search text means no search term at all
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() { None } else { Some(search) };
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = PlanStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_volumes(mut self, volumes: impl IntoIterator<Item = VolumeDivision>) -> Self {
        self.volumes = volumes.into_iter().collect();
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.page == 0 {
            return Err(ClientError::invalid_request("page is 1-based and must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(ClientError::invalid_request("page size must be at least 1"));
        }
        Ok(())
    }

    /// Query string pairs: `_page`, `_limit`, `q`, repeated `status` and `volumeDivision`
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("_page", self.page.to_string()), ("_limit", self.page_size.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("q", search.clone()));
        }
        for status in &self.statuses {
            pairs.push(("status", status.as_str().to_string()));
        }
        for volume in &self.volumes {
            pairs.push(("volumeDivision", volume.as_str().to_string()));
        }
        pairs
    }
}

/// Where `PlanPage::total` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TotalSource {
    /// `x-total-count` response header
    Header,
    /// Header absent: length of the returned batch, a lower bound only
    BatchLength,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanPage {
    pub items: Vec<PlanItem>,
    pub total: u64,
    pub total_source: TotalSource,
}

impl PlanPage {
    /// Build a page from a response batch, trimming anything past `page_size`
    pub fn from_batch(mut items: Vec<PlanItem>, header_total: Option<u64>, page_size: u32) -> Self {
        let limit = page_size as usize;
        if items.len() > limit {
            tracing::warn!(returned = items.len(), page_size, "server returned more rows than requested, trimming");
            items.truncate(limit);
        }

        match header_total {
            Some(total) => Self {
                items,
                total,
                total_source: TotalSource::Header,
            },
            None => Self {
                total: items.len() as u64,
                items,
                total_source: TotalSource::BatchLength,
            },
        }
    }

    pub fn total_is_exact(&self) -> bool {
        self.total_source == TotalSource::Header
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.id.as_str())
    }
}
