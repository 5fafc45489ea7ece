use std::collections::BTreeSet;

use crate::config::PAGE_SIZE_OPTIONS;
use crate::plans::{ListParams, PlanStatus, VolumeDivision};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// What slice of the collection the list view currently wants.
///
/// Search and filter changes always return to page 1; paging leaves
/// search and filters alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    page: u32,
    page_size: u32,
    search: String,
    statuses: BTreeSet<PlanStatus>,
    volumes: BTreeSet<VolumeDivision>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    /// Falls back to the default size when `page_size` is not a selectable option
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: if PAGE_SIZE_OPTIONS.contains(&page_size) {
                page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
            search: String::new(),
            statuses: BTreeSet::new(),
            volumes: BTreeSet::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn statuses(&self) -> &BTreeSet<PlanStatus> {
        &self.statuses
    }

    pub fn volumes(&self) -> &BTreeSet<VolumeDivision> {
        &self.volumes
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn set_status_filter(&mut self, statuses: impl IntoIterator<Item = PlanStatus>) {
        self.statuses = statuses.into_iter().collect();
        self.page = 1;
    }

    pub fn set_volume_filter(&mut self, volumes: impl IntoIterator<Item = VolumeDivision>) {
        self.volumes = volumes.into_iter().collect();
        self.page = 1;
    }

    /// Pages below 1 clamp to 1
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Ignores sizes outside the selectable options. Returns whether it applied.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return false;
        }
        self.page_size = page_size;
        true
    }

    /// Back to page 1 with no search and no filters; the page size is kept
    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.statuses.clear();
        self.volumes.clear();
        self.page = 1;
    }

    pub fn has_filters(&self) -> bool {
        !self.search.trim().is_empty() || !self.statuses.is_empty() || !self.volumes.is_empty()
    }

    pub fn to_params(&self) -> ListParams {
        ListParams::new(self.page, self.page_size)
            .with_search(self.search.clone())
            .with_statuses(self.statuses.iter().copied())
            .with_volumes(self.volumes.iter().copied())
    }
}

/// Pager state derived from the current page and the reported total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current: u32,
    pub page_size: u32,
    pub total: u64,
    /// `false` when the total is only the length of the returned batch
    pub total_is_exact: bool,
}

impl Pagination {
    pub fn page_count(&self) -> u64 {
        page_count(self.total, self.page_size)
    }

    pub fn summary(&self) -> String {
        format!("Total {} items", self.total)
    }
}

pub fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64)
}
