use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::columns::Column;
use crate::plans::PlanItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(&self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(format!("unknown sort direction '{}'", s))
        }
    }
}

/// Client-side ordering of the loaded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortKey {
    /// `None` for columns without a comparator
    pub fn new(column: Column, direction: SortDirection) -> Option<SortKey> {
        column.is_sortable().then_some(SortKey { column, direction })
    }

    pub fn compare(&self, a: &PlanItem, b: &PlanItem) -> Ordering {
        let ordering = match self.column {
            Column::DocNo => compare_text(&a.doc_no, &b.doc_no),
            Column::ProjectName => compare_text(&a.project_name, &b.project_name),
            Column::Year => a.year.value().cmp(&b.year.value()),
            Column::Description => compare_text(&a.description, &b.description),
            Column::VolumeDivision => compare_text(a.volume_division.as_str(), b.volume_division.as_str()),
            Column::Status | Column::Actions => Ordering::Equal,
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Case-folded first, then ordinal so the order is total
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Stable sort of one page. Nothing outside `items` is considered.
pub fn sort_page(items: &mut [PlanItem], key: Option<SortKey>) {
    if let Some(key) = key {
        items.sort_by(|a, b| key.compare(a, b));
    }
}
