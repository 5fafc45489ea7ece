use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Table columns in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    DocNo,
    ProjectName,
    Year,
    Description,
    VolumeDivision,
    Status,
    Actions,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::DocNo,
        Column::ProjectName,
        Column::Year,
        Column::Description,
        Column::VolumeDivision,
        Column::Status,
        Column::Actions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Column::DocNo => "Sənədin nömrəsi",
            Column::ProjectName => "Layihə adı",
            Column::Year => "Planlamanın aid olduğu il",
            Column::Description => "Təsvir",
            Column::VolumeDivision => "Həcm bölünmə",
            Column::Status => "Status",
            Column::Actions => "Əməliyyatlar",
        }
    }

    /// Short name used on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Column::DocNo => "doc-no",
            Column::ProjectName => "project",
            Column::Year => "year",
            Column::Description => "description",
            Column::VolumeDivision => "volume",
            Column::Status => "status",
            Column::Actions => "actions",
        }
    }

    pub fn is_sortable(&self) -> bool {
        !matches!(self, Column::Status | Column::Actions)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(wanted) || c.label() == wanted)
            .ok_or_else(|| {
                let keys: Vec<&str> = Column::ALL.iter().map(|c| c.key()).collect();
                format!("unknown column '{}' (expected one of: {})", s, keys.join(", "))
            })
    }
}

/// Which columns are shown, plus the search box that filters the column picker.
/// Presentation only; never affects what is fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSettings {
    hidden: BTreeSet<Column>,
    label_search: String,
}

impl ColumnSettings {
    pub fn is_visible(&self, column: Column) -> bool {
        !self.hidden.contains(&column)
    }

    pub fn set_visible(&mut self, column: Column, visible: bool) {
        if visible {
            self.hidden.remove(&column);
        } else {
            self.hidden.insert(column);
        }
    }

    /// Flip visibility, returning the new state
    pub fn toggle(&mut self, column: Column) -> bool {
        let visible = !self.is_visible(column);
        self.set_visible(column, visible);
        visible
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn visible(&self) -> Vec<Column> {
        Column::ALL.into_iter().filter(|c| self.is_visible(*c)).collect()
    }

    pub fn set_label_search(&mut self, search: impl Into<String>) {
        self.label_search = search.into();
    }

    pub fn label_search(&self) -> &str {
        &self.label_search
    }

    /// Columns offered in the picker: labels containing the search text, case-insensitive
    pub fn picker_options(&self) -> Vec<Column> {
        let needle = self.label_search.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .filter(|c| needle.is_empty() || c.label().to_lowercase().contains(&needle))
            .collect()
    }
}
