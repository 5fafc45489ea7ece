use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

/// Field names as they appear on the wire, used as validation keys
pub mod fields {
    pub const DOC_NO: &str = "docNo";
    pub const PROJECT_NAME: &str = "projectName";
    pub const YEAR: &str = "year";
    pub const DESCRIPTION: &str = "description";
    pub const VOLUME_DIVISION: &str = "volumeDivision";
    pub const STATUS: &str = "status";
}

/// Inline messages shown under each form field
pub mod messages {
    pub const DOC_NO_REQUIRED: &str = "Sənədin nömrəsini daxil edin";
    pub const PROJECT_NAME_REQUIRED: &str = "Layihə adını daxil edin";
    pub const YEAR_REQUIRED: &str = "İli seçin";
    pub const DESCRIPTION_REQUIRED: &str = "Təsviri daxil edin";
    pub const VOLUME_DIVISION_REQUIRED: &str = "Həcm bölünməni seçin";
    pub const STATUS_REQUIRED: &str = "Statusu seçin";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlanStatus {
    #[serde(rename = "Aktiv")]
    Active,
    #[serde(rename = "Deaktiv")]
    Inactive,
}

impl PlanStatus {
    pub const ALL: [PlanStatus; 2] = [PlanStatus::Active, PlanStatus::Inactive];

    /// Wire and display value
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "Aktiv",
            PlanStatus::Inactive => "Deaktiv",
        }
    }

    pub fn toggled(&self) -> PlanStatus {
        match self {
            PlanStatus::Active => PlanStatus::Inactive,
            PlanStatus::Inactive => PlanStatus::Active,
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aktiv" | "active" => Ok(PlanStatus::Active),
            "deaktiv" | "inactive" => Ok(PlanStatus::Inactive),
            other => Err(format!("unknown status '{other}' (expected Aktiv or Deaktiv)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VolumeDivision {
    #[serde(rename = "Bərabər Bölünmə")]
    Equal,
    #[serde(rename = "Tarixi Məlumatlara Əsaslanan Bölgü")]
    Historical,
    #[serde(rename = "Dəyişən Bölünmə")]
    Variable,
}

impl VolumeDivision {
    pub const ALL: [VolumeDivision; 3] = [
        VolumeDivision::Equal,
        VolumeDivision::Historical,
        VolumeDivision::Variable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeDivision::Equal => "Bərabər Bölünmə",
            VolumeDivision::Historical => "Tarixi Məlumatlara Əsaslanan Bölgü",
            VolumeDivision::Variable => "Dəyişən Bölünmə",
        }
    }
}

impl fmt::Display for VolumeDivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeDivision {
    type Err = String;

    /// Accepts the wire value or a short alias (`equal`/`a`, `historical`/`b`, `variable`/`c`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(v) = Self::ALL.iter().find(|v| v.as_str() == trimmed) {
            return Ok(*v);
        }
        match trimmed.to_lowercase().as_str() {
            "equal" | "a" => Ok(VolumeDivision::Equal),
            "historical" | "b" => Ok(VolumeDivision::Historical),
            "variable" | "c" => Ok(VolumeDivision::Variable),
            _ => Err(format!("unknown volume division '{trimmed}'")),
        }
    }
}

/// Planning year, restricted to the selectable set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct PlanYear(i32);

impl PlanYear {
    pub const ALLOWED: [i32; 4] = [2023, 2024, 2025, 2026];

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn options() -> impl Iterator<Item = PlanYear> {
        Self::ALLOWED.into_iter().map(PlanYear)
    }
}

impl TryFrom<i32> for PlanYear {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&value) {
            Ok(PlanYear(value))
        } else {
            Err(format!("year {value} is not one of {:?}", Self::ALLOWED))
        }
    }
}

impl From<PlanYear> for i32 {
    fn from(year: PlanYear) -> Self {
        year.0
    }
}

impl fmt::Display for PlanYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub id: String,
    pub doc_no: String,
    pub project_name: String,
    pub year: PlanYear,
    pub description: String,
    pub volume_division: VolumeDivision,
    pub status: PlanStatus,
}

impl PlanItem {
    pub fn without_id(&self) -> NewPlan {
        NewPlan {
            doc_no: self.doc_no.clone(),
            project_name: self.project_name.clone(),
            year: self.year,
            description: self.description.clone(),
            volume_division: self.volume_division,
            status: self.status,
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &PlanPatch) {
        if let Some(v) = &patch.doc_no {
            self.doc_no = v.clone();
        }
        if let Some(v) = &patch.project_name {
            self.project_name = v.clone();
        }
        if let Some(v) = patch.year {
            self.year = v;
        }
        if let Some(v) = &patch.description {
            self.description = v.clone();
        }
        if let Some(v) = patch.volume_division {
            self.volume_division = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
    }
}

/// Create payload: a plan item before the server assigns its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlan {
    pub doc_no: String,
    pub project_name: String,
    pub year: PlanYear,
    pub description: String,
    pub volume_division: VolumeDivision,
    pub status: PlanStatus,
}

impl NewPlan {
    /// Free-text fields must not be blank; the enumerated ones are valid by construction
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.doc_no.trim().is_empty() {
            errors.add(fields::DOC_NO, messages::DOC_NO_REQUIRED);
        }
        if self.project_name.trim().is_empty() {
            errors.add(fields::PROJECT_NAME, messages::PROJECT_NAME_REQUIRED);
        }
        if self.description.trim().is_empty() {
            errors.add(fields::DESCRIPTION, messages::DESCRIPTION_REQUIRED);
        }
        errors
    }

    pub fn into_item(self, id: impl Into<String>) -> PlanItem {
        PlanItem {
            id: id.into(),
            doc_no: self.doc_no,
            project_name: self.project_name,
            year: self.year,
            description: self.description,
            volume_division: self.volume_division,
            status: self.status,
        }
    }
}

/// Partial update; absent fields are left untouched by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<PlanYear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_division: Option<VolumeDivision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlanStatus>,
}

impl PlanPatch {
    pub fn status(status: PlanStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Only the fields of `edited` that differ from `original`
    pub fn between(original: &PlanItem, edited: &NewPlan) -> Self {
        fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
            (before != after).then(|| after.clone())
        }

        Self {
            doc_no: changed(&original.doc_no, &edited.doc_no),
            project_name: changed(&original.project_name, &edited.project_name),
            year: changed(&original.year, &edited.year),
            description: changed(&original.description, &edited.description),
            volume_division: changed(&original.volume_division, &edited.volume_division),
            status: changed(&original.status, &edited.status),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.doc_no.is_none()
            && self.project_name.is_none()
            && self.year.is_none()
            && self.description.is_none()
            && self.volume_division.is_none()
            && self.status.is_none()
    }

    /// Present free-text fields must not be blank
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.doc_no) {
            errors.add(fields::DOC_NO, messages::DOC_NO_REQUIRED);
        }
        if blank(&self.project_name) {
            errors.add(fields::PROJECT_NAME, messages::PROJECT_NAME_REQUIRED);
        }
        if blank(&self.description) {
            errors.add(fields::DESCRIPTION, messages::DESCRIPTION_REQUIRED);
        }
        errors
    }

    /// Names of the fields this patch touches
    pub fn touched(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.doc_no.is_some() {
            out.push(fields::DOC_NO);
        }
        if self.project_name.is_some() {
            out.push(fields::PROJECT_NAME);
        }
        if self.year.is_some() {
            out.push(fields::YEAR);
        }
        if self.description.is_some() {
            out.push(fields::DESCRIPTION);
        }
        if self.volume_division.is_some() {
            out.push(fields::VOLUME_DIVISION);
        }
        if self.status.is_some() {
            out.push(fields::STATUS);
        }
        out
    }
}

/// Body of a successful delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedPlan {
    pub id: String,
}
