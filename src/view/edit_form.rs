use tracing::debug;

use crate::error::{ClientError, ValidationErrors};
use crate::plans::model::{fields, messages};
use crate::plans::{NewPlan, PlanClient, PlanItem, PlanPatch, PlanStatus, PlanTransport, PlanYear, VolumeDivision};

/// Field values as typed into the modal. The enumerated fields can only hold
/// legal values; `None` means nothing has been selected yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDraft {
    pub doc_no: String,
    pub project_name: String,
    pub year: Option<PlanYear>,
    pub description: String,
    pub volume_division: Option<VolumeDivision>,
    pub status: Option<PlanStatus>,
}

impl PlanDraft {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.doc_no.trim().is_empty() {
            errors.add(fields::DOC_NO, messages::DOC_NO_REQUIRED);
        }
        if self.project_name.trim().is_empty() {
            errors.add(fields::PROJECT_NAME, messages::PROJECT_NAME_REQUIRED);
        }
        if self.year.is_none() {
            errors.add(fields::YEAR, messages::YEAR_REQUIRED);
        }
        if self.description.trim().is_empty() {
            errors.add(fields::DESCRIPTION, messages::DESCRIPTION_REQUIRED);
        }
        if self.volume_division.is_none() {
            errors.add(fields::VOLUME_DIVISION, messages::VOLUME_DIVISION_REQUIRED);
        }
        if self.status.is_none() {
            errors.add(fields::STATUS, messages::STATUS_REQUIRED);
        }
        errors
    }

    /// Complete payload, or `None` while a selection is missing
    pub fn to_new_plan(&self) -> Option<NewPlan> {
        Some(NewPlan {
            doc_no: self.doc_no.trim().to_string(),
            project_name: self.project_name.trim().to_string(),
            year: self.year?,
            description: self.description.trim().to_string(),
            volume_division: self.volume_division?,
            status: self.status?,
        })
    }
}

impl From<&PlanItem> for PlanDraft {
    fn from(item: &PlanItem) -> Self {
        Self {
            doc_no: item.doc_no.clone(),
            project_name: item.project_name.clone(),
            year: Some(item.year),
            description: item.description.clone(),
            volume_division: Some(item.volume_division),
            status: Some(item.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(PlanItem),
}

/// What a submission did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Created(PlanItem),
    Updated(PlanItem),
    /// Edit with nothing changed; closed without a request
    Unchanged,
}

/// Create/edit modal state.
///
/// Closed until `open_create` or `open_edit`. A successful submit closes and
/// resets it; a failed one keeps it open with the error shown.
#[derive(Debug, Clone, Default)]
pub struct EditForm {
    mode: Option<FormMode>,
    draft: PlanDraft,
    field_errors: ValidationErrors,
    error_message: Option<String>,
}

impl EditForm {
    pub fn open_create(&mut self) {
        self.reset();
        self.mode = Some(FormMode::Create);
    }

    pub fn open_edit(&mut self, item: &PlanItem) {
        self.reset();
        self.draft = PlanDraft::from(item);
        self.mode = Some(FormMode::Edit(item.clone()));
    }

    pub fn close(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<&FormMode> {
        self.mode.as_ref()
    }

    pub fn draft(&self) -> &PlanDraft {
        &self.draft
    }

    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_doc_no(&mut self, value: impl Into<String>) {
        self.draft.doc_no = value.into();
    }

    pub fn set_project_name(&mut self, value: impl Into<String>) {
        self.draft.project_name = value.into();
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.draft.description = value.into();
    }

    pub fn set_year(&mut self, year: PlanYear) {
        self.draft.year = Some(year);
    }

    pub fn set_volume_division(&mut self, volume: VolumeDivision) {
        self.draft.volume_division = Some(volume);
    }

    pub fn set_status(&mut self, status: PlanStatus) {
        self.draft.status = Some(status);
    }

    /// Pick a year from the options; anything else is refused
    pub fn select_year(&mut self, year: i32) -> bool {
        match PlanYear::try_from(year) {
            Ok(year) => {
                self.set_year(year);
                true
            }
            Err(_) => false,
        }
    }

    pub fn select_volume_division(&mut self, value: &str) -> bool {
        match value.parse::<VolumeDivision>() {
            Ok(volume) => {
                self.set_volume_division(volume);
                true
            }
            Err(_) => false,
        }
    }

    pub fn select_status(&mut self, value: &str) -> bool {
        match value.parse::<PlanStatus>() {
            Ok(status) => {
                self.set_status(status);
                true
            }
            Err(_) => false,
        }
    }

    /// Run validation and keep the result for display
    pub fn validate(&mut self) -> bool {
        self.field_errors = self.draft.validate();
        self.field_errors.is_empty()
    }

    pub async fn submit<T: PlanTransport>(&mut self, client: &PlanClient<T>) -> Result<Submitted, ClientError> {
        let Some(mode) = self.mode.clone() else {
            return Err(ClientError::invalid_request("form is not open"));
        };

        self.error_message = None;
        if !self.validate() {
            return Err(ClientError::Validation(self.field_errors.clone()));
        }
        let Some(plan) = self.draft.to_new_plan() else {
            return Err(ClientError::Validation(self.draft.validate()));
        };

        let result = match mode {
            FormMode::Create => client.create(plan).await.map(Submitted::Created),
            FormMode::Edit(original) => {
                let patch = PlanPatch::between(&original, &plan);
                if patch.is_empty() {
                    debug!(id = %original.id, "edit submitted without changes");
                    Ok(Submitted::Unchanged)
                } else {
                    client.update(&original.id, patch).await.map(Submitted::Updated)
                }
            }
        };

        match result {
            Ok(outcome) => {
                self.reset();
                Ok(outcome)
            }
            Err(err) => {
                match &err {
                    ClientError::Validation(errors) => self.field_errors = errors.clone(),
                    other => self.error_message = Some(other.user_message()),
                }
                Err(err)
            }
        }
    }
}
