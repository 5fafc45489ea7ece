use std::sync::Arc;

use clap::{Args, Subcommand};
use serde_json::json;

use crate::cli::utils::{
    confirm, output_error, output_field_errors, output_notices, output_plan, output_plans, output_success,
};
use crate::cli::{open_session, OutputFormat};
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::plans::{HttpTransport, PlanClient, PlanPatch, PlanStatus, PlanYear, VolumeDivision};
use crate::session::Session;
use crate::view::{notify, Column, EditForm, ListView, SortDirection, SortKey, Submitted};

#[derive(Subcommand)]
pub enum PlanCommands {
    #[command(about = "List one page of plans")]
    List {
        #[arg(long, default_value_t = 1, help = "Page number, starting at 1")]
        page: u32,
        #[arg(long, help = "Page size (10, 20, 50 or 100)")]
        limit: Option<u32>,
        #[arg(long, help = "Free-text search")]
        search: Option<String>,
        #[arg(long = "status", help = "Status filter, repeatable (Aktiv, Deaktiv)")]
        statuses: Vec<PlanStatus>,
        #[arg(long = "volume", help = "Volume division filter, repeatable")]
        volumes: Vec<VolumeDivision>,
        #[arg(long, help = "Sort the loaded page by column (doc-no, project, year, description, volume)")]
        sort: Option<Column>,
        #[arg(long, help = "Sort descending")]
        desc: bool,
        #[arg(long = "hide", help = "Hide a column, repeatable")]
        hidden: Vec<Column>,
    },

    #[command(about = "Create a plan")]
    Create {
        #[command(flatten)]
        fields: PlanFields,
    },

    #[command(about = "Update fields of an existing plan")]
    Update {
        #[arg(help = "Plan id")]
        id: String,
        #[command(flatten)]
        fields: PlanFields,
    },

    #[command(about = "Set a plan's status to Aktiv")]
    Activate {
        id: String,
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "Set a plan's status to Deaktiv")]
    Deactivate {
        id: String,
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "Delete a plan")]
    Delete {
        id: String,
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct PlanFields {
    #[arg(long, help = "Document number")]
    pub doc_no: Option<String>,
    #[arg(long, help = "Project name")]
    pub project: Option<String>,
    #[arg(long, help = "Planning year (2023-2026)")]
    pub year: Option<i32>,
    #[arg(long, help = "Description")]
    pub description: Option<String>,
    #[arg(long, help = "Volume division (equal, historical, variable or the full value)")]
    pub volume: Option<VolumeDivision>,
    #[arg(long, help = "Status (Aktiv or Deaktiv)")]
    pub status: Option<PlanStatus>,
}

impl PlanFields {
    fn fill(self, form: &mut EditForm) -> anyhow::Result<()> {
        if let Some(v) = self.doc_no {
            form.set_doc_no(v);
        }
        if let Some(v) = self.project {
            form.set_project_name(v);
        }
        if let Some(v) = self.year {
            form.set_year(PlanYear::try_from(v).map_err(anyhow::Error::msg)?);
        }
        if let Some(v) = self.description {
            form.set_description(v);
        }
        if let Some(v) = self.volume {
            form.set_volume_division(v);
        }
        if let Some(v) = self.status {
            form.set_status(v);
        }
        Ok(())
    }

    fn into_patch(self) -> anyhow::Result<PlanPatch> {
        Ok(PlanPatch {
            doc_no: self.doc_no,
            project_name: self.project,
            year: self.year.map(PlanYear::try_from).transpose().map_err(anyhow::Error::msg)?,
            description: self.description,
            volume_division: self.volume,
            status: self.status,
        })
    }
}

type HttpListView = ListView<HttpTransport>;

fn open_view(config: &AppConfig, session: Session) -> anyhow::Result<HttpListView> {
    let client = PlanClient::from_config(config, session.clone())?;
    Ok(ListView::from_config(Arc::new(client), session, config))
}

/// Print what the view collected and turn a failed run into an error
fn finish(view: &mut HttpListView, output_format: &OutputFormat, ok: bool) -> anyhow::Result<()> {
    output_notices(output_format, &view.take_notices())?;
    if view.redirect().is_some() {
        anyhow::bail!("session is no longer valid, run `planning auth login`");
    }
    if !ok {
        anyhow::bail!("request failed");
    }
    Ok(())
}

pub async fn handle(cmd: PlanCommands, output_format: OutputFormat, config: &AppConfig) -> anyhow::Result<()> {
    let session = open_session(config)?;
    if !session.is_authenticated() {
        output_error(&output_format, "Not logged in", Some("UNAUTHORIZED"))?;
        anyhow::bail!("not logged in, run `planning auth login`");
    }
    let mut view = open_view(config, session)?;

    match cmd {
        PlanCommands::List {
            page,
            limit,
            search,
            statuses,
            volumes,
            sort,
            desc,
            hidden,
        } => {
            let query = view.query_mut();
            if let Some(limit) = limit {
                if !query.set_page_size(limit) {
                    anyhow::bail!("page size must be one of {:?}", config.view.page_size_options);
                }
            }
            if let Some(search) = search {
                query.set_search(search);
            }
            query.set_status_filter(statuses);
            query.set_volume_filter(volumes);
            query.set_page(page);

            if let Some(column) = sort {
                let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
                match SortKey::new(column, direction) {
                    Some(key) => view.set_sort(Some(key)),
                    None => anyhow::bail!("column '{}' cannot be sorted", column.key()),
                }
            }
            for column in hidden {
                view.columns_mut().set_visible(column, false);
            }

            let ok = view.refresh().await && view.page().is_some();
            if let Some(pagination) = view.pagination() {
                output_plans(&output_format, &view.rows(), &view.columns().visible(), &pagination)?;
            }
            finish(&mut view, &output_format, ok)
        }
        PlanCommands::Create { fields } => {
            let mut form = EditForm::default();
            form.open_create();
            fields.fill(&mut form)?;

            if !form.validate() {
                output_field_errors(&output_format, form.field_errors())?;
                anyhow::bail!("plan is incomplete");
            }
            match view.submit_form(&mut form).await {
                Some(Submitted::Created(item)) => {
                    view.take_notices();
                    output_plan(&output_format, notify::CREATED, &item)
                }
                Some(other) => anyhow::bail!("unexpected outcome {:?}", other),
                None => {
                    if !form.field_errors().is_empty() {
                        output_field_errors(&output_format, form.field_errors())?;
                    }
                    finish(&mut view, &output_format, false)
                }
            }
        }
        PlanCommands::Update { id, fields } => {
            let patch = fields.into_patch()?;
            if patch.is_empty() {
                anyhow::bail!("nothing to update, pass at least one field");
            }
            match view.client().update(&id, patch).await {
                Ok(updated) => output_plan(&output_format, notify::UPDATED, &updated),
                Err(err) => {
                    if let ClientError::Validation(errors) = &err {
                        output_field_errors(&output_format, errors)?;
                    }
                    view.report_error(&err);
                    finish(&mut view, &output_format, false)
                }
            }
        }
        PlanCommands::Activate { id, yes } => {
            let prompt = view.request_set_status(id, PlanStatus::Active);
            run_pending(&mut view, &output_format, prompt, yes).await
        }
        PlanCommands::Deactivate { id, yes } => {
            let prompt = view.request_set_status(id, PlanStatus::Inactive);
            run_pending(&mut view, &output_format, prompt, yes).await
        }
        PlanCommands::Delete { id, yes } => {
            let prompt = view.request_delete(id);
            run_pending(&mut view, &output_format, prompt, yes).await
        }
    }
}

async fn run_pending(
    view: &mut HttpListView,
    output_format: &OutputFormat,
    prompt: &str,
    assume_yes: bool,
) -> anyhow::Result<()> {
    if !confirm(prompt, assume_yes)? {
        view.cancel();
        return output_success(output_format, "Cancelled", Some(json!({ "cancelled": true })));
    }
    let ok = view.confirm().await;
    finish(view, output_format, ok)
}
