use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use super::columns::{Column, ColumnSettings};
use super::edit_form::{EditForm, Submitted};
use super::notify::{self, Notice};
use super::query_state::{Pagination, QueryState};
use super::sort::{sort_page, SortDirection, SortKey};
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::plans::{ListParams, PlanClient, PlanItem, PlanPage, PlanStatus, PlanTransport};
use crate::session::{Route, Session};

pub const CONFIRM_DELETE: &str = "Silmək istədiyinizə əminsiniz?";
pub const CONFIRM_DEACTIVATE: &str = "Planlamanı deaktiv etmək istədiyinizə əminsiniz?";
pub const CONFIRM_ACTIVATE: &str = "Planlamanı aktiv etmək istədiyinizə əminsiniz?";

/// A state-changing row action waiting for the user to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Delete { id: String },
    SetStatus { id: String, status: PlanStatus },
}

impl PendingAction {
    pub fn id(&self) -> &str {
        match self {
            PendingAction::Delete { id } | PendingAction::SetStatus { id, .. } => id,
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            PendingAction::Delete { .. } => CONFIRM_DELETE,
            PendingAction::SetStatus { status: PlanStatus::Inactive, .. } => CONFIRM_DEACTIVATE,
            PendingAction::SetStatus { status: PlanStatus::Active, .. } => CONFIRM_ACTIVATE,
        }
    }
}

/// Handed out by `begin_fetch`; only the newest ticket for the current
/// parameters may land in the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    params: ListParams,
}

impl FetchTicket {
    pub fn params(&self) -> &ListParams {
        &self.params
    }
}

/// Dashboard table: query state, the loaded page and everything the user
/// can do to it.
pub struct ListView<T: PlanTransport> {
    client: Arc<PlanClient<T>>,
    session: Session,
    query: QueryState,
    columns: ColumnSettings,
    sort: Option<SortKey>,
    page: Option<PlanPage>,
    loaded_params: Option<ListParams>,
    issued: u64,
    applied: u64,
    loading: bool,
    pending: Option<PendingAction>,
    notices: Vec<Notice>,
    redirect: Option<Route>,
    events: broadcast::Receiver<Vec<ListParams>>,
}

impl<T: PlanTransport> ListView<T> {
    pub fn new(client: Arc<PlanClient<T>>, session: Session, query: QueryState) -> Self {
        let events = client.subscribe();
        Self {
            client,
            session,
            query,
            columns: ColumnSettings::default(),
            sort: None,
            page: None,
            loaded_params: None,
            issued: 0,
            applied: 0,
            loading: false,
            pending: None,
            notices: Vec::new(),
            redirect: None,
            events,
        }
    }

    pub fn from_config(client: Arc<PlanClient<T>>, session: Session, config: &AppConfig) -> Self {
        Self::new(client, session, QueryState::with_page_size(config.view.default_page_size))
    }

    pub fn client(&self) -> &Arc<PlanClient<T>> {
        &self.client
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Changes take effect on the next `refresh`
    pub fn query_mut(&mut self) -> &mut QueryState {
        &mut self.query
    }

    pub fn columns(&self) -> &ColumnSettings {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ColumnSettings {
        &mut self.columns
    }

    pub fn sort(&self) -> Option<SortKey> {
        self.sort
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) {
        self.sort = sort;
    }

    /// Header click: ascending first, then descending, then unsorted.
    /// Returns `false` for columns that cannot be sorted.
    pub fn cycle_sort(&mut self, column: Column) -> bool {
        if !column.is_sortable() {
            return false;
        }
        self.sort = match self.sort {
            Some(key) if key.column == column => match key.direction {
                SortDirection::Asc => SortKey::new(column, SortDirection::Desc),
                SortDirection::Desc => None,
            },
            _ => SortKey::new(column, SortDirection::Asc),
        };
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the displayed page was fetched for the current query state
    pub fn is_current(&self) -> bool {
        self.loaded_params.as_ref() == Some(&self.query.to_params())
    }

    pub fn page(&self) -> Option<&PlanPage> {
        self.page.as_ref()
    }

    /// Loaded page in display order
    pub fn rows(&self) -> Vec<PlanItem> {
        let mut items = self.page.as_ref().map(|p| p.items.clone()).unwrap_or_default();
        sort_page(&mut items, self.sort);
        items
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.page.as_ref().map(|page| Pagination {
            current: self.query.page(),
            page_size: self.query.page_size(),
            total: page.total,
            total_is_exact: page.total_is_exact(),
        })
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Set once a request was rejected as unauthenticated
    pub fn redirect(&self) -> Option<Route> {
        self.redirect
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket {
            seq: self.issued,
            params: self.query.to_params(),
        }
    }

    /// Land a fetch result. Returns `false` when the ticket was superseded and
    /// the result discarded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<PlanPage, ClientError>) -> bool {
        if ticket.params != self.query.to_params() || ticket.seq < self.applied {
            debug!(seq = ticket.seq, "discarding stale list result");
            return false;
        }
        self.applied = ticket.seq;
        if ticket.seq == self.issued {
            self.loading = false;
        }

        match result {
            Ok(page) => {
                self.page = Some(page);
                self.loaded_params = Some(ticket.params);
            }
            Err(err) => self.report_error(&err),
        }
        true
    }

    /// Fetch the page for the current query state
    pub async fn refresh(&mut self) -> bool {
        let ticket = self.begin_fetch();
        let result = self.client.list(ticket.params.clone()).await;
        self.complete_fetch(ticket, result)
    }

    /// Drain invalidation announcements and refetch when the displayed page
    /// was among the dropped entries. Returns whether a refetch happened.
    pub async fn sync(&mut self) -> bool {
        let Some(loaded) = self.loaded_params.clone() else {
            return false;
        };

        let mut stale = false;
        loop {
            match self.events.try_recv() {
                Ok(keys) => stale |= keys.contains(&loaded),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed invalidation events, refetching");
                    stale = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if stale {
            self.refresh().await;
        }
        stale
    }

    pub fn request_delete(&mut self, id: impl Into<String>) -> &'static str {
        let action = PendingAction::Delete { id: id.into() };
        let prompt = action.prompt();
        self.pending = Some(action);
        prompt
    }

    pub fn request_set_status(&mut self, id: impl Into<String>, status: PlanStatus) -> &'static str {
        let action = PendingAction::SetStatus { id: id.into(), status };
        let prompt = action.prompt();
        self.pending = Some(action);
        prompt
    }

    /// Ask to flip the row's status
    pub fn request_toggle_status(&mut self, item: &PlanItem) -> &'static str {
        self.request_set_status(item.id.clone(), item.status.toggled())
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Run the pending action. Returns `false` when nothing was pending or the action failed.
    pub async fn confirm(&mut self) -> bool {
        let Some(action) = self.pending.take() else {
            return false;
        };

        let outcome = match &action {
            PendingAction::Delete { id } => self.client.delete(id).await.map(|_| notify::DELETED),
            PendingAction::SetStatus { id, status } => self
                .client
                .set_status(id, *status)
                .await
                .map(|_| match status {
                    PlanStatus::Active => notify::ACTIVATED,
                    PlanStatus::Inactive => notify::DEACTIVATED,
                }),
        };

        match outcome {
            Ok(message) => {
                info!(id = action.id(), notice = message, "row action applied");
                self.notices.push(Notice::success(message));
                self.sync().await;
                true
            }
            Err(err) => {
                self.report_error(&err);
                false
            }
        }
    }

    /// Submit the modal and report the outcome here. `None` when it failed;
    /// inline field errors stay on the form.
    pub async fn submit_form(&mut self, form: &mut EditForm) -> Option<Submitted> {
        match form.submit(&*self.client).await {
            Ok(outcome) => {
                let message = match &outcome {
                    Submitted::Created(_) => Some(notify::CREATED),
                    Submitted::Updated(_) => Some(notify::UPDATED),
                    Submitted::Unchanged => None,
                };
                if let Some(message) = message {
                    self.notices.push(Notice::success(message));
                    self.sync().await;
                }
                Some(outcome)
            }
            Err(ClientError::Validation(_)) => None,
            Err(err) => {
                self.report_error(&err);
                None
            }
        }
    }

    /// Surface a failed request as a notice. An unauthenticated answer also
    /// clears the session and sets the redirect to `/login`.
    pub fn report_error(&mut self, err: &ClientError) {
        if err.is_unauthorized() {
            warn!("request rejected as unauthenticated, clearing session");
            if let Err(e) = self.session.clear() {
                warn!("failed to clear session: {}", e);
            }
            self.redirect = Some(Route::Login);
        }
        self.notices.push(Notice::error(err.user_message()));
    }
}
