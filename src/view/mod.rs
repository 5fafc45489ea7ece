// Headless dashboard state: what the table shows and what the modal holds

pub mod columns;
pub mod edit_form;
pub mod list_view;
pub mod notify;
pub mod query_state;
pub mod sort;

pub use columns::{Column, ColumnSettings};
pub use edit_form::{EditForm, FormMode, PlanDraft, Submitted};
pub use list_view::{FetchTicket, ListView, PendingAction};
pub use notify::{Notice, NoticeKind};
pub use query_state::{page_count, Pagination, QueryState};
pub use sort::{sort_page, SortDirection, SortKey};
