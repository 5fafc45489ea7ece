// Plan collection: model, list parameters, wire transport and the cache-aware client

pub mod client;
pub mod model;
pub mod params;
pub mod transport;

pub use client::{PlanCache, PlanClient, PLAN_TAG};
pub use model::{DeletedPlan, NewPlan, PlanItem, PlanPatch, PlanStatus, PlanYear, VolumeDivision};
pub use params::{ListParams, PlanPage, TotalSource};
pub use transport::{HttpTransport, PlanTransport, TOTAL_COUNT_HEADER};
