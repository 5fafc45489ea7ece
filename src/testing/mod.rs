use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::plans::{
    DeletedPlan, ListParams, NewPlan, PlanItem, PlanPage, PlanPatch, PlanStatus, PlanTransport, PlanYear,
    VolumeDivision,
};

/// In-memory plan collection behaving like a json-server `/plans` resource.
/// Counts every call so tests can assert what reached "the network".
pub struct FakeTransport {
    plans: Mutex<Vec<PlanItem>>,
    next_id: AtomicUsize,
    fail_next: Mutex<Option<ClientError>>,
    send_total_header: bool,
    delay: Option<Duration>,
    /// Pause after reading the collection, so a list can carry a stale snapshot
    read_delay: Option<Duration>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

pub fn sample_draft() -> NewPlan {
    NewPlan {
        doc_no: "1213213".to_string(),
        project_name: "Layihe1".to_string(),
        year: PlanYear::try_from(2025).unwrap(),
        description: "Qısa təsvir".to_string(),
        volume_division: VolumeDivision::Equal,
        status: PlanStatus::Active,
    }
}

pub fn sample_item(n: usize) -> PlanItem {
    let years = PlanYear::ALLOWED;
    NewPlan {
        doc_no: format!("DOC-{n:03}"),
        project_name: format!("Layihe {n}"),
        year: PlanYear::try_from(years[n % years.len()]).unwrap(),
        description: format!("Plan {n} təsviri"),
        volume_division: VolumeDivision::ALL[n % VolumeDivision::ALL.len()],
        status: if n % 2 == 0 { PlanStatus::Inactive } else { PlanStatus::Active },
    }
    .into_item(format!("plan-{n}"))
}

impl FakeTransport {
    pub fn seeded(count: usize) -> Self {
        Self {
            plans: Mutex::new((1..=count).map(sample_item).collect()),
            next_id: AtomicUsize::new(count + 1),
            fail_next: Mutex::new(None),
            send_total_header: true,
            delay: None,
            read_delay: None,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn without_total_header(mut self) -> Self {
        self.send_total_header = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// The next call of any kind fails with `err`
    pub fn fail_next(&self, err: ClientError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn snapshot(&self) -> Vec<PlanItem> {
        self.plans.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    async fn begin(&self, counter: &AtomicUsize) -> Result<(), ClientError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn matches(item: &PlanItem, params: &ListParams) -> bool {
        if !params.statuses.is_empty() && !params.statuses.contains(&item.status) {
            return false;
        }
        if !params.volumes.is_empty() && !params.volumes.contains(&item.volume_division) {
            return false;
        }
        match &params.search {
            Some(q) => {
                let q = q.to_lowercase();
                [
                    item.doc_no.as_str(),
                    item.project_name.as_str(),
                    item.description.as_str(),
                    item.volume_division.as_str(),
                    item.status.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&q))
            }
            None => true,
        }
    }
}

#[async_trait]
impl PlanTransport for FakeTransport {
    async fn fetch_page(&self, params: &ListParams) -> Result<PlanPage, ClientError> {
        self.begin(&self.list_calls).await?;

        let (items, total) = {
            let plans = self.plans.lock().unwrap();
            let matching: Vec<&PlanItem> = plans.iter().filter(|p| Self::matches(p, params)).collect();
            let total = matching.len() as u64;
            let skip = (params.page as usize - 1) * params.page_size as usize;
            let items: Vec<PlanItem> = matching
                .into_iter()
                .skip(skip)
                .take(params.page_size as usize)
                .cloned()
                .collect();
            (items, total)
        };
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }

        let header = self.send_total_header.then_some(total);
        Ok(PlanPage::from_batch(items, header, params.page_size))
    }

    async fn create(&self, draft: &NewPlan) -> Result<PlanItem, ClientError> {
        self.begin(&self.create_calls).await?;
        let id = format!("plan-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let item = draft.clone().into_item(id);
        self.plans.lock().unwrap().push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: &str, patch: &PlanPatch) -> Result<PlanItem, ClientError> {
        self.begin(&self.update_calls).await?;
        let mut plans = self.plans.lock().unwrap();
        let item = plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::from_status(404, r#"{"message":"not found"}"#))?;
        item.apply(patch);
        Ok(item.clone())
    }

    async fn delete(&self, id: &str) -> Result<DeletedPlan, ClientError> {
        self.begin(&self.delete_calls).await?;
        let mut plans = self.plans.lock().unwrap();
        let before = plans.len();
        plans.retain(|p| p.id != id);
        if plans.len() == before {
            return Err(ClientError::from_status(404, r#"{"message":"not found"}"#));
        }
        Ok(DeletedPlan { id: id.to_string() })
    }
}
