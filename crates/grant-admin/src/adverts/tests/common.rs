use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{Map, Value};

use crate::adverts::cms::{CmsEntry, CmsError, CmsGateway};
use crate::adverts::definition::AdvertDefinition;
use crate::adverts::domain::{AdminId, AdvertId, GrantAdvert, SchemeId};
use crate::adverts::repository::{
    AdvertEvent, AdvertEventPublisher, AdvertRepository, EventError, RepositoryError,
};
use crate::adverts::response::{PageResponse, QuestionResponse};
use crate::adverts::service::GrantAdvertService;

pub(super) const OWNER: AdminId = AdminId(7);
pub(super) const INTRUDER: AdminId = AdminId(99);
pub(super) const SCHEME: SchemeId = SchemeId(12);
pub(super) const LAMBDA_SECRET: &str = "lambda-shared-secret";

pub(super) type TestService = GrantAdvertService<MemoryRepository, MemoryEvents>;

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) events: Arc<MemoryEvents>,
    pub(super) cms: Arc<FakeCms>,
}

pub(super) fn harness() -> Harness {
    harness_with_cms(FakeCms::default())
}

pub(super) fn harness_with_cms(cms: FakeCms) -> Harness {
    let repository = Arc::new(MemoryRepository::default());
    let events = Arc::new(MemoryEvents::default());
    let cms = Arc::new(cms);
    let service = Arc::new(GrantAdvertService::new(
        repository.clone(),
        events.clone(),
        cms.clone(),
        Arc::new(AdvertDefinition::standard()),
    ));
    Harness {
        service,
        repository,
        events,
        cms,
    }
}

impl Harness {
    pub(super) fn draft(&self) -> GrantAdvert {
        self.service
            .create(OWNER, SCHEME, "Community Resilience Fund")
            .expect("advert created")
    }

    /// A draft with every page of the definition answered.
    pub(super) fn completed(&self) -> GrantAdvert {
        let advert = self.draft();
        for (section_id, page) in complete_pages() {
            self.service
                .update_page(OWNER, advert.id, section_id, page)
                .expect("page merges");
        }
        self.stored(advert.id)
    }

    pub(super) fn stored(&self, id: AdvertId) -> GrantAdvert {
        self.repository
            .fetch(id)
            .expect("fetch succeeds")
            .expect("advert stored")
    }
}

pub(super) fn complete_pages() -> Vec<(&'static str, PageResponse)> {
    vec![
        (
            "grantDetails",
            PageResponse::new(
                "1",
                vec![QuestionResponse::single(
                    "grantShortDescription",
                    "Funding for community groups recovering from flooding.",
                )],
            ),
        ),
        (
            "grantDetails",
            PageResponse::new(
                "2",
                vec![QuestionResponse::multi("grantLocation", ["National"])],
            ),
        ),
        (
            "grantDetails",
            PageResponse::new(
                "3",
                vec![QuestionResponse::single(
                    "grantFunder",
                    "Department for Levelling Up",
                )],
            ),
        ),
        (
            "grantDetails",
            PageResponse::new(
                "4",
                vec![QuestionResponse::multi(
                    "grantApplicantType",
                    ["Charity", "Local authority"],
                )],
            ),
        ),
        ("awardAmounts", award_amounts_page("1,000,000", "50,000", "1,000")),
        ("applicationDates", dates_page(["1", "7", "2030"], ["31", "8", "2030"])),
        (
            "howToApply",
            PageResponse::new(
                "1",
                vec![QuestionResponse::single(
                    "grantWebpageUrl",
                    "https://apply.example.gov.uk/community-resilience",
                )],
            ),
        ),
        (
            "furtherInformation",
            PageResponse::new(
                "1",
                vec![QuestionResponse::single(
                    "grantEligibilityTab",
                    "Registered charities and local authorities.",
                )],
            ),
        ),
        (
            "furtherInformation",
            PageResponse::new(
                "2",
                vec![QuestionResponse::single(
                    "grantSummaryTab",
                    "## Summary\n\nSupport for flood recovery.\n\n- Repairs\n- Equipment",
                )],
            ),
        ),
        ("furtherInformation", PageResponse::new("3", Vec::new())),
        ("furtherInformation", PageResponse::new("4", Vec::new())),
        ("furtherInformation", PageResponse::new("5", Vec::new())),
        ("furtherInformation", PageResponse::new("6", Vec::new())),
    ]
}

pub(super) fn award_amounts_page(total: &str, maximum: &str, minimum: &str) -> PageResponse {
    PageResponse::new(
        "1",
        vec![
            QuestionResponse::single("grantTotalAwardAmount", total),
            QuestionResponse::single("grantMaximumAward", maximum),
            QuestionResponse::single("grantMinimumAward", minimum),
        ],
    )
}

pub(super) fn dates_page(opening: [&str; 3], closing: [&str; 3]) -> PageResponse {
    PageResponse::new(
        "1",
        vec![
            QuestionResponse::multi("grantApplicationOpenDate", opening),
            QuestionResponse::multi("grantApplicationCloseDate", closing),
        ],
    )
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) adverts: Arc<Mutex<HashMap<AdvertId, GrantAdvert>>>,
}

impl AdvertRepository for MemoryRepository {
    fn insert(&self, advert: GrantAdvert) -> Result<GrantAdvert, RepositoryError> {
        let mut guard = self.adverts.lock().expect("repository mutex poisoned");
        if guard.contains_key(&advert.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(advert.id, advert.clone());
        Ok(advert)
    }

    fn update(&self, mut advert: GrantAdvert) -> Result<GrantAdvert, RepositoryError> {
        let mut guard = self.adverts.lock().expect("repository mutex poisoned");
        let current = guard.get(&advert.id).ok_or(RepositoryError::NotFound)?;
        advert.version = current.version + 1;
        guard.insert(advert.id, advert.clone());
        Ok(advert)
    }

    fn fetch(&self, id: AdvertId) -> Result<Option<GrantAdvert>, RepositoryError> {
        let guard = self.adverts.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn delete(&self, id: AdvertId) -> Result<(), RepositoryError> {
        let mut guard = self.adverts.lock().expect("repository mutex poisoned");
        guard.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn for_scheme(&self, scheme_id: SchemeId) -> Result<Vec<GrantAdvert>, RepositoryError> {
        let guard = self.adverts.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|advert| advert.scheme_id == scheme_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryEvents {
    events: Arc<Mutex<Vec<AdvertEvent>>>,
    fail: bool,
}

impl MemoryEvents {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn events(&self) -> Vec<AdvertEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl AdvertEventPublisher for MemoryEvents {
    fn publish(&self, event: AdvertEvent) -> Result<(), EventError> {
        if self.fail {
            return Err(EventError::Transport("queue offline".to_string()));
        }
        self.events.lock().expect("event mutex poisoned").push(event);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FakeCmsState {
    entries: HashMap<String, CmsEntry>,
    calls: Vec<String>,
    published: Vec<String>,
    next_id: u32,
}

/// Records every call and keeps entries in memory. `fail_on` makes the named
/// operation return a 500.
#[derive(Debug, Default)]
pub(super) struct FakeCms {
    state: Mutex<FakeCmsState>,
    fail_on: Option<&'static str>,
}

impl FakeCms {
    pub(super) fn failing_on(operation: &'static str) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.state.lock().expect("cms mutex poisoned").calls.clone()
    }

    pub(super) fn entry(&self, id: &str) -> Option<CmsEntry> {
        self.state
            .lock()
            .expect("cms mutex poisoned")
            .entries
            .get(id)
            .cloned()
    }

    pub(super) fn entry_count(&self) -> usize {
        self.state.lock().expect("cms mutex poisoned").entries.len()
    }

    pub(super) fn is_published(&self, id: &str) -> bool {
        self.state
            .lock()
            .expect("cms mutex poisoned")
            .published
            .iter()
            .any(|published| published == id)
    }

    fn record(&self, operation: &str) -> Result<std::sync::MutexGuard<'_, FakeCmsState>, CmsError> {
        let mut state = self.state.lock().expect("cms mutex poisoned");
        state.calls.push(operation.to_string());
        if self.fail_on == Some(operation) {
            return Err(CmsError::Status {
                status: 500,
                body: format!("{operation} failed"),
            });
        }
        Ok(state)
    }
}

fn missing(id: &str) -> CmsError {
    CmsError::Status {
        status: 404,
        body: format!("entry {id} not found"),
    }
}

#[async_trait]
impl CmsGateway for FakeCms {
    async fn create_entry(&self, fields: Map<String, Value>) -> Result<CmsEntry, CmsError> {
        let mut state = self.record("create")?;
        state.next_id += 1;
        let entry = CmsEntry {
            id: format!("entry-{}", state.next_id),
            version: 1,
            fields,
        };
        state.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn fetch_entry(&self, entry_id: &str) -> Result<CmsEntry, CmsError> {
        let state = self.record("fetch")?;
        state
            .entries
            .get(entry_id)
            .cloned()
            .ok_or_else(|| missing(entry_id))
    }

    async fn update_entry(&self, mut entry: CmsEntry) -> Result<CmsEntry, CmsError> {
        let mut state = self.record("update")?;
        if !state.entries.contains_key(&entry.id) {
            return Err(missing(&entry.id));
        }
        entry.version += 1;
        state.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn patch_rich_text(
        &self,
        entry: &CmsEntry,
        fields: Map<String, Value>,
    ) -> Result<(), CmsError> {
        let mut state = self.record("patch")?;
        let stored = state
            .entries
            .get_mut(&entry.id)
            .ok_or_else(|| missing(&entry.id))?;
        stored.fields.extend(fields);
        stored.version += 1;
        Ok(())
    }

    async fn publish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError> {
        let mut state = self.record("publish")?;
        let stored = state
            .entries
            .get_mut(&entry.id)
            .ok_or_else(|| missing(&entry.id))?;
        stored.version += 1;
        let published = stored.clone();
        state.published.push(entry.id.clone());
        Ok(published)
    }

    async fn unpublish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError> {
        let mut state = self.record("unpublish")?;
        state.published.retain(|published| published != &entry.id);
        state
            .entries
            .get(&entry.id)
            .cloned()
            .ok_or_else(|| missing(&entry.id))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
