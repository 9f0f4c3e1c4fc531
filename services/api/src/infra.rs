use async_trait::async_trait;
use grant_admin::adverts::{
    AdvertEvent, AdvertEventPublisher, AdvertId, AdvertRepository, CmsEntry, CmsError,
    CmsGateway, EventError, GrantAdvert, RepositoryError, SchemeId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAdvertRepository {
    adverts: Arc<Mutex<HashMap<AdvertId, GrantAdvert>>>,
}

impl AdvertRepository for InMemoryAdvertRepository {
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
        guard
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn for_scheme(&self, scheme_id: SchemeId) -> Result<Vec<GrantAdvert>, RepositoryError> {
        let guard = self.adverts.lock().expect("repository mutex poisoned");
        let mut adverts: Vec<_> = guard
            .values()
            .filter(|advert| advert.scheme_id == scheme_id)
            .cloned()
            .collect();
        adverts.sort_by(|left, right| right.last_updated.cmp(&left.last_updated));
        Ok(adverts)
    }
}

/// Logs advert events instead of forwarding them to a queue, and keeps them
/// for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingEventPublisher {
    events: Arc<Mutex<Vec<AdvertEvent>>>,
}

impl AdvertEventPublisher for LoggingEventPublisher {
    fn publish(&self, event: AdvertEvent) -> Result<(), EventError> {
        info!(
            advert_id = %event.advert_id,
            action = ?event.action,
            occurred_at = %event.occurred_at,
            "grant advert event"
        );
        let mut guard = self.events.lock().expect("event mutex poisoned");
        guard.push(event);
        Ok(())
    }
}

impl LoggingEventPublisher {
    pub(crate) fn events(&self) -> Vec<AdvertEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

#[derive(Debug, Default)]
struct CmsStore {
    entries: HashMap<String, CmsEntry>,
    published: Vec<String>,
}

/// Stand-in CMS used when no Contentful space is configured.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryCms {
    store: Arc<Mutex<CmsStore>>,
}

impl InMemoryCms {
    pub(crate) fn is_published(&self, entry_id: &str) -> bool {
        self.store
            .lock()
            .expect("cms mutex poisoned")
            .published
            .iter()
            .any(|published| published == entry_id)
    }
}

fn unknown_entry(entry_id: &str) -> CmsError {
    CmsError::Status {
        status: 404,
        body: format!("entry {entry_id} does not exist"),
    }
}

#[async_trait]
impl CmsGateway for InMemoryCms {
    async fn create_entry(&self, fields: Map<String, Value>) -> Result<CmsEntry, CmsError> {
        let entry = CmsEntry {
            id: Uuid::new_v4().simple().to_string(),
            version: 1,
            fields,
        };
        let mut store = self.store.lock().expect("cms mutex poisoned");
        store.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn fetch_entry(&self, entry_id: &str) -> Result<CmsEntry, CmsError> {
        let store = self.store.lock().expect("cms mutex poisoned");
        store
            .entries
            .get(entry_id)
            .cloned()
            .ok_or_else(|| unknown_entry(entry_id))
    }

    async fn update_entry(&self, mut entry: CmsEntry) -> Result<CmsEntry, CmsError> {
        let mut store = self.store.lock().expect("cms mutex poisoned");
        if !store.entries.contains_key(&entry.id) {
            return Err(unknown_entry(&entry.id));
        }
        entry.version += 1;
        store.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn patch_rich_text(
        &self,
        entry: &CmsEntry,
        fields: Map<String, Value>,
    ) -> Result<(), CmsError> {
        let mut store = self.store.lock().expect("cms mutex poisoned");
        let stored = store
            .entries
            .get_mut(&entry.id)
            .ok_or_else(|| unknown_entry(&entry.id))?;
        stored.fields.extend(fields);
        stored.version += 1;
        Ok(())
    }

    async fn publish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError> {
        let mut store = self.store.lock().expect("cms mutex poisoned");
        let stored = store
            .entries
            .get_mut(&entry.id)
            .ok_or_else(|| unknown_entry(&entry.id))?;
        stored.version += 1;
        let published = stored.clone();
        if !store.published.contains(&entry.id) {
            store.published.push(entry.id.clone());
        }
        Ok(published)
    }

    async fn unpublish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError> {
        let mut store = self.store.lock().expect("cms mutex poisoned");
        store.published.retain(|published| published != &entry.id);
        store
            .entries
            .get(&entry.id)
            .cloned()
            .ok_or_else(|| unknown_entry(&entry.id))
    }
}
