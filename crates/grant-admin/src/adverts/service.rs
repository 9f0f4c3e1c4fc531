use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::cms::{CmsError, CmsGateway};
use super::definition::AdvertDefinition;
use super::domain::{
    Actor, AdminId, AdvertId, AdvertSummaryView, GrantAdvert, GrantAdvertStatus,
    PublishingInformationView, SchemeId,
};
use super::merge::{advert_dates, merge_page, MergeError, ValidationErrors};
use super::publisher::{build_entry_fields, slugify};
use super::repository::{
    AdvertAction, AdvertEvent, AdvertEventPublisher, AdvertRepository, RepositoryError,
};
use super::response::{CompletionStatus, PageResponse};
use super::views::{AdvertPageView, AdvertSectionsView, PageUpdateView, QuestionView};

const MAX_ADVERT_NAME_LENGTH: usize = 80;
const DEFAULT_LOCALE: &str = "en-US";

/// Service composing the advert definition, repository, CMS and event queue.
pub struct GrantAdvertService<R, E> {
    repository: Arc<R>,
    events: Arc<E>,
    cms: Arc<dyn CmsGateway>,
    definition: Arc<AdvertDefinition>,
    locale: String,
}

impl<R, E> GrantAdvertService<R, E>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        events: Arc<E>,
        cms: Arc<dyn CmsGateway>,
        definition: Arc<AdvertDefinition>,
    ) -> Self {
        Self {
            repository,
            events,
            cms,
            definition,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn definition(&self) -> &AdvertDefinition {
        &self.definition
    }

    /// Create an empty DRAFT advert owned by `admin`.
    pub fn create(
        &self,
        admin: AdminId,
        scheme_id: SchemeId,
        name: &str,
    ) -> Result<GrantAdvert, AdvertServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationErrors::single("name", "Enter the name of your advert").into());
        }
        if name.chars().count() > MAX_ADVERT_NAME_LENGTH {
            return Err(ValidationErrors::single(
                "name",
                format!("Advert name must be {MAX_ADVERT_NAME_LENGTH} characters or less"),
            )
            .into());
        }

        let advert = self
            .repository
            .insert(GrantAdvert::new(scheme_id, name, admin))?;
        info!(advert_id = %advert.id, admin_id = %admin, "grant advert created");
        Ok(advert)
    }

    pub fn get(&self, admin: AdminId, id: AdvertId) -> Result<GrantAdvert, AdvertServiceError> {
        self.load_for(Actor::Admin(admin), id)
    }

    pub fn list_for_scheme(
        &self,
        admin: AdminId,
        scheme_id: SchemeId,
    ) -> Result<Vec<AdvertSummaryView>, AdvertServiceError> {
        let adverts = self.repository.for_scheme(scheme_id)?;
        Ok(adverts
            .iter()
            .filter(|advert| advert.is_owned_by(admin))
            .map(GrantAdvert::summary)
            .collect())
    }

    pub fn sections_overview(
        &self,
        admin: AdminId,
        id: AdvertId,
    ) -> Result<AdvertSectionsView, AdvertServiceError> {
        let advert = self.load_for(Actor::Admin(admin), id)?;
        Ok(AdvertSectionsView::build(&advert, &self.definition))
    }

    pub fn page(
        &self,
        admin: AdminId,
        id: AdvertId,
        section_id: &str,
        page_id: &str,
    ) -> Result<AdvertPageView, AdvertServiceError> {
        let advert = self.load_for(Actor::Admin(admin), id)?;
        let section = self.definition.section(section_id).ok_or_else(|| {
            AdvertServiceError::NotFound(format!("section '{section_id}' does not exist"))
        })?;
        let position = section
            .pages
            .iter()
            .position(|page| page.id == page_id)
            .ok_or_else(|| {
                AdvertServiceError::NotFound(format!(
                    "page '{page_id}' does not exist in section '{section_id}'"
                ))
            })?;
        let page = &section.pages[position];
        let stored = advert
            .response
            .section(section_id)
            .and_then(|stored| stored.page(page_id));

        let questions = page
            .questions
            .iter()
            .map(|question| QuestionView {
                definition: question.clone(),
                response: stored
                    .and_then(|stored| stored.question(question.id))
                    .cloned(),
            })
            .collect();

        Ok(AdvertPageView {
            advert_id: advert.id,
            advert_name: advert.name.clone(),
            section_id: section.id,
            section_title: section.title,
            page_id: page.id,
            page_title: page.title,
            status: stored.map(|stored| stored.status).unwrap_or_default(),
            questions,
            previous_page_id: position
                .checked_sub(1)
                .map(|previous| section.pages[previous].id),
            next_page_id: section.pages.get(position + 1).map(|next| next.id),
        })
    }

    /// Merge one submitted page into the advert's answers. Ownership is
    /// checked before the section or page is resolved.
    pub fn update_page(
        &self,
        admin: AdminId,
        id: AdvertId,
        section_id: &str,
        page: PageResponse,
    ) -> Result<PageUpdateView, AdvertServiceError> {
        let mut advert = self.load_for(Actor::Admin(admin), id)?;
        let page_id = page.id.clone();

        let outcome = merge_page(&mut advert.response, &self.definition, section_id, page)?;
        advert.opening_date = outcome.dates.opening;
        advert.closing_date = outcome.dates.closing;
        advert.last_updated = Utc::now();
        let advert = self.repository.update(advert)?;

        info!(
            advert_id = %advert.id,
            section_id,
            page_id = %page_id,
            page_status = ?outcome.page_status,
            section_status = ?outcome.section_status,
            "grant advert page updated"
        );

        Ok(PageUpdateView {
            advert_id: advert.id,
            page_status: outcome.page_status,
            section_status: outcome.section_status,
        })
    }

    /// Create or update the CMS entry for the advert and publish it.
    ///
    /// Lambda actors skip the ownership check; CMS failures propagate and are
    /// left to the caller to retry.
    pub async fn publish(
        &self,
        actor: Actor,
        id: AdvertId,
    ) -> Result<GrantAdvert, AdvertServiceError> {
        let mut advert = self.load_for(actor, id)?;
        self.ensure_complete(&advert)?;
        let dates = advert_dates(&advert.response, &self.definition)?;

        let slug = advert
            .contentful_slug
            .clone()
            .unwrap_or_else(|| slugify(&advert.name, advert.id));
        let fields = build_entry_fields(&advert, &self.definition, &slug, &self.locale);

        let entry = match advert.contentful_entry_id.as_deref() {
            None => {
                let created = self.cms.create_entry(fields.plain).await?;
                // Record the entry straight away so a failed publish is retried
                // as an update instead of creating a second entry.
                advert.contentful_entry_id = Some(created.id.clone());
                advert.contentful_slug = Some(slug.clone());
                advert = self.repository.update(advert)?;
                created
            }
            Some(entry_id) => {
                let mut existing = self.cms.fetch_entry(entry_id).await?;
                for name in &fields.cleared {
                    existing.fields.remove(name);
                }
                existing.fields.extend(fields.plain);
                self.cms.update_entry(existing).await?
            }
        };

        if !fields.rich_text.is_empty() {
            self.cms.patch_rich_text(&entry, fields.rich_text).await?;
        }
        let entry = self.cms.fetch_entry(&entry.id).await?;
        self.cms.publish_entry(&entry).await?;

        let now = Utc::now();
        advert.contentful_entry_id = Some(entry.id);
        advert.contentful_slug = Some(slug);
        advert.status = GrantAdvertStatus::Published;
        advert.first_published_date.get_or_insert(now);
        advert.last_published_date = Some(now);
        advert.opening_date = dates.opening;
        advert.closing_date = dates.closing;
        advert.last_updated = now;
        let advert = self.repository.update(advert)?;

        info!(advert_id = %advert.id, ?actor, "grant advert published");
        self.notify(advert.id, AdvertAction::Publish);
        Ok(advert)
    }

    /// Take a published advert offline and return it to DRAFT.
    pub async fn unpublish(
        &self,
        actor: Actor,
        id: AdvertId,
    ) -> Result<GrantAdvert, AdvertServiceError> {
        let mut advert = self.load_for(actor, id)?;

        if advert.is_live() {
            if let Some(entry_id) = advert.contentful_entry_id.as_deref() {
                let entry = self.cms.fetch_entry(entry_id).await?;
                self.cms.unpublish_entry(&entry).await?;
            }
        }

        let now = Utc::now();
        advert.status = GrantAdvertStatus::Draft;
        advert.unpublished_date = Some(now);
        advert.last_updated = now;
        let advert = self.repository.update(advert)?;

        info!(advert_id = %advert.id, ?actor, "grant advert unpublished");
        self.notify(advert.id, AdvertAction::Unpublish);
        Ok(advert)
    }

    pub fn schedule(
        &self,
        admin: AdminId,
        id: AdvertId,
    ) -> Result<GrantAdvert, AdvertServiceError> {
        let mut advert = self.load_for(Actor::Admin(admin), id)?;
        if !advert.status.can_schedule() {
            return Err(AdvertServiceError::InvalidTransition {
                action: "schedule",
                status: advert.status,
            });
        }
        self.ensure_complete(&advert)?;
        let dates = advert_dates(&advert.response, &self.definition)?;

        advert.status = GrantAdvertStatus::Scheduled;
        advert.opening_date = dates.opening;
        advert.closing_date = dates.closing;
        advert.last_updated = Utc::now();
        let advert = self.repository.update(advert)?;

        info!(advert_id = %advert.id, opening_date = ?advert.opening_date, "grant advert scheduled");
        self.notify(advert.id, AdvertAction::Schedule);
        Ok(advert)
    }

    pub fn unschedule(
        &self,
        actor: Actor,
        id: AdvertId,
    ) -> Result<GrantAdvert, AdvertServiceError> {
        let mut advert = self.load_for(actor, id)?;
        if !advert.status.can_unschedule() {
            return Err(AdvertServiceError::InvalidTransition {
                action: "unschedule",
                status: advert.status,
            });
        }

        advert.status = GrantAdvertStatus::Unscheduled;
        advert.last_updated = Utc::now();
        let advert = self.repository.update(advert)?;

        info!(advert_id = %advert.id, ?actor, "grant advert unscheduled");
        self.notify(advert.id, AdvertAction::Unschedule);
        Ok(advert)
    }

    /// Adverts with a live CMS entry must be unpublished before they can be
    /// deleted.
    pub fn delete(&self, admin: AdminId, id: AdvertId) -> Result<(), AdvertServiceError> {
        let advert = self.load_for(Actor::Admin(admin), id)?;
        if advert.status == GrantAdvertStatus::Published || advert.is_live() {
            return Err(AdvertServiceError::InvalidTransition {
                action: "delete",
                status: advert.status,
            });
        }
        self.repository.delete(id)?;
        info!(advert_id = %id, admin_id = %admin, "grant advert deleted");
        Ok(())
    }

    pub fn publishing_information(
        &self,
        admin: AdminId,
        id: AdvertId,
    ) -> Result<PublishingInformationView, AdvertServiceError> {
        let advert = self.load_for(Actor::Admin(admin), id)?;
        Ok(advert.publishing_information())
    }
}

impl<R, E> GrantAdvertService<R, E>
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    fn load_for(&self, actor: Actor, id: AdvertId) -> Result<GrantAdvert, AdvertServiceError> {
        let advert = self
            .repository
            .fetch(id)?
            .ok_or_else(|| AdvertServiceError::NotFound(format!("grant advert {id} not found")))?;

        if !advert.permits(actor) {
            warn!(advert_id = %id, ?actor, "grant advert access denied");
            return Err(AdvertServiceError::AccessDenied { advert_id: id });
        }
        Ok(advert)
    }

    fn ensure_complete(&self, advert: &GrantAdvert) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for section in &self.definition.sections {
            let status = advert
                .response
                .section(section.id)
                .map(|stored| stored.status)
                .unwrap_or_default();
            if status != CompletionStatus::Completed {
                errors.push(
                    section.id,
                    format!("Complete the '{}' section before publishing", section.title),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn notify(&self, advert_id: AdvertId, action: AdvertAction) {
        let event = AdvertEvent {
            advert_id,
            action,
            occurred_at: Utc::now(),
        };
        if let Err(err) = self.events.publish(event) {
            warn!(%advert_id, ?action, error = %err, "failed to enqueue advert event");
        }
    }
}

/// Error raised by the advert service.
#[derive(Debug, thiserror::Error)]
pub enum AdvertServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("access to grant advert {advert_id} denied")]
    AccessDenied { advert_id: AdvertId },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("cannot {action} a grant advert with status {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: GrantAdvertStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Cms(#[from] CmsError),
}

impl From<MergeError> for AdvertServiceError {
    fn from(value: MergeError) -> Self {
        match value {
            MergeError::Validation(errors) => Self::Validation(errors),
            not_found => Self::NotFound(not_found.to_string()),
        }
    }
}
