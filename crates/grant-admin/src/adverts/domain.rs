use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::response::GrantAdvertResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdvertId(pub Uuid);

impl AdvertId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AdvertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminId(pub u32);

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemeId(pub u32);

/// Who is driving a state change: an interactive admin, or the scheduling
/// lambda acting on the system's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin(AdminId),
    Lambda,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantAdvertStatus {
    #[default]
    Draft,
    Scheduled,
    Unscheduled,
    Published,
}

impl GrantAdvertStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Scheduled => "Scheduled",
            Self::Unscheduled => "Unscheduled",
            Self::Published => "Published",
        }
    }

    pub const fn can_schedule(self) -> bool {
        matches!(self, Self::Draft | Self::Published | Self::Unscheduled)
    }

    pub const fn can_unschedule(self) -> bool {
        matches!(self, Self::Scheduled)
    }
}

/// A grant advert and the answers entered for it so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantAdvert {
    pub id: AdvertId,
    pub scheme_id: SchemeId,
    pub name: String,
    pub created_by: AdminId,
    pub status: GrantAdvertStatus,
    pub response: GrantAdvertResponse,
    pub contentful_entry_id: Option<String>,
    pub contentful_slug: Option<String>,
    pub opening_date: Option<DateTime<Utc>>,
    pub closing_date: Option<DateTime<Utc>>,
    pub first_published_date: Option<DateTime<Utc>>,
    pub last_published_date: Option<DateTime<Utc>>,
    pub unpublished_date: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: u64,
}

impl GrantAdvert {
    pub fn new(scheme_id: SchemeId, name: impl Into<String>, created_by: AdminId) -> Self {
        let now = Utc::now();
        Self {
            id: AdvertId::generate(),
            scheme_id,
            name: name.into(),
            created_by,
            status: GrantAdvertStatus::Draft,
            response: GrantAdvertResponse::default(),
            contentful_entry_id: None,
            contentful_slug: None,
            opening_date: None,
            closing_date: None,
            first_published_date: None,
            last_published_date: None,
            unpublished_date: None,
            created: now,
            last_updated: now,
            version: 1,
        }
    }

    pub fn is_owned_by(&self, admin: AdminId) -> bool {
        self.created_by == admin
    }

    /// Lambda actors are trusted; admins must be the advert's creator.
    pub fn permits(&self, actor: Actor) -> bool {
        match actor {
            Actor::Admin(admin) => self.is_owned_by(admin),
            Actor::Lambda => true,
        }
    }

    /// Whether the CMS entry is currently public. Scheduling a published
    /// advert leaves its entry live, so the status alone cannot tell.
    pub fn is_live(&self) -> bool {
        if self.contentful_entry_id.is_none() {
            return false;
        }
        match (self.last_published_date, self.unpublished_date) {
            (Some(published), Some(unpublished)) => published > unpublished,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn summary(&self) -> AdvertSummaryView {
        AdvertSummaryView {
            id: self.id,
            scheme_id: self.scheme_id,
            name: self.name.clone(),
            status: self.status,
            opening_date: self.opening_date,
            closing_date: self.closing_date,
            last_updated: self.last_updated,
        }
    }

    pub fn publishing_information(&self) -> PublishingInformationView {
        PublishingInformationView {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            status_label: self.status.label(),
            contentful_entry_id: self.contentful_entry_id.clone(),
            contentful_slug: self.contentful_slug.clone(),
            opening_date: self.opening_date,
            closing_date: self.closing_date,
            first_published_date: self.first_published_date,
            last_published_date: self.last_published_date,
            unpublished_date: self.unpublished_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvertSummaryView {
    pub id: AdvertId,
    pub scheme_id: SchemeId,
    pub name: String,
    pub status: GrantAdvertStatus,
    pub opening_date: Option<DateTime<Utc>>,
    pub closing_date: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishingInformationView {
    pub id: AdvertId,
    pub name: String,
    pub status: GrantAdvertStatus,
    pub status_label: &'static str,
    pub contentful_entry_id: Option<String>,
    pub contentful_slug: Option<String>,
    pub opening_date: Option<DateTime<Utc>>,
    pub closing_date: Option<DateTime<Utc>>,
    pub first_published_date: Option<DateTime<Utc>>,
    pub last_published_date: Option<DateTime<Utc>>,
    pub unpublished_date: Option<DateTime<Utc>>,
}
