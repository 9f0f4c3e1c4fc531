use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AdvertId, GrantAdvert, SchemeId};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update` is last-write-wins: implementations bump `version` on every
/// write but do not reject stale copies.
pub trait AdvertRepository: Send + Sync {
    fn insert(&self, advert: GrantAdvert) -> Result<GrantAdvert, RepositoryError>;
    fn update(&self, advert: GrantAdvert) -> Result<GrantAdvert, RepositoryError>;
    fn fetch(&self, id: AdvertId) -> Result<Option<GrantAdvert>, RepositoryError>;
    fn delete(&self, id: AdvertId) -> Result<(), RepositoryError>;
    fn for_scheme(&self, scheme_id: SchemeId) -> Result<Vec<GrantAdvert>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvertAction {
    Publish,
    Unpublish,
    Schedule,
    Unschedule,
}

/// Notification placed on the advert action queue after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertEvent {
    pub advert_id: AdvertId,
    pub action: AdvertAction,
    pub occurred_at: DateTime<Utc>,
}

/// Outbound queue hook (SQS in production).
pub trait AdvertEventPublisher: Send + Sync {
    fn publish(&self, event: AdvertEvent) -> Result<(), EventError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
