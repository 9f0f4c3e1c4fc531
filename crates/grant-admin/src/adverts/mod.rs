//! Grant advert authoring and publishing.
//!
//! Admins fill an advert in page by page against the static
//! [`AdvertDefinition`]; each submitted page is merged into the advert's
//! response aggregate. Completed adverts are scheduled or published to the
//! CMS, either interactively or by the scheduling lambda.

pub mod cms;
pub mod definition;
pub mod domain;
pub mod merge;
pub mod publisher;
pub mod repository;
pub mod response;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use cms::{CmsEntry, CmsError, CmsGateway, ContentfulClient};
pub use definition::{
    AdvertDefinition, AdvertDefinitionPage, AdvertDefinitionQuestion, AdvertDefinitionSection,
    DateRole, QuestionValidation, ResponseType,
};
pub use domain::{
    Actor, AdminId, AdvertId, AdvertSummaryView, GrantAdvert, GrantAdvertStatus,
    PublishingInformationView, SchemeId,
};
pub use merge::{AdvertDates, FieldError, MergeError, MergeOutcome, ValidationErrors};
pub use repository::{
    AdvertAction, AdvertEvent, AdvertEventPublisher, AdvertRepository, EventError,
    RepositoryError,
};
pub use response::{
    CompletionStatus, GrantAdvertResponse, PageResponse, QuestionResponse, SectionResponse,
};
pub use router::{advert_router, AdminSession, AuthRejection, ADMIN_ID_HEADER};
pub use service::{AdvertServiceError, GrantAdvertService};
pub use views::{AdvertPageView, AdvertSectionsView, PageUpdateView};
