use serde::Serialize;

use super::definition::{AdvertDefinition, AdvertDefinitionQuestion};
use super::domain::{AdvertId, GrantAdvert, GrantAdvertStatus};
use super::response::{CompletionStatus, QuestionResponse};

#[derive(Debug, Clone, Serialize)]
pub struct PageOverview {
    pub id: &'static str,
    pub title: &'static str,
    pub status: CompletionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionOverview {
    pub id: &'static str,
    pub title: &'static str,
    pub status: CompletionStatus,
    pub pages: Vec<PageOverview>,
}

/// Task-list view of an advert: every defined section and page with the
/// author's progress, including ones not yet touched.
#[derive(Debug, Clone, Serialize)]
pub struct AdvertSectionsView {
    pub advert_id: AdvertId,
    pub name: String,
    pub status: GrantAdvertStatus,
    pub sections: Vec<SectionOverview>,
    pub ready_to_publish: bool,
}

impl AdvertSectionsView {
    pub fn build(advert: &GrantAdvert, definition: &AdvertDefinition) -> Self {
        let sections: Vec<SectionOverview> = definition
            .sections
            .iter()
            .map(|section| {
                let stored = advert.response.section(section.id);
                let pages = section
                    .pages
                    .iter()
                    .map(|page| PageOverview {
                        id: page.id,
                        title: page.title,
                        status: stored
                            .and_then(|stored| stored.page(page.id))
                            .map(|stored| stored.status)
                            .unwrap_or_default(),
                    })
                    .collect();
                SectionOverview {
                    id: section.id,
                    title: section.title,
                    status: stored.map(|stored| stored.status).unwrap_or_default(),
                    pages,
                }
            })
            .collect();

        let ready_to_publish = sections
            .iter()
            .all(|section| section.status == CompletionStatus::Completed);

        Self {
            advert_id: advert.id,
            name: advert.name.clone(),
            status: advert.status,
            sections,
            ready_to_publish,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub definition: AdvertDefinitionQuestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<QuestionResponse>,
}

/// One page of the advert as the authoring form renders it.
#[derive(Debug, Clone, Serialize)]
pub struct AdvertPageView {
    pub advert_id: AdvertId,
    pub advert_name: String,
    pub section_id: &'static str,
    pub section_title: &'static str,
    pub page_id: &'static str,
    pub page_title: &'static str,
    pub status: CompletionStatus,
    pub questions: Vec<QuestionView>,
    pub previous_page_id: Option<&'static str>,
    pub next_page_id: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageUpdateView {
    pub advert_id: AdvertId,
    pub page_status: CompletionStatus,
    pub section_status: CompletionStatus,
}
