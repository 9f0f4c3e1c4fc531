use serde::{Deserialize, Serialize};

use super::definition::ResponseType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl CompletionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }
}

/// A single answer. Composite answers (dates, multi-select lists) use
/// `multi_response`; everything else uses `response`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: String,
    #[serde(default)]
    pub seen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_response: Option<Vec<String>>,
}

impl QuestionResponse {
    pub fn single(id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: Some(response.into()),
            ..Self::default()
        }
    }

    pub fn multi<I, S>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            multi_response: Some(values.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// The first non-blank textual value, falling back to the head of a multi
    /// response for clients that post single values as one-element arrays.
    pub fn text(&self) -> Option<&str> {
        self.response
            .as_deref()
            .or_else(|| {
                self.multi_response
                    .as_ref()
                    .and_then(|values| values.first())
                    .map(String::as_str)
            })
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn values(&self) -> Vec<&str> {
        match &self.multi_response {
            Some(values) => values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .collect(),
            None => self.text().into_iter().collect(),
        }
    }

    /// Whether the stored value counts as answered for a question of `response_type`.
    pub fn has_answer(&self, response_type: ResponseType) -> bool {
        match response_type {
            ResponseType::Date => self.multi_response.as_ref().is_some_and(|parts| {
                parts.len() >= 3 && parts.iter().take(3).all(|part| !part.trim().is_empty())
            }),
            ResponseType::List => !self.values().is_empty(),
            ResponseType::ShortText
            | ResponseType::LongText
            | ResponseType::RichText
            | ResponseType::Currency => self.text().is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: CompletionStatus,
    #[serde(default)]
    pub questions: Vec<QuestionResponse>,
}

impl PageResponse {
    pub fn new(id: impl Into<String>, questions: Vec<QuestionResponse>) -> Self {
        Self {
            id: id.into(),
            status: CompletionStatus::NotStarted,
            questions,
        }
    }

    pub fn question(&self, question_id: &str) -> Option<&QuestionResponse> {
        self.questions
            .iter()
            .find(|question| question.id == question_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionResponse {
    pub id: String,
    #[serde(default)]
    pub status: CompletionStatus,
    #[serde(default)]
    pub pages: Vec<PageResponse>,
}

impl SectionResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: CompletionStatus::NotStarted,
            pages: Vec::new(),
        }
    }

    pub fn page(&self, page_id: &str) -> Option<&PageResponse> {
        self.pages.iter().find(|page| page.id == page_id)
    }

    /// Replaces the page with the same id, or appends it when absent.
    pub fn upsert_page(&mut self, page: PageResponse) {
        match self.pages.iter_mut().find(|existing| existing.id == page.id) {
            Some(existing) => *existing = page,
            None => self.pages.push(page),
        }
    }
}

/// Every answer entered for one advert, grouped the way the definition is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrantAdvertResponse {
    #[serde(default)]
    pub sections: Vec<SectionResponse>,
}

impl GrantAdvertResponse {
    pub fn section(&self, section_id: &str) -> Option<&SectionResponse> {
        self.sections
            .iter()
            .find(|section| section.id == section_id)
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut SectionResponse> {
        self.sections
            .iter_mut()
            .find(|section| section.id == section_id)
    }

    pub fn section_or_insert(&mut self, section_id: &str) -> &mut SectionResponse {
        let index = match self
            .sections
            .iter()
            .position(|section| section.id == section_id)
        {
            Some(index) => index,
            None => {
                self.sections.push(SectionResponse::new(section_id));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn question_response(
        &self,
        section_id: &str,
        page_id: &str,
        question_id: &str,
    ) -> Option<&QuestionResponse> {
        self.section(section_id)?.page(page_id)?.question(question_id)
    }

    pub fn all_questions(&self) -> impl Iterator<Item = &QuestionResponse> {
        self.sections
            .iter()
            .flat_map(|section| section.pages.iter())
            .flat_map(|page| page.questions.iter())
    }

    /// Looks an answer up by question id anywhere in the aggregate.
    pub fn find_question(&self, question_id: &str) -> Option<&QuestionResponse> {
        self.all_questions()
            .find(|question| question.id == question_id)
    }
}
