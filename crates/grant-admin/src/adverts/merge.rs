//! Folding a submitted page into an advert's response aggregate.
//!
//! A merge upserts the page into its section, marks the incoming answers as
//! seen, recomputes page and section completion from the definition's
//! mandatory questions, and expands date answers with their fixed time of day
//! so the advert's opening and closing instants can be derived.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::London;
use serde::Serialize;
use std::collections::HashSet;

use super::definition::{
    AdvertDefinition, AdvertDefinitionPage, AdvertDefinitionQuestion, AdvertDefinitionSection,
    DateRole, ResponseType,
};
use super::response::{CompletionStatus, GrantAdvertResponse, PageResponse, SectionResponse};

/// One rejected field, shaped for the 400 response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field_name: String,
    pub error_message: String,
}

impl FieldError {
    pub fn new(field_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            error_message: error_message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("validation failed for {} field(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field_name, error_message)],
        }
    }

    pub fn push(&mut self, field_name: impl Into<String>, error_message: impl Into<String>) {
        self.errors.push(FieldError::new(field_name, error_message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("section '{0}' is not part of the advert definition")]
    SectionNotFound(String),
    #[error("page '{page_id}' is not part of section '{section_id}'")]
    PageNotFound { section_id: String, page_id: String },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Opening and closing instants derived from the date answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvertDates {
    pub opening: Option<DateTime<Utc>>,
    pub closing: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub page_status: CompletionStatus,
    pub section_status: CompletionStatus,
    pub dates: AdvertDates,
}

/// Merges `page` into `response`. On error the aggregate is left untouched.
pub fn merge_page(
    response: &mut GrantAdvertResponse,
    definition: &AdvertDefinition,
    section_id: &str,
    mut page: PageResponse,
) -> Result<MergeOutcome, MergeError> {
    let definition_section = definition
        .section(section_id)
        .ok_or_else(|| MergeError::SectionNotFound(section_id.to_string()))?;
    let definition_page =
        definition_section
            .page(&page.id)
            .ok_or_else(|| MergeError::PageNotFound {
                section_id: section_id.to_string(),
                page_id: page.id.clone(),
            })?;

    validate_page(definition_page, &page)?;

    for question in &mut page.questions {
        question.seen = true;
        let role = definition_page
            .question(&question.id)
            .and_then(|definition| definition.date_role);
        if let (Some(role), Some(parts)) = (role, question.multi_response.as_mut()) {
            if has_all_date_parts(parts) {
                *parts = append_time_component(role, parts);
            }
        }
    }

    page.status = page_status(definition_page, &page);
    let page_status = page.status;

    let mut working = response.clone();
    let section = working.section_or_insert(section_id);
    section.upsert_page(page);
    section.status = section_status(definition_section, section);
    let section_status = section.status;

    let dates = advert_dates(&working, definition)?;
    *response = working;

    Ok(MergeOutcome {
        page_status,
        section_status,
        dates,
    })
}

/// COMPLETED when every mandatory question on the page has a non-blank answer.
pub fn page_status(definition: &AdvertDefinitionPage, page: &PageResponse) -> CompletionStatus {
    let complete = definition
        .questions
        .iter()
        .filter(|question| question.validation.mandatory)
        .all(|question| {
            page.question(question.id)
                .is_some_and(|answer| answer.has_answer(question.response_type))
        });

    if complete {
        CompletionStatus::Completed
    } else {
        CompletionStatus::InProgress
    }
}

/// COMPLETED when every page the definition lists for the section has a
/// COMPLETED response; pages never submitted count as incomplete.
pub fn section_status(
    definition: &AdvertDefinitionSection,
    section: &SectionResponse,
) -> CompletionStatus {
    let complete = definition.pages.iter().all(|definition_page| {
        section
            .page(definition_page.id)
            .is_some_and(|page| page.status == CompletionStatus::Completed)
    });

    if complete {
        CompletionStatus::Completed
    } else if section.pages.is_empty() {
        CompletionStatus::NotStarted
    } else {
        CompletionStatus::InProgress
    }
}

/// Turns a submitted `[day, month, year]` into `[day, month, year, hour, minute]`.
/// Answers already carrying a time are normalised first so repeated
/// submissions never accumulate extra parts.
pub fn append_time_component(role: DateRole, parts: &[String]) -> Vec<String> {
    parts
        .iter()
        .take(3)
        .map(|part| part.trim().to_string())
        .chain(role.time_component().iter().map(|part| part.to_string()))
        .collect()
}

/// Interprets `[day, month, year, hour, minute]` as Europe/London wall-clock
/// time and returns the matching UTC instant.
pub fn london_instant(parts: &[String]) -> Result<DateTime<Utc>, String> {
    let [day, month, year, hour, minute] = parts else {
        return Err(format!("expected 5 date parts, found {}", parts.len()));
    };

    let date = parse_date(day, month, year)?;
    let hour = parse_part::<u32>(hour, "hour")?;
    let minute = parse_part::<u32>(minute, "minute")?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| format!("{hour:02}:{minute:02} is not a valid time"))?;
    let local = date.and_time(time);

    match London.from_local_datetime(&local) {
        LocalResult::Single(zoned) => Ok(zoned.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => Err(format!("{local} does not exist in Europe/London")),
    }
}

/// Recomputes the opening and closing instants from whatever date answers the
/// aggregate currently holds. Closing must fall after opening.
pub fn advert_dates(
    response: &GrantAdvertResponse,
    definition: &AdvertDefinition,
) -> Result<AdvertDates, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut resolve = |role: DateRole| -> Option<(DateTime<Utc>, &'static str)> {
        let question = definition.date_question(role)?;
        let answer = response.find_question(question.id)?;
        if !answer.has_answer(ResponseType::Date) {
            return None;
        }
        let parts = answer.multi_response.as_deref().unwrap_or_default();
        let parts = if parts.len() == 5 {
            parts.to_vec()
        } else {
            append_time_component(role, parts)
        };
        match london_instant(&parts) {
            Ok(instant) => Some((instant, question.id)),
            Err(message) => {
                errors.push(question.id, message);
                None
            }
        }
    };

    let opening = resolve(DateRole::Opening);
    let closing = resolve(DateRole::Closing);

    if let (Some((opening, _)), Some((closing, closing_id))) = (opening, closing) {
        if closing <= opening {
            errors.push(closing_id, "Closing date must be after the opening date");
        }
    }

    errors.into_result()?;
    Ok(AdvertDates {
        opening: opening.map(|(instant, _)| instant),
        closing: closing.map(|(instant, _)| instant),
    })
}

/// Parses a currency answer such as `"£1,250,000"` into whole pounds.
pub fn parse_currency(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '£' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Rejects answers that break the definition's validation rules. Missing
/// mandatory answers are not errors here; they only hold the page open.
pub fn validate_page(
    definition: &AdvertDefinitionPage,
    page: &PageResponse,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut seen_ids = HashSet::new();

    for answer in &page.questions {
        if !seen_ids.insert(answer.id.as_str()) {
            errors.push(&answer.id, "Question was answered more than once");
            continue;
        }

        let Some(question) = definition.question(&answer.id) else {
            errors.push(&answer.id, "Question is not part of this page");
            continue;
        };

        if let Err(message) = validate_answer(question, answer) {
            errors.push(&answer.id, message);
        }
    }

    errors.into_result()
}

fn validate_answer(
    question: &AdvertDefinitionQuestion,
    answer: &super::response::QuestionResponse,
) -> Result<(), String> {
    match question.response_type {
        ResponseType::ShortText | ResponseType::LongText | ResponseType::RichText => {
            let Some(text) = answer.text() else {
                return Ok(());
            };
            let length = text.chars().count();
            if let Some(min) = question.validation.min_length {
                if length < min {
                    return Err(format!("Answer must be at least {min} characters"));
                }
            }
            if let Some(max) = question.validation.max_length {
                if length > max {
                    return Err(format!("Answer must be {max} characters or less"));
                }
            }
            Ok(())
        }
        ResponseType::Currency => match answer.text() {
            Some(text) if parse_currency(text).is_none() => {
                Err("Enter a whole number amount".to_string())
            }
            _ => Ok(()),
        },
        ResponseType::Date => {
            let parts = answer.multi_response.as_deref().unwrap_or_default();
            if parts.iter().all(|part| part.trim().is_empty()) {
                return Ok(());
            }
            if !has_all_date_parts(parts) {
                return Err("Date must include a day, month and year".to_string());
            }
            parse_date(&parts[0], &parts[1], &parts[2]).map(|_| ())
        }
        ResponseType::List => Ok(()),
    }
}

fn has_all_date_parts(parts: &[String]) -> bool {
    parts.len() >= 3 && parts.iter().take(3).all(|part| !part.trim().is_empty())
}

fn parse_date(day: &str, month: &str, year: &str) -> Result<NaiveDate, String> {
    let day = parse_part::<u32>(day, "day")?;
    let month = parse_part::<u32>(month, "month")?;
    let year = parse_part::<i32>(year, "year")?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("{day:02}/{month:02}/{year} is not a real date"))
}

fn parse_part<T: std::str::FromStr>(raw: &str, label: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid {label}", raw.trim()))
}
