use chrono_tz::Europe::London;
use serde_json::{json, Map, Value};

use super::definition::{AdvertDefinition, ResponseType};
use super::domain::{AdvertId, GrantAdvert};
use super::merge::{append_time_component, london_instant, parse_currency};
use super::response::QuestionResponse;

/// CMS fields for one advert, split by whether they can be sent on create.
/// `cleared` names definition questions with no current answer; an existing
/// entry must drop them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFields {
    pub plain: Map<String, Value>,
    pub rich_text: Map<String, Value>,
    pub cleared: Vec<String>,
}

/// Builds the locale-keyed CMS fields for every answered question.
pub fn build_entry_fields(
    advert: &GrantAdvert,
    definition: &AdvertDefinition,
    slug: &str,
    locale: &str,
) -> EntryFields {
    let mut fields = EntryFields::default();
    fields
        .plain
        .insert("grantName".to_string(), localised(locale, json!(advert.name)));
    fields
        .plain
        .insert("label".to_string(), localised(locale, json!(slug)));

    for question in definition.questions() {
        let answered = advert
            .response
            .find_question(question.id)
            .filter(|answer| answer.has_answer(question.response_type));
        let Some(answer) = answered else {
            fields.cleared.push(question.id.to_string());
            continue;
        };

        let value = match question.response_type {
            ResponseType::ShortText | ResponseType::LongText => answer.text().map(|text| json!(text)),
            ResponseType::List => Some(json!(answer.values())),
            ResponseType::Currency => answer.text().and_then(parse_currency).map(|amount| json!(amount)),
            ResponseType::Date => date_field(question.date_role, answer),
            ResponseType::RichText => {
                if let Some(text) = answer.text() {
                    fields.rich_text.insert(
                        question.id.to_string(),
                        localised(locale, rich_text_document(text)),
                    );
                }
                None
            }
        };

        if let Some(value) = value {
            fields
                .plain
                .insert(question.id.to_string(), localised(locale, value));
        }
    }

    fields
}

fn localised(locale: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(locale.to_string(), value);
    Value::Object(map)
}

fn date_field(
    role: Option<super::definition::DateRole>,
    answer: &QuestionResponse,
) -> Option<Value> {
    let parts = answer.multi_response.as_deref()?;
    let parts = match (parts.len(), role) {
        (5, _) => parts.to_vec(),
        (_, Some(role)) => append_time_component(role, parts),
        _ => return None,
    };
    let instant = london_instant(&parts).ok()?;
    Some(json!(instant
        .with_timezone(&London)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()))
}

/// Converts author-entered long-form text into a rich-text document.
/// Blank lines separate blocks; blocks whose lines all start with `- ` or
/// `* ` become bulleted lists and `## ` lines become headings.
pub fn rich_text_document(raw: &str) -> Value {
    let normalised = raw.replace("\r\n", "\n");
    let content: Vec<Value> = normalised
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(rich_text_block)
        .collect();

    json!({
        "nodeType": "document",
        "data": {},
        "content": content,
    })
}

fn rich_text_block(block: &str) -> Value {
    let lines: Vec<&str> = block.lines().map(str::trim).collect();

    let bullets: Option<Vec<&str>> = lines
        .iter()
        .map(|line| line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")))
        .collect();
    if let Some(items) = bullets {
        let items: Vec<Value> = items
            .into_iter()
            .map(|item| {
                json!({
                    "nodeType": "list-item",
                    "data": {},
                    "content": [paragraph(item)],
                })
            })
            .collect();
        return json!({
            "nodeType": "unordered-list",
            "data": {},
            "content": items,
        });
    }

    if let [line] = lines.as_slice() {
        if let Some(heading) = line.strip_prefix("## ") {
            return json!({
                "nodeType": "heading-2",
                "data": {},
                "content": [text_node(heading)],
            });
        }
    }

    paragraph(&lines.join("\n"))
}

fn paragraph(text: &str) -> Value {
    json!({
        "nodeType": "paragraph",
        "data": {},
        "content": [text_node(text)],
    })
}

fn text_node(text: &str) -> Value {
    json!({
        "nodeType": "text",
        "value": text,
        "marks": [],
        "data": {},
    })
}

/// URL label for the published advert: the name in kebab case plus a short
/// id suffix so two adverts with the same name never collide.
pub fn slugify(name: &str, id: AdvertId) -> String {
    let mut slug = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let trimmed = slug.trim_matches('-');
    let suffix: String = id.0.simple().to_string().chars().take(8).collect();
    if trimmed.is_empty() {
        format!("grant-advert-{suffix}")
    } else {
        format!("{trimmed}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adverts::domain::{AdminId, SchemeId};
    use crate::adverts::response::{PageResponse, SectionResponse};
    use uuid::Uuid;

    fn advert_with(section: &str, page: &str, questions: Vec<QuestionResponse>) -> GrantAdvert {
        let mut advert = GrantAdvert::new(SchemeId(1), "Community Fund", AdminId(7));
        let mut section = SectionResponse::new(section);
        section.upsert_page(PageResponse::new(page, questions));
        advert.response.sections.push(section);
        advert
    }

    #[test]
    fn maps_response_types_to_field_shapes() {
        let mut advert = advert_with(
            "awardAmounts",
            "1",
            vec![QuestionResponse::single("grantTotalAwardAmount", "£1,500,000")],
        );
        let mut details = SectionResponse::new("grantDetails");
        details.upsert_page(PageResponse::new(
            "2",
            vec![QuestionResponse::multi("grantLocation", ["Scotland", "Wales"])],
        ));
        details.upsert_page(PageResponse::new(
            "3",
            vec![QuestionResponse::single("grantFunder", "Cabinet Office")],
        ));
        advert.response.sections.push(details);

        let fields = build_entry_fields(&advert, &AdvertDefinition::standard(), "slug", "en-US");

        assert_eq!(fields.plain["grantTotalAwardAmount"]["en-US"], json!(1_500_000));
        assert_eq!(fields.plain["grantLocation"]["en-US"], json!(["Scotland", "Wales"]));
        assert_eq!(fields.plain["grantFunder"]["en-US"], json!("Cabinet Office"));
        assert_eq!(fields.plain["grantName"]["en-US"], json!("Community Fund"));
        assert_eq!(fields.plain["label"]["en-US"], json!("slug"));
        assert!(fields.rich_text.is_empty());
    }

    #[test]
    fn date_fields_carry_london_offset() {
        let advert = advert_with(
            "applicationDates",
            "1",
            vec![
                QuestionResponse::multi(
                    "grantApplicationOpenDate",
                    ["1", "7", "2030", "00", "01"],
                ),
                QuestionResponse::multi("grantApplicationCloseDate", ["15", "12", "2030"]),
            ],
        );

        let fields = build_entry_fields(&advert, &AdvertDefinition::standard(), "slug", "en-US");

        assert_eq!(
            fields.plain["grantApplicationOpenDate"]["en-US"],
            json!("2030-07-01T00:01:00+01:00")
        );
        assert_eq!(
            fields.plain["grantApplicationCloseDate"]["en-US"],
            json!("2030-12-15T23:59:00+00:00")
        );
    }

    #[test]
    fn rich_text_is_kept_apart_from_plain_fields() {
        let advert = advert_with(
            "furtherInformation",
            "2",
            vec![QuestionResponse::single(
                "grantSummaryTab",
                "## Overview\n\nFunding for local groups.\n\n- Charities\n- Community groups",
            )],
        );

        let fields = build_entry_fields(&advert, &AdvertDefinition::standard(), "slug", "en-US");

        assert!(!fields.plain.contains_key("grantSummaryTab"));
        let document = &fields.rich_text["grantSummaryTab"]["en-US"];
        assert_eq!(document["nodeType"], "document");
        assert_eq!(document["content"][0]["nodeType"], "heading-2");
        assert_eq!(document["content"][1]["nodeType"], "paragraph");
        assert_eq!(
            document["content"][1]["content"][0]["value"],
            "Funding for local groups."
        );
        assert_eq!(document["content"][2]["nodeType"], "unordered-list");
        assert_eq!(document["content"][2]["content"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unanswered_questions_are_listed_as_cleared() {
        let advert = advert_with(
            "furtherInformation",
            "4",
            vec![QuestionResponse::single("grantObjectivesTab", "   ")],
        );

        let fields = build_entry_fields(&advert, &AdvertDefinition::standard(), "slug", "en-US");

        assert!(fields.cleared.iter().any(|name| name == "grantObjectivesTab"));
        assert!(fields.cleared.iter().any(|name| name == "grantFunder"));
        assert!(!fields.rich_text.contains_key("grantObjectivesTab"));
        assert!(!fields.cleared.iter().any(|name| name == "grantName"));
    }

    #[test]
    fn slugify_collapses_separators_and_appends_id() {
        let id = AdvertId(Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").expect("uuid"));
        assert_eq!(slugify("  Rural  Broadband -- Fund! ", id), "rural-broadband-fund-0f8fad5b");
        assert_eq!(slugify("***", id), "grant-advert-0f8fad5b");
    }
}
