use crate::infra::{InMemoryAdvertRepository, InMemoryCms, LoggingEventPublisher};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use clap::Args;
use grant_admin::adverts::{
    Actor, AdminId, AdvertDefinition, AdvertServiceError, GrantAdvertService,
    PageResponse, QuestionResponse, SchemeId,
};
use grant_admin::error::AppError;
use std::sync::Arc;

const DEMO_ADMIN: AdminId = AdminId(1);

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Name of the advert to author
    #[arg(long, default_value = "Community Resilience Fund")]
    pub(crate) name: String,
    /// Grant scheme the advert belongs to
    #[arg(long, default_value_t = 1)]
    pub(crate) scheme_id: u32,
    /// Days from today until applications open
    #[arg(long, default_value_t = 7)]
    pub(crate) opens_in_days: i64,
    /// How many days applications stay open
    #[arg(long, default_value_t = 30)]
    pub(crate) open_for_days: i64,
    /// Stop after scheduling instead of publishing immediately
    #[arg(long)]
    pub(crate) skip_publish: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DefinitionArgs {
    /// Print the definition as JSON instead of a tree
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_definition(args: DefinitionArgs) -> Result<(), AppError> {
    let definition = AdvertDefinition::standard();
    if args.json {
        match serde_json::to_string_pretty(&definition) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Definition unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Grant advert definition");
    for section in &definition.sections {
        println!("\n{} ({})", section.title, section.id);
        for page in &section.pages {
            println!("  Page {}: {}", page.id, page.title);
            for question in &page.questions {
                let mandatory = if question.validation.mandatory {
                    "mandatory"
                } else {
                    "optional"
                };
                println!(
                    "    - {} [{}, {}] {}",
                    question.id,
                    question.response_type.label(),
                    mandatory,
                    question.title
                );
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        name,
        scheme_id,
        opens_in_days,
        open_for_days,
        skip_publish,
    } = args;

    let today = Utc::now().date_naive();
    let opening = today + Duration::days(opens_in_days.max(0));
    let closing = opening + Duration::days(open_for_days.max(1));

    let repository = Arc::new(InMemoryAdvertRepository::default());
    let events = Arc::new(LoggingEventPublisher::default());
    let cms = Arc::new(InMemoryCms::default());
    let service = GrantAdvertService::new(
        repository,
        events.clone(),
        cms.clone(),
        Arc::new(AdvertDefinition::standard()),
    );

    println!("Grant advert demo");
    let advert = match service.create(DEMO_ADMIN, SchemeId(scheme_id), &name) {
        Ok(advert) => advert,
        Err(err) => {
            println!("  Advert rejected: {err}");
            return Ok(());
        }
    };
    println!("- Created advert {} ({:?})", advert.id, advert.status);

    for (section_id, page) in demo_pages(opening, closing) {
        let page_id = page.id.clone();
        match service.update_page(DEMO_ADMIN, advert.id, section_id, page) {
            Ok(view) => println!(
                "  {section_id}/{page_id}: page {} | section {}",
                view.page_status.label(),
                view.section_status.label()
            ),
            Err(err) => {
                println!("  {section_id}/{page_id} rejected: {err}");
                render_field_errors(&err);
                return Ok(());
            }
        }
    }

    match service.sections_overview(DEMO_ADMIN, advert.id) {
        Ok(overview) => println!(
            "- Ready to publish: {}",
            if overview.ready_to_publish { "yes" } else { "no" }
        ),
        Err(err) => println!("  Overview unavailable: {err}"),
    }

    match service.schedule(DEMO_ADMIN, advert.id) {
        Ok(scheduled) => println!(
            "- Scheduled: opens {} | closes {}",
            scheduled
                .opening_date
                .map(|date| date.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            scheduled
                .closing_date
                .map(|date| date.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        ),
        Err(err) => {
            println!("  Scheduling failed: {err}");
            render_field_errors(&err);
            return Ok(());
        }
    }

    if !skip_publish {
        let published = match service.publish(Actor::Lambda, advert.id).await {
            Ok(published) => published,
            Err(err) => {
                println!("  Publishing failed: {err}");
                return Ok(());
            }
        };
        let entry_id = published.contentful_entry_id.clone().unwrap_or_default();
        println!(
            "- Published entry {} (live: {}) at slug {}",
            entry_id,
            cms.is_published(&entry_id),
            published.contentful_slug.as_deref().unwrap_or("-")
        );
    }

    match service.publishing_information(DEMO_ADMIN, advert.id) {
        Ok(view) => match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("  Publishing information:\n{json}"),
            Err(err) => println!("  Publishing information unavailable: {err}"),
        },
        Err(err) => println!("  Publishing information unavailable: {err}"),
    }

    let events = events.events();
    if events.is_empty() {
        println!("  Advert events: none dispatched");
    } else {
        println!("  Advert events:");
        for event in events {
            println!("    - {:?} -> {}", event.action, event.advert_id);
        }
    }

    Ok(())
}

fn render_field_errors(err: &AdvertServiceError) {
    if let AdvertServiceError::Validation(errors) = err {
        for field in &errors.errors {
            println!("    - {}: {}", field.field_name, field.error_message);
        }
    }
}

fn date_parts(date: NaiveDate) -> [String; 3] {
    [
        date.day().to_string(),
        date.month().to_string(),
        date.year().to_string(),
    ]
}

fn demo_pages(opening: NaiveDate, closing: NaiveDate) -> Vec<(&'static str, PageResponse)> {
    vec![
        (
            "grantDetails",
            PageResponse::new(
                "1",
                vec![QuestionResponse::single(
                    "grantShortDescription",
                    "Funding for community groups preparing for severe weather.",
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
                    "Department for Environment",
                )],
            ),
        ),
        (
            "grantDetails",
            PageResponse::new(
                "4",
                vec![QuestionResponse::multi(
                    "grantApplicantType",
                    ["Charity", "Non-profit"],
                )],
            ),
        ),
        (
            "awardAmounts",
            PageResponse::new(
                "1",
                vec![
                    QuestionResponse::single("grantTotalAwardAmount", "2,500,000"),
                    QuestionResponse::single("grantMaximumAward", "100,000"),
                    QuestionResponse::single("grantMinimumAward", "5,000"),
                ],
            ),
        ),
        (
            "applicationDates",
            PageResponse::new(
                "1",
                vec![
                    QuestionResponse::multi("grantApplicationOpenDate", date_parts(opening)),
                    QuestionResponse::multi("grantApplicationCloseDate", date_parts(closing)),
                ],
            ),
        ),
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
                    "Registered charities operating in flood-risk areas.",
                )],
            ),
        ),
        (
            "furtherInformation",
            PageResponse::new(
                "2",
                vec![QuestionResponse::single(
                    "grantSummaryTab",
                    "## Summary\n\nCapital funding for resilience equipment.\n\n- Pumps\n- Sandbags",
                )],
            ),
        ),
        ("furtherInformation", PageResponse::new("3", Vec::new())),
        ("furtherInformation", PageResponse::new("4", Vec::new())),
        ("furtherInformation", PageResponse::new("5", Vec::new())),
        ("furtherInformation", PageResponse::new("6", Vec::new())),
    ]
}
