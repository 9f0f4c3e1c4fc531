use super::common::*;

use crate::adverts::domain::{Actor, GrantAdvertStatus};
use crate::adverts::repository::AdvertAction;
use crate::adverts::response::{PageResponse, QuestionResponse};
use crate::adverts::service::AdvertServiceError;

#[tokio::test]
async fn first_publish_creates_patches_and_publishes_the_entry() {
    let harness = harness();
    let advert = harness.completed();

    let published = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("publishes");

    assert_eq!(
        harness.cms.calls(),
        ["create", "patch", "fetch", "publish"]
    );
    assert_eq!(published.status, GrantAdvertStatus::Published);
    let entry_id = published
        .contentful_entry_id
        .clone()
        .expect("entry id stored");
    assert!(harness.cms.is_published(&entry_id));
    assert!(published.first_published_date.is_some());
    assert_eq!(published.first_published_date, published.last_published_date);
    assert!(published
        .contentful_slug
        .as_deref()
        .is_some_and(|slug| slug.starts_with("community-resilience-fund-")));

    let entry = harness.cms.entry(&entry_id).expect("entry stored");
    assert_eq!(
        entry.fields["grantName"]["en-US"],
        "Community Resilience Fund"
    );
    assert_eq!(entry.fields["grantTotalAwardAmount"]["en-US"], 1_000_000);
    assert_eq!(
        entry.fields["grantSummaryTab"]["en-US"]["nodeType"],
        "document"
    );

    let stored = harness.stored(advert.id);
    assert_eq!(stored.status, GrantAdvertStatus::Published);
    assert_eq!(stored.opening_date, advert.opening_date);
    assert_eq!(
        harness.events.events().last().map(|event| event.action),
        Some(AdvertAction::Publish)
    );
}

#[tokio::test]
async fn republishing_updates_the_existing_entry() {
    let harness = harness();
    let advert = harness.completed();

    let first = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("first publish");
    let second = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("second publish");

    assert_eq!(harness.cms.entry_count(), 1);
    assert_eq!(first.contentful_entry_id, second.contentful_entry_id);
    assert_eq!(first.contentful_slug, second.contentful_slug);
    assert_eq!(first.first_published_date, second.first_published_date);
    assert!(second.last_published_date >= first.last_published_date);

    let calls = harness.cms.calls();
    assert_eq!(calls.iter().filter(|call| *call == "create").count(), 1);
    assert_eq!(
        &calls[4..],
        ["fetch", "update", "patch", "fetch", "publish"]
    );
}

#[tokio::test]
async fn lambda_publish_skips_the_ownership_check() {
    let harness = harness();
    let advert = harness.completed();

    let denied = harness
        .service
        .publish(Actor::Admin(INTRUDER), advert.id)
        .await;
    assert!(matches!(denied, Err(AdvertServiceError::AccessDenied { .. })));
    assert!(harness.cms.calls().is_empty());

    let published = harness
        .service
        .publish(Actor::Lambda, advert.id)
        .await
        .expect("lambda publishes");
    assert_eq!(published.status, GrantAdvertStatus::Published);
}

#[tokio::test]
async fn incomplete_adverts_never_reach_the_cms() {
    let harness = harness();
    let advert = harness.draft();

    let result = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await;

    assert!(matches!(result, Err(AdvertServiceError::Validation(_))));
    assert!(harness.cms.calls().is_empty());
}

#[tokio::test]
async fn cms_failures_propagate_and_leave_the_advert_unpublished() {
    let harness = harness_with_cms(FakeCms::failing_on("publish"));
    let advert = harness.completed();

    let result = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await;

    assert!(matches!(result, Err(AdvertServiceError::Cms(_))));
    let stored = harness.stored(advert.id);
    assert_eq!(stored.status, GrantAdvertStatus::Draft);
    assert!(stored.first_published_date.is_none());
    assert!(harness.events.events().is_empty());

    let entry_id = stored.contentful_entry_id.expect("created entry recorded");
    assert_eq!(harness.cms.entry_count(), 1);
    assert!(!harness.cms.is_published(&entry_id));
}

#[tokio::test]
async fn unpublishing_without_an_entry_returns_to_draft() {
    let harness = harness();
    let advert = harness.draft();

    let unpublished = harness
        .service
        .unpublish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("unpublishes");

    assert_eq!(unpublished.status, GrantAdvertStatus::Draft);
    assert!(unpublished.unpublished_date.is_some());
    assert!(harness.cms.calls().is_empty());
    assert_eq!(
        harness.stored(advert.id).unpublished_date,
        unpublished.unpublished_date
    );
}

#[tokio::test]
async fn unpublishing_a_published_advert_takes_the_entry_down() {
    let harness = harness();
    let advert = harness.completed();
    let published = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("publishes");
    let entry_id = published.contentful_entry_id.clone().expect("entry id");

    let unpublished = harness
        .service
        .unpublish(Actor::Lambda, advert.id)
        .await
        .expect("unpublishes");

    assert_eq!(unpublished.status, GrantAdvertStatus::Draft);
    assert!(!harness.cms.is_published(&entry_id));
    assert_eq!(unpublished.contentful_entry_id, Some(entry_id));
    assert_eq!(
        unpublished.first_published_date,
        published.first_published_date
    );
    assert_eq!(
        harness.cms.calls().last().map(String::as_str),
        Some("unpublish")
    );
}

#[tokio::test]
async fn unpublish_by_non_owner_is_denied() {
    let harness = harness();
    let advert = harness.draft();

    let result = harness
        .service
        .unpublish(Actor::Admin(INTRUDER), advert.id)
        .await;

    assert!(matches!(result, Err(AdvertServiceError::AccessDenied { .. })));
    assert!(harness.stored(advert.id).unpublished_date.is_none());
}

#[tokio::test]
async fn unpublishing_a_rescheduled_advert_takes_the_live_entry_down() {
    let harness = harness();
    let advert = harness.completed();
    let published = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("publishes");
    let entry_id = published.contentful_entry_id.clone().expect("entry id");
    let scheduled = harness
        .service
        .schedule(OWNER, advert.id)
        .expect("schedules");
    assert_eq!(scheduled.status, GrantAdvertStatus::Scheduled);
    assert!(harness.cms.is_published(&entry_id));

    let unpublished = harness
        .service
        .unpublish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("unpublishes");

    assert_eq!(unpublished.status, GrantAdvertStatus::Draft);
    assert!(!harness.cms.is_published(&entry_id));
    assert!(!unpublished.is_live());
    let calls = harness.cms.calls();
    assert_eq!(&calls[calls.len() - 2..], ["fetch", "unpublish"]);
}

#[tokio::test]
async fn unpublishing_twice_only_takes_the_entry_down_once() {
    let harness = harness();
    let advert = harness.completed();
    harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("publishes");

    for _ in 0..2 {
        harness
            .service
            .unpublish(Actor::Lambda, advert.id)
            .await
            .expect("unpublishes");
    }

    let calls = harness.cms.calls();
    assert_eq!(calls.iter().filter(|call| *call == "unpublish").count(), 1);
}

#[tokio::test]
async fn live_entries_block_delete_until_unpublished() {
    let harness = harness();
    let advert = harness.completed();
    harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("publishes");
    harness
        .service
        .schedule(OWNER, advert.id)
        .expect("schedules");

    assert!(matches!(
        harness.service.delete(OWNER, advert.id),
        Err(AdvertServiceError::InvalidTransition { action: "delete", .. })
    ));

    harness
        .service
        .unpublish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("unpublishes");
    harness
        .service
        .delete(OWNER, advert.id)
        .expect("deleted once offline");
}

#[tokio::test]
async fn republishing_drops_answers_the_author_cleared() {
    let harness = harness();
    let advert = harness.completed();
    harness
        .service
        .update_page(
            OWNER,
            advert.id,
            "furtherInformation",
            PageResponse::new(
                "4",
                vec![QuestionResponse::single(
                    "grantObjectivesTab",
                    "Old objectives",
                )],
            ),
        )
        .expect("objectives saved");
    let published = harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("first publish");
    let entry_id = published.contentful_entry_id.clone().expect("entry id");
    assert!(harness
        .cms
        .entry(&entry_id)
        .expect("entry stored")
        .fields
        .contains_key("grantObjectivesTab"));

    harness
        .service
        .update_page(
            OWNER,
            advert.id,
            "furtherInformation",
            PageResponse::new("4", Vec::new()),
        )
        .expect("objectives cleared");
    harness
        .service
        .publish(Actor::Admin(OWNER), advert.id)
        .await
        .expect("republishes");

    let entry = harness.cms.entry(&entry_id).expect("entry stored");
    assert!(!entry.fields.contains_key("grantObjectivesTab"));
    assert!(entry.fields.contains_key("grantSummaryTab"));
    assert_eq!(entry.fields["grantName"]["en-US"], "Community Resilience Fund");
}
