use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::model::application::{ApplicationStatus, LeaveKind};
use crate::notify::testing::RecordingNotifier;
use crate::store::memory::MemoryStore;
use crate::store::RecordStore;

use super::keyboards::{MAIN_MENU, MY_APPLICATIONS, SICK_LEAVE, START, VACATION};
use super::{ChatEngine, InboundEvent, OutboundMessage};

const HR: i64 = 99;
const EMPLOYEE: i64 = 42;

fn fixture() -> (Arc<MemoryStore>, Arc<RecordingNotifier>, ChatEngine) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = ChatEngine::new(store.clone(), notifier.clone(), HR);
    (store, notifier, engine)
}

async fn say(engine: &ChatEngine, chat_id: i64, text: &str) -> Vec<OutboundMessage> {
    engine
        .handle(InboundEvent {
            chat_id,
            text: text.to_string(),
        })
        .await
}

async fn register(engine: &ChatEngine, chat_id: i64, email: &str) {
    for text in [START, "John", "Doe", "Engineer", "Engineering"] {
        say(engine, chat_id, text).await;
    }
    let replies = say(engine, chat_id, email).await;
    assert!(
        replies[0].text.contains("Registration complete"),
        "unexpected reply: {}",
        replies[0].text
    );
}

fn future(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

async fn submit(
    engine: &ChatEngine,
    chat_id: i64,
    start: &str,
    end: &str,
    reason: &str,
) -> Vec<OutboundMessage> {
    say(engine, chat_id, VACATION).await;
    say(engine, chat_id, "Annual basic paid leave").await;
    say(engine, chat_id, start).await;
    say(engine, chat_id, end).await;
    say(engine, chat_id, reason).await
}

#[tokio::test]
async fn registration_creates_user_and_one_log() {
    let (store, _notifier, engine) = fixture();

    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    let user = store.user(EMPLOYEE).await.unwrap().expect("user stored");
    assert_eq!(user.first_name, "John");
    assert_eq!(user.last_name, "Doe");
    assert_eq!(user.position.as_deref(), Some("Engineer"));
    assert_eq!(user.department.as_deref(), Some("Engineering"));
    assert_eq!(user.email, "john.doe@company.com");
    assert_eq!(store.log_count(), 1);
}

#[tokio::test]
async fn start_greets_a_registered_user() {
    let (_store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    let replies = say(&engine, EMPLOYEE, START).await;
    assert!(replies[0].text.contains("already registered"));
}

#[tokio::test]
async fn duplicate_email_leaves_second_conversant_unregistered() {
    let (store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "shared@company.com").await;

    let other = EMPLOYEE + 1;
    for text in [START, "Jane", "Roe", "Analyst", "Finance"] {
        say(&engine, other, text).await;
    }
    let replies = say(&engine, other, "shared@company.com").await;
    assert!(replies[0].text.contains("already registered"));
    assert!(store.user(other).await.unwrap().is_none());

    // the flow stays on the email step; a fresh address completes it
    let replies = say(&engine, other, "jane.roe@company.com").await;
    assert!(replies[0].text.contains("Registration complete"));
    let user = store.user(other).await.unwrap().expect("second user stored");
    assert_eq!(user.first_name, "Jane");
}

#[tokio::test]
async fn malformed_email_reprompts_without_losing_fields() {
    let (store, _notifier, engine) = fixture();
    for text in [START, "John", "Doe", "Engineer", "Engineering"] {
        say(&engine, EMPLOYEE, text).await;
    }

    let replies = say(&engine, EMPLOYEE, "not-an-email").await;
    assert!(replies[0].text.contains("Invalid email"));

    let replies = say(&engine, EMPLOYEE, "john.doe@company.com").await;
    assert!(replies[0].text.contains("Registration complete"));
    let user = store.user(EMPLOYEE).await.unwrap().expect("user stored");
    assert_eq!(user.department.as_deref(), Some("Engineering"));
}

#[tokio::test]
async fn submission_creates_pending_application_and_single_log() {
    let (store, notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    let replies = submit(&engine, EMPLOYEE, &future(30), &future(39), "family trip").await;
    assert!(replies[0].text.contains("Application submitted"));

    let applications = store.snapshot_applications();
    assert_eq!(applications.len(), 1);
    let app = &applications[0];
    assert_eq!(app.user_id, EMPLOYEE);
    assert_eq!(app.status, ApplicationStatus::Pending);
    assert_eq!(app.leave_type, LeaveKind::AnnualBasic);
    assert_eq!(app.reason.as_deref(), Some("family trip"));

    // exactly one log beyond the registration entry
    assert_eq!(store.log_count(), 2);
    // and exactly one HR summary
    let hr_messages = notifier.sent_to(HR);
    assert_eq!(hr_messages.len(), 1);
    assert!(hr_messages[0].contains("annual basic paid leave"));
}

#[tokio::test]
async fn sick_leave_skips_the_category_menu() {
    let (store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    let replies = say(&engine, EMPLOYEE, SICK_LEAVE).await;
    assert!(replies[0].text.contains("Start date"));
    say(&engine, EMPLOYEE, &future(1)).await;
    say(&engine, EMPLOYEE, &future(3)).await;
    say(&engine, EMPLOYEE, "flu").await;

    let app = &store.snapshot_applications()[0];
    assert_eq!(app.leave_type, LeaveKind::Sick);
}

#[tokio::test]
async fn malformed_date_reprompts_and_preserves_accepted_fields() {
    let (store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    say(&engine, EMPLOYEE, VACATION).await;
    say(&engine, EMPLOYEE, "Annual basic paid leave").await;

    let replies = say(&engine, EMPLOYEE, "garbage").await;
    assert!(replies[0].text.contains("Invalid format"));

    say(&engine, EMPLOYEE, &future(10)).await;
    // an end date before the accepted start date re-prompts for the end only
    let replies = say(&engine, EMPLOYEE, &future(5)).await;
    assert!(replies[0].text.contains("before the start date"));
    let replies = say(&engine, EMPLOYEE, "2x").await;
    assert!(replies[0].text.contains("Invalid format"));

    say(&engine, EMPLOYEE, &future(12)).await;
    say(&engine, EMPLOYEE, "ok").await;

    let app = &store.snapshot_applications()[0];
    assert_eq!(app.start_date.to_string(), future(10));
    assert_eq!(app.end_date.to_string(), future(12));
}

#[tokio::test]
async fn past_start_date_is_rejected() {
    let (store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    say(&engine, EMPLOYEE, SICK_LEAVE).await;
    let replies = say(&engine, EMPLOYEE, "2000-01-01").await;
    assert!(replies[0].text.contains("in the past"));
    assert!(store.snapshot_applications().is_empty());
}

#[tokio::test]
async fn menu_return_aborts_the_flow_without_partial_state() {
    let (store, _notifier, engine) = fixture();

    say(&engine, EMPLOYEE, START).await;
    say(&engine, EMPLOYEE, "John").await;
    let replies = say(&engine, EMPLOYEE, MAIN_MENU).await;
    assert!(replies[0].text.contains("Choose an action"));

    assert!(store.user(EMPLOYEE).await.unwrap().is_none());
    assert_eq!(store.log_count(), 0);

    // the next input is treated as idle, not as a last name
    let replies = say(&engine, EMPLOYEE, "Doe").await;
    assert!(replies[0].text.contains("/start"));
}

#[tokio::test]
async fn start_supersedes_an_active_flow() {
    let (store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    say(&engine, EMPLOYEE, SICK_LEAVE).await;
    let replies = say(&engine, EMPLOYEE, START).await;
    assert!(replies[0].text.contains("already registered"));

    // the superseded start-date step is gone
    say(&engine, EMPLOYEE, &future(1)).await;
    assert!(store.snapshot_applications().is_empty());
}

#[tokio::test]
async fn unregistered_conversants_are_sent_to_start() {
    let (_store, _notifier, engine) = fixture();
    for text in [VACATION, SICK_LEAVE, MY_APPLICATIONS] {
        let replies = say(&engine, EMPLOYEE, text).await;
        assert!(replies[0].text.contains("/start"), "for input {text}");
    }
}

#[tokio::test]
async fn persistence_failure_resets_the_flow_cleanly() {
    let (store, notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;

    say(&engine, EMPLOYEE, SICK_LEAVE).await;
    say(&engine, EMPLOYEE, &future(1)).await;
    say(&engine, EMPLOYEE, &future(2)).await;
    store.fail_writes(true);
    let replies = say(&engine, EMPLOYEE, "flu").await;
    assert!(replies[0].text.contains("went wrong"));

    // nothing half-created, no HR summary, session back to idle
    assert!(store.snapshot_applications().is_empty());
    assert_eq!(store.log_count(), 1);
    assert!(notifier.sent_to(HR).is_empty());
    store.fail_writes(false);
    let replies = say(&engine, EMPLOYEE, "flu").await;
    assert!(replies[0].text.contains("Choose an action"));
}

#[tokio::test]
async fn edit_flow_revises_a_pending_application() {
    let (store, notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;
    submit(&engine, EMPLOYEE, &future(10), &future(12), "trip").await;

    let replies = say(&engine, EMPLOYEE, "edit_1").await;
    assert!(replies[0].text.contains("New start date"));
    say(&engine, EMPLOYEE, &future(20)).await;
    say(&engine, EMPLOYEE, &future(25)).await;
    let replies = say(&engine, EMPLOYEE, "moved the trip").await;
    assert!(replies[0].text.contains("Application updated"));

    let app = &store.snapshot_applications()[0];
    assert_eq!(app.start_date.to_string(), future(20));
    assert_eq!(app.end_date.to_string(), future(25));
    assert_eq!(app.reason.as_deref(), Some("moved the trip"));
    assert_eq!(app.status, ApplicationStatus::Pending);
    // registration + submission + edit
    assert_eq!(store.log_count(), 3);
    assert_eq!(notifier.sent_to(HR).len(), 2);
}

#[tokio::test]
async fn edit_is_refused_once_processed() {
    let (store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;
    submit(&engine, EMPLOYEE, &future(10), &future(12), "trip").await;

    store
        .transition_status(1, ApplicationStatus::Approved, None, "approved")
        .await
        .unwrap();

    let replies = say(&engine, EMPLOYEE, "edit_1").await;
    assert!(replies[0].text.contains("cannot be edited"));
}

#[tokio::test]
async fn my_applications_browse_and_view() {
    let (_store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;
    submit(&engine, EMPLOYEE, &future(10), &future(12), "trip").await;

    let replies = say(&engine, EMPLOYEE, MY_APPLICATIONS).await;
    assert_eq!(replies[0].quick_replies.len(), 1);
    assert_eq!(replies[0].quick_replies[0].data, "view_1");

    let replies = say(&engine, EMPLOYEE, "view_1").await;
    assert!(replies[0].text.contains("Application #1"));
    assert!(replies[0].text.contains("trip"));
    // pending applications offer the edit entry point
    assert_eq!(replies[0].quick_replies[0].data, "edit_1");
}

#[tokio::test]
async fn foreign_applications_are_not_visible() {
    let (_store, _notifier, engine) = fixture();
    register(&engine, EMPLOYEE, "john.doe@company.com").await;
    submit(&engine, EMPLOYEE, &future(10), &future(12), "trip").await;

    let stranger = EMPLOYEE + 7;
    register(&engine, stranger, "jane.roe@company.com").await;
    let replies = say(&engine, stranger, "view_1").await;
    assert!(replies[0].text.contains("not found"));
    let replies = say(&engine, stranger, "edit_1").await;
    assert!(replies[0].text.contains("cannot be edited"));
}
