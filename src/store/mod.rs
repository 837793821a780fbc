use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::application::{Application, ApplicationStatus, LeaveKind};
use crate::model::log::Log;
use crate::model::user::User;

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // 23000 is the MySQL integrity-violation class (duplicate keys included)
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23000") {
                return StoreError::Conflict;
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size,
        }
    }

    pub fn offset(&self) -> u32 {
        (self.number - 1) * self.size
    }
}

/// Admin listing filter: free text matches first/last name substrings or an
/// exact numeric application id; `statuses` is a set-membership constraint.
#[derive(Debug, Clone, Default)]
pub struct ApplicationSearch {
    pub text: Option<String>,
    pub statuses: Vec<ApplicationStatus>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveKind,
    pub reason: Option<String>,
}

/// Owner-side revision of a still-pending application.
#[derive(Debug, Clone)]
pub struct ApplicationUpdate {
    pub application_id: u64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ApplicationWithUser {
    pub application: Application,
    pub user: User,
}

/// A log row joined with the actor's first name, when the actor still exists.
#[derive(Debug, Clone)]
pub struct ActorLog {
    pub log: Log,
    pub first_name: Option<String>,
}

/// Outcome of an attempted status transition.
#[derive(Debug)]
pub enum Transition {
    Applied(Application),
    NotPending,
    NotFound,
}

/// Row counts removed by a cascading user deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeDelete {
    pub applications: u64,
    pub logs: u64,
}

pub(crate) fn submission_audit(application_id: u64) -> String {
    format!("Submitted application #{application_id}")
}

pub(crate) fn rejection_note(existing: Option<&str>, note: &str) -> String {
    match existing {
        Some(reason) => format!("{reason} [Rejected: {note}]"),
        None => format!("[Rejected: {note}]"),
    }
}

/// Persistence contract shared by the conversational core, the review
/// surface, and the report generator. Each mutating operation commits the
/// primary record together with its audit log entry, or rolls both back.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn user(&self, user_id: i64) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn users(&self, page: Page) -> Result<Vec<User>, StoreError>;
    async fn register_user(&self, user: &User, action: &str) -> Result<(), StoreError>;
    /// Admin overwrite of a user's fields. Returns false when the user is absent.
    async fn update_user(&self, user: &User, action: &str) -> Result<bool, StoreError>;
    /// Cascading delete of a user with their applications and logs.
    /// Returns None when the user is absent.
    async fn delete_user(&self, user_id: i64) -> Result<Option<CascadeDelete>, StoreError>;

    async fn application(&self, application_id: u64) -> Result<Option<Application>, StoreError>;
    async fn applications_for_user(&self, user_id: i64) -> Result<Vec<Application>, StoreError>;
    async fn applications_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Application>, StoreError>;
    /// Filtered, paginated admin listing joined with owners, plus the total
    /// matching row count.
    async fn search_applications(
        &self,
        search: &ApplicationSearch,
        page: Page,
    ) -> Result<(Vec<ApplicationWithUser>, i64), StoreError>;
    async fn submit_application(&self, new: NewApplication) -> Result<Application, StoreError>;
    /// Conditional revision: applies only while the application is still
    /// pending and owned by `update.user_id`. Returns false otherwise.
    async fn revise_application(
        &self,
        update: ApplicationUpdate,
        action: &str,
    ) -> Result<bool, StoreError>;
    /// Atomic pending-only status transition, optionally appending a
    /// rejection note to the stored reason.
    async fn transition_status(
        &self,
        application_id: u64,
        to: ApplicationStatus,
        reason_note: Option<&str>,
        action: &str,
    ) -> Result<Transition, StoreError>;

    async fn append_log(&self, user_id: i64, action: &str) -> Result<(), StoreError>;
    async fn logs(&self, page: Page) -> Result<Vec<ActorLog>, StoreError>;
}
