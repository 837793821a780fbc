use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Review status of a leave application. Stored as lowercase text; the only
/// permitted transitions are Pending -> Approved and Pending -> Rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[sqlx(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Leave category. The display string doubles as the stored column text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
pub enum LeaveKind {
    #[serde(rename = "annual basic paid leave")]
    #[strum(serialize = "annual basic paid leave")]
    #[sqlx(rename = "annual basic paid leave")]
    AnnualBasic,

    #[serde(rename = "annual additional paid leave")]
    #[strum(serialize = "annual additional paid leave")]
    #[sqlx(rename = "annual additional paid leave")]
    AnnualAdditional,

    #[serde(rename = "unpaid leave")]
    #[strum(serialize = "unpaid leave")]
    #[sqlx(rename = "unpaid leave")]
    Unpaid,

    #[serde(rename = "sick leave")]
    #[strum(serialize = "sick leave")]
    #[sqlx(rename = "sick leave")]
    Sick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Application {
    #[schema(example = 1)]
    pub application_id: u64,

    #[schema(example = 420100100)]
    pub user_id: i64,

    #[schema(example = "2026-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,

    #[schema(example = "2026-06-10", format = "date", value_type = String)]
    pub end_date: NaiveDate,

    #[schema(example = "annual basic paid leave", value_type = String)]
    pub leave_type: LeaveKind,

    #[schema(example = "pending", value_type = String)]
    pub status: ApplicationStatus,

    #[schema(example = "family trip", nullable = true)]
    pub reason: Option<String>,

    #[schema(example = "2026-05-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2026-05-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Inclusive day count of the requested leave span.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}
