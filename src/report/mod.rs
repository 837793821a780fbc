//! Read-only report aggregations over the application records.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::model::application::Application;
use crate::store::{RecordStore, StoreError};

pub mod render;

pub use render::{PlainTextRenderer, RenderError, RenderedReport, ReportRenderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Empty result set; no document is produced.
    #[error("no matching records")]
    Empty,
    #[error("user {0} not found")]
    UnknownUser(i64),
    #[error("invalid report period")]
    InvalidPeriod,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub struct ReportService {
    store: Arc<dyn RecordStore>,
    renderer: Arc<dyn ReportRenderer>,
}

impl ReportService {
    pub fn new(store: Arc<dyn RecordStore>, renderer: Arc<dyn ReportRenderer>) -> Self {
        Self { store, renderer }
    }

    /// Every application whose span falls inside the period.
    pub async fn applications_in_period(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<RenderedReport, ReportError> {
        if from > to {
            return Err(ReportError::InvalidPeriod);
        }
        let applications = self.store.applications_in_range(from, to).await?;
        if applications.is_empty() {
            return Err(ReportError::Empty);
        }
        let document = ReportDocument {
            title: format!("Applications {from} to {to}"),
            lines: applications.iter().map(application_line).collect(),
        };
        info!(lines = document.lines.len(), "Period report built");
        Ok(self.renderer.render(&document)?)
    }

    /// Total leave days per department across one calendar year, inclusive
    /// day counting, one line per department.
    pub async fn duration_by_department(&self, year: i32) -> Result<RenderedReport, ReportError> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ReportError::InvalidPeriod)?;
        let to = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(ReportError::InvalidPeriod)?;
        let applications = self.store.applications_in_range(from, to).await?;
        if applications.is_empty() {
            return Err(ReportError::Empty);
        }

        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for application in &applications {
            let department = self
                .store
                .user(application.user_id)
                .await?
                .and_then(|user| user.department)
                .unwrap_or_else(|| "no department".to_string());
            *totals.entry(department).or_default() += application.duration_days();
        }

        let document = ReportDocument {
            title: format!("Leave days by department, {year}"),
            lines: totals
                .iter()
                .map(|(department, days)| format!("{department}: {days} days"))
                .collect(),
        };
        info!(year, departments = document.lines.len(), "Department report built");
        Ok(self.renderer.render(&document)?)
    }

    /// Every application of a single employee, newest first.
    pub async fn employee_applications(&self, user_id: i64) -> Result<RenderedReport, ReportError> {
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or(ReportError::UnknownUser(user_id))?;
        let applications = self.store.applications_for_user(user_id).await?;
        if applications.is_empty() {
            return Err(ReportError::Empty);
        }
        let document = ReportDocument {
            title: format!("Applications of {}", user.full_name()),
            lines: applications.iter().map(application_line).collect(),
        };
        info!(user_id, lines = document.lines.len(), "Employee report built");
        Ok(self.renderer.render(&document)?)
    }
}

fn application_line(app: &Application) -> String {
    format!(
        "#{} - {}, {} - {}, {}",
        app.application_id, app.leave_type, app.start_date, app.end_date, app.status
    )
}
