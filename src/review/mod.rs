//! Admin-facing review operations, kept free of any presentation concerns so
//! they can be exercised directly against a store double.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::model::application::{Application, ApplicationStatus};
use crate::model::user::User;
use crate::notify::Notifier;
use crate::store::{
    ActorLog, ApplicationSearch, ApplicationWithUser, CascadeDelete, Page, RecordStore,
    StoreError, Transition,
};


/// Fixed page size for every admin listing.
pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Status filter of the admin listing. `All` deliberately narrows to pending
/// applications only; the processed ones live in the history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn parse(input: Option<&str>) -> Option<Self> {
        match input {
            None => Some(Self::All),
            Some(raw) if raw.eq_ignore_ascii_case("all") => Some(Self::All),
            Some(raw) => ApplicationStatus::from_str(raw).ok().map(Self::Only),
        }
    }

    fn statuses(self) -> Vec<ApplicationStatus> {
        match self {
            Self::All => vec![ApplicationStatus::Pending],
            Self::Only(status) => vec![status],
        }
    }
}

/// Outcome of an approve/reject attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum DecisionOutcome {
    Applied,
    NotPending,
    NotFound,
}

pub struct ReviewService {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn applications(
        &self,
        search: Option<String>,
        filter: StatusFilter,
        page: u32,
    ) -> Result<(Vec<ApplicationWithUser>, i64), ReviewError> {
        let search = ApplicationSearch {
            text: search,
            statuses: filter.statuses(),
        };
        Ok(self
            .store
            .search_applications(&search, Page::new(page, PAGE_SIZE))
            .await?)
    }

    /// Processed applications only, newest first.
    pub async fn history(
        &self,
        page: u32,
    ) -> Result<(Vec<ApplicationWithUser>, i64), ReviewError> {
        let search = ApplicationSearch {
            text: None,
            statuses: vec![ApplicationStatus::Approved, ApplicationStatus::Rejected],
        };
        Ok(self
            .store
            .search_applications(&search, Page::new(page, PAGE_SIZE))
            .await?)
    }

    pub async fn application(&self, id: u64) -> Result<Option<Application>, ReviewError> {
        Ok(self.store.application(id).await?)
    }

    pub async fn approve(&self, id: u64) -> Result<DecisionOutcome, ReviewError> {
        let action = format!("Application #{id} approved by administrator");
        match self
            .store
            .transition_status(id, ApplicationStatus::Approved, None, &action)
            .await?
        {
            Transition::Applied(app) => {
                info!(application_id = id, "Application approved");
                self.notify_decision(&app, "approved").await;
                Ok(DecisionOutcome::Applied)
            }
            Transition::NotPending => {
                warn!(application_id = id, "Approve skipped, not pending");
                Ok(DecisionOutcome::NotPending)
            }
            Transition::NotFound => {
                warn!(application_id = id, "Approve skipped, no such application");
                Ok(DecisionOutcome::NotFound)
            }
        }
    }

    pub async fn reject(&self, id: u64, note: &str) -> Result<DecisionOutcome, ReviewError> {
        let action = format!("Application #{id} rejected by administrator");
        match self
            .store
            .transition_status(id, ApplicationStatus::Rejected, Some(note), &action)
            .await?
        {
            Transition::Applied(app) => {
                info!(application_id = id, "Application rejected");
                self.notify_decision(&app, "rejected").await;
                Ok(DecisionOutcome::Applied)
            }
            Transition::NotPending => {
                warn!(application_id = id, "Reject skipped, not pending");
                Ok(DecisionOutcome::NotPending)
            }
            Transition::NotFound => {
                warn!(application_id = id, "Reject skipped, no such application");
                Ok(DecisionOutcome::NotFound)
            }
        }
    }

    /// Removes the user together with their applications and logs. The audit
    /// line goes to the process log so the cascade leaves nothing behind.
    pub async fn delete_user(&self, user_id: i64) -> Result<Option<CascadeDelete>, ReviewError> {
        let outcome = self.store.delete_user(user_id).await?;
        match &outcome {
            Some(cascade) => info!(
                user_id,
                applications = cascade.applications,
                logs = cascade.logs,
                "User deleted by administrator"
            ),
            None => warn!(user_id, "User to delete not found"),
        }
        Ok(outcome)
    }

    /// Admin overwrite of user fields, bypassing registration validation.
    pub async fn update_user(&self, user: User) -> Result<bool, ReviewError> {
        let updated = self
            .store
            .update_user(&user, "User details edited by administrator")
            .await?;
        if updated {
            info!(user_id = user.user_id, "User edited by administrator");
        }
        Ok(updated)
    }

    pub async fn users(&self, page: u32) -> Result<Vec<User>, ReviewError> {
        Ok(self.store.users(Page::new(page, PAGE_SIZE)).await?)
    }

    pub async fn logs(&self, page: u32) -> Result<Vec<ActorLog>, ReviewError> {
        Ok(self.store.logs(Page::new(page, PAGE_SIZE)).await?)
    }

    /// Best-effort owner notification after a committed decision; a delivered
    /// notification is itself an auditable event.
    async fn notify_decision(&self, app: &Application, verdict: &str) {
        let text = format!(
            "Your application #{} has been {verdict}",
            app.application_id
        );
        match self.notifier.send(app.user_id, &text).await {
            Ok(()) => {
                let action = format!(
                    "Notified about application #{}: {verdict}",
                    app.application_id
                );
                if let Err(e) = self.store.append_log(app.user_id, &action).await {
                    error!(error = %e, user_id = app.user_id, "Notification log write failed");
                }
            }
            Err(e) => {
                error!(error = %e, user_id = app.user_id, "Owner notification failed");
            }
        }
    }
}
