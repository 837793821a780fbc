//! In-process store double for exercising the services without a database.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::model::application::{Application, ApplicationStatus};
use crate::model::log::Log;
use crate::model::user::User;

use super::{
    ActorLog, ApplicationSearch, ApplicationUpdate, ApplicationWithUser, CascadeDelete,
    NewApplication, Page, RecordStore, StoreError, Transition, rejection_note, submission_audit,
};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    applications: BTreeMap<u64, Application>,
    logs: Vec<Log>,
    next_application_id: u64,
    next_log_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail, simulating a persistence outage.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn log_count(&self) -> usize {
        self.inner.lock().unwrap().logs.len()
    }

    pub fn snapshot_applications(&self) -> Vec<Application> {
        self.inner
            .lock()
            .unwrap()
            .applications
            .values()
            .cloned()
            .collect()
    }

    pub fn snapshot_logs(&self) -> Vec<Log> {
        self.inner.lock().unwrap().logs.clone()
    }

    /// Total row count across all three tables.
    pub fn total_rows(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.users.len() + inner.applications.len() + inner.logs.len()
    }

    fn write_guard(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }
}

fn push_log(inner: &mut Inner, user_id: i64, action: &str) {
    inner.next_log_id += 1;
    inner.logs.push(Log {
        log_id: inner.next_log_id,
        user_id,
        action: action.to_string(),
        timestamp: Utc::now(),
    });
}

fn matches_search(search: &ApplicationSearch, application: &Application, user: &User) -> bool {
    if !search.statuses.is_empty() && !search.statuses.contains(&application.status) {
        return false;
    }
    if let Some(text) = search.text.as_deref().map(str::trim) {
        if !text.is_empty() {
            let needle = text.to_lowercase();
            let by_name = user.first_name.to_lowercase().contains(&needle)
                || user.last_name.to_lowercase().contains(&needle);
            let by_id = text
                .parse::<u64>()
                .is_ok_and(|id| id == application.application_id);
            if !by_name && !by_id {
                return false;
            }
        }
    }
    true
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn users(&self, page: Page) -> Result<Vec<User>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .cloned()
            .collect())
    }

    async fn register_user(&self, user: &User, action: &str) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        inner.users.insert(user.user_id, user.clone());
        push_log(&mut inner, user.user_id, action);
        Ok(())
    }

    async fn update_user(&self, user: &User, action: &str) -> Result<bool, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        if !inner.users.contains_key(&user.user_id) {
            return Ok(false);
        }
        inner.users.insert(user.user_id, user.clone());
        push_log(&mut inner, user.user_id, action);
        Ok(true)
    }

    async fn delete_user(&self, user_id: i64) -> Result<Option<CascadeDelete>, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        if inner.users.remove(&user_id).is_none() {
            return Ok(None);
        }
        let before_applications = inner.applications.len();
        inner.applications.retain(|_, app| app.user_id != user_id);
        let applications = (before_applications - inner.applications.len()) as u64;
        let before_logs = inner.logs.len();
        inner.logs.retain(|log| log.user_id != user_id);
        let logs = (before_logs - inner.logs.len()) as u64;
        Ok(Some(CascadeDelete { applications, logs }))
    }

    async fn application(&self, application_id: u64) -> Result<Option<Application>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .applications
            .get(&application_id)
            .cloned())
    }

    async fn applications_for_user(&self, user_id: i64) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> = self
            .inner
            .lock()
            .unwrap()
            .applications
            .values()
            .filter(|app| app.user_id == user_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| b.application_id.cmp(&a.application_id));
        Ok(applications)
    }

    async fn applications_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> = self
            .inner
            .lock()
            .unwrap()
            .applications
            .values()
            .filter(|app| app.start_date >= from && app.end_date <= to)
            .cloned()
            .collect();
        applications.sort_by_key(|app| app.start_date);
        Ok(applications)
    }

    async fn search_applications(
        &self,
        search: &ApplicationSearch,
        page: Page,
    ) -> Result<(Vec<ApplicationWithUser>, i64), StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matching: Vec<ApplicationWithUser> = inner
            .applications
            .values()
            .filter_map(|app| {
                let user = inner.users.get(&app.user_id)?;
                matches_search(search, app, user).then(|| ApplicationWithUser {
                    application: app.clone(),
                    user: user.clone(),
                })
            })
            .collect();
        matching.sort_by(|a, b| {
            b.application
                .application_id
                .cmp(&a.application.application_id)
        });
        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();
        Ok((rows, total))
    }

    async fn submit_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_application_id += 1;
        let now = Utc::now();
        let application = Application {
            application_id: inner.next_application_id,
            user_id: new.user_id,
            start_date: new.start_date,
            end_date: new.end_date,
            leave_type: new.leave_type,
            status: ApplicationStatus::Pending,
            reason: new.reason,
            created_at: now,
            updated_at: now,
        };
        inner
            .applications
            .insert(application.application_id, application.clone());
        push_log(
            &mut inner,
            new.user_id,
            &submission_audit(application.application_id),
        );
        Ok(application)
    }

    async fn revise_application(
        &self,
        update: ApplicationUpdate,
        action: &str,
    ) -> Result<bool, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(application) = inner.applications.get_mut(&update.application_id) else {
            return Ok(false);
        };
        if application.user_id != update.user_id
            || application.status != ApplicationStatus::Pending
        {
            return Ok(false);
        }
        application.start_date = update.start_date;
        application.end_date = update.end_date;
        application.reason = Some(update.reason);
        application.updated_at = Utc::now();
        push_log(&mut inner, update.user_id, action);
        Ok(true)
    }

    async fn transition_status(
        &self,
        application_id: u64,
        to: ApplicationStatus,
        reason_note: Option<&str>,
        action: &str,
    ) -> Result<Transition, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(application) = inner.applications.get_mut(&application_id) else {
            return Ok(Transition::NotFound);
        };
        if application.status != ApplicationStatus::Pending {
            return Ok(Transition::NotPending);
        }
        application.status = to;
        if let Some(note) = reason_note {
            application.reason = Some(rejection_note(application.reason.as_deref(), note));
        }
        application.updated_at = Utc::now();
        let updated = application.clone();
        push_log(&mut inner, updated.user_id, action);
        Ok(Transition::Applied(updated))
    }

    async fn append_log(&self, user_id: i64, action: &str) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        push_log(&mut inner, user_id, action);
        Ok(())
    }

    async fn logs(&self, page: Page) -> Result<Vec<ActorLog>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut logs: Vec<ActorLog> = inner
            .logs
            .iter()
            .map(|log| ActorLog {
                log: log.clone(),
                first_name: inner
                    .users
                    .get(&log.user_id)
                    .map(|user| user.first_name.clone()),
            })
            .collect();
        logs.reverse();
        Ok(logs
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect())
    }
}
