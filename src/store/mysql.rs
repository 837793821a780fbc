use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlPool, Row, mysql::MySqlRow};
use tracing::info;

use crate::model::application::{Application, ApplicationStatus};
use crate::model::log::Log;
use crate::model::user::User;

use super::{
    ActorLog, ApplicationSearch, ApplicationUpdate, ApplicationWithUser, CascadeDelete,
    NewApplication, Page, RecordStore, StoreError, Transition, rejection_note, submission_audit,
};

/// sqlx/MySQL adapter. Every logical operation that writes a primary record
/// and its audit log entry runs inside one transaction.
pub struct MySqlStore {
    pool: MySqlPool,
}

// Helper enum for typed SQLx binding of dynamically built WHERE clauses.
enum FilterValue {
    U64(u64),
    Str(String),
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id BIGINT NOT NULL PRIMARY KEY,
        first_name VARCHAR(100) NOT NULL,
        last_name VARCHAR(100) NOT NULL,
        position VARCHAR(100) NULL,
        department VARCHAR(100) NULL,
        email VARCHAR(100) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS applications (
        application_id BIGINT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT,
        user_id BIGINT NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        leave_type VARCHAR(100) NOT NULL,
        status VARCHAR(20) NOT NULL,
        reason TEXT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
        CONSTRAINT fk_applications_user FOREIGN KEY (user_id) REFERENCES users (user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS logs (
        log_id BIGINT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT,
        user_id BIGINT NOT NULL,
        action TEXT NOT NULL,
        timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CONSTRAINT fk_logs_user FOREIGN KEY (user_id) REFERENCES users (user_id)
    )
    "#,
];

impl MySqlStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = MySqlPool::connect(database_url).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema verified");
        Ok(())
    }
}

fn application_from_row(row: &MySqlRow) -> Result<Application, sqlx::Error> {
    Ok(Application {
        application_id: row.try_get("application_id")?,
        user_id: row.try_get("user_id")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        leave_type: row.try_get("leave_type")?,
        status: row.try_get("status")?,
        reason: row.try_get("reason")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn users(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY user_id LIMIT ? OFFSET ?")
                .bind(page.size as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    async fn register_user(&self, user: &User, action: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO users (user_id, first_name, last_name, position, department, email)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.position)
        .bind(&user.department)
        .bind(&user.email)
        .execute(&mut *tx)
        .await?;
        sqlx::query("INSERT INTO logs (user_id, action) VALUES (?, ?)")
            .bind(user.user_id)
            .bind(action)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_user(&self, user: &User, action: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, position = ?, department = ?, email = ?
            WHERE user_id = ?
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.position)
        .bind(&user.department)
        .bind(&user.email)
        .bind(user.user_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query("INSERT INTO logs (user_id, action) VALUES (?, ?)")
            .bind(user.user_id)
            .bind(action)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_user(&self, user_id: i64) -> Result<Option<CascadeDelete>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query("SELECT 1 FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }
        let applications = sqlx::query("DELETE FROM applications WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let logs = sqlx::query("DELETE FROM logs WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(CascadeDelete { applications, logs }))
    }

    async fn application(&self, application_id: u64) -> Result<Option<Application>, StoreError> {
        let application = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE application_id = ?",
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn applications_for_user(&self, user_id: i64) -> Result<Vec<Application>, StoreError> {
        let applications = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE user_id = ? ORDER BY application_id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn applications_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Application>, StoreError> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE start_date >= ? AND end_date <= ?
            ORDER BY start_date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn search_applications(
        &self,
        search: &ApplicationSearch,
        page: Page,
    ) -> Result<(Vec<ApplicationWithUser>, i64), StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if !search.statuses.is_empty() {
            let placeholders = vec!["?"; search.statuses.len()].join(", ");
            where_sql.push_str(&format!(" AND a.status IN ({placeholders})"));
            for status in &search.statuses {
                args.push(FilterValue::Str(status.to_string()));
            }
        }

        if let Some(text) = search.text.as_deref().map(str::trim) {
            if !text.is_empty() {
                let like = format!("%{}%", text.to_lowercase());
                match text.parse::<u64>() {
                    Ok(id) => {
                        where_sql.push_str(
                            " AND (LOWER(u.first_name) LIKE ? OR LOWER(u.last_name) LIKE ? \
                             OR a.application_id = ?)",
                        );
                        args.push(FilterValue::Str(like.clone()));
                        args.push(FilterValue::Str(like));
                        args.push(FilterValue::U64(id));
                    }
                    Err(_) => {
                        where_sql.push_str(
                            " AND (LOWER(u.first_name) LIKE ? OR LOWER(u.last_name) LIKE ?)",
                        );
                        args.push(FilterValue::Str(like.clone()));
                        args.push(FilterValue::Str(like));
                    }
                }
            }
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM applications a JOIN users u ON u.user_id = a.user_id{where_sql}"
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_query = match arg {
                FilterValue::U64(v) => count_query.bind(*v),
                FilterValue::Str(s) => count_query.bind(s.clone()),
            };
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let data_sql = format!(
            r#"
            SELECT a.application_id, a.user_id, a.start_date, a.end_date, a.leave_type,
                   a.status, a.reason, a.created_at, a.updated_at,
                   u.first_name, u.last_name, u.position, u.department, u.email
            FROM applications a
            JOIN users u ON u.user_id = a.user_id
            {where_sql}
            ORDER BY a.created_at DESC, a.application_id DESC
            LIMIT ? OFFSET ?
            "#
        );
        let mut data_query = sqlx::query(&data_sql);
        for arg in args {
            data_query = match arg {
                FilterValue::U64(v) => data_query.bind(v),
                FilterValue::Str(s) => data_query.bind(s),
            };
        }
        let rows = data_query
            .bind(page.size as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let application = application_from_row(row).map_err(StoreError::from)?;
            let user = User {
                user_id: application.user_id,
                first_name: row.try_get("first_name").map_err(StoreError::from)?,
                last_name: row.try_get("last_name").map_err(StoreError::from)?,
                position: row.try_get("position").map_err(StoreError::from)?,
                department: row.try_get("department").map_err(StoreError::from)?,
                email: row.try_get("email").map_err(StoreError::from)?,
            };
            results.push(ApplicationWithUser { application, user });
        }
        Ok((results, total))
    }

    async fn submit_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO applications (user_id, start_date, end_date, leave_type, status, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.leave_type)
        .bind(ApplicationStatus::Pending)
        .bind(&new.reason)
        .execute(&mut *tx)
        .await?;
        let application_id = result.last_insert_id();
        sqlx::query("INSERT INTO logs (user_id, action) VALUES (?, ?)")
            .bind(new.user_id)
            .bind(submission_audit(application_id))
            .execute(&mut *tx)
            .await?;
        let application = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE application_id = ?",
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(application)
    }

    async fn revise_application(
        &self,
        update: ApplicationUpdate,
        action: &str,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET start_date = ?, end_date = ?, reason = ?, updated_at = NOW()
            WHERE application_id = ? AND user_id = ? AND status = ?
            "#,
        )
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(&update.reason)
        .bind(update.application_id)
        .bind(update.user_id)
        .bind(ApplicationStatus::Pending)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query("INSERT INTO logs (user_id, action) VALUES (?, ?)")
            .bind(update.user_id)
            .bind(action)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn transition_status(
        &self,
        application_id: u64,
        to: ApplicationStatus,
        reason_note: Option<&str>,
        action: &str,
    ) -> Result<Transition, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT * FROM applications WHERE application_id = ? FOR UPDATE")
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(Transition::NotFound);
        };
        let application = application_from_row(&row).map_err(StoreError::from)?;
        if application.status != ApplicationStatus::Pending {
            return Ok(Transition::NotPending);
        }

        let reason = match reason_note {
            Some(note) => Some(rejection_note(application.reason.as_deref(), note)),
            None => application.reason.clone(),
        };
        sqlx::query(
            "UPDATE applications SET status = ?, reason = ?, updated_at = NOW() \
             WHERE application_id = ?",
        )
        .bind(to)
        .bind(&reason)
        .bind(application_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("INSERT INTO logs (user_id, action) VALUES (?, ?)")
            .bind(application.user_id)
            .bind(action)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Transition::Applied(Application {
            status: to,
            reason,
            updated_at: chrono::Utc::now(),
            ..application
        }))
    }

    async fn append_log(&self, user_id: i64, action: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO logs (user_id, action) VALUES (?, ?)")
            .bind(user_id)
            .bind(action)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn logs(&self, page: Page) -> Result<Vec<ActorLog>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT l.log_id, l.user_id, l.action, l.timestamp, u.first_name
            FROM logs l
            LEFT JOIN users u ON u.user_id = l.user_id
            ORDER BY l.timestamp DESC, l.log_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in &rows {
            logs.push(ActorLog {
                log: Log {
                    log_id: row.try_get("log_id").map_err(StoreError::from)?,
                    user_id: row.try_get("user_id").map_err(StoreError::from)?,
                    action: row.try_get("action").map_err(StoreError::from)?,
                    timestamp: row.try_get("timestamp").map_err(StoreError::from)?,
                },
                first_name: row.try_get("first_name").map_err(StoreError::from)?,
            });
        }
        Ok(logs)
    }
}
