//! Conversational core: drives registration, submission, and revision flows
//! one prompt at a time, independent of any concrete chat transport.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::model::application::{Application, ApplicationStatus, LeaveKind};
use crate::model::user::User;
use crate::notify::Notifier;
use crate::store::{ApplicationUpdate, NewApplication, RecordStore, StoreError};

pub mod keyboards;
pub mod state;
#[cfg(test)]
mod tests;
pub mod validate;

use keyboards::{QuickReply, action_menu, main_menu, vacation_menu};
use state::{SessionState, SessionTable};
use validate::{validate_date, validate_email};

/// Flows untouched for this long count as abandoned.
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

const REGISTER_FIRST: &str = "Register first with /start";
const STORE_FAILURE: &str = "❌ Something went wrong, please try again";
const ASK_START_DATE: &str = "Start date (YYYY-MM-DD):";
const ASK_END_DATE: &str = "End date (YYYY-MM-DD):";

/// One inbound chat event: plain text or a quick-reply payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InboundEvent {
    #[schema(example = 420100100)]
    pub chat_id: i64,
    #[schema(example = "/start")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub quick_replies: Vec<QuickReply>,
}

fn reply(chat_id: i64, text: impl Into<String>) -> OutboundMessage {
    OutboundMessage {
        chat_id,
        text: text.into(),
        quick_replies: Vec::new(),
    }
}

fn reply_kb(
    chat_id: i64,
    text: impl Into<String>,
    quick_replies: Vec<QuickReply>,
) -> OutboundMessage {
    OutboundMessage {
        chat_id,
        text: text.into(),
        quick_replies,
    }
}

pub struct ChatEngine {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    sessions: SessionTable,
    hr_chat_id: i64,
}

impl ChatEngine {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn Notifier>, hr_chat_id: i64) -> Self {
        Self {
            store,
            notifier,
            sessions: SessionTable::new(SESSION_TTL),
            hr_chat_id,
        }
    }

    /// Processes one inbound event and returns the messages to deliver.
    /// `/start` and the main-menu label always supersede an active flow.
    pub async fn handle(&self, event: InboundEvent) -> Vec<OutboundMessage> {
        let chat_id = event.chat_id;
        let text = event.text.trim().to_string();

        if text == keyboards::START {
            self.sessions.clear(chat_id);
            return self.start(chat_id).await;
        }
        if text == keyboards::MAIN_MENU {
            self.sessions.clear(chat_id);
            return self.menu(chat_id).await;
        }
        if let Some(active) = self.sessions.take(chat_id) {
            return self.advance(chat_id, active, &text).await;
        }
        self.idle(chat_id, &text).await
    }

    async fn start(&self, chat_id: i64) -> Vec<OutboundMessage> {
        match self.store.user(chat_id).await {
            Ok(Some(_)) => vec![reply_kb(
                chat_id,
                "You are already registered",
                action_menu(),
            )],
            Ok(None) => {
                self.sessions.put(chat_id, SessionState::AwaitFirstName);
                vec![reply_kb(chat_id, "Enter your first name:", main_menu())]
            }
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn menu(&self, chat_id: i64) -> Vec<OutboundMessage> {
        match self.store.user(chat_id).await {
            Ok(Some(_)) => vec![reply_kb(chat_id, "Choose an action:", action_menu())],
            Ok(None) => vec![reply_kb(chat_id, "Choose an action:", main_menu())],
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn idle(&self, chat_id: i64, text: &str) -> Vec<OutboundMessage> {
        if text == keyboards::VACATION {
            return match self.require_registered(chat_id).await {
                Ok(_) => vec![reply_kb(chat_id, "Vacation type:", vacation_menu())],
                Err(messages) => messages,
            };
        }
        if text == keyboards::SICK_LEAVE {
            return match self.require_registered(chat_id).await {
                Ok(_) => self.begin_submission(chat_id, LeaveKind::Sick),
                Err(messages) => messages,
            };
        }
        if text == keyboards::MY_APPLICATIONS {
            return match self.require_registered(chat_id).await {
                Ok(_) => self.list_own_applications(chat_id).await,
                Err(messages) => messages,
            };
        }
        if let Some(kind) = keyboards::vacation_kind(text) {
            return match self.require_registered(chat_id).await {
                Ok(_) => self.begin_submission(chat_id, kind),
                Err(messages) => messages,
            };
        }
        if let Some(id) = parse_payload(text, "view_") {
            return self.view_application(chat_id, id).await;
        }
        if let Some(id) = parse_payload(text, "edit_") {
            return self.begin_edit(chat_id, id).await;
        }

        match self.store.user(chat_id).await {
            Ok(Some(_)) => vec![reply_kb(chat_id, "Choose an action:", action_menu())],
            Ok(None) => vec![reply(chat_id, REGISTER_FIRST)],
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    fn begin_submission(&self, chat_id: i64, leave_type: LeaveKind) -> Vec<OutboundMessage> {
        self.sessions
            .put(chat_id, SessionState::AwaitStartDate { leave_type });
        vec![reply_kb(chat_id, ASK_START_DATE, main_menu())]
    }

    async fn list_own_applications(&self, chat_id: i64) -> Vec<OutboundMessage> {
        match self.store.applications_for_user(chat_id).await {
            Ok(applications) if applications.is_empty() => {
                vec![reply_kb(chat_id, "You have no applications", action_menu())]
            }
            Ok(applications) => {
                let buttons = applications
                    .iter()
                    .map(|app| {
                        QuickReply::action(
                            format!(
                                "#{} ({}, {})",
                                app.application_id, app.leave_type, app.status
                            ),
                            format!("view_{}", app.application_id),
                        )
                    })
                    .collect();
                vec![reply_kb(chat_id, "Your applications:", buttons)]
            }
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn view_application(&self, chat_id: i64, id: u64) -> Vec<OutboundMessage> {
        match self.store.application(id).await {
            Ok(Some(app)) if app.user_id == chat_id => {
                let text = format!(
                    "Application #{}\nType: {}\nFrom: {}\nTo: {}\nStatus: {}\nReason: {}",
                    app.application_id,
                    app.leave_type,
                    app.start_date,
                    app.end_date,
                    app.status,
                    app.reason.as_deref().unwrap_or("Not specified"),
                );
                let buttons = if app.status == ApplicationStatus::Pending {
                    vec![QuickReply::action(
                        format!("✏️ Edit #{}", app.application_id),
                        format!("edit_{}", app.application_id),
                    )]
                } else {
                    Vec::new()
                };
                vec![reply_kb(chat_id, text, buttons)]
            }
            Ok(_) => vec![reply(chat_id, "Application not found")],
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn begin_edit(&self, chat_id: i64, id: u64) -> Vec<OutboundMessage> {
        match self.store.application(id).await {
            Ok(Some(app))
                if app.user_id == chat_id && app.status == ApplicationStatus::Pending =>
            {
                self.sessions
                    .put(chat_id, SessionState::AwaitEditStartDate { application_id: id });
                vec![reply_kb(
                    chat_id,
                    "New start date (YYYY-MM-DD):",
                    main_menu(),
                )]
            }
            Ok(_) => vec![reply(chat_id, "⚠️ Application cannot be edited")],
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn advance(
        &self,
        chat_id: i64,
        active: SessionState,
        text: &str,
    ) -> Vec<OutboundMessage> {
        match active {
            SessionState::AwaitFirstName => {
                self.sessions.put(
                    chat_id,
                    SessionState::AwaitLastName {
                        first_name: text.to_string(),
                    },
                );
                vec![reply_kb(chat_id, "Last name:", main_menu())]
            }
            SessionState::AwaitLastName { first_name } => {
                self.sessions.put(
                    chat_id,
                    SessionState::AwaitPosition {
                        first_name,
                        last_name: text.to_string(),
                    },
                );
                vec![reply_kb(chat_id, "Position:", main_menu())]
            }
            SessionState::AwaitPosition {
                first_name,
                last_name,
            } => {
                self.sessions.put(
                    chat_id,
                    SessionState::AwaitDepartment {
                        first_name,
                        last_name,
                        position: text.to_string(),
                    },
                );
                vec![reply_kb(chat_id, "Department:", main_menu())]
            }
            SessionState::AwaitDepartment {
                first_name,
                last_name,
                position,
            } => {
                self.sessions.put(
                    chat_id,
                    SessionState::AwaitEmail {
                        first_name,
                        last_name,
                        position,
                        department: text.to_string(),
                    },
                );
                vec![reply_kb(chat_id, "Email:", main_menu())]
            }
            SessionState::AwaitEmail {
                first_name,
                last_name,
                position,
                department,
            } => {
                self.finish_registration(chat_id, first_name, last_name, position, department, text)
                    .await
            }

            SessionState::AwaitStartDate { leave_type } => {
                match validate_date(text, false) {
                    Ok(start_date) => {
                        self.sessions.put(
                            chat_id,
                            SessionState::AwaitEndDate {
                                leave_type,
                                start_date,
                            },
                        );
                        vec![reply_kb(chat_id, ASK_END_DATE, main_menu())]
                    }
                    Err(e) => {
                        self.sessions
                            .put(chat_id, SessionState::AwaitStartDate { leave_type });
                        vec![reply_kb(chat_id, format!("❌ {e}"), main_menu())]
                    }
                }
            }
            SessionState::AwaitEndDate {
                leave_type,
                start_date,
            } => match validate_date(text, false) {
                Ok(end_date) if end_date >= start_date => {
                    self.sessions.put(
                        chat_id,
                        SessionState::AwaitReason {
                            leave_type,
                            start_date,
                            end_date,
                        },
                    );
                    vec![reply_kb(chat_id, "Reason:", main_menu())]
                }
                Ok(_) => {
                    self.sessions.put(
                        chat_id,
                        SessionState::AwaitEndDate {
                            leave_type,
                            start_date,
                        },
                    );
                    vec![reply_kb(
                        chat_id,
                        "❌ End date is before the start date",
                        main_menu(),
                    )]
                }
                Err(e) => {
                    self.sessions.put(
                        chat_id,
                        SessionState::AwaitEndDate {
                            leave_type,
                            start_date,
                        },
                    );
                    vec![reply_kb(chat_id, format!("❌ {e}"), main_menu())]
                }
            },
            SessionState::AwaitReason {
                leave_type,
                start_date,
                end_date,
            } => {
                self.finish_submission(chat_id, leave_type, start_date, end_date, text)
                    .await
            }

            SessionState::AwaitEditStartDate { application_id } => {
                match validate_date(text, false) {
                    Ok(start_date) => {
                        self.sessions.put(
                            chat_id,
                            SessionState::AwaitEditEndDate {
                                application_id,
                                start_date,
                            },
                        );
                        vec![reply_kb(chat_id, "New end date (YYYY-MM-DD):", main_menu())]
                    }
                    Err(e) => {
                        self.sessions
                            .put(chat_id, SessionState::AwaitEditStartDate { application_id });
                        vec![reply_kb(chat_id, format!("❌ {e}"), main_menu())]
                    }
                }
            }
            SessionState::AwaitEditEndDate {
                application_id,
                start_date,
            } => match validate_date(text, false) {
                Ok(end_date) if end_date >= start_date => {
                    self.sessions.put(
                        chat_id,
                        SessionState::AwaitEditReason {
                            application_id,
                            start_date,
                            end_date,
                        },
                    );
                    vec![reply_kb(chat_id, "New reason:", main_menu())]
                }
                Ok(_) => {
                    self.sessions.put(
                        chat_id,
                        SessionState::AwaitEditEndDate {
                            application_id,
                            start_date,
                        },
                    );
                    vec![reply_kb(
                        chat_id,
                        "❌ End date is before the start date",
                        main_menu(),
                    )]
                }
                Err(e) => {
                    self.sessions.put(
                        chat_id,
                        SessionState::AwaitEditEndDate {
                            application_id,
                            start_date,
                        },
                    );
                    vec![reply_kb(chat_id, format!("❌ {e}"), main_menu())]
                }
            },
            SessionState::AwaitEditReason {
                application_id,
                start_date,
                end_date,
            } => {
                self.finish_edit(chat_id, application_id, start_date, end_date, text)
                    .await
            }
        }
    }

    async fn finish_registration(
        &self,
        chat_id: i64,
        first_name: String,
        last_name: String,
        position: String,
        department: String,
        email: &str,
    ) -> Vec<OutboundMessage> {
        let again = |engine: &Self| {
            engine.sessions.put(
                chat_id,
                SessionState::AwaitEmail {
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    position: position.clone(),
                    department: department.clone(),
                },
            );
        };

        if let Err(e) = validate_email(email) {
            again(self);
            return vec![reply_kb(chat_id, format!("❌ {e}"), main_menu())];
        }
        match self.store.user_by_email(email).await {
            Ok(Some(_)) => {
                warn!(chat_id, email, "Registration attempt with a taken email");
                again(self);
                return vec![reply_kb(
                    chat_id,
                    "❌ This email is already registered",
                    main_menu(),
                )];
            }
            Ok(None) => {}
            Err(e) => return self.store_failure(chat_id, e),
        }

        let user = User {
            user_id: chat_id,
            first_name,
            last_name,
            position: Some(position),
            department: Some(department),
            email: email.to_string(),
        };
        match self.store.register_user(&user, "User registered").await {
            Ok(()) => {
                info!(chat_id, email = %user.email, "User registered");
                vec![reply_kb(chat_id, "✅ Registration complete", action_menu())]
            }
            Err(StoreError::Conflict) => {
                warn!(chat_id, "Registration raced with a duplicate email");
                self.sessions.put(
                    chat_id,
                    SessionState::AwaitEmail {
                        first_name: user.first_name,
                        last_name: user.last_name,
                        position: user.position.unwrap_or_default(),
                        department: user.department.unwrap_or_default(),
                    },
                );
                vec![reply_kb(
                    chat_id,
                    "❌ This email is already registered",
                    main_menu(),
                )]
            }
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn finish_submission(
        &self,
        chat_id: i64,
        leave_type: LeaveKind,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        reason: &str,
    ) -> Vec<OutboundMessage> {
        let new = NewApplication {
            user_id: chat_id,
            start_date,
            end_date,
            leave_type,
            reason: Some(reason.to_string()),
        };
        match self.store.submit_application(new).await {
            Ok(app) => {
                info!(chat_id, application_id = app.application_id, "Application submitted");
                self.notify_hr(hr_summary(&app, chat_id, "submitted")).await;
                vec![reply_kb(chat_id, "✅ Application submitted", action_menu())]
            }
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn finish_edit(
        &self,
        chat_id: i64,
        application_id: u64,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        reason: &str,
    ) -> Vec<OutboundMessage> {
        let update = ApplicationUpdate {
            application_id,
            user_id: chat_id,
            start_date,
            end_date,
            reason: reason.to_string(),
        };
        let action = format!("Edited application #{application_id}");
        match self.store.revise_application(update, &action).await {
            Ok(true) => {
                info!(chat_id, application_id, "Application revised");
                if let Ok(Some(app)) = self.store.application(application_id).await {
                    self.notify_hr(hr_summary(&app, chat_id, "updated")).await;
                }
                vec![reply_kb(chat_id, "✅ Application updated", action_menu())]
            }
            Ok(false) => vec![reply_kb(
                chat_id,
                "⚠️ Application can no longer be edited",
                action_menu(),
            )],
            Err(e) => self.store_failure(chat_id, e),
        }
    }

    async fn require_registered(&self, chat_id: i64) -> Result<User, Vec<OutboundMessage>> {
        match self.store.user(chat_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(vec![reply(chat_id, REGISTER_FIRST)]),
            Err(e) => Err(self.store_failure(chat_id, e)),
        }
    }

    /// Terminal failure path: the store already rolled the flow's writes
    /// back, so drop the session and hand back a generic notice.
    fn store_failure(&self, chat_id: i64, e: StoreError) -> Vec<OutboundMessage> {
        error!(error = %e, chat_id, "Store operation failed");
        self.sessions.clear(chat_id);
        vec![reply_kb(chat_id, STORE_FAILURE, main_menu())]
    }

    async fn notify_hr(&self, text: String) {
        if let Err(e) = self.notifier.send(self.hr_chat_id, &text).await {
            error!(error = %e, "HR notification failed");
        }
    }
}

fn parse_payload(text: &str, prefix: &str) -> Option<u64> {
    text.strip_prefix(prefix)?.parse().ok()
}

fn hr_summary(app: &Application, chat_id: i64, verb: &str) -> String {
    format!(
        "Application #{} from {} {}: {} from {} to {}. Reason: {}",
        app.application_id,
        chat_id,
        verb,
        app.leave_type,
        app.start_date,
        app.end_date,
        app.reason.as_deref().unwrap_or("-"),
    )
}
