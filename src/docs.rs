use crate::api::applications::{
    ApplicationListResponse, ApplicationView, RejectApplication,
};
use crate::api::logs::{LogListResponse, LogView};
use crate::api::reports::{DepartmentReportRequest, EmployeeReportRequest, PeriodReportRequest};
use crate::api::users::{UpdateUser, UserListResponse};
use crate::chat::keyboards::QuickReply;
use crate::chat::{InboundEvent, OutboundMessage};
use crate::model::application::Application;
use crate::model::user::User;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Desk API",
        version = "1.0.0",
        description = r#"
## Leave Desk

Internal HR leave-request workflow. Employees register and file
vacation/sick-leave applications through a chat transport; HR staff review,
decide, and report on them here.

- **Chat webhook** — inbound conversant events, answered with the messages to deliver
- **Applications** — search, approve, reject, history
- **Users** — listing, admin edit, cascading delete
- **Logs** — append-only audit trail
- **Reports** — period, per-department durations, single employee

Built with **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::chat::chat_event,

        crate::api::applications::list_applications,
        crate::api::applications::application_history,
        crate::api::applications::get_application,
        crate::api::applications::approve_application,
        crate::api::applications::reject_application,

        crate::api::users::list_users,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        crate::api::logs::list_logs,

        crate::api::reports::period_report,
        crate::api::reports::department_report,
        crate::api::reports::employee_report
    ),
    components(
        schemas(
            InboundEvent,
            OutboundMessage,
            QuickReply,
            Application,
            ApplicationView,
            ApplicationListResponse,
            RejectApplication,
            User,
            UserListResponse,
            UpdateUser,
            LogView,
            LogListResponse,
            PeriodReportRequest,
            DepartmentReportRequest,
            EmployeeReportRequest
        )
    ),
    tags(
        (name = "Chat", description = "Chat transport webhook"),
        (name = "Applications", description = "Leave application review"),
        (name = "Users", description = "User administration"),
        (name = "Logs", description = "Audit log"),
        (name = "Reports", description = "Canned report documents"),
    )
)]
pub struct ApiDoc;
