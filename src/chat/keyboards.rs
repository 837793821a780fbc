//! Menu labels and quick-reply sets offered to conversants. Labels double as
//! the inbound payloads the transport echoes back.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::application::LeaveKind;

pub const START: &str = "/start";
pub const MAIN_MENU: &str = "Main menu";
pub const VACATION: &str = "Vacation";
pub const SICK_LEAVE: &str = "Sick leave";
pub const MY_APPLICATIONS: &str = "My applications";

pub static VACATION_KINDS: Lazy<Vec<(&'static str, LeaveKind)>> = Lazy::new(|| {
    vec![
        ("Annual basic paid leave", LeaveKind::AnnualBasic),
        ("Annual additional paid leave", LeaveKind::AnnualAdditional),
        ("Unpaid leave", LeaveKind::Unpaid),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuickReply {
    pub label: String,
    pub data: String,
}

impl QuickReply {
    /// A menu button whose payload is its own label.
    pub fn menu(label: &str) -> Self {
        Self {
            label: label.to_string(),
            data: label.to_string(),
        }
    }

    pub fn action(label: String, data: String) -> Self {
        Self { label, data }
    }
}

pub fn main_menu() -> Vec<QuickReply> {
    vec![QuickReply::menu(MAIN_MENU)]
}

pub fn action_menu() -> Vec<QuickReply> {
    vec![
        QuickReply::menu(VACATION),
        QuickReply::menu(SICK_LEAVE),
        QuickReply::menu(MY_APPLICATIONS),
    ]
}

pub fn vacation_menu() -> Vec<QuickReply> {
    VACATION_KINDS
        .iter()
        .map(|(label, _)| QuickReply::menu(label))
        .chain(std::iter::once(QuickReply::menu(MAIN_MENU)))
        .collect()
}

pub fn vacation_kind(label: &str) -> Option<LeaveKind> {
    VACATION_KINDS
        .iter()
        .find(|(candidate, _)| *candidate == label)
        .map(|(_, kind)| *kind)
}
