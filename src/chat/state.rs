use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::model::application::LeaveKind;

/// Which prompt a conversant is currently answering, together with every
/// field already validated on the way there. One entry per conversant; a
/// menu return or a fresh `/start` discards the entry wholesale.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    // registration
    AwaitFirstName,
    AwaitLastName {
        first_name: String,
    },
    AwaitPosition {
        first_name: String,
        last_name: String,
    },
    AwaitDepartment {
        first_name: String,
        last_name: String,
        position: String,
    },
    AwaitEmail {
        first_name: String,
        last_name: String,
        position: String,
        department: String,
    },

    // submission
    AwaitStartDate {
        leave_type: LeaveKind,
    },
    AwaitEndDate {
        leave_type: LeaveKind,
        start_date: NaiveDate,
    },
    AwaitReason {
        leave_type: LeaveKind,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    // revision of a pending application
    AwaitEditStartDate {
        application_id: u64,
    },
    AwaitEditEndDate {
        application_id: u64,
        start_date: NaiveDate,
    },
    AwaitEditReason {
        application_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

struct SessionEntry {
    state: SessionState,
    touched: Instant,
}

/// Process-wide table of active flows, keyed by conversant identity.
/// Entries untouched for longer than the ttl count as abandoned and are
/// dropped on next contact.
pub struct SessionTable {
    entries: Mutex<HashMap<i64, SessionEntry>>,
    ttl: Duration,
}

impl SessionTable {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Removes and returns the active state for a conversant, if any and not
    /// yet abandoned. The caller re-inserts whatever state comes next.
    pub fn take(&self, chat_id: i64) -> Option<SessionState> {
        let entry = self.entries.lock().unwrap().remove(&chat_id)?;
        (entry.touched.elapsed() <= self.ttl).then_some(entry.state)
    }

    pub fn put(&self, chat_id: i64, state: SessionState) {
        self.entries.lock().unwrap().insert(
            chat_id,
            SessionEntry {
                state,
                touched: Instant::now(),
            },
        );
    }

    pub fn clear(&self, chat_id: i64) {
        self.entries.lock().unwrap().remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_removes_the_entry() {
        let table = SessionTable::new(Duration::from_secs(60));
        table.put(1, SessionState::AwaitFirstName);
        assert_eq!(table.take(1), Some(SessionState::AwaitFirstName));
        assert_eq!(table.take(1), None);
    }

    #[test]
    fn abandoned_entries_are_dropped() {
        let table = SessionTable::new(Duration::ZERO);
        table.put(1, SessionState::AwaitFirstName);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(table.take(1), None);
    }

    #[test]
    fn put_replaces_any_active_state() {
        let table = SessionTable::new(Duration::from_secs(60));
        table.put(1, SessionState::AwaitFirstName);
        table.put(
            1,
            SessionState::AwaitLastName {
                first_name: "John".into(),
            },
        );
        assert_eq!(
            table.take(1),
            Some(SessionState::AwaitLastName {
                first_name: "John".into()
            })
        );
    }
}
