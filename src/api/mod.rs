pub mod applications;
pub mod chat;
pub mod logs;
pub mod reports;
pub mod users;
