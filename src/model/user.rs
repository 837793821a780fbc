use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An employee known to the bot. The primary key is the chat identity the
/// transport hands us, so registration never assigns ids of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "user_id": 420100100,
        "first_name": "John",
        "last_name": "Doe",
        "position": "Engineer",
        "department": "Engineering",
        "email": "john.doe@company.com"
    })
)]
pub struct User {
    #[schema(example = 420100100)]
    pub user_id: i64,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "Engineer", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "john.doe@company.com")]
    pub email: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
