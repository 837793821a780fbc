use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    /// Chat identity receiving HR summaries of submitted/edited applications.
    pub hr_chat_id: i64,
    /// Webhook of the external bot transport used for outbound notifications.
    pub notify_url: String,

    // Rate limiting
    pub rate_chat_per_min: u32,
    pub rate_admin_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            hr_chat_id: env::var("HR_CHAT_ID")
                .expect("HR_CHAT_ID must be set")
                .parse()
                .expect("HR_CHAT_ID must be an integer chat identity"),
            notify_url: env::var("NOTIFY_URL").expect("NOTIFY_URL must be set"),

            rate_chat_per_min: env::var("RATE_CHAT_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
            rate_admin_per_min: env::var("RATE_ADMIN_PER_MIN")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }
}
