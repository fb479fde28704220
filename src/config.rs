use std::env;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v20.0";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub log_path: String,
    pub graph_api_base: String,
    pub send_timeout_secs: u64,
    /// Credentials written into the settings store on first start, when the
    /// stored value is still empty.
    pub bootstrap: BootstrapCredentials,
}

#[derive(Clone, Debug, Default)]
pub struct BootstrapCredentials {
    pub access_token: String,
    pub phone_number_id: String,
    pub verify_token: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "wahub.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            log_path: env::var("LOG_PATH")
                .unwrap_or_else(|_| "data/whatsapp-bot.log".to_string()),
            graph_api_base: env::var("GRAPH_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_GRAPH_API_BASE.to_string()),
            send_timeout_secs: env::var("SEND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            bootstrap: BootstrapCredentials {
                access_token: env::var("WHATSAPP_ACCESS_TOKEN").unwrap_or_default(),
                phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default(),
                verify_token: env::var("WHATSAPP_VERIFY_TOKEN").unwrap_or_default(),
            },
        }
    }
}
