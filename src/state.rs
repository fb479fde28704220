use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::log_sink::LogSink;
use crate::services::messaging::MessagingProvider;
use crate::services::settings::SettingsStore;

pub struct AppState {
    pub config: AppConfig,
    pub settings: Arc<dyn SettingsStore>,
    pub log: Arc<dyn LogSink>,
    pub messaging: Box<dyn MessagingProvider>,
}
