use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Credentials, SettingsUpdate};

/// Every option name is stored under this prefix.
pub const OPTION_PREFIX: &str = "wahub_";

pub const ACCESS_TOKEN: &str = "access_token";
pub const PHONE_NUMBER_ID: &str = "phone_number_id";
pub const VERIFY_TOKEN: &str = "verify_token";
pub const WIDGET_SEND_ENABLED: &str = "widget_send_enabled";

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str, default: &str) -> String;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Read fresh on every call; credentials can change between requests.
    fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.get(ACCESS_TOKEN, ""),
            phone_number_id: self.get(PHONE_NUMBER_ID, ""),
            verify_token: self.get(VERIFY_TOKEN, ""),
        }
    }

    fn widget_send_enabled(&self) -> bool {
        !matches!(
            self.get(WIDGET_SEND_ENABLED, "1").trim(),
            "0" | "false"
        )
    }

    fn apply(&self, update: &SettingsUpdate) -> Result<(), AppError> {
        if let Some(token) = &update.access_token {
            self.set(ACCESS_TOKEN, token.trim())?;
        }
        if let Some(phone_id) = &update.phone_number_id {
            self.set(PHONE_NUMBER_ID, phone_id.trim())?;
        }
        if let Some(verify) = &update.verify_token {
            self.set(VERIFY_TOKEN, verify.trim())?;
        }
        if let Some(enabled) = update.widget_send_enabled {
            self.set(WIDGET_SEND_ENABLED, if enabled { "1" } else { "0" })?;
        }
        Ok(())
    }

    /// Write `value` only when nothing is stored yet. Used for credentials
    /// supplied through the environment at startup.
    fn seed(&self, key: &str, value: &str) -> Result<bool, AppError> {
        if value.is_empty() || !self.get(key, "").is_empty() {
            return Ok(false);
        }
        self.set(key, value)?;
        Ok(true)
    }
}

pub struct SqliteSettings {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSettings {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

impl SettingsStore for SqliteSettings {
    fn get(&self, key: &str, default: &str) -> String {
        let name = format!("{OPTION_PREFIX}{key}");
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        match queries::get_option(&db, &name) {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(e) => {
                tracing::error!(error = %e, option = %name, "failed to read option");
                default.to_string()
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let name = format!("{OPTION_PREFIX}{key}");
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        queries::set_option(&db, &name, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn store() -> SqliteSettings {
        let conn = db::init_db(":memory:").unwrap();
        SqliteSettings::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_get_falls_back_to_default() {
        let store = store();
        assert_eq!(store.get(ACCESS_TOKEN, ""), "");
        assert_eq!(store.get(WIDGET_SEND_ENABLED, "1"), "1");
    }

    #[test]
    fn test_set_then_get_is_prefixed() {
        let store = store();
        store.set(VERIFY_TOKEN, "s3cret").unwrap();
        assert_eq!(store.get(VERIFY_TOKEN, ""), "s3cret");

        let db = store.db.lock().unwrap();
        let raw = queries::get_option(&db, "wahub_verify_token").unwrap();
        assert_eq!(raw.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_widget_flag_defaults_to_enabled() {
        let store = store();
        assert!(store.widget_send_enabled());
        store.set(WIDGET_SEND_ENABLED, "0").unwrap();
        assert!(!store.widget_send_enabled());
    }

    #[test]
    fn test_apply_is_partial() {
        let store = store();
        store.set(ACCESS_TOKEN, "EAAG-old").unwrap();
        store.set(PHONE_NUMBER_ID, "1098").unwrap();

        store
            .apply(&SettingsUpdate {
                access_token: Some("  EAAG-new  ".to_string()),
                widget_send_enabled: Some(false),
                ..Default::default()
            })
            .unwrap();

        let creds = store.credentials();
        assert_eq!(creds.access_token, "EAAG-new");
        assert_eq!(creds.phone_number_id, "1098");
        assert_eq!(creds.verify_token, "");
        assert!(!store.widget_send_enabled());
    }

    #[test]
    fn test_seed_keeps_existing_value() {
        let store = store();
        assert!(store.seed(VERIFY_TOKEN, "from-env").unwrap());
        assert!(!store.seed(VERIFY_TOKEN, "other").unwrap());
        assert!(!store.seed(ACCESS_TOKEN, "").unwrap());
        assert_eq!(store.get(VERIFY_TOKEN, ""), "from-env");
    }
}
