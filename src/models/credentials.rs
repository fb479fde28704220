use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub phone_number_id: String,
    pub verify_token: String,
}

impl Credentials {
    /// A send needs both the bearer token and the sending phone-number id.
    pub fn can_send(&self) -> bool {
        !self.access_token.is_empty() && !self.phone_number_id.is_empty()
    }
}

/// Partial settings update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub verify_token: Option<String>,
    pub widget_send_enabled: Option<bool>,
}
