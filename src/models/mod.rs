pub mod credentials;
pub mod inbound;
pub mod log_entry;

pub use credentials::{Credentials, SettingsUpdate};
pub use inbound::InboundEvent;
pub use log_entry::{LogContext, LogEntry};
