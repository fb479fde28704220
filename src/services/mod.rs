pub mod log_sink;
pub mod messaging;
pub mod settings;
