pub mod whatsapp;

use async_trait::async_trait;

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Send a text message. Never errors: every failure is logged and
    /// reported as `false`.
    async fn send_message(&self, to: &str, body: &str) -> bool;
}
