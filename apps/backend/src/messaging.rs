//! Outbound messaging port.
//!
//! The chat transport itself lives outside this service; the core only needs
//! fire-and-receive-later sends and retraction by handle. Every send
//! eventually yields an opaque [`MessageRef`] that can later be passed to
//! `delete` to retract the message.

use async_trait::async_trait;
use ulid::Ulid;

use crate::error::AppError;

/// Opaque handle to a message accepted by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef(pub String);

impl MessageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send `text` to `target`, optionally with inline buttons. Returns the
    /// transport's handle for the accepted message.
    async fn send(
        &self,
        target: &str,
        text: &str,
        buttons: Option<Vec<String>>,
    ) -> Result<MessageRef, AppError>;

    /// Retract a previously sent message by handle.
    async fn delete(&self, message: &MessageRef) -> Result<(), AppError>;
}

/// Default transport used when no chat adapter is wired: logs every send and
/// fabricates handles. Keeps the core runnable in isolation.
pub struct LoggingMessenger;

#[async_trait]
impl Messenger for LoggingMessenger {
    async fn send(
        &self,
        target: &str,
        text: &str,
        buttons: Option<Vec<String>>,
    ) -> Result<MessageRef, AppError> {
        let reference = MessageRef(format!("log:{}", Ulid::new()));
        tracing::info!(
            target_chat = target,
            reference = %reference.0,
            buttons = buttons.as_ref().map(|b| b.len()).unwrap_or(0),
            "outbound message: {text}"
        );
        Ok(reference)
    }

    async fn delete(&self, message: &MessageRef) -> Result<(), AppError> {
        tracing::info!(reference = %message.0, "retract message");
        Ok(())
    }
}
