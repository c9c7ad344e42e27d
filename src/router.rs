use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::menu;
use crate::platform::{InboundUpdate, ReplySender};

/// Routes inbound updates through the menu and hands replies to the sender.
/// Stateless; one instance is shared by every concurrent handler.
pub struct Router {
    sender: Arc<dyn ReplySender>,
}

impl Router {
    pub fn new(sender: Arc<dyn ReplySender>) -> Self {
        Self { sender }
    }

    /// Handle one update. A delivery failure is returned, never retried.
    pub async fn route(&self, update: InboundUpdate) -> Result<()> {
        match &update {
            InboundUpdate::Message { chat_id, text } => {
                info!("Received a '{}' message in chat {}.", text, chat_id);
            }
            InboundUpdate::CallbackQuery { chat_id, data } => {
                debug!("Callback '{}' in chat {}", data, chat_id);
            }
        }

        let Some(action) = menu::respond(&update) else {
            return Ok(());
        };

        let sent = self
            .sender
            .send(&action)
            .await
            .with_context(|| format!("Failed to deliver reply to chat {}", update.chat_id()))?;
        debug!("Delivered message {} to chat {}", sent.0, action.chat_id());

        Ok(())
    }
}
