pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::menu::CallbackToken;

/// An update received from the platform, reduced to what the menu needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundUpdate {
    Message { chat_id: i64, text: String },
    CallbackQuery { chat_id: i64, data: String },
}

impl InboundUpdate {
    pub fn chat_id(&self) -> i64 {
        match self {
            InboundUpdate::Message { chat_id, .. } | InboundUpdate::CallbackQuery { chat_id, .. } => {
                *chat_id
            }
        }
    }
}

/// One reply the bot wants delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    SendText {
        chat_id: i64,
        text: &'static str,
        keyboard: Option<Keyboard>,
        options: TextOptions,
    },
    SendSticker {
        chat_id: i64,
        sticker_url: &'static str,
    },
}

impl OutboundAction {
    pub fn chat_id(&self) -> i64 {
        match self {
            OutboundAction::SendText { chat_id, .. } | OutboundAction::SendSticker { chat_id, .. } => {
                *chat_id
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Deliver without a notification sound
    pub silent: bool,
    /// Render with MarkdownV2
    pub markdown: bool,
}

/// Inline keyboard attached to a text message, laid out row by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

/// Inline button that echoes its token back as callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub token: CallbackToken,
}

/// Platform message id of a delivered reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage(pub i32);

/// Delivers outbound actions to a chat
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, action: &OutboundAction) -> Result<SentMessage>;
}
