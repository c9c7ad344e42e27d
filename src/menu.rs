//! Static menu: maps a message or a button press to at most one reply.

use crate::platform::{Button, InboundUpdate, Keyboard, OutboundAction, TextOptions};

pub const START_COMMAND: &str = "/start";

pub const GREETING: &str = "Привет! Что надо?";
pub const ADDRESS_TEXT: &str = "Купить по адресу: ул Где то там";
pub const PAYMENT_TEXT: &str = "Наличкой конечно, что за вопрос?";
pub const FAREWELL_STICKER_URL: &str =
    "https://chpic.su/_data/stickers/o/OkeyStickersss/OkeyStickersss_011.webp";

/// Callback data carried by the menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackToken {
    Where,
    Buy,
    Disconnect,
    Unknown,
}

impl CallbackToken {
    pub fn parse(data: &str) -> Self {
        match data {
            "where" => CallbackToken::Where,
            "buy" => CallbackToken::Buy,
            "disconnect" => CallbackToken::Disconnect,
            _ => CallbackToken::Unknown,
        }
    }

    /// Wire value sent as the button's callback data. `Unknown` maps to a
    /// value that parses back to `Unknown`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackToken::Where => "where",
            CallbackToken::Buy => "buy",
            CallbackToken::Disconnect => "disconnect",
            CallbackToken::Unknown => "unknown",
        }
    }
}

/// The keyboard shown under the greeting
pub fn main_menu() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![
                Button {
                    label: "Где купить?",
                    token: CallbackToken::Where,
                },
                Button {
                    label: "Как купить?",
                    token: CallbackToken::Buy,
                },
            ],
            vec![Button {
                label: "Ничего не надо.",
                token: CallbackToken::Disconnect,
            }],
        ],
    }
}

/// Reply for an inbound update, if any
pub fn respond(update: &InboundUpdate) -> Option<OutboundAction> {
    match update {
        InboundUpdate::Message { chat_id, text } => respond_to_message(*chat_id, text),
        InboundUpdate::CallbackQuery { chat_id, data } => respond_to_callback(*chat_id, data),
    }
}

/// Only `/start` gets an answer; the bot does not echo.
pub fn respond_to_message(chat_id: i64, text: &str) -> Option<OutboundAction> {
    if text != START_COMMAND {
        return None;
    }

    Some(OutboundAction::SendText {
        chat_id,
        text: GREETING,
        keyboard: Some(main_menu()),
        options: TextOptions::default(),
    })
}

pub fn respond_to_callback(chat_id: i64, data: &str) -> Option<OutboundAction> {
    let quiet_markdown = TextOptions {
        silent: true,
        markdown: true,
    };

    match CallbackToken::parse(data) {
        CallbackToken::Where => Some(OutboundAction::SendText {
            chat_id,
            text: ADDRESS_TEXT,
            keyboard: None,
            options: quiet_markdown,
        }),
        CallbackToken::Buy => Some(OutboundAction::SendText {
            chat_id,
            text: PAYMENT_TEXT,
            keyboard: None,
            options: quiet_markdown,
        }),
        CallbackToken::Disconnect => Some(OutboundAction::SendSticker {
            chat_id,
            sticker_url: FAREWELL_STICKER_URL,
        }),
        CallbackToken::Unknown => None,
    }
}
