use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use teloxide::error_handlers::ErrorHandler;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use teloxide::update_listeners::Polling;
use teloxide::RequestError;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::console;
use crate::platform::{
    InboundUpdate, Keyboard, OutboundAction, ReplySender, SentMessage, TextOptions,
};
use crate::router::Router;

/// Delivers replies through the Bot API
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| InlineKeyboardButton::callback(button.label, button.token.as_str()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

fn text_request(
    bot: &Bot,
    chat_id: i64,
    text: &'static str,
    keyboard: Option<&Keyboard>,
    options: TextOptions,
) -> <Bot as Requester>::SendMessage {
    let mut request = bot.send_message(ChatId(chat_id), text);
    if options.silent {
        request = request.disable_notification(true);
    }
    if options.markdown {
        request = request.parse_mode(ParseMode::MarkdownV2);
    }
    if let Some(keyboard) = keyboard {
        request = request.reply_markup(inline_keyboard(keyboard));
    }
    request
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send(&self, action: &OutboundAction) -> Result<SentMessage> {
        let message = match action {
            OutboundAction::SendText {
                chat_id,
                text,
                keyboard,
                options,
            } => {
                text_request(&self.bot, *chat_id, *text, keyboard.as_ref(), *options).await?
            }
            OutboundAction::SendSticker {
                chat_id,
                sticker_url,
            } => {
                let url = sticker_url
                    .parse()
                    .with_context(|| format!("Invalid sticker URL: {}", sticker_url))?;
                self.bot
                    .send_sticker(ChatId(*chat_id), InputFile::url(url))
                    .await?
            }
        };

        Ok(SentMessage(message.id.0))
    }
}

/// Polling failure, split into errors reported by Telegram and everything else
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollingError {
    Api { code: Option<u16>, message: String },
    Transport(String),
}

impl PollingError {
    pub fn classify(err: &RequestError) -> Self {
        match err {
            RequestError::Api(_) => PollingError::Api {
                code: None,
                message: err.to_string(),
            },
            RequestError::RetryAfter(_) => PollingError::Api {
                code: Some(429),
                message: err.to_string(),
            },
            RequestError::MigrateToChatId(_) => PollingError::Api {
                code: Some(400),
                message: err.to_string(),
            },
            _ => PollingError::Transport(err.to_string()),
        }
    }
}

impl fmt::Display for PollingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollingError::Api {
                code: Some(code),
                message,
            } => write!(f, "Telegram API Error:\n[{}]\n{}", code, message),
            PollingError::Api {
                code: None,
                message,
            } => write!(f, "Telegram API Error:\n{}", message),
            PollingError::Transport(message) => write!(f, "Polling transport error: {}", message),
        }
    }
}

/// Logs polling failures; the listener keeps polling afterwards
pub struct PollingErrorHandler;

impl ErrorHandler<RequestError> for PollingErrorHandler {
    fn handle_error(self: Arc<Self>, error: RequestError) -> BoxFuture<'static, ()> {
        error!("{}", PollingError::classify(&error));
        Box::pin(async {})
    }
}

async fn handle_message(msg: Message, router: Arc<Router>) -> Result<()> {
    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message in chat {}", msg.chat.id.0);
        return Ok(());
    };

    router
        .route(InboundUpdate::Message {
            chat_id: msg.chat.id.0,
            text: text.to_string(),
        })
        .await
}

async fn handle_callback(bot: Bot, q: CallbackQuery, router: Arc<Router>) -> Result<()> {
    let update = match (q.data.as_deref(), q.message.as_ref()) {
        (Some(data), Some(message)) => Some(InboundUpdate::CallbackQuery {
            chat_id: message.chat().id.0,
            data: data.to_string(),
        }),
        _ => None,
    };

    let routed = match update {
        Some(update) => router.route(update).await,
        None => {
            debug!("Ignoring callback query without data or message");
            Ok(())
        }
    };

    // Clears the loading indicator on the pressed button
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!("Failed to answer callback query: {}", e);
    }

    routed
}

fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

/// Run the bot until the operator stops it
pub async fn run(bot: Bot, router: Arc<Router>, config: &Config) -> Result<()> {
    let me = bot
        .get_me()
        .await
        .context("Failed to fetch bot identity, is the token valid?")?;
    info!(
        "Start listening for @{}",
        me.user.username.as_deref().unwrap_or("unknown")
    );
    info!("Type \"stop\" to stop the bot");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![router])
        // Updates are not serialized per chat
        .distribution_function(|_| None::<Infallible>)
        .default_handler(|upd| async move {
            debug!("Ignoring update {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Failed to handle update",
        ))
        .build();

    let shutdown = dispatcher.shutdown_token();
    tokio::spawn(console::watch_stdin(
        shutdown.clone(),
        config.shutdown_grace(),
    ));
    tokio::spawn(console::watch_ctrl_c(shutdown, config.shutdown_grace()));

    let mut polling = Polling::builder(bot);
    if config.drop_pending_updates {
        polling = polling.drop_pending_updates();
    }

    dispatcher
        .dispatch_with_listener(polling.build(), Arc::new(PollingErrorHandler))
        .await;

    info!("Bot stopped");
    Ok(())
}
