use async_trait::async_trait;
use teloxide::{
  payloads::SendMessageSetters,
  requests::Requester,
  types::{ChatId, InputFile},
  Bot,
};

use crate::error::BotError;

/// Outgoing message content. Media is passed through as-is; any conversion
/// happens upstream of this boundary.
#[derive(Clone, Debug, Default)]
pub struct Payload {
  pub text: Option<String>,
  pub media: Option<Vec<u8>>,
  pub mime_type: Option<String>,
}

impl Payload {
  pub fn text<T: Into<String>>(text: T) -> Self {
    Self { text: Some(text.into()), ..Default::default() }
  }
}

/// Narrow seam to the messaging network. A recipient id names either a user
/// or a group chat; fan-out to several recipients is the caller's loop.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, recipient: &str, payload: Payload) -> Result<(), BotError>;
}

pub struct TelegramTransport {
  bot: Bot,
}

impl TelegramTransport {
  pub fn new(bot: Bot) -> Self {
    Self { bot }
  }
}

#[async_trait]
impl Transport for TelegramTransport {
  async fn send(&self, recipient: &str, payload: Payload) -> Result<(), BotError> {
    let chat = recipient
      .parse::<i64>()
      .map(ChatId)
      .map_err(|_| BotError::Transport(format!("Invalid recipient id: {}", recipient)))?;

    if let Some(media) = payload.media {
      self.bot.send_document(chat, InputFile::memory(media)).await?;
    }

    if let Some(text) = payload.text {
      self.bot.send_message(chat, text).disable_web_page_preview(true).await?;
    }

    Ok(())
  }
}
