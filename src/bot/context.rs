use std::sync::Arc;

use crate::error::BotError;
use crate::transport::Payload;

use super::App;

/// Per-command context bundle handed to handlers: where to reply, who asked,
/// and the already-split positional arguments.
pub struct Context {
  pub app: Arc<App>,
  pub chat_id: String,
  pub sender_id: String,
  pub group_id: Option<String>,
  pub is_group: bool,
  pub args: Vec<String>,
}

impl Context {
  pub fn new(
    app: Arc<App>,
    chat_id: String,
    sender_id: String,
    group_id: Option<String>,
    is_group: bool,
    args: Vec<String>,
  ) -> Self {
    Self { app, chat_id, sender_id, group_id, is_group, args }
  }

  pub async fn reply<T: Into<String>>(&self, text: T) -> Result<(), BotError> {
    self.app.transport.send(&self.chat_id, Payload::text(text)).await
  }

  pub fn arg(&self, index: usize) -> Option<&str> {
    self.args.get(index).map(String::as_str)
  }

  /// The literal remainder of the line starting at `from`; commands with a
  /// free-text argument (note content, task text) use this.
  pub fn rest(&self, from: usize) -> String {
    self.args.get(from..).unwrap_or_default().join(" ")
  }
}
