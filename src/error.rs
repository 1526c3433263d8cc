use thiserror::Error;

/// Crate-wide error type. Variants that reach the user Display the exact
/// reply text; infrastructure variants are logged at the router boundary and
/// replaced with a generic failure reply.
#[derive(Error, Debug)]
pub enum BotError {
  #[error("Usage: {usage}\nExample: {example}")]
  InvalidCommand { usage: String, example: String },

  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  #[error("❌ You need to be a group admin to do that.")]
  PermissionDenied,

  #[error("Transport: {0}")]
  Transport(String),

  #[error("Database: {0}")]
  Db(#[from] mongodb::error::Error),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),

  #[error("Spotify: {0}")]
  Spotify(String),
}

impl BotError {
  pub fn invalid_command<U: Into<String>, E: Into<String>>(usage: U, example: E) -> Self {
    Self::InvalidCommand { usage: usage.into(), example: example.into() }
  }

  pub fn validation<T: Into<String>>(msg: T) -> Self {
    Self::Validation(msg.into())
  }

  pub fn not_found<T: Into<String>>(msg: T) -> Self {
    Self::NotFound(msg.into())
  }

  /// Errors the user caused and can fix; these are replied verbatim and never
  /// logged as failures.
  pub fn is_user_error(&self) -> bool {
    matches!(
      self,
      Self::InvalidCommand { .. } | Self::Validation(_) | Self::NotFound(_) | Self::PermissionDenied
    )
  }
}

impl From<teloxide::RequestError> for BotError {
  fn from(err: teloxide::RequestError) -> Self {
    Self::Transport(err.to_string())
  }
}

impl From<reqwest::Error> for BotError {
  fn from(err: reqwest::Error) -> Self {
    Self::Spotify(err.to_string())
  }
}
