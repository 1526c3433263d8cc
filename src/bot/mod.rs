use std::sync::Arc;

use teloxide::{
  dispatching::UpdateFilterExt,
  dptree as dp,
  prelude::Dispatcher,
  requests::Requester,
  types::{Message, Update},
  Bot,
};

use crate::db::Storage;
use crate::env;
use crate::error::BotError;
use crate::scheduler::Scheduler;
use crate::services::{ReminderService, TimerService};
use crate::spotify::SpotifyAuth;
use crate::transport::Transport;

pub mod commands;
pub mod context;
pub mod router;

pub type BotResult = Result<(), BotError>;

#[derive(Clone, Debug)]
pub struct BotConfig {
  pub prefix: String,
  /// Unknown commands either get a short reply or are ignored; both
  /// behaviors exist in the wild, so it is a flag rather than a guess.
  pub reply_unknown_commands: bool,
  /// Same choice for group permission denials (banned user, disallowed
  /// command).
  pub reply_permission_denials: bool,
}

impl Default for BotConfig {
  fn default() -> Self {
    Self { prefix: "!".into(), reply_unknown_commands: true, reply_permission_denials: true }
  }
}

impl BotConfig {
  pub fn from_env() -> Self {
    let default = Self::default();
    Self {
      prefix: env::var(env::COMMAND_PREFIX).unwrap_or(default.prefix),
      reply_unknown_commands: env::parse_var(env::REPLY_UNKNOWN_COMMANDS).unwrap_or(default.reply_unknown_commands),
      reply_permission_denials: env::parse_var(env::REPLY_PERMISSION_DENIALS).unwrap_or(default.reply_permission_denials),
    }
  }
}

/// Everything a command handler can reach. One instance per process,
/// explicitly constructed and injected; no ambient singletons.
pub struct App {
  pub storage: Arc<dyn Storage>,
  pub transport: Arc<dyn Transport>,
  pub scheduler: Arc<Scheduler>,
  pub reminders: ReminderService,
  pub timers: TimerService,
  pub spotify: Option<Arc<SpotifyAuth>>,
  pub config: BotConfig,
}

impl App {
  pub fn new(
    storage: Arc<dyn Storage>,
    transport: Arc<dyn Transport>,
    scheduler: Arc<Scheduler>,
    spotify: Option<Arc<SpotifyAuth>>,
    config: BotConfig,
  ) -> Arc<Self> {
    let reminders = ReminderService::new(storage.clone(), transport.clone(), scheduler.clone());
    let timers = TimerService::new(storage.clone(), transport.clone(), scheduler.clone());
    Arc::new(Self { storage, transport, scheduler, reminders, timers, spotify, config })
  }

  /// Runs once before the transport starts delivering messages, so a freshly
  /// created reminder can never race the recovery scan.
  pub async fn recover(&self) -> Result<(), BotError> {
    self.reminders.recover().await?;
    self.timers.recover().await?;
    Ok(())
  }

  pub fn shutdown(&self) {
    self.scheduler.shutdown();
  }
}

pub async fn start(bot: Bot, app: Arc<App>) {
  let me = bot.get_me().await.expect("Login error");
  info!("Logged in as {} [@{}]", me.full_name(), me.username());
  info!("Started");

  let handler = Update::filter_message().endpoint(on_message);

  Dispatcher::builder(bot, handler)
    .dependencies(dp::deps![app.clone()])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

  // Pending jobs die with the process anyway; aborting them here makes the
  // exit orderly. Recovery re-establishes them from storage at next boot.
  app.shutdown();
}

async fn on_message(msg: Message, app: Arc<App>) -> BotResult {
  let Some(text) = msg.text() else { return Ok(()) };
  let Some(sender) = msg.from().map(|user| user.id.0.to_string()) else { return Ok(()) };
  let chat = msg.chat.id.0.to_string();
  let is_group = msg.chat.is_group() || msg.chat.is_supergroup();
  router::dispatch(&app, chat, sender, is_group, text).await
}
