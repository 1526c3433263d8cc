use std::sync::Arc;

use teloxide::Bot;

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

mod bot;
mod db;
mod env;
mod error;
mod models;
mod permissions;
mod scheduler;
mod services;
mod spotify;
mod timeparse;
mod transport;

use bot::{App, BotConfig};
use db::MongoPool;
use scheduler::Scheduler;
use transport::TelegramTransport;

#[tokio::main]
async fn main() {
  init();

  let storage: Arc<dyn db::Storage> = Arc::new(MongoPool::init().await.expect("Couldn't connect to database"));
  let telegram = Bot::from_env();
  let transport: Arc<dyn transport::Transport> = Arc::new(TelegramTransport::new(telegram.clone()));
  let scheduler = Scheduler::new();

  let auth = spotify::SpotifyAuth::from_env(storage.clone(), transport.clone());
  let app = App::new(storage, transport, scheduler, auth.clone(), BotConfig::from_env());

  // Persisted reminders and timers are rescheduled before the first inbound
  // message can create new ones.
  app.recover().await.expect("Couldn't recover scheduled notifications");

  if let Some(auth) = auth {
    let port = env::parse_var(env::CALLBACK_PORT).unwrap_or(3000);
    tokio::spawn(async move {
      if let Err(err) = spotify::serve(auth, port).await {
        error!("OAuth callback server failed: {}", err);
      }
    });
  }

  bot::start(telegram, app).await
}

fn init() {
  dotenvy::dotenv().expect("Unable to init .env");
  pretty_env_logger::init();
  env::check_env_vars();
}
