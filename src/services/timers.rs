use std::sync::Arc;

use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::Storage;
use crate::error::BotError;
use crate::models::Timer;
use crate::scheduler::Scheduler;
use crate::transport::{Payload, Transport};

/// Same persist-then-schedule orchestration as reminders, for the simpler
/// always-individual countdown timers.
#[derive(Clone)]
pub struct TimerService {
  storage: Arc<dyn Storage>,
  transport: Arc<dyn Transport>,
  scheduler: Arc<Scheduler>,
}

impl TimerService {
  pub fn new(storage: Arc<dyn Storage>, transport: Arc<dyn Transport>, scheduler: Arc<Scheduler>) -> Self {
    Self { storage, transport, scheduler }
  }

  pub async fn create(&self, user_id: &str, duration_minutes: i64) -> Result<Timer, BotError> {
    let fire_at = DateTime::from_chrono(chrono::Utc::now() + chrono::Duration::minutes(duration_minutes));
    let timer = self.storage.create_timer(Timer::new(user_id, duration_minutes, fire_at)).await?;
    self.watch(&timer);
    Ok(timer)
  }

  pub async fn list(&self, user_id: &str) -> Result<Vec<Timer>, BotError> {
    self.storage.list_user_timers(user_id).await
  }

  pub async fn cancel(&self, id: ObjectId) -> Result<(), BotError> {
    self.scheduler.cancel(&id);
    self.storage.deactivate_timer(id).await
  }

  pub async fn recover(&self) -> Result<usize, BotError> {
    let active = self.storage.active_timers().await?;
    let mut recovered = 0;
    for timer in &active {
      if matches!(timer.id, Some(id) if !self.scheduler.tracked(&id)) {
        self.watch(timer);
        recovered += 1;
      }
    }
    info!("Recovered {} active timer(s)", recovered);
    Ok(recovered)
  }

  fn watch(&self, timer: &Timer) {
    let Some(id) = timer.id else {
      warn!("Timer without an id cannot be scheduled");
      return;
    };
    let service = self.clone();
    self.scheduler.schedule(id, timer.fire_at.to_chrono(), move || async move {
      if let Err(err) = service.fire(id).await {
        error!("Timer {} fire failed: {}", id, err);
      }
    });
  }

  async fn fire(&self, id: ObjectId) -> Result<(), BotError> {
    let Some(timer) = self.storage.get_timer(id).await? else {
      return Ok(());
    };
    if !timer.active {
      return Ok(());
    }

    let text = format!("⏰ Timer completed: {} minutes have passed!", timer.duration_minutes);
    if let Err(err) = self.transport.send(&timer.user_id, Payload::text(text)).await {
      warn!("Couldn't deliver timer {} to {}: {}", id, timer.user_id, err);
    }

    self.storage.deactivate_timer(id).await
  }
}
