use std::sync::Arc;

use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::Storage;
use crate::error::BotError;
use crate::models::Reminder;
use crate::scheduler::Scheduler;
use crate::transport::{Payload, Transport};

/// Orchestration over storage + scheduler for one-shot reminders. Rows are
/// persisted before they are scheduled: a lost in-process handle is
/// recoverable at the next `recover()`, a lost row is not.
#[derive(Clone)]
pub struct ReminderService {
  storage: Arc<dyn Storage>,
  transport: Arc<dyn Transport>,
  scheduler: Arc<Scheduler>,
}

impl ReminderService {
  pub fn new(storage: Arc<dyn Storage>, transport: Arc<dyn Transport>, scheduler: Arc<Scheduler>) -> Self {
    Self { storage, transport, scheduler }
  }

  pub async fn create(
    &self,
    user_id: &str,
    task: &str,
    fire_at: DateTime,
    notify_users: Vec<String>,
    group_id: Option<String>,
  ) -> Result<Reminder, BotError> {
    let reminder = self
      .storage
      .create_reminder(Reminder::new(user_id, task, fire_at, notify_users, group_id))
      .await?;
    self.watch(&reminder);
    Ok(reminder)
  }

  pub async fn list(&self, user_id: &str) -> Result<Vec<Reminder>, BotError> {
    self.storage.list_user_reminders(user_id).await
  }

  /// Cancel before delete, so a fire cannot race against the removal.
  pub async fn delete(&self, user_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.scheduler.cancel(&id);
    self.storage.delete_reminder(user_id, id).await
  }

  pub async fn clear_completed(&self, user_id: &str) -> Result<u64, BotError> {
    self.storage.clear_completed_reminders(user_id).await
  }

  /// Re-establishes in-process jobs for every pending row. Overdue rows go
  /// through the scheduler's catch-up path and fire promptly. Rows already
  /// tracked in-process are left alone.
  pub async fn recover(&self) -> Result<usize, BotError> {
    let pending = self.storage.pending_reminders().await?;
    let mut recovered = 0;
    for reminder in &pending {
      if matches!(reminder.id, Some(id) if !self.scheduler.tracked(&id)) {
        self.watch(reminder);
        recovered += 1;
      }
    }
    info!("Recovered {} pending reminder(s)", recovered);
    Ok(recovered)
  }

  fn watch(&self, reminder: &Reminder) {
    let Some(id) = reminder.id else {
      warn!("Reminder without an id cannot be scheduled");
      return;
    };
    let service = self.clone();
    self
      .scheduler
      .schedule(id, reminder.fire_at.to_chrono(), move || async move {
        if let Err(err) = service.fire(id).await {
          error!("Reminder {} fire failed: {}", id, err);
        }
      });
  }

  /// Fire callback. The row's terminal flag is re-checked first so a cancel
  /// that won the race turns this into a no-op, and it is set even when the
  /// send fails: delivery is at-most-once, never retried.
  async fn fire(&self, id: ObjectId) -> Result<(), BotError> {
    let Some(reminder) = self.storage.get_reminder(id).await? else {
      return Ok(());
    };
    if reminder.completed {
      return Ok(());
    }

    let text = format!("🔔 Reminder: {}", reminder.task);
    for recipient in self.recipients(&reminder).await? {
      if let Err(err) = self.transport.send(&recipient, Payload::text(&text)).await {
        warn!("Couldn't deliver reminder {} to {}: {}", id, recipient, err);
      }
    }

    self.storage.complete_reminder(id).await
  }

  /// `group_id` present means the group chat is the single fan-out target
  /// (honoring its notifications switch); otherwise the owner plus the
  /// explicit notify-list.
  async fn recipients(&self, reminder: &Reminder) -> Result<Vec<String>, BotError> {
    if let Some(group_id) = &reminder.group_id {
      let group = self.storage.get_or_create_group(group_id).await?;
      if !group.is_notifications_enabled {
        info!("Group {} has notifications disabled, dropping reminder delivery", group_id);
        return Ok(vec![]);
      }
      return Ok(vec![group_id.clone()]);
    }

    let mut recipients = vec![reminder.user_id.clone()];
    for user in &reminder.notify_users {
      if !recipients.contains(user) {
        recipients.push(user.clone());
      }
    }
    Ok(recipients)
  }
}
