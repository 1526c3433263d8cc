use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::BotError;
use crate::models::{Group, GroupSettingsPatch, MentionPolicyPatch, Note, Reminder, SpotifyToken, Timer, Todo, User};

mod mongo;

#[cfg(test)]
pub mod memory;

pub use mongo::MongoPool;

/// Canonical persistence gateway. Handlers and services depend on this trait
/// only; storage-technology specifics (query idioms, field encodings) stay in
/// the implementations. Group mutations are single-document atomic updates so
/// concurrent admin actions cannot lose writes.
#[async_trait]
pub trait Storage: Send + Sync {
  // users
  async fn get_or_create_user(&self, user_id: &str) -> Result<User, BotError>;
  async fn touch_user(&self, user_id: &str) -> Result<(), BotError>;
  async fn set_user_notifications(&self, user_id: &str, enabled: bool) -> Result<(), BotError>;
  async fn set_user_timezone(&self, user_id: &str, timezone: &str) -> Result<(), BotError>;

  // groups
  async fn get_or_create_group(&self, group_id: &str) -> Result<Group, BotError>;
  async fn add_group_admin(&self, group_id: &str, user_id: &str) -> Result<(), BotError>;
  async fn remove_group_admin(&self, group_id: &str, user_id: &str) -> Result<(), BotError>;
  /// Banning also revokes admin status, atomically.
  async fn ban_group_user(&self, group_id: &str, user_id: &str) -> Result<(), BotError>;
  async fn unban_group_user(&self, group_id: &str, user_id: &str) -> Result<(), BotError>;
  async fn update_group_settings(&self, group_id: &str, patch: GroupSettingsPatch) -> Result<(), BotError>;
  async fn allow_group_command(&self, group_id: &str, command: &str) -> Result<(), BotError>;
  async fn deny_group_command(&self, group_id: &str, command: &str) -> Result<(), BotError>;
  async fn update_mention_policy(&self, group_id: &str, patch: MentionPolicyPatch) -> Result<(), BotError>;

  // todos
  async fn create_todo(&self, todo: Todo) -> Result<Todo, BotError>;
  async fn list_todos(&self, chat_id: &str, include_completed: bool) -> Result<Vec<Todo>, BotError>;
  async fn list_user_todos(&self, user_id: &str, include_completed: bool) -> Result<Vec<Todo>, BotError>;
  async fn complete_todo(&self, chat_id: &str, id: ObjectId) -> Result<(), BotError>;
  async fn delete_todo(&self, chat_id: &str, id: ObjectId) -> Result<(), BotError>;
  async fn clear_completed_todos(&self, chat_id: &str) -> Result<u64, BotError>;

  // notes
  async fn create_note(&self, note: Note) -> Result<Note, BotError>;
  async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>, BotError>;
  async fn delete_note(&self, user_id: &str, id: ObjectId) -> Result<(), BotError>;
  async fn search_notes(&self, user_id: &str, query: &str) -> Result<Vec<Note>, BotError>;

  // reminders
  async fn create_reminder(&self, reminder: Reminder) -> Result<Reminder, BotError>;
  async fn get_reminder(&self, id: ObjectId) -> Result<Option<Reminder>, BotError>;
  /// Every not-yet-completed reminder, overdue ones included; recovery feeds
  /// these straight back into the scheduler.
  async fn pending_reminders(&self) -> Result<Vec<Reminder>, BotError>;
  async fn list_user_reminders(&self, user_id: &str) -> Result<Vec<Reminder>, BotError>;
  async fn complete_reminder(&self, id: ObjectId) -> Result<(), BotError>;
  async fn delete_reminder(&self, user_id: &str, id: ObjectId) -> Result<(), BotError>;
  async fn clear_completed_reminders(&self, user_id: &str) -> Result<u64, BotError>;

  // timers
  async fn create_timer(&self, timer: Timer) -> Result<Timer, BotError>;
  async fn get_timer(&self, id: ObjectId) -> Result<Option<Timer>, BotError>;
  async fn active_timers(&self) -> Result<Vec<Timer>, BotError>;
  async fn list_user_timers(&self, user_id: &str) -> Result<Vec<Timer>, BotError>;
  async fn deactivate_timer(&self, id: ObjectId) -> Result<(), BotError>;

  // third-party tokens
  async fn save_spotify_token(&self, token: SpotifyToken) -> Result<(), BotError>;
}
