use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::error::BotError;
use crate::models::{Group, GroupSettingsPatch, MentionPolicyPatch, Note, Reminder, SpotifyToken, Timer, Todo, User};

use super::Storage;

/// In-memory stand-in for `MongoPool`; the whole test suite runs against it.
/// Mutations mirror the single-document atomic updates of the real gateway.
#[derive(Default)]
pub struct MemStorage {
  inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
  users: Vec<User>,
  groups: Vec<Group>,
  todos: Vec<Todo>,
  notes: Vec<Note>,
  reminders: Vec<Reminder>,
  timers: Vec<Timer>,
  spotify_tokens: Vec<SpotifyToken>,
}

impl MemStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
    f(&mut self.inner.lock().unwrap())
  }

  pub fn user(&self, user_id: &str) -> Option<User> {
    self.with(|inner| inner.users.iter().find(|u| u.id == user_id).cloned())
  }

  pub fn group(&self, group_id: &str) -> Option<Group> {
    self.with(|inner| inner.groups.iter().find(|g| g.id == group_id).cloned())
  }

  pub fn spotify_token(&self, user_id: &str) -> Option<SpotifyToken> {
    self.with(|inner| inner.spotify_tokens.iter().find(|t| t.user_id == user_id).cloned())
  }

  fn update_group(&self, group_id: &str, f: impl FnOnce(&mut Group)) {
    self.with(|inner| {
      if let Some(group) = inner.groups.iter_mut().find(|g| g.id == group_id) {
        f(group);
      }
    })
  }
}

#[async_trait]
impl Storage for MemStorage {
  async fn get_or_create_user(&self, user_id: &str) -> Result<User, BotError> {
    Ok(self.with(|inner| match inner.users.iter().find(|u| u.id == user_id) {
      Some(user) => user.clone(),
      None => {
        let user = User::new(user_id);
        inner.users.push(user.clone());
        user
      }
    }))
  }

  async fn touch_user(&self, user_id: &str) -> Result<(), BotError> {
    self.with(|inner| match inner.users.iter_mut().find(|u| u.id == user_id) {
      Some(user) => user.last_active_at = DateTime::now(),
      None => inner.users.push(User::new(user_id)),
    });
    Ok(())
  }

  async fn set_user_notifications(&self, user_id: &str, enabled: bool) -> Result<(), BotError> {
    self.with(|inner| {
      if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
        user.is_notifications_enabled = enabled;
      }
    });
    Ok(())
  }

  async fn set_user_timezone(&self, user_id: &str, timezone: &str) -> Result<(), BotError> {
    self.with(|inner| {
      if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
        user.timezone = Some(timezone.to_string());
      }
    });
    Ok(())
  }

  async fn get_or_create_group(&self, group_id: &str) -> Result<Group, BotError> {
    Ok(self.with(|inner| match inner.groups.iter().find(|g| g.id == group_id) {
      Some(group) => group.clone(),
      None => {
        let group = Group::new(group_id);
        inner.groups.push(group.clone());
        group
      }
    }))
  }

  async fn add_group_admin(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    self.update_group(group_id, |group| {
      if !group.admin_users.iter().any(|u| u == user_id) {
        group.admin_users.push(user_id.to_string());
      }
    });
    Ok(())
  }

  async fn remove_group_admin(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    self.update_group(group_id, |group| group.admin_users.retain(|u| u != user_id));
    Ok(())
  }

  async fn ban_group_user(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    self.update_group(group_id, |group| {
      if !group.banned_users.iter().any(|u| u == user_id) {
        group.banned_users.push(user_id.to_string());
      }
      group.admin_users.retain(|u| u != user_id);
    });
    Ok(())
  }

  async fn unban_group_user(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    self.update_group(group_id, |group| group.banned_users.retain(|u| u != user_id));
    Ok(())
  }

  async fn update_group_settings(&self, group_id: &str, patch: GroupSettingsPatch) -> Result<(), BotError> {
    self.update_group(group_id, |group| {
      if let Some(v) = patch.is_notifications_enabled {
        group.is_notifications_enabled = v;
      }
      if let Some(v) = patch.is_mentions_enabled {
        group.is_mentions_enabled = v;
      }
      if let Some(v) = patch.only_admins_can_change {
        group.only_admins_can_change = v;
      }
    });
    Ok(())
  }

  async fn allow_group_command(&self, group_id: &str, command: &str) -> Result<(), BotError> {
    let command = command.to_lowercase();
    self.update_group(group_id, |group| {
      if !group.allowed_commands.iter().any(|c| *c == command) {
        group.allowed_commands.push(command);
      }
    });
    Ok(())
  }

  async fn deny_group_command(&self, group_id: &str, command: &str) -> Result<(), BotError> {
    let command = command.to_lowercase();
    self.update_group(group_id, |group| group.allowed_commands.retain(|c| *c != command));
    Ok(())
  }

  async fn update_mention_policy(&self, group_id: &str, patch: MentionPolicyPatch) -> Result<(), BotError> {
    self.update_group(group_id, |group| {
      if let Some(v) = patch.everyone {
        group.allow_mention_everyone = v;
      }
      if let Some(v) = patch.roles {
        group.allow_mention_roles = v;
      }
      if let Some(v) = patch.users {
        group.allow_mention_users = v;
      }
    });
    Ok(())
  }

  async fn create_todo(&self, mut todo: Todo) -> Result<Todo, BotError> {
    todo.id = Some(ObjectId::new());
    self.with(|inner| inner.todos.push(todo.clone()));
    Ok(todo)
  }

  async fn list_todos(&self, chat_id: &str, include_completed: bool) -> Result<Vec<Todo>, BotError> {
    Ok(self.with(|inner| {
      let mut todos: Vec<_> = inner
        .todos
        .iter()
        .filter(|t| t.chat_id == chat_id && (include_completed || !t.completed))
        .cloned()
        .collect();
      todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
      todos
    }))
  }

  async fn list_user_todos(&self, user_id: &str, include_completed: bool) -> Result<Vec<Todo>, BotError> {
    Ok(self.with(|inner| {
      let mut todos: Vec<_> = inner
        .todos
        .iter()
        .filter(|t| t.user_id == user_id && (include_completed || !t.completed))
        .cloned()
        .collect();
      todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
      todos
    }))
  }

  async fn complete_todo(&self, chat_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.with(|inner| {
      if let Some(todo) = inner.todos.iter_mut().find(|t| t.id == Some(id) && t.chat_id == chat_id) {
        todo.completed = true;
        todo.completed_at = Some(DateTime::now());
      }
    });
    Ok(())
  }

  async fn delete_todo(&self, chat_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.with(|inner| inner.todos.retain(|t| !(t.id == Some(id) && t.chat_id == chat_id)));
    Ok(())
  }

  async fn clear_completed_todos(&self, chat_id: &str) -> Result<u64, BotError> {
    Ok(self.with(|inner| {
      let before = inner.todos.len();
      inner.todos.retain(|t| !(t.chat_id == chat_id && t.completed));
      (before - inner.todos.len()) as u64
    }))
  }

  async fn create_note(&self, mut note: Note) -> Result<Note, BotError> {
    note.id = Some(ObjectId::new());
    self.with(|inner| inner.notes.push(note.clone()));
    Ok(note)
  }

  async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>, BotError> {
    Ok(self.with(|inner| {
      let mut notes: Vec<_> = inner.notes.iter().filter(|n| n.user_id == user_id).cloned().collect();
      notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
      notes
    }))
  }

  async fn delete_note(&self, user_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.with(|inner| inner.notes.retain(|n| !(n.id == Some(id) && n.user_id == user_id)));
    Ok(())
  }

  async fn search_notes(&self, user_id: &str, query: &str) -> Result<Vec<Note>, BotError> {
    let query = query.to_lowercase();
    Ok(self.with(|inner| {
      inner
        .notes
        .iter()
        .filter(|n| {
          n.user_id == user_id
            && (n.content.to_lowercase().contains(&query) || n.tags.iter().any(|t| t.to_lowercase().contains(&query)))
        })
        .cloned()
        .collect()
    }))
  }

  async fn create_reminder(&self, mut reminder: Reminder) -> Result<Reminder, BotError> {
    reminder.id = Some(ObjectId::new());
    self.with(|inner| inner.reminders.push(reminder.clone()));
    Ok(reminder)
  }

  async fn get_reminder(&self, id: ObjectId) -> Result<Option<Reminder>, BotError> {
    Ok(self.with(|inner| inner.reminders.iter().find(|r| r.id == Some(id)).cloned()))
  }

  async fn pending_reminders(&self) -> Result<Vec<Reminder>, BotError> {
    Ok(self.with(|inner| {
      let mut reminders: Vec<_> = inner.reminders.iter().filter(|r| !r.completed).cloned().collect();
      reminders.sort_by_key(|r| r.fire_at);
      reminders
    }))
  }

  async fn list_user_reminders(&self, user_id: &str) -> Result<Vec<Reminder>, BotError> {
    Ok(self.with(|inner| {
      let mut reminders: Vec<_> = inner
        .reminders
        .iter()
        .filter(|r| r.user_id == user_id && !r.completed)
        .cloned()
        .collect();
      reminders.sort_by_key(|r| r.fire_at);
      reminders
    }))
  }

  async fn complete_reminder(&self, id: ObjectId) -> Result<(), BotError> {
    self.with(|inner| {
      if let Some(reminder) = inner.reminders.iter_mut().find(|r| r.id == Some(id)) {
        reminder.completed = true;
      }
    });
    Ok(())
  }

  async fn delete_reminder(&self, user_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.with(|inner| inner.reminders.retain(|r| !(r.id == Some(id) && r.user_id == user_id)));
    Ok(())
  }

  async fn clear_completed_reminders(&self, user_id: &str) -> Result<u64, BotError> {
    Ok(self.with(|inner| {
      let before = inner.reminders.len();
      inner.reminders.retain(|r| !(r.user_id == user_id && r.completed));
      (before - inner.reminders.len()) as u64
    }))
  }

  async fn create_timer(&self, mut timer: Timer) -> Result<Timer, BotError> {
    timer.id = Some(ObjectId::new());
    self.with(|inner| inner.timers.push(timer.clone()));
    Ok(timer)
  }

  async fn get_timer(&self, id: ObjectId) -> Result<Option<Timer>, BotError> {
    Ok(self.with(|inner| inner.timers.iter().find(|t| t.id == Some(id)).cloned()))
  }

  async fn active_timers(&self) -> Result<Vec<Timer>, BotError> {
    Ok(self.with(|inner| {
      let mut timers: Vec<_> = inner.timers.iter().filter(|t| t.active).cloned().collect();
      timers.sort_by_key(|t| t.fire_at);
      timers
    }))
  }

  async fn list_user_timers(&self, user_id: &str) -> Result<Vec<Timer>, BotError> {
    let now = DateTime::now();
    Ok(self.with(|inner| {
      let mut timers: Vec<_> = inner
        .timers
        .iter()
        .filter(|t| t.user_id == user_id && t.active && t.fire_at > now)
        .cloned()
        .collect();
      timers.sort_by_key(|t| t.fire_at);
      timers
    }))
  }

  async fn deactivate_timer(&self, id: ObjectId) -> Result<(), BotError> {
    self.with(|inner| {
      if let Some(timer) = inner.timers.iter_mut().find(|t| t.id == Some(id)) {
        timer.active = false;
      }
    });
    Ok(())
  }

  async fn save_spotify_token(&self, token: SpotifyToken) -> Result<(), BotError> {
    self.with(|inner| {
      inner.spotify_tokens.retain(|t| t.user_id != token.user_id);
      inner.spotify_tokens.push(token);
    });
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn token(user_id: &str, access_token: &str) -> SpotifyToken {
    SpotifyToken {
      user_id: user_id.into(),
      access_token: access_token.into(),
      refresh_token: "refresh".into(),
      expires_at: DateTime::now(),
    }
  }

  #[tokio::test]
  async fn spotify_token_save_is_an_upsert() {
    let storage = MemStorage::new();
    storage.save_spotify_token(token("u1", "first")).await.unwrap();
    storage.save_spotify_token(token("u1", "second")).await.unwrap();

    assert_eq!(storage.spotify_token("u1").unwrap().access_token, "second");
    assert!(storage.spotify_token("u2").is_none());
  }
}
