use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Commands every freshly-created group accepts. `group` and `settings` are
/// included so a new group is never locked out of its own management command.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &["help", "notify", "todo", "note", "timer", "group", "settings"];

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
  pub id: String,
  pub last_active_at: DateTime,
  pub is_notifications_enabled: bool,
  pub timezone: Option<String>,
}

impl User {
  pub fn new<T: Into<String>>(id: T) -> Self {
    Self { id: id.into(), last_active_at: DateTime::now(), is_notifications_enabled: true, timezone: None }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Group {
  pub id: String,
  pub allowed_commands: Vec<String>,
  pub is_notifications_enabled: bool,
  pub is_mentions_enabled: bool,
  pub only_admins_can_change: bool,
  pub admin_users: Vec<String>,
  pub banned_users: Vec<String>,
  pub allow_mention_everyone: bool,
  pub allow_mention_roles: bool,
  pub allow_mention_users: bool,
}

impl Group {
  pub fn new<T: Into<String>>(id: T) -> Self {
    Self {
      id: id.into(),
      allowed_commands: DEFAULT_ALLOWED_COMMANDS.iter().map(|c| c.to_string()).collect(),
      is_notifications_enabled: true,
      is_mentions_enabled: true,
      only_admins_can_change: true,
      admin_users: vec![],
      banned_users: vec![],
      allow_mention_everyone: true,
      allow_mention_roles: true,
      allow_mention_users: true,
    }
  }
}

/// Partial update for group settings a non-admin may change when
/// `only_admins_can_change` is off.
#[derive(Clone, Debug, Default)]
pub struct GroupSettingsPatch {
  pub is_notifications_enabled: Option<bool>,
  pub is_mentions_enabled: Option<bool>,
  pub only_admins_can_change: Option<bool>,
}

/// Partial update for the mention policy; admin-only regardless of
/// `only_admins_can_change`.
#[derive(Clone, Debug, Default)]
pub struct MentionPolicyPatch {
  pub everyone: Option<bool>,
  pub roles: Option<bool>,
  pub users: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Todo {
  #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
  pub id: Option<ObjectId>,
  pub user_id: String,
  pub chat_id: String,
  pub task: String,
  pub completed: bool,
  pub completed_at: Option<DateTime>,
  pub created_at: DateTime,
}

impl Todo {
  pub fn new<U: Into<String>, C: Into<String>, T: Into<String>>(user_id: U, chat_id: C, task: T) -> Self {
    Self {
      id: None,
      user_id: user_id.into(),
      chat_id: chat_id.into(),
      task: task.into(),
      completed: false,
      completed_at: None,
      created_at: DateTime::now(),
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Note {
  #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
  pub id: Option<ObjectId>,
  pub user_id: String,
  pub content: String,
  pub tags: Vec<String>,
  pub created_at: DateTime,
}

impl Note {
  pub fn new<U: Into<String>, C: Into<String>>(user_id: U, content: C, tags: Vec<String>) -> Self {
    Self { id: None, user_id: user_id.into(), content: content.into(), tags, created_at: DateTime::now() }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Reminder {
  #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
  pub id: Option<ObjectId>,
  pub user_id: String,
  pub task: String,
  pub fire_at: DateTime,
  pub notify_users: Vec<String>,
  pub group_id: Option<String>,
  pub completed: bool,
}

impl Reminder {
  pub fn new<U: Into<String>, T: Into<String>>(
    user_id: U,
    task: T,
    fire_at: DateTime,
    notify_users: Vec<String>,
    group_id: Option<String>,
  ) -> Self {
    Self { id: None, user_id: user_id.into(), task: task.into(), fire_at, notify_users, group_id, completed: false }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Timer {
  #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
  pub id: Option<ObjectId>,
  pub user_id: String,
  pub duration_minutes: i64,
  pub fire_at: DateTime,
  pub active: bool,
}

impl Timer {
  pub fn new<U: Into<String>>(user_id: U, duration_minutes: i64, fire_at: DateTime) -> Self {
    Self { id: None, user_id: user_id.into(), duration_minutes, fire_at, active: true }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpotifyToken {
  pub user_id: String,
  pub access_token: String,
  pub refresh_token: String,
  pub expires_at: DateTime,
}
