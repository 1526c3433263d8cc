use async_trait::async_trait;
use mongodb::{
  bson::{doc, oid::ObjectId, Bson, DateTime, Document},
  options::{ClientOptions, FindOptions, UpdateOptions},
  Collection, Cursor,
};

use crate::env;
use crate::error::BotError;
use crate::models::{Group, GroupSettingsPatch, MentionPolicyPatch, Note, Reminder, SpotifyToken, Timer, Todo, User};

use super::Storage;

pub type Mongo = mongodb::Client;

#[derive(Clone)]
pub struct MongoPool {
  users: Collection<User>,
  groups: Collection<Group>,
  todos: Collection<Todo>,
  notes: Collection<Note>,
  reminders: Collection<Reminder>,
  timers: Collection<Timer>,
  spotify_tokens: Collection<SpotifyToken>,
}

impl MongoPool {
  pub async fn init() -> Result<Self, BotError> {
    let url = env::var(env::DB_URL).unwrap_or_default();
    info!("Connecting to database");
    let mut opts = ClientOptions::parse(url).await?;
    opts.app_name = Some("memo-bot".into());
    opts.default_database = env::var(env::DEFAULT_DB);
    let mongo = Mongo::with_options(opts)?;
    let db = mongo
      .default_database()
      .ok_or_else(|| BotError::validation("Default database is not set"))?;

    Ok(Self {
      users: db.collection("users"),
      groups: db.collection("groups"),
      todos: db.collection("todos"),
      notes: db.collection("notes"),
      reminders: db.collection("reminders"),
      timers: db.collection("timers"),
      spotify_tokens: db.collection("spotify_tokens"),
    })
  }
}

async fn collect<T: serde::de::DeserializeOwned + Unpin + Send + Sync>(mut cursor: Cursor<T>) -> Result<Vec<T>, BotError> {
  let mut out = vec![];
  while cursor.advance().await? {
    out.push(cursor.deserialize_current()?);
  }
  Ok(out)
}

fn by_fire_at() -> FindOptions {
  FindOptions::builder().sort(doc! { "fire_at": 1 }).build()
}

fn newest_first() -> FindOptions {
  FindOptions::builder().sort(doc! { "created_at": -1 }).build()
}

#[async_trait]
impl Storage for MongoPool {
  async fn get_or_create_user(&self, user_id: &str) -> Result<User, BotError> {
    if let Some(user) = self.users.find_one(doc! { "id": user_id }, None).await? {
      return Ok(user);
    }
    let user = User::new(user_id);
    info!("New user {}", user_id);
    self.users.insert_one(&user, None).await?;
    Ok(user)
  }

  async fn touch_user(&self, user_id: &str) -> Result<(), BotError> {
    let update = doc! {
      "$set": { "last_active_at": DateTime::now() },
      "$setOnInsert": { "is_notifications_enabled": true, "timezone": Bson::Null },
    };
    let opts = UpdateOptions::builder().upsert(true).build();
    self.users.update_one(doc! { "id": user_id }, update, opts).await?;
    Ok(())
  }

  async fn set_user_notifications(&self, user_id: &str, enabled: bool) -> Result<(), BotError> {
    self
      .users
      .update_one(doc! { "id": user_id }, doc! { "$set": { "is_notifications_enabled": enabled } }, None)
      .await?;
    Ok(())
  }

  async fn set_user_timezone(&self, user_id: &str, timezone: &str) -> Result<(), BotError> {
    self
      .users
      .update_one(doc! { "id": user_id }, doc! { "$set": { "timezone": timezone } }, None)
      .await?;
    Ok(())
  }

  async fn get_or_create_group(&self, group_id: &str) -> Result<Group, BotError> {
    if let Some(group) = self.groups.find_one(doc! { "id": group_id }, None).await? {
      return Ok(group);
    }
    let group = Group::new(group_id);
    info!("New group {}", group_id);
    self.groups.insert_one(&group, None).await?;
    Ok(group)
  }

  async fn add_group_admin(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    self
      .groups
      .update_one(doc! { "id": group_id }, doc! { "$addToSet": { "admin_users": user_id } }, None)
      .await?;
    Ok(())
  }

  async fn remove_group_admin(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    self
      .groups
      .update_one(doc! { "id": group_id }, doc! { "$pull": { "admin_users": user_id } }, None)
      .await?;
    Ok(())
  }

  async fn ban_group_user(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    let update = doc! {
      "$addToSet": { "banned_users": user_id },
      "$pull": { "admin_users": user_id },
    };
    self.groups.update_one(doc! { "id": group_id }, update, None).await?;
    Ok(())
  }

  async fn unban_group_user(&self, group_id: &str, user_id: &str) -> Result<(), BotError> {
    self
      .groups
      .update_one(doc! { "id": group_id }, doc! { "$pull": { "banned_users": user_id } }, None)
      .await?;
    Ok(())
  }

  async fn update_group_settings(&self, group_id: &str, patch: GroupSettingsPatch) -> Result<(), BotError> {
    let mut set = Document::new();
    if let Some(v) = patch.is_notifications_enabled {
      set.insert("is_notifications_enabled", v);
    }
    if let Some(v) = patch.is_mentions_enabled {
      set.insert("is_mentions_enabled", v);
    }
    if let Some(v) = patch.only_admins_can_change {
      set.insert("only_admins_can_change", v);
    }
    if set.is_empty() {
      return Ok(());
    }
    self.groups.update_one(doc! { "id": group_id }, doc! { "$set": set }, None).await?;
    Ok(())
  }

  async fn allow_group_command(&self, group_id: &str, command: &str) -> Result<(), BotError> {
    let command = command.to_lowercase();
    self
      .groups
      .update_one(doc! { "id": group_id }, doc! { "$addToSet": { "allowed_commands": command } }, None)
      .await?;
    Ok(())
  }

  async fn deny_group_command(&self, group_id: &str, command: &str) -> Result<(), BotError> {
    let command = command.to_lowercase();
    self
      .groups
      .update_one(doc! { "id": group_id }, doc! { "$pull": { "allowed_commands": command } }, None)
      .await?;
    Ok(())
  }

  async fn update_mention_policy(&self, group_id: &str, patch: MentionPolicyPatch) -> Result<(), BotError> {
    let mut set = Document::new();
    if let Some(v) = patch.everyone {
      set.insert("allow_mention_everyone", v);
    }
    if let Some(v) = patch.roles {
      set.insert("allow_mention_roles", v);
    }
    if let Some(v) = patch.users {
      set.insert("allow_mention_users", v);
    }
    if set.is_empty() {
      return Ok(());
    }
    self.groups.update_one(doc! { "id": group_id }, doc! { "$set": set }, None).await?;
    Ok(())
  }

  async fn create_todo(&self, mut todo: Todo) -> Result<Todo, BotError> {
    let res = self.todos.insert_one(&todo, None).await?;
    todo.id = res.inserted_id.as_object_id();
    Ok(todo)
  }

  async fn list_todos(&self, chat_id: &str, include_completed: bool) -> Result<Vec<Todo>, BotError> {
    let mut filter = doc! { "chat_id": chat_id };
    if !include_completed {
      filter.insert("completed", false);
    }
    collect(self.todos.find(filter, newest_first()).await?).await
  }

  async fn list_user_todos(&self, user_id: &str, include_completed: bool) -> Result<Vec<Todo>, BotError> {
    let mut filter = doc! { "user_id": user_id };
    if !include_completed {
      filter.insert("completed", false);
    }
    collect(self.todos.find(filter, newest_first()).await?).await
  }

  async fn complete_todo(&self, chat_id: &str, id: ObjectId) -> Result<(), BotError> {
    let update = doc! { "$set": { "completed": true, "completed_at": DateTime::now() } };
    self.todos.update_one(doc! { "_id": id, "chat_id": chat_id }, update, None).await?;
    Ok(())
  }

  async fn delete_todo(&self, chat_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.todos.delete_one(doc! { "_id": id, "chat_id": chat_id }, None).await?;
    Ok(())
  }

  async fn clear_completed_todos(&self, chat_id: &str) -> Result<u64, BotError> {
    let res = self.todos.delete_many(doc! { "chat_id": chat_id, "completed": true }, None).await?;
    Ok(res.deleted_count)
  }

  async fn create_note(&self, mut note: Note) -> Result<Note, BotError> {
    let res = self.notes.insert_one(&note, None).await?;
    note.id = res.inserted_id.as_object_id();
    Ok(note)
  }

  async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>, BotError> {
    collect(self.notes.find(doc! { "user_id": user_id }, newest_first()).await?).await
  }

  async fn delete_note(&self, user_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.notes.delete_one(doc! { "_id": id, "user_id": user_id }, None).await?;
    Ok(())
  }

  async fn search_notes(&self, user_id: &str, query: &str) -> Result<Vec<Note>, BotError> {
    let pattern = regex::escape(query);
    let filter = doc! {
      "user_id": user_id,
      "$or": [
        { "content": { "$regex": &pattern, "$options": "i" } },
        { "tags": { "$regex": &pattern, "$options": "i" } },
      ],
    };
    collect(self.notes.find(filter, newest_first()).await?).await
  }

  async fn create_reminder(&self, mut reminder: Reminder) -> Result<Reminder, BotError> {
    let res = self.reminders.insert_one(&reminder, None).await?;
    reminder.id = res.inserted_id.as_object_id();
    Ok(reminder)
  }

  async fn get_reminder(&self, id: ObjectId) -> Result<Option<Reminder>, BotError> {
    Ok(self.reminders.find_one(doc! { "_id": id }, None).await?)
  }

  async fn pending_reminders(&self) -> Result<Vec<Reminder>, BotError> {
    collect(self.reminders.find(doc! { "completed": false }, by_fire_at()).await?).await
  }

  async fn list_user_reminders(&self, user_id: &str) -> Result<Vec<Reminder>, BotError> {
    collect(
      self
        .reminders
        .find(doc! { "user_id": user_id, "completed": false }, by_fire_at())
        .await?,
    )
    .await
  }

  async fn complete_reminder(&self, id: ObjectId) -> Result<(), BotError> {
    self
      .reminders
      .update_one(doc! { "_id": id }, doc! { "$set": { "completed": true } }, None)
      .await?;
    Ok(())
  }

  async fn delete_reminder(&self, user_id: &str, id: ObjectId) -> Result<(), BotError> {
    self.reminders.delete_one(doc! { "_id": id, "user_id": user_id }, None).await?;
    Ok(())
  }

  async fn clear_completed_reminders(&self, user_id: &str) -> Result<u64, BotError> {
    let res = self
      .reminders
      .delete_many(doc! { "user_id": user_id, "completed": true }, None)
      .await?;
    Ok(res.deleted_count)
  }

  async fn create_timer(&self, mut timer: Timer) -> Result<Timer, BotError> {
    let res = self.timers.insert_one(&timer, None).await?;
    timer.id = res.inserted_id.as_object_id();
    Ok(timer)
  }

  async fn get_timer(&self, id: ObjectId) -> Result<Option<Timer>, BotError> {
    Ok(self.timers.find_one(doc! { "_id": id }, None).await?)
  }

  async fn active_timers(&self) -> Result<Vec<Timer>, BotError> {
    collect(self.timers.find(doc! { "active": true }, by_fire_at()).await?).await
  }

  async fn list_user_timers(&self, user_id: &str) -> Result<Vec<Timer>, BotError> {
    let filter = doc! { "user_id": user_id, "active": true, "fire_at": { "$gt": DateTime::now() } };
    collect(self.timers.find(filter, by_fire_at()).await?).await
  }

  async fn deactivate_timer(&self, id: ObjectId) -> Result<(), BotError> {
    self
      .timers
      .update_one(doc! { "_id": id }, doc! { "$set": { "active": false } }, None)
      .await?;
    Ok(())
  }

  async fn save_spotify_token(&self, token: SpotifyToken) -> Result<(), BotError> {
    let update = doc! {
      "$set": {
        "access_token": &token.access_token,
        "refresh_token": &token.refresh_token,
        "expires_at": token.expires_at,
      },
    };
    let opts = UpdateOptions::builder().upsert(true).build();
    self
      .spotify_tokens
      .update_one(doc! { "user_id": &token.user_id }, update, opts)
      .await?;
    Ok(())
  }
}
