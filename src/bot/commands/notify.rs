use mongodb::bson::DateTime;

use crate::bot::context::Context;
use crate::bot::BotResult;
use crate::error::BotError;
use crate::permissions;
use crate::timeparse::{format_minutes, parse_minutes};

use super::{parse_index, pick};

const USAGE: &str = "!notify <task> <time> | !notify @me/@all <task> <time> | !notify list/delete/clear";

pub async fn execute(ctx: &Context) -> BotResult {
  match ctx.arg(0) {
    None => Err(BotError::invalid_command(USAGE, "!notify call mom 30m")),
    Some("list") => list(ctx).await,
    Some("delete") => delete(ctx).await,
    Some("clear") => clear(ctx).await,
    Some(_) => create(ctx).await,
  }
}

async fn create(ctx: &Context) -> BotResult {
  let mut args = ctx.args.as_slice();

  // In a group the reminder targets the group chat unless `@me` asks for a
  // personal one; `@all` is the explicit group-wide form and goes through
  // the mention policy.
  let mut group_target = ctx.is_group;
  let mut mention_everyone = false;
  if ctx.is_group {
    match args.first().map(String::as_str) {
      Some("@me") => {
        group_target = false;
        args = &args[1..];
      }
      Some("@all") => {
        mention_everyone = true;
        args = &args[1..];
      }
      _ => {}
    }
  }

  let [task @ .., time] = args else {
    return Err(BotError::invalid_command(USAGE, "!notify call mom 30m"));
  };
  let task = task.join(" ");
  if task.is_empty() {
    return Err(BotError::invalid_command(USAGE, "!notify call mom 30m"));
  }

  let Some(minutes) = parse_minutes(time) else {
    return Err(BotError::validation("Invalid time format. Examples: 30m, 1h, 2h30m"));
  };

  let group_id = group_target.then(|| ctx.chat_id.clone());
  if mention_everyone {
    let group = ctx.app.storage.get_or_create_group(&ctx.chat_id).await?;
    if !permissions::mentions_allowed(&group, &["everyone".into()], &ctx.sender_id) {
      return Err(BotError::validation("❌ Mentioning everyone is not allowed in this group."));
    }
  }

  // `@user` mentions in an individual reminder's task extend the fan-out
  // list; a group reminder already targets the whole chat.
  let notify_users = if group_id.is_none() { permissions::parse_mentions(&task) } else { vec![] };

  let fire_at = DateTime::from_chrono(chrono::Utc::now() + chrono::Duration::minutes(minutes));
  ctx
    .app
    .reminders
    .create(&ctx.sender_id, &task, fire_at, notify_users, group_id.clone())
    .await?;

  let prefix = if group_id.is_some() { "✅ Group reminder set" } else { "✅ Reminder set" };
  ctx.reply(format!("{}: \"{}\" in {}", prefix, task, format_minutes(minutes))).await
}

async fn list(ctx: &Context) -> BotResult {
  let reminders = ctx.app.reminders.list(&ctx.sender_id).await?;
  if reminders.is_empty() {
    return ctx.reply("No pending reminders.").await;
  }

  let now = chrono::Utc::now();
  let body: Vec<String> = reminders
    .iter()
    .enumerate()
    .map(|(i, reminder)| {
      let left = (reminder.fire_at.to_chrono() - now).num_minutes().max(0);
      format!("{}. 🔔 {} — in {}", i + 1, reminder.task, format_minutes(left))
    })
    .collect();
  ctx.reply(format!("🔔 Pending Reminders:\n{}", body.join("\n"))).await
}

async fn delete(ctx: &Context) -> BotResult {
  let index = parse_index(ctx.arg(1), "reminder")?;
  let reminders = ctx.app.reminders.list(&ctx.sender_id).await?;
  let reminder = pick(&reminders, index, "reminder")?;
  let id = reminder.id.ok_or_else(|| BotError::not_found("Invalid reminder number."))?;
  ctx.app.reminders.delete(&ctx.sender_id, id).await?;
  ctx.reply(format!("🗑️ Reminder deleted: {}", reminder.task)).await
}

async fn clear(ctx: &Context) -> BotResult {
  let count = ctx.app.reminders.clear_completed(&ctx.sender_id).await?;
  ctx.reply(format!("🧹 Cleared {} completed reminders.", count)).await
}
