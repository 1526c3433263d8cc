use std::sync::Arc;

use crate::permissions;
use crate::transport::Payload;

use super::commands;
use super::context::Context;
use super::{App, BotResult};

/// Splits raw text into a lowercased command name and positional arguments.
/// Text without the configured prefix is not a command at all.
pub fn parse(prefix: &str, text: &str) -> Option<(String, Vec<String>)> {
  let rest = text.trim().strip_prefix(prefix)?;
  let mut parts = rest.split_whitespace();
  let name = parts.next()?.to_lowercase();
  Some((name, parts.map(str::to_string).collect()))
}

/// Stateless dispatch for one inbound message: parse, resolve the handler,
/// apply the group permission gate, invoke. Handler errors never escape this
/// boundary; user errors are replied verbatim, everything else becomes one
/// generic failure reply.
pub async fn dispatch(app: &Arc<App>, chat_id: String, sender_id: String, is_group: bool, text: &str) -> BotResult {
  let Some((name, args)) = parse(&app.config.prefix, text) else {
    return Ok(());
  };

  if commands::find(&name).is_none() {
    info!("Unknown command {:?} from {}", name, sender_id);
    if app.config.reply_unknown_commands {
      let reply = format!("Unknown command. Type {}help for available commands.", app.config.prefix);
      app.transport.send(&chat_id, Payload::text(reply)).await?;
    }
    return Ok(());
  }

  if is_group {
    let group = app.storage.get_or_create_group(&chat_id).await?;
    if permissions::is_banned(&group, &sender_id) {
      info!("Banned user {} tried {:?} in group {}", sender_id, name, chat_id);
      if app.config.reply_permission_denials {
        app
          .transport
          .send(&chat_id, Payload::text("❌ You are banned from using commands in this group."))
          .await?;
      }
      return Ok(());
    }
    if !permissions::is_command_allowed(&group, &name) {
      if app.config.reply_permission_denials {
        app
          .transport
          .send(&chat_id, Payload::text("❌ This command is not allowed in this group."))
          .await?;
      }
      return Ok(());
    }
  }

  // Activity tracking is off the reply's critical path.
  let storage = app.storage.clone();
  let sender = sender_id.clone();
  tokio::spawn(async move {
    if let Err(err) = storage.touch_user(&sender).await {
      warn!("Couldn't update last_active_at for {}: {}", sender, err);
    }
  });

  info!("Command {:?} from {}", name, sender_id);
  let group_id = is_group.then(|| chat_id.clone());
  let ctx = Context::new(app.clone(), chat_id, sender_id, group_id, is_group, args);
  if let Err(err) = commands::execute(&name, &ctx).await {
    if err.is_user_error() {
      ctx.reply(err.to_string()).await?;
    } else {
      error!("Command {:?} failed: {}", name, err);
      ctx.reply("❌ An error occurred while processing your command.").await?;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::super::testutil::{test_app, test_app_with};
  use super::super::BotConfig;
  use super::*;
  use crate::db::Storage;

  #[test]
  fn parse_splits_name_and_args() {
    assert_eq!(parse("!", "!todo add Buy milk"), Some(("todo".into(), vec!["add".into(), "Buy".into(), "milk".into()])));
    assert_eq!(parse("!", "!TODO list"), Some(("todo".into(), vec!["list".into()])));
    assert_eq!(parse("!", "hello there"), None);
    assert_eq!(parse("!", "!"), None);
    assert_eq!(parse("/", "/help"), Some(("help".into(), vec![])));
  }

  #[tokio::test]
  async fn ignores_plain_text() {
    let t = test_app();
    t.send("1", "1", false, "just chatting").await;
    assert!(t.transport.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn unknown_command_reply_is_configurable() {
    let t = test_app();
    t.send("1", "1", false, "!frobnicate").await;
    assert_eq!(t.last_reply("1").unwrap(), "Unknown command. Type !help for available commands.");

    let silent = test_app_with(BotConfig { reply_unknown_commands: false, ..Default::default() });
    silent.send("1", "1", false, "!frobnicate").await;
    assert!(silent.transport.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn routed_command_touches_sender() {
    let t = test_app();
    t.send("1", "42", false, "!help").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(t.storage.user("42").is_some());
  }

  #[tokio::test]
  async fn banned_user_is_gated() {
    let t = test_app();
    t.storage.get_or_create_group("-10").await.unwrap();
    t.storage.ban_group_user("-10", "7").await.unwrap();

    t.send("-10", "7", true, "!todo add sneaky").await;
    assert_eq!(t.last_reply("-10").unwrap(), "❌ You are banned from using commands in this group.");
    assert!(t.storage.list_todos("-10", true).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn disallowed_command_is_gated() {
    let t = test_app();
    t.storage.get_or_create_group("-10").await.unwrap();
    t.storage.deny_group_command("-10", "todo").await.unwrap();

    t.send("-10", "7", true, "!todo add blocked").await;
    assert_eq!(t.last_reply("-10").unwrap(), "❌ This command is not allowed in this group.");
    assert!(t.storage.list_todos("-10", true).await.unwrap().is_empty());

    let silent = test_app_with(BotConfig { reply_permission_denials: false, ..Default::default() });
    silent.storage.get_or_create_group("-10").await.unwrap();
    silent.storage.deny_group_command("-10", "todo").await.unwrap();
    silent.send("-10", "7", true, "!todo add blocked").await;
    assert!(silent.transport.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn handler_error_becomes_usage_reply() {
    let t = test_app();
    t.send("1", "1", false, "!timer start soon").await;
    assert_eq!(
      t.last_reply("1").unwrap(),
      "Invalid duration format. Examples: 30m, 1h, or just 30 for minutes."
    );
  }

  #[tokio::test]
  async fn todo_round_trip_through_dispatch() {
    let t = test_app();
    t.send("1", "1", false, "!todo add Buy milk").await;
    assert_eq!(t.last_reply("1").unwrap(), "✅ Todo added: Buy milk");

    t.send("1", "1", false, "!todo list").await;
    assert_eq!(t.last_reply("1").unwrap(), "📝 Todo List for this chat:\n1. ○ Buy milk");

    t.send("1", "1", false, "!todo done 1").await;
    let todos = t.storage.list_todos("1", true).await.unwrap();
    assert!(todos[0].completed && todos[0].completed_at.is_some());

    t.send("1", "1", false, "!todo delete 1").await;
    assert!(t.storage.list_todos("1", true).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn note_round_trip_through_dispatch() {
    let t = test_app();
    t.send("1", "1", false, "!note save Buy milk #shopping").await;
    assert_eq!(t.last_reply("1").unwrap(), "📝 Note saved successfully!");

    let notes = t.storage.list_notes("1").await.unwrap();
    assert_eq!(notes[0].content, "Buy milk #shopping");
    assert_eq!(notes[0].tags, vec!["shopping".to_string()]);

    t.send("1", "1", false, "!note list").await;
    assert_eq!(t.last_reply("1").unwrap(), "📚 Your Notes:\n1. Buy milk #shopping");

    t.send("1", "1", false, "!note view 1").await;
    assert_eq!(t.last_reply("1").unwrap(), "📖 Note #1:\nBuy milk #shopping");

    t.send("1", "1", false, "!note search milk").await;
    assert_eq!(t.last_reply("1").unwrap(), "🔍 Search Results for \"milk\":\n1. Buy milk #shopping");

    t.send("1", "1", false, "!note delete 1").await;
    assert_eq!(t.last_reply("1").unwrap(), "🗑️ Note deleted successfully!");
    assert!(t.storage.list_notes("1").await.unwrap().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn scenario_timer_lifecycle() {
    let t = test_app();
    t.send("7", "7", false, "!timer start 30").await;
    assert_eq!(t.last_reply("7").unwrap(), "⏰ Timer set for 30 minutes!");

    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    let fired: Vec<_> = t.transport.sent_to("7").into_iter().filter(|m| m.contains("30")).collect();
    assert_eq!(fired.len(), 2); // confirmation + the single fire
    assert!(t.transport.sent_to("7").iter().any(|m| m == "⏰ Timer completed: 30 minutes have passed!"));

    t.send("7", "7", false, "!timer list").await;
    assert_eq!(t.last_reply("7").unwrap(), "No active timers.");
  }

  #[tokio::test]
  async fn scenario_notify_creates_listed_reminder() {
    let t = test_app();
    t.send("7", "7", false, "!notify call mom 1h").await;

    let reminders = t.storage.list_user_reminders("7").await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].task, "call mom");

    let minutes = (reminders[0].fire_at.to_chrono() - chrono::Utc::now()).num_minutes();
    assert!((59..=60).contains(&minutes), "fire_at should be about an hour out, got {}m", minutes);
  }

  #[tokio::test]
  async fn notify_mentions_extend_the_fanout_list() {
    let t = test_app();
    t.send("1", "1", false, "!notify ping @bob about standup 30m").await;

    let reminders = t.storage.list_user_reminders("1").await.unwrap();
    assert_eq!(reminders[0].notify_users, vec!["bob".to_string()]);
  }

  #[tokio::test]
  async fn scenario_non_admin_cannot_ban() {
    let t = test_app();
    t.storage.get_or_create_group("-10").await.unwrap();
    t.storage.add_group_admin("-10", "alice").await.unwrap();

    t.send("-10", "bob", true, "!group ban @x").await;
    assert_eq!(t.last_reply("-10").unwrap(), "❌ You need to be a group admin to do that.");
    assert!(t.storage.group("-10").unwrap().banned_users.is_empty());
  }

  #[tokio::test]
  async fn scenario_promoted_admin_can_ban() {
    let t = test_app();
    t.storage.get_or_create_group("-10").await.unwrap();
    t.storage.add_group_admin("-10", "alice").await.unwrap();

    t.send("-10", "alice", true, "!group admin add @x").await;
    assert!(t.storage.group("-10").unwrap().admin_users.contains(&"x".to_string()));

    t.send("-10", "x", true, "!group ban @y").await;
    assert!(t.storage.group("-10").unwrap().banned_users.contains(&"y".to_string()));
  }
}
