use crate::bot::context::Context;
use crate::bot::BotResult;
use crate::error::BotError;
use crate::models::Todo;

use super::{parse_index, pick};

const USAGE: &str = "!todo <add/list/list-all/done/delete/clear> [task/number]";

pub async fn execute(ctx: &Context) -> BotResult {
  let Some(sub) = ctx.arg(0) else {
    return Err(BotError::invalid_command(USAGE, "!todo add Buy milk"));
  };

  match sub.to_lowercase().as_str() {
    "add" => add(ctx).await,
    "list" => list(ctx).await,
    "list-all" => list_all(ctx).await,
    "done" => done(ctx).await,
    "delete" => delete(ctx).await,
    "clear" => clear(ctx).await,
    _ => Err(BotError::validation("Unknown subcommand. Use: add, list, list-all, done, delete, or clear.")),
  }
}

async fn add(ctx: &Context) -> BotResult {
  // Comma-separated input adds several todos at once.
  let tasks: Vec<String> = ctx
    .rest(1)
    .split(',')
    .map(|task| task.trim().to_string())
    .filter(|task| !task.is_empty())
    .collect();

  if tasks.is_empty() {
    return Err(BotError::validation("Please specify a task to add."));
  }

  for task in &tasks {
    ctx
      .app
      .storage
      .create_todo(Todo::new(&ctx.sender_id, &ctx.chat_id, task))
      .await?;
  }

  match tasks.as_slice() {
    [task] => ctx.reply(format!("✅ Todo added: {}", task)).await,
    many => {
      let listed: Vec<String> = many.iter().enumerate().map(|(i, task)| format!("{}. {}", i + 1, task)).collect();
      ctx.reply(format!("✅ Added multiple todos:\n{}", listed.join("\n"))).await
    }
  }
}

async fn list(ctx: &Context) -> BotResult {
  let todos = ctx.app.storage.list_todos(&ctx.chat_id, false).await?;
  if todos.is_empty() {
    return ctx.reply("No todos found in this chat.").await;
  }
  ctx.reply(format!("📝 Todo List for this chat:\n{}", render(&todos))).await
}

async fn list_all(ctx: &Context) -> BotResult {
  let todos = ctx.app.storage.list_user_todos(&ctx.sender_id, false).await?;
  if todos.is_empty() {
    return ctx.reply("No todos found.").await;
  }

  let mut body = String::from("📝 All Your Todos:\n");
  let mut chats: Vec<&str> = todos.iter().map(|t| t.chat_id.as_str()).collect();
  chats.sort_unstable();
  chats.dedup();
  for chat in chats {
    // Group chat ids are negative on this transport.
    let label = if chat.starts_with('-') { "Group chat" } else { "Personal chat" };
    let of_chat: Vec<_> = todos.iter().filter(|t| t.chat_id == chat).cloned().collect();
    body.push_str(&format!("\n{}:\n{}\n", label, render(&of_chat)));
  }
  ctx.reply(body).await
}

async fn done(ctx: &Context) -> BotResult {
  let index = parse_index(ctx.arg(1), "todo")?;
  let todos = ctx.app.storage.list_todos(&ctx.chat_id, false).await?;
  let todo = pick(&todos, index, "todo")?;
  let id = todo.id.ok_or_else(|| BotError::not_found("Invalid todo number."))?;
  ctx.app.storage.complete_todo(&ctx.chat_id, id).await?;
  ctx.reply(format!("✅ Marked as done: {}", todo.task)).await
}

async fn delete(ctx: &Context) -> BotResult {
  let index = parse_index(ctx.arg(1), "todo")?;
  let todos = ctx.app.storage.list_todos(&ctx.chat_id, true).await?;
  let todo = pick(&todos, index, "todo")?;
  let id = todo.id.ok_or_else(|| BotError::not_found("Invalid todo number."))?;
  ctx.app.storage.delete_todo(&ctx.chat_id, id).await?;
  ctx.reply(format!("🗑️ Deleted: {}", todo.task)).await
}

async fn clear(ctx: &Context) -> BotResult {
  let count = ctx.app.storage.clear_completed_todos(&ctx.chat_id).await?;
  ctx.reply(format!("🧹 Cleared {} completed todos from this chat.", count)).await
}

fn render(todos: &[Todo]) -> String {
  todos
    .iter()
    .enumerate()
    .map(|(i, todo)| format!("{}. {} {}", i + 1, if todo.completed { "✓" } else { "○" }, todo.task))
    .collect::<Vec<_>>()
    .join("\n")
}
