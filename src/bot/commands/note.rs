use crate::bot::context::Context;
use crate::bot::BotResult;
use crate::error::BotError;
use crate::models::Note;

use super::{parse_index, pick};

const USAGE: &str = "!note <save/list/view/delete/search> [content/number/query]";

pub async fn execute(ctx: &Context) -> BotResult {
  let Some(sub) = ctx.arg(0) else {
    return Err(BotError::invalid_command(USAGE, "!note save Remember to buy milk"));
  };

  match sub.to_lowercase().as_str() {
    "save" => save(ctx).await,
    "list" => list(ctx).await,
    "view" => view(ctx).await,
    "delete" => delete(ctx).await,
    "search" => search(ctx).await,
    _ => Err(BotError::validation("Unknown subcommand. Use: save, list, view, delete, or search.")),
  }
}

async fn save(ctx: &Context) -> BotResult {
  let content = ctx.rest(1);
  if content.is_empty() {
    return Err(BotError::validation("Please specify the note content."));
  }

  // #hashtags in the content double as tags; the content is kept verbatim.
  let tags: Vec<String> = content
    .split_whitespace()
    .filter_map(|word| word.strip_prefix('#'))
    .filter(|tag| !tag.is_empty())
    .map(str::to_string)
    .collect();

  ctx.app.storage.create_note(Note::new(&ctx.sender_id, content, tags)).await?;
  ctx.reply("📝 Note saved successfully!").await
}

async fn list(ctx: &Context) -> BotResult {
  let notes = ctx.app.storage.list_notes(&ctx.sender_id).await?;
  if notes.is_empty() {
    return ctx.reply("No notes found.").await;
  }
  ctx.reply(format!("📚 Your Notes:\n{}", render(&notes))).await
}

async fn view(ctx: &Context) -> BotResult {
  let index = parse_index(ctx.arg(1), "note")?;
  let notes = ctx.app.storage.list_notes(&ctx.sender_id).await?;
  let note = pick(&notes, index, "note")?;
  ctx.reply(format!("📖 Note #{}:\n{}", index + 1, note.content)).await
}

async fn delete(ctx: &Context) -> BotResult {
  let index = parse_index(ctx.arg(1), "note")?;
  let notes = ctx.app.storage.list_notes(&ctx.sender_id).await?;
  let note = pick(&notes, index, "note")?;
  let id = note.id.ok_or_else(|| BotError::not_found("Invalid note number."))?;
  ctx.app.storage.delete_note(&ctx.sender_id, id).await?;
  ctx.reply("🗑️ Note deleted successfully!").await
}

async fn search(ctx: &Context) -> BotResult {
  let query = ctx.rest(1);
  if query.is_empty() {
    return Err(BotError::validation("Please specify a search query."));
  }

  let notes = ctx.app.storage.search_notes(&ctx.sender_id, &query).await?;
  if notes.is_empty() {
    return ctx.reply("No notes found matching your search.").await;
  }
  ctx.reply(format!("🔍 Search Results for \"{}\":\n{}", query, render(&notes))).await
}

fn render(notes: &[Note]) -> String {
  notes
    .iter()
    .enumerate()
    .map(|(i, note)| format!("{}. {}", i + 1, preview(&note.content)))
    .collect::<Vec<_>>()
    .join("\n")
}

fn preview(content: &str) -> String {
  if content.chars().count() <= 50 {
    return content.to_string();
  }
  let cut: String = content.chars().take(47).collect();
  format!("{}...", cut)
}
