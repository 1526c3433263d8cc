use crate::bot::context::Context;
use crate::bot::BotResult;
use crate::error::BotError;
use crate::timeparse::parse_minutes;

use super::{parse_index, pick};

const USAGE: &str = "!timer start <duration> | !timer list | !timer cancel <number>";
const MAX_MINUTES: i64 = 24 * 60;

pub async fn execute(ctx: &Context) -> BotResult {
  let Some(sub) = ctx.arg(0) else {
    return Err(BotError::invalid_command(USAGE, "!timer start 30m"));
  };

  match sub.to_lowercase().as_str() {
    "start" => start(ctx).await,
    "list" => list(ctx).await,
    "cancel" => cancel(ctx).await,
    _ => Err(BotError::validation("Unknown subcommand. Use: start, list, or cancel.")),
  }
}

async fn start(ctx: &Context) -> BotResult {
  let Some(raw) = ctx.arg(1) else {
    return Err(BotError::validation("Please specify a duration (e.g., 30m, 1h, or just 30 for minutes)."));
  };
  let Some(minutes) = parse_minutes(raw) else {
    return Err(BotError::validation("Invalid duration format. Examples: 30m, 1h, or just 30 for minutes."));
  };
  if minutes > MAX_MINUTES {
    return Err(BotError::validation("Timer duration cannot exceed 24 hours."));
  }

  ctx.app.timers.create(&ctx.sender_id, minutes).await?;
  ctx.reply(format!("⏰ Timer set for {} minutes!", minutes)).await
}

async fn list(ctx: &Context) -> BotResult {
  let timers = ctx.app.timers.list(&ctx.sender_id).await?;
  if timers.is_empty() {
    return ctx.reply("No active timers.").await;
  }

  let now = chrono::Utc::now();
  let body: Vec<String> = timers
    .iter()
    .enumerate()
    .map(|(i, timer)| {
      let remaining = (timer.fire_at.to_chrono() - now).num_minutes().max(0);
      format!("{}. ⏳ {} minutes remaining", i + 1, remaining)
    })
    .collect();
  ctx.reply(format!("⏰ Active Timers:\n{}", body.join("\n"))).await
}

async fn cancel(ctx: &Context) -> BotResult {
  let index = parse_index(ctx.arg(1), "timer")?;
  let timers = ctx.app.timers.list(&ctx.sender_id).await?;
  let timer = pick(&timers, index, "timer")?;
  let id = timer.id.ok_or_else(|| BotError::not_found("Invalid timer number."))?;
  ctx.app.timers.cancel(id).await?;
  ctx.reply("⏰ Timer cancelled successfully!").await
}
