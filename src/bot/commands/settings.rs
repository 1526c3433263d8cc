use crate::bot::context::Context;
use crate::bot::BotResult;
use crate::error::BotError;

use super::parse_on_off;

pub async fn execute(ctx: &Context) -> BotResult {
  match ctx.arg(0).map(str::to_lowercase).as_deref() {
    None => show(ctx).await,
    Some("notifications") => notifications(ctx).await,
    Some("timezone") => timezone(ctx).await,
    _ => Err(BotError::validation("Unknown setting. Use: notifications or timezone.")),
  }
}

async fn show(ctx: &Context) -> BotResult {
  let user = ctx.app.storage.get_or_create_user(&ctx.sender_id).await?;
  let notifications = if user.is_notifications_enabled { "on" } else { "off" };
  let timezone = user.timezone.as_deref().unwrap_or("not set");
  ctx
    .reply(format!("⚙️ Your Settings:\nNotifications: {}\nTimezone: {}", notifications, timezone))
    .await
}

async fn notifications(ctx: &Context) -> BotResult {
  let enabled = parse_on_off(ctx.arg(1), "notifications")?;
  ctx.app.storage.set_user_notifications(&ctx.sender_id, enabled).await?;
  let state = if enabled { "on" } else { "off" };
  ctx.reply(format!("🔔 Notifications turned {}.", state)).await
}

async fn timezone(ctx: &Context) -> BotResult {
  let Some(tz) = ctx.arg(1) else {
    return Err(BotError::validation("Please specify a timezone (e.g., Europe/Lisbon or UTC)."));
  };
  // Sanity check only; the value is an IANA name used for display formatting.
  if !tz.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '+' | '-')) {
    return Err(BotError::validation("Invalid timezone. Use an IANA name like Europe/Lisbon."));
  }
  ctx.app.storage.set_user_timezone(&ctx.sender_id, tz).await?;
  ctx.reply(format!("🌍 Timezone set to {}.", tz)).await
}
