use crate::bot::context::Context;
use crate::bot::BotResult;
use crate::error::BotError;
use crate::models::{Group, GroupSettingsPatch, MentionPolicyPatch};
use crate::permissions;

use super::parse_on_off;

const USAGE: &str = "!group <settings/admin/ban/unban/mentions> [action] [target]";

pub async fn execute(ctx: &Context) -> BotResult {
  let Some(group_id) = ctx.group_id.as_deref() else {
    return Err(BotError::validation("❌ This command can only be used in groups."));
  };

  let Some(sub) = ctx.arg(0) else {
    return Err(BotError::invalid_command(USAGE, "!group settings list"));
  };

  let group = ctx.app.storage.get_or_create_group(group_id).await?;
  match sub.to_lowercase().as_str() {
    "settings" => settings(ctx, &group).await,
    "admin" => admin(ctx, &group).await,
    "ban" => ban(ctx, &group).await,
    "unban" => unban(ctx, &group).await,
    "mentions" => mentions(ctx, &group).await,
    _ => Err(BotError::validation("Unknown subcommand. Use: settings, admin, ban, unban, or mentions.")),
  }
}

/// Mention targets arrive as `@user`; membership lists store the bare id.
fn target(arg: Option<&str>) -> Result<String, BotError> {
  arg
    .map(|a| a.trim_start_matches('@').to_string())
    .filter(|t| !t.is_empty())
    .ok_or_else(|| BotError::validation("Please specify a user (e.g., @user)."))
}

fn require_admin(group: &Group, user_id: &str) -> Result<(), BotError> {
  if permissions::is_admin(group, user_id) {
    return Ok(());
  }
  Err(BotError::PermissionDenied)
}

async fn settings(ctx: &Context, group: &Group) -> BotResult {
  let action = ctx.arg(1).map(str::to_lowercase);
  if action.as_deref() == Some("list") || action.is_none() {
    return ctx.reply(render_settings(group)).await;
  }

  if !permissions::can_change_settings(group, &ctx.sender_id) {
    return Err(BotError::PermissionDenied);
  }

  match action.as_deref() {
    Some("notifications") => {
      let enabled = parse_on_off(ctx.arg(2), "notifications")?;
      let patch = GroupSettingsPatch { is_notifications_enabled: Some(enabled), ..Default::default() };
      ctx.app.storage.update_group_settings(&group.id, patch).await?;
      ctx.reply(format!("🔔 Group notifications turned {}.", on_off(enabled))).await
    }
    Some("mentions") => {
      let enabled = parse_on_off(ctx.arg(2), "mentions")?;
      let patch = GroupSettingsPatch { is_mentions_enabled: Some(enabled), ..Default::default() };
      ctx.app.storage.update_group_settings(&group.id, patch).await?;
      ctx.reply(format!("💬 Group mentions turned {}.", on_off(enabled))).await
    }
    Some("adminonly") => {
      let enabled = parse_on_off(ctx.arg(2), "adminonly")?;
      let patch = GroupSettingsPatch { only_admins_can_change: Some(enabled), ..Default::default() };
      ctx.app.storage.update_group_settings(&group.id, patch).await?;
      ctx.reply(format!("🔒 Admin-only settings turned {}.", on_off(enabled))).await
    }
    Some("allow") => {
      let command = command_arg(ctx.arg(2))?;
      ctx.app.storage.allow_group_command(&group.id, &command).await?;
      ctx.reply(format!("✅ Command \"{}\" is now allowed in this group.", command)).await
    }
    Some("deny") => {
      let command = command_arg(ctx.arg(2))?;
      ctx.app.storage.deny_group_command(&group.id, &command).await?;
      ctx.reply(format!("🚫 Command \"{}\" is now denied in this group.", command)).await
    }
    _ => Err(BotError::validation("Unknown setting. Use: list, notifications, mentions, adminonly, allow, or deny.")),
  }
}

fn command_arg(arg: Option<&str>) -> Result<String, BotError> {
  arg
    .map(|a| a.trim_start_matches('!').to_lowercase())
    .filter(|c| !c.is_empty())
    .ok_or_else(|| BotError::validation("Please specify a command name."))
}

fn render_settings(group: &Group) -> String {
  format!(
    "⚙️ Group Settings:\n\
     Notifications: {}\n\
     Mentions: {}\n\
     Admin-only changes: {}\n\
     Allowed commands: {}\n\
     Admins: {}\n\
     Banned: {}",
    on_off(group.is_notifications_enabled),
    on_off(group.is_mentions_enabled),
    on_off(group.only_admins_can_change),
    group.allowed_commands.join(", "),
    if group.admin_users.is_empty() { "none".to_string() } else { group.admin_users.join(", ") },
    if group.banned_users.is_empty() { "none".to_string() } else { group.banned_users.join(", ") },
  )
}

fn on_off(enabled: bool) -> &'static str {
  if enabled {
    "on"
  } else {
    "off"
  }
}

async fn admin(ctx: &Context, group: &Group) -> BotResult {
  // A group with no admins yet accepts its first `admin add` from anyone;
  // after that, admin management is admin-only.
  if !group.admin_users.is_empty() {
    require_admin(group, &ctx.sender_id)?;
  }

  match ctx.arg(1).map(str::to_lowercase).as_deref() {
    Some("add") => {
      let user = target(ctx.arg(2))?;
      ctx.app.storage.add_group_admin(&group.id, &user).await?;
      ctx.reply(format!("👑 @{} is now a group admin.", user)).await
    }
    Some("remove") => {
      let user = target(ctx.arg(2))?;
      ctx.app.storage.remove_group_admin(&group.id, &user).await?;
      ctx.reply(format!("👑 @{} is no longer a group admin.", user)).await
    }
    _ => Err(BotError::invalid_command("!group admin <add/remove> @user", "!group admin add @user")),
  }
}

async fn ban(ctx: &Context, group: &Group) -> BotResult {
  require_admin(group, &ctx.sender_id)?;
  let user = target(ctx.arg(1))?;
  if permissions::is_banned(group, &user) {
    return Err(BotError::validation(format!("@{} is already banned.", user)));
  }
  ctx.app.storage.ban_group_user(&group.id, &user).await?;
  ctx.reply(format!("🚫 @{} has been banned from using commands in this group.", user)).await
}

async fn unban(ctx: &Context, group: &Group) -> BotResult {
  require_admin(group, &ctx.sender_id)?;
  let user = target(ctx.arg(1))?;
  if !permissions::is_banned(group, &user) {
    return Err(BotError::validation(format!("@{} is not banned.", user)));
  }
  ctx.app.storage.unban_group_user(&group.id, &user).await?;
  ctx.reply(format!("✅ @{} has been unbanned.", user)).await
}

async fn mentions(ctx: &Context, group: &Group) -> BotResult {
  require_admin(group, &ctx.sender_id)?;

  let scope = ctx.arg(1).map(str::to_lowercase);
  let enabled = parse_on_off(ctx.arg(2), "mentions")?;
  let patch = match scope.as_deref() {
    Some("everyone") => MentionPolicyPatch { everyone: Some(enabled), ..Default::default() },
    Some("roles") => MentionPolicyPatch { roles: Some(enabled), ..Default::default() },
    Some("users") => MentionPolicyPatch { users: Some(enabled), ..Default::default() },
    _ => return Err(BotError::validation("Unknown mention scope. Use: everyone, roles, or users.")),
  };

  ctx.app.storage.update_mention_policy(&group.id, patch).await?;
  ctx.reply(format!("💬 Mentioning {} turned {}.", scope.unwrap_or_default(), on_off(enabled))).await
}
