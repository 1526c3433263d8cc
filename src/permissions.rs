use regex::Regex;

use crate::models::Group;

lazy_static! {
  static ref MENTION: Regex = Regex::new(r"@([\w:]+)").unwrap();
}

/// Pure predicates over a `Group` snapshot. Handlers never inline admin or
/// ban logic; they ask these questions and go through `Storage` for any
/// mutation.

pub fn is_command_allowed(group: &Group, command: &str) -> bool {
  let command = command.to_lowercase();
  group.allowed_commands.iter().any(|c| *c == command)
}

pub fn is_admin(group: &Group, user_id: &str) -> bool {
  group.admin_users.iter().any(|u| u == user_id)
}

pub fn is_banned(group: &Group, user_id: &str) -> bool {
  group.banned_users.iter().any(|u| u == user_id)
}

/// Plain settings (notifications, mentions, allowed-command list) follow the
/// `only_admins_can_change` switch; admin/ban/mention-policy mutations are
/// always admin-only.
pub fn can_change_settings(group: &Group, user_id: &str) -> bool {
  !group.only_admins_can_change || is_admin(group, user_id)
}

/// Extracts `@name` mention targets from raw text, `@` stripped.
pub fn parse_mentions(text: &str) -> Vec<String> {
  MENTION.captures_iter(text).map(|c| c[1].to_string()).collect()
}

/// Whether `user_id` may deliver the given mentions in this group.
pub fn mentions_allowed(group: &Group, mentions: &[String], user_id: &str) -> bool {
  if !group.is_mentions_enabled || is_banned(group, user_id) {
    return false;
  }

  mentions.iter().all(|mention| match mention.as_str() {
    "all" | "everyone" => group.allow_mention_everyone,
    m if m.starts_with("role:") => group.allow_mention_roles,
    _ => group.allow_mention_users,
  })
}
