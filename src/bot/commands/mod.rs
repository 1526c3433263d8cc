use crate::error::BotError;

use super::context::Context;
use super::BotResult;

mod group;
mod help;
mod note;
mod notify;
mod settings;
mod spotify;
mod timer;
mod todo;

pub struct CommandInfo {
  pub name: &'static str,
  pub description: &'static str,
  pub usage: &'static str,
  pub examples: &'static [&'static str],
}

/// Static name -> handler table; `find` resolves, `execute` invokes.
pub const COMMANDS: &[CommandInfo] = &[
  CommandInfo {
    name: "notify",
    description: "Set a reminder for yourself or the group",
    usage: "!notify <task> <time> | !notify @me/@all <task> <time> | !notify list/delete/clear",
    examples: &["!notify call mom 30m", "!notify @me drink water 1h", "!notify @all team meeting 2h", "!notify list"],
  },
  CommandInfo {
    name: "todo",
    description: "Manage your todo list",
    usage: "!todo <add/list/list-all/done/delete/clear> [task/number]",
    examples: &["!todo add Buy groceries", "!todo add task1, task2", "!todo list", "!todo done 1", "!todo clear"],
  },
  CommandInfo {
    name: "note",
    description: "Manage your notes",
    usage: "!note <save/list/view/delete/search> [content/number/query]",
    examples: &["!note save Remember to buy milk #shopping", "!note list", "!note view 1", "!note search milk"],
  },
  CommandInfo {
    name: "timer",
    description: "Set and manage timers",
    usage: "!timer start <duration> | !timer list | !timer cancel <number>",
    examples: &["!timer start 30m", "!timer start 1h", "!timer start 30", "!timer list", "!timer cancel 1"],
  },
  CommandInfo {
    name: "group",
    description: "Manage group settings and permissions",
    usage: "!group <settings/admin/ban/unban/mentions> [action] [target]",
    examples: &[
      "!group settings list",
      "!group settings notifications on",
      "!group admin add @user",
      "!group ban @user",
      "!group mentions everyone off",
    ],
  },
  CommandInfo {
    name: "settings",
    description: "Your personal settings",
    usage: "!settings [notifications on/off | timezone <tz>]",
    examples: &["!settings", "!settings notifications off", "!settings timezone Europe/Lisbon"],
  },
  CommandInfo {
    name: "spotify",
    description: "Link your Spotify account",
    usage: "!spotify login",
    examples: &["!spotify login"],
  },
  CommandInfo {
    name: "help",
    description: "Show available commands and their usage",
    usage: "!help [command]",
    examples: &["!help", "!help notify"],
  },
];

pub fn find(name: &str) -> Option<&'static CommandInfo> {
  COMMANDS.iter().find(|c| c.name == name)
}

pub async fn execute(name: &str, ctx: &Context) -> BotResult {
  match name {
    "notify" => notify::execute(ctx).await,
    "todo" => todo::execute(ctx).await,
    "note" => note::execute(ctx).await,
    "timer" => timer::execute(ctx).await,
    "group" => group::execute(ctx).await,
    "settings" => settings::execute(ctx).await,
    "spotify" => spotify::execute(ctx).await,
    "help" => help::execute(ctx).await,
    // The router resolves through `find` first, so this is unreachable.
    _ => Ok(()),
  }
}

/// One-based list index argument shared by done/delete/view/cancel actions.
pub(crate) fn parse_index(arg: Option<&str>, what: &str) -> Result<usize, BotError> {
  arg
    .and_then(|a| a.parse::<usize>().ok())
    .filter(|n| *n >= 1)
    .map(|n| n - 1)
    .ok_or_else(|| BotError::validation(format!("Please specify the {} number.", what)))
}

pub(crate) fn pick<'a, T>(items: &'a [T], index: usize, what: &str) -> Result<&'a T, BotError> {
  items.get(index).ok_or_else(|| BotError::not_found(format!("Invalid {} number.", what)))
}

pub(crate) fn parse_on_off(arg: Option<&str>, what: &str) -> Result<bool, BotError> {
  match arg {
    Some("on") => Ok(true),
    Some("off") => Ok(false),
    _ => Err(BotError::validation(format!("Please specify on/off for {}.", what))),
  }
}
