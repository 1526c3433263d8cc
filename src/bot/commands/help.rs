use crate::bot::context::Context;
use crate::bot::BotResult;

use super::{find, COMMANDS};

pub async fn execute(ctx: &Context) -> BotResult {
  let prefix = &ctx.app.config.prefix;

  let Some(name) = ctx.arg(0).map(str::to_lowercase) else {
    let body: Vec<String> = COMMANDS
      .iter()
      .map(|c| format!("{}{} — {}", prefix, c.name, c.description))
      .collect();
    return ctx
      .reply(format!(
        "🤖 Available Commands:\n{}\n\nType {}help <command> for details.",
        body.join("\n"),
        prefix
      ))
      .await;
  };

  let Some(command) = find(&name) else {
    return ctx
      .reply(format!("❌ Command \"{}\" not found. Type {}help for available commands.", name, prefix))
      .await;
  };

  let examples: Vec<String> = command.examples.iter().map(|e| format!("  {}", e)).collect();
  ctx
    .reply(format!(
      "📖 {}{}\n{}\n\nUsage: {}\nExamples:\n{}",
      prefix,
      command.name,
      command.description,
      command.usage,
      examples.join("\n")
    ))
    .await
}
