use crate::bot::context::Context;
use crate::bot::BotResult;
use crate::error::BotError;

pub async fn execute(ctx: &Context) -> BotResult {
  match ctx.arg(0).map(str::to_lowercase).as_deref() {
    Some("login") => login(ctx).await,
    _ => Err(BotError::invalid_command("!spotify login", "!spotify login")),
  }
}

async fn login(ctx: &Context) -> BotResult {
  let Some(spotify) = &ctx.app.spotify else {
    return Err(BotError::validation("Spotify is not configured."));
  };

  let url = spotify.auth_url(&ctx.sender_id)?;
  ctx
    .reply(format!("🎵 Log in to Spotify by opening this link:\n{}", url))
    .await
}
