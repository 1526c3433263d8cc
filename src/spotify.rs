use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use mongodb::bson::DateTime;
use reqwest::Url;
use serde::Deserialize;

use crate::db::Storage;
use crate::env;
use crate::error::BotError;
use crate::models::SpotifyToken;
use crate::transport::{Payload, Transport};

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SCOPES: &str = "user-read-private user-read-email user-read-playback-state user-modify-playback-state";

/// Third-party OAuth collaborator: builds the authorize link handed out by
/// `!spotify login` and runs the single callback endpoint that exchanges the
/// code and persists the token. Refresh and playback live behind this
/// boundary and are not part of the bot core.
pub struct SpotifyAuth {
  storage: Arc<dyn Storage>,
  transport: Arc<dyn Transport>,
  http: reqwest::Client,
  client_id: String,
  client_secret: String,
  redirect_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  refresh_token: String,
  expires_in: i64,
}

#[derive(Deserialize)]
struct CallbackParams {
  code: Option<String>,
  /// The requesting user id, round-tripped through the authorize link.
  state: Option<String>,
  error: Option<String>,
}

impl SpotifyAuth {
  pub fn from_env(storage: Arc<dyn Storage>, transport: Arc<dyn Transport>) -> Option<Arc<Self>> {
    let client_id = env::var(env::SPOTIFY_CLIENT_ID)?;
    let client_secret = env::var(env::SPOTIFY_CLIENT_SECRET)?;
    let redirect_uri = env::var(env::SPOTIFY_REDIRECT_URI)?;
    Some(Arc::new(Self { storage, transport, http: reqwest::Client::new(), client_id, client_secret, redirect_uri }))
  }

  pub fn auth_url(&self, user_id: &str) -> Result<String, BotError> {
    let url = Url::parse_with_params(
      AUTHORIZE_URL,
      &[
        ("client_id", self.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", self.redirect_uri.as_str()),
        ("scope", SCOPES),
        ("state", user_id),
      ],
    )
    .map_err(|e| BotError::Spotify(e.to_string()))?;
    Ok(url.to_string())
  }

  /// Exchanges the authorization code, upserts the token row and tells the
  /// user on the messaging side that the link succeeded.
  pub async fn handle_code(&self, user_id: &str, code: &str) -> Result<(), BotError> {
    let res = self
      .http
      .post(TOKEN_URL)
      .basic_auth(&self.client_id, Some(&self.client_secret))
      .form(&[
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", self.redirect_uri.as_str()),
      ])
      .send()
      .await?;

    if !res.status().is_success() {
      return Err(BotError::Spotify(format!("Token exchange failed with status {}", res.status())));
    }

    let token: TokenResponse = res.json().await?;
    let expires_at = DateTime::from_chrono(chrono::Utc::now() + chrono::Duration::seconds(token.expires_in));
    self
      .storage
      .save_spotify_token(SpotifyToken {
        user_id: user_id.to_string(),
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
      })
      .await?;

    info!("Linked Spotify account for user {}", user_id);
    if let Err(err) = self
      .transport
      .send(user_id, Payload::text("✅ Successfully logged in to Spotify!"))
      .await
    {
      warn!("Couldn't notify {} about the Spotify link: {}", user_id, err);
    }
    Ok(())
  }
}

pub async fn serve(auth: Arc<SpotifyAuth>, port: u16) -> Result<(), BotError> {
  let router = Router::new().route("/spotify/callback", get(callback)).with_state(auth);
  let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
  info!("OAuth callback server listening on port {}", port);
  axum::serve(listener, router).await?;
  Ok(())
}

async fn callback(
  State(auth): State<Arc<SpotifyAuth>>,
  Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
  if let Some(error) = params.error {
    return (StatusCode::BAD_REQUEST, Html(format!("Authentication failed: {}", error)));
  }

  let (Some(code), Some(state)) = (params.code, params.state) else {
    return (StatusCode::BAD_REQUEST, Html("Missing code or state".into()));
  };

  match auth.handle_code(&state, &code).await {
    Ok(()) => (
      StatusCode::OK,
      Html("<h1>Spotify login successful!</h1><p>You can close this window and return to the chat.</p>".into()),
    ),
    Err(err) => {
      error!("Spotify callback failed: {}", err);
      (StatusCode::INTERNAL_SERVER_ERROR, Html("Internal error during authentication".into()))
    }
  }
}
