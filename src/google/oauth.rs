//! OAuth2 against the Google token endpoint, plus the on-disk client
//! secret and token files

use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::AppConfig;
use crate::google::gmail::GmailClient;

/// Scopes required to list, fetch, and delete messages
pub const SCOPES: &str = "https://www.googleapis.com/auth/gmail.modify https://mail.google.com/";

/// The `installed` section of a Google client secret file
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: ClientSecrets,
}

impl ClientSecrets {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| anyhow!("Failed to read client secret file {}: {}", path.display(), err))?;
        let parsed: ClientSecretsFile = serde_json::from_str(&raw)?;
        Ok(parsed.installed)
    }
}

/// Token pair persisted between runs. The refresh token is long lived;
/// the access token is replaced on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
}

impl StoredToken {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| anyhow!("Failed to read token file {}: {}", path.display(), err))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// Consent URL the user opens in a browser to authorize access
pub fn consent_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(SCOPES)
    )
}

pub async fn exchange_code_for_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    let client = Client::new();
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
    ];
    let res = client
        .post(format!("{}/token", token_url.trim_end_matches('/')))
        .form(&params)
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Token exchange failed: {} ({})", status, text);
    }
    Ok(serde_json::from_str(&text)?)
}

pub async fn refresh_access_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let client = Client::new();
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    let res = client
        .post(format!("{}/token", token_url.trim_end_matches('/')))
        .form(&params)
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Token refresh failed: {} ({})", status, text);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Build an authenticated session from the stored token, refreshing
/// the access token first. The refreshed pair is written back so the
/// token file always holds the latest credentials.
pub async fn authenticate(config: &AppConfig) -> Result<GmailClient> {
    if !Path::new(&config.token_path).exists() {
        anyhow::bail!(
            "No stored token at {}. Run `mailsweep auth` first.",
            config.token_path
        );
    }
    let secrets = ClientSecrets::from_file(&config.credentials_path)?;
    let mut stored = StoredToken::load(&config.token_path)?;
    let token = refresh_access_token(
        &config.oauth_token_url,
        &secrets.client_id,
        &secrets.client_secret,
        &stored.refresh_token,
    )
    .await?;
    stored.access_token = token.access_token.clone();
    if let Some(refresh_token) = token.refresh_token {
        stored.refresh_token = refresh_token;
    }
    stored.save(&config.token_path)?;
    Ok(GmailClient::new(&config.api_base_url, token.access_token))
}
