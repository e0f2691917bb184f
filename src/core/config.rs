use std::env;

/// Runtime configuration, read once from the environment at startup.
///
/// The URL fields exist so tests can point the client at a local mock
/// server; the defaults are the real Google endpoints.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub credentials_path: String,
    pub token_path: String,
    pub oauth_token_url: String,
    pub api_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let credentials_path = env::var("MAILSWEEP_CREDENTIALS_PATH")
            .unwrap_or_else(|_| "credentials.json".to_string());
        let token_path =
            env::var("MAILSWEEP_TOKEN_PATH").unwrap_or_else(|_| "token.json".to_string());
        let oauth_token_url = env::var("MAILSWEEP_OAUTH_TOKEN_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com".to_string());
        let api_base_url = env::var("MAILSWEEP_GMAIL_API_URL")
            .unwrap_or_else(|_| "https://gmail.googleapis.com".to_string());

        Self {
            credentials_path,
            token_path,
            oauth_token_url,
            api_base_url,
        }
    }
}
