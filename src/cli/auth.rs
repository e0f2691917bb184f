use std::io::{self, Write};

use anyhow::{Result, anyhow};

use crate::core::AppConfig;
use crate::google::oauth::{ClientSecrets, StoredToken, consent_url, exchange_code_for_token};

const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

pub async fn run(config: &AppConfig) -> Result<()> {
    let secrets = ClientSecrets::from_file(&config.credentials_path)?;

    let url = consent_url(&secrets.client_id, REDIRECT_URI);
    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        url
    );
    print!("Paste the authorization code shown by Google here: ");
    io::stdout().flush().unwrap();
    let mut code = String::new();
    io::stdin()
        .read_line(&mut code)
        .expect("Failed to read code");
    let code = code.trim();

    let token = exchange_code_for_token(
        &config.oauth_token_url,
        &secrets.client_id,
        &secrets.client_secret,
        code,
        REDIRECT_URI,
    )
    .await?;

    let refresh_token = token
        .refresh_token
        .ok_or(anyhow!("No refresh token in response"))?;
    let stored = StoredToken {
        access_token: token.access_token,
        refresh_token,
    };
    stored.save(&config.token_path)?;
    println!("Token for this account saved to {}.", config.token_path);

    Ok(())
}
