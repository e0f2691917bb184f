use anyhow::Result;
use mailsweep::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
