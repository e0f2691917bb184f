use anyhow::Result;

use super::events::stdout_reporter;
use crate::core::AppConfig;
use crate::google::oauth::authenticate;
use crate::sweep::top_senders;

pub async fn run(config: &AppConfig, max_messages: usize, top: usize) -> Result<()> {
    let client = authenticate(config).await?;

    println!("Scanning inbox for top senders...");
    let (events, printer) = stdout_reporter();
    let ranked = top_senders(&client, max_messages, top, &events).await?;
    drop(events);
    printer.await?;

    if ranked.is_empty() {
        println!("No senders found.");
        return Ok(());
    }

    println!("\nTop {} senders:", ranked.len());
    for (index, (sender, count)) in ranked.iter().enumerate() {
        println!("{}. {} - {} messages", index + 1, sender, count);
    }

    Ok(())
}
