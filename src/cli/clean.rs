use anyhow::Result;

use super::events::stdout_reporter;
use super::purge::confirm;
use crate::core::AppConfig;
use crate::google::oauth::authenticate;
use crate::sweep::{Filters, purge_sender, top_senders};

/// Scan for the top senders, then walk the list asking which of them
/// to purge
pub async fn run(
    config: &AppConfig,
    max_messages: usize,
    top: usize,
    filters: &Filters,
) -> Result<()> {
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
    println!();

    for (sender, count) in &ranked {
        let prompt = format!("Delete {} messages from '{}'? (y/n): ", count, sender);
        if confirm(&prompt)? {
            let (events, printer) = stdout_reporter();
            purge_sender(&client, sender, filters, &events).await?;
            drop(events);
            printer.await?;
        } else {
            println!("Skipped {}", sender);
        }
    }

    Ok(())
}
