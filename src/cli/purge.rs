use std::io::{self, Write};

use anyhow::Result;

use super::events::stdout_reporter;
use crate::core::AppConfig;
use crate::google::oauth::authenticate;
use crate::sweep::{Filters, purge_sender};

pub async fn run(
    config: &AppConfig,
    senders: &[String],
    filters: &Filters,
    yes: bool,
) -> Result<()> {
    if !yes {
        let prompt = format!(
            "Are you sure you want to delete emails from {} sender(s)? (y/n): ",
            senders.len()
        );
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let client = authenticate(config).await?;

    let mut total = 0u64;
    for sender in senders {
        println!("Deleting from {}...", sender);
        let (events, printer) = stdout_reporter();
        total += purge_sender(&client, sender, filters, &events).await?;
        drop(events);
        printer.await?;
    }
    println!("Deletion completed. {} messages removed.", total);

    Ok(())
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
