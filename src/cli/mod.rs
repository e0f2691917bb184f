use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod clean;
pub mod events;
pub mod purge;
pub mod scan;

use crate::core::AppConfig;
use crate::sweep::Filters;

/// Filters shared by the purge and clean commands. Values that do not
/// parse degrade to "no filter" instead of failing the command.
#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// Only messages whose subject or body contains this keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Only messages older than this many days
    #[arg(long, value_name = "DAYS")]
    older_than_days: Option<String>,

    /// Only messages received after this date (YYYY/MM/DD)
    #[arg(long, value_name = "DATE")]
    after: Option<String>,

    /// Only messages received before this date (YYYY/MM/DD)
    #[arg(long, value_name = "DATE")]
    before: Option<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Filters {
        Filters::from_raw(
            self.keyword.as_deref(),
            self.older_than_days.as_deref(),
            self.after.as_deref(),
            self.before.as_deref(),
        )
    }
}

#[derive(Subcommand)]
enum Command {
    /// Perform OAuth consent and store the resulting token
    Auth {},
    /// Rank the most frequent senders in the inbox
    Scan {
        /// Cap on the number of messages scanned
        #[arg(long, default_value = "3000")]
        max_messages: usize,

        /// Number of senders to report
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Delete messages from the given senders
    Purge {
        /// Sender to purge; repeat the flag for several
        #[arg(long, required = true)]
        sender: Vec<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Skip the confirmation prompt
        #[arg(long, action, default_value = "false")]
        yes: bool,
    },
    /// Scan, then choose interactively which senders to purge
    Clean {
        #[arg(long, default_value = "3000")]
        max_messages: usize,

        #[arg(long, default_value = "10")]
        top: usize,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let config = AppConfig::default();

    match args.command {
        Command::Auth {} => {
            auth::run(&config).await?;
        }
        Command::Scan { max_messages, top } => {
            scan::run(&config, max_messages, top).await?;
        }
        Command::Purge {
            sender,
            filters,
            yes,
        } => {
            purge::run(&config, &sender, &filters.to_filters(), yes).await?;
        }
        Command::Clean {
            max_messages,
            top,
            filters,
        } => {
            clean::run(&config, max_messages, top, &filters.to_filters()).await?;
        }
    }

    Ok(())
}
