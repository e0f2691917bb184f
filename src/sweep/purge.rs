use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;

use super::{EventSender, SweepEvent, emit};
use crate::google::gmail::GmailClient;

/// Optional constraints narrowing which of a sender's messages a purge
/// targets. Absent fields apply no constraint; nothing links the
/// fields to each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub keyword: Option<String>,
    pub older_than_days: Option<u32>,
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
}

impl Filters {
    /// Normalize raw user input. Empty, zero, or unparsable values
    /// mean "no filter" rather than an error.
    pub fn from_raw(
        keyword: Option<&str>,
        older_than_days: Option<&str>,
        after: Option<&str>,
        before: Option<&str>,
    ) -> Self {
        Self {
            keyword: keyword
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            older_than_days: older_than_days
                .and_then(|n| n.trim().parse().ok())
                .filter(|n| *n >= 1),
            after: after.and_then(parse_date),
            before: before.and_then(parse_date),
        }
    }
}

/// Gmail's query language wants YYYY/MM/DD
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y/%m/%d").ok()
}

/// Pull the bare address out of a `Display Name <address>` sender.
/// Senders without the angle-bracket form pass through trimmed.
pub fn extract_email(sender: &str) -> String {
    let re = Regex::new(r"<(.+?)>").unwrap();
    match re.captures(sender).and_then(|caps| caps.get(1)) {
        Some(address) => address.as_str().to_string(),
        None => sender.trim().to_string(),
    }
}

/// Assemble the Gmail search query for one sender plus filters.
/// The keyword clause matches the subject or the full text body and is
/// passed through unescaped; its semantics belong to the provider.
pub fn build_query(address: &str, filters: &Filters) -> String {
    let mut clauses = vec![format!("from:{}", address)];
    if let Some(keyword) = &filters.keyword {
        clauses.push(format!("(subject:{keyword} OR {keyword})"));
    }
    if let Some(days) = filters.older_than_days {
        clauses.push(format!("older_than:{days}d"));
    }
    if let Some(after) = filters.after {
        clauses.push(format!("after:{}", after.format("%Y/%m/%d")));
    }
    if let Some(before) = filters.before {
        clauses.push(format!("before:{}", before.format("%Y/%m/%d")));
    }
    clauses.join(" ")
}

/// Delete every message matching the sender and filters, narrating
/// through the event channel. Individual delete failures are logged
/// and skipped; the count of successful deletions is returned.
pub async fn purge_sender(
    client: &GmailClient,
    sender: &str,
    filters: &Filters,
    events: &EventSender,
) -> Result<u64> {
    let address = extract_email(sender);
    let query = build_query(&address, filters);
    emit(events, SweepEvent::Log(format!("Using query: {}", query)));

    // The search listing is drained across every result page so the
    // purge sees the whole candidate set
    let ids = client.collect_message_ids(None, Some(&query), None).await?;
    if ids.is_empty() {
        emit(
            events,
            SweepEvent::Log(format!("No messages found for query from {}", address)),
        );
        return Ok(0);
    }

    let total = ids.len();
    let mut deleted = 0u64;
    for (index, id) in ids.iter().enumerate() {
        match client.delete_message(id).await {
            Ok(()) => deleted += 1,
            Err(err) => emit(
                events,
                SweepEvent::Log(format!("Failed to delete message {}: {}", id, err)),
            ),
        }
        emit(
            events,
            SweepEvent::Progress {
                current: index + 1,
                total,
            },
        );
    }

    emit(
        events,
        SweepEvent::Log(format!("Deleted {} messages from {}", deleted, address)),
    );
    Ok(deleted)
}
