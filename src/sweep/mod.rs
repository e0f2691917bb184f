//! The two core inbox operations: sender aggregation and bulk purge

pub mod aggregate;
pub mod purge;

pub use aggregate::top_senders;
pub use purge::{Filters, extract_email, purge_sender};

use tokio::sync::mpsc::UnboundedSender;

/// Events emitted by the core operations. The presentation layer
/// drains these from a channel; the core never mutates caller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepEvent {
    /// Human-readable narration of what is happening
    Log(String),
    /// 1-based progress through a known amount of work
    Progress { current: usize, total: usize },
}

pub type EventSender = UnboundedSender<SweepEvent>;

/// A dropped receiver means the caller stopped listening; the event is
/// discarded rather than treated as an error.
pub(crate) fn emit(events: &EventSender, event: SweepEvent) {
    let _ = events.send(event);
}
