//! Renders core sweep events to the terminal

use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;

use crate::sweep::{EventSender, SweepEvent};

/// Create an event channel plus a task that prints everything the
/// core narrates. Drop the sender, then await the handle to flush the
/// remaining events.
pub fn stdout_reporter() -> (EventSender, JoinHandle<()>) {
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(drain(rx));
    (tx, handle)
}

async fn drain(mut rx: UnboundedReceiver<SweepEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            SweepEvent::Log(line) => println!("{}", line),
            SweepEvent::Progress { current, total } => println!("[{}/{}]", current, total),
        }
    }
}
