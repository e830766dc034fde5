//! Event delivery from the engine to observers
//!
//! Producers never wait on observers: events go into an unbounded channel and
//! the observer drains it at its own pace.

use crate::network::RankedNetwork;
use std::net::IpAddr;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Everything the engine reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One completed scan cycle, strongest network first
    ScanResult(Vec<RankedNetwork>),
    /// Connect attempt progress, 0-100
    ConnectProgress { percent: u8 },
    /// Terminal outcome of a connect attempt
    ConnectResult {
        success: bool,
        identity: String,
        address: Option<IpAddr>,
    },
}

/// Publishing half, cheap to clone into every background task
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<Event>,
}

/// Receiving half held by the observer
#[derive(Debug)]
pub struct EventStream {
    rx: UnboundedReceiver<Event>,
}

impl Notifier {
    pub fn channel() -> (Notifier, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, EventStream { rx })
    }

    /// Queue an event; a departed observer is not an error for the producer
    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event dropped, observer gone");
        }
    }

    pub fn scan_result(&self, networks: Vec<RankedNetwork>) {
        self.publish(Event::ScanResult(networks));
    }

    pub fn connect_progress(&self, percent: u8) {
        self.publish(Event::ConnectProgress {
            percent: percent.min(100),
        });
    }

    pub fn connect_result(&self, success: bool, identity: &str, address: Option<IpAddr>) {
        self.publish(Event::ConnectResult {
            success,
            identity: identity.to_string(),
            address,
        });
    }
}

impl EventStream {
    /// Wait for the next event; `None` once every notifier is dropped
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take an event if one is already queued
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}
