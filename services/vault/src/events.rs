//! Event delivery
//!
//! The engine hands every committed [`VaultEvent`] to each registered sink in
//! registration order. Sinks must not fail; a sink that cannot deliver logs
//! and drops the event.

use parking_lot::Mutex;
use router_types::VaultEvent;
use tracing::{info, warn};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &VaultEvent);
}

/// Writes each event as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &VaultEvent) {
        match event.to_json() {
            Ok(json) => info!(
                target: "vault_events",
                event = event.name(),
                pair = ?event.pair(),
                "{}",
                json
            ),
            Err(e) => warn!(target: "vault_events", event = event.name(), "Unserializable event: {}", e),
        }
    }
}

/// Keeps every event in memory, for tests and the keeper's summary
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<VaultEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<VaultEvent> {
        self.events.lock().clone()
    }

    pub fn last(&self) -> Option<VaultEvent> {
        self.events.lock().last().cloned()
    }

    /// Number of recorded events with the given canonical name
    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name() == name).count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &VaultEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_types::{Address, PairId};

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.emit(&VaultEvent::Paused {
            by: Address::from_low_u64(1),
        });
        sink.emit(&VaultEvent::FeeCollected {
            pair: PairId::new(0),
            amount: 2,
            total_fees: 2,
        });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.count("FeeCollected"), 1);
        assert_eq!(sink.last().map(|e| e.name()), Some("FeeCollected"));

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        TracingSink.emit(&VaultEvent::Unpaused {
            by: Address::from_low_u64(9),
        });
    }
}
