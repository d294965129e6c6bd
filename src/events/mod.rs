use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::{
    payable::PayableStatus, phase::PhaseStatus, quote::QuoteStatus,
    receivable::ReceivableStatus,
};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

/// Domain events published after a mutation commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    QuoteCreated {
        quote_id: i32,
        job_site_id: i32,
        version: i32,
    },
    QuoteStatusChanged {
        quote_id: i32,
        old_status: QuoteStatus,
        new_status: QuoteStatus,
    },
    QuoteRecomputed {
        quote_id: i32,
        total_amount: Decimal,
        final_amount: Decimal,
    },
    QuoteDocumentIssued {
        quote_id: i32,
        document_ref: String,
    },
    PhaseStatusChanged {
        phase_id: i32,
        old_status: PhaseStatus,
        new_status: PhaseStatus,
    },
    ReceivableSpawned {
        receivable_id: i32,
        phase_id: i32,
        amount: Decimal,
    },
    ReceivableStatusChanged {
        receivable_id: i32,
        new_status: ReceivableStatus,
    },
    AllocationConfirmed(i32),
    ProductionRecorded {
        entry_id: i32,
        quote_id: i32,
        final_value: Decimal,
    },
    PayableCreated {
        payable_id: i32,
        items: usize,
        failed_items: usize,
    },
    PayableStatusChanged {
        payable_id: i32,
        new_status: PayableStatus,
    },
}

/// Drains the event channel, logging each event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::QuoteStatusChanged {
                quote_id,
                old_status,
                new_status,
            } => {
                info!(quote_id, %old_status, %new_status, "Quote status changed");
            }
            Event::ReceivableSpawned {
                receivable_id,
                phase_id,
                amount,
            } => {
                info!(receivable_id, phase_id, %amount, "Receivable opened for completed phase");
            }
            Event::PayableCreated {
                payable_id,
                items,
                failed_items,
            } if failed_items > 0 => {
                warn!(
                    payable_id,
                    items, failed_items, "Payable created with missing items"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sent_events_reach_the_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender.send(Event::AllocationConfirmed(7)).await.unwrap();

        match rx.recv().await {
            Some(Event::AllocationConfirmed(id)) => assert_eq!(id, 7),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_tolerates_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::AllocationConfirmed(1)).await.is_err());
        sender.send_or_log(Event::AllocationConfirmed(1)).await;
    }
}
