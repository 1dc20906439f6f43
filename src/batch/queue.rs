//! Work queue feeding cards to the worker threads.
//!
//! All items are queued before the workers start; the sender is dropped right
//! after, so a worker's `recv` failing means the batch is drained.

use std::sync::mpsc::{Receiver, Sender, channel};

use crate::card::CardMetadata;
use crate::correction::CardCorrections;

/// One card to read, with its own slice of the correction table.
#[derive(Debug, Clone)]
pub struct CardWorkItem {
    pub card: CardMetadata,
    pub corrections: CardCorrections,
}

impl CardWorkItem {
    pub fn new(card: CardMetadata, corrections: CardCorrections) -> Self {
        Self { card, corrections }
    }
}

pub fn create_work_queue() -> (Sender<CardWorkItem>, Receiver<CardWorkItem>) {
    channel()
}
