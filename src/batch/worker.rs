//! Worker loop: pulls cards off the shared queue and parses them with the
//! worker's own recognizer.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use super::queue::CardWorkItem;
use crate::card::ParsedCard;
use crate::correction::CorrectionRuleSet;
use crate::language::Language;
use crate::ocr::{TextRecognizer, read_card};
use crate::reconstruct::reconstruct;

/// What a worker needs besides its recognizer. Shared read-only by all workers.
pub struct WorkerContext<'a> {
    pub rules: &'a CorrectionRuleSet,
    pub image_dir: PathBuf,
    pub language: Language,
    pub debug_dir: Option<PathBuf>,
}

/// The result for one card. Failures keep only the message, so the batch can
/// carry on and report them at the end.
#[derive(Debug)]
pub struct CardOutcome {
    pub id: u32,
    pub result: Result<ParsedCard, String>,
    /// Correction keys that never applied to this card.
    pub leftovers: Vec<String>,
}

impl CardOutcome {
    pub fn is_failed(&self) -> bool {
        self.result.is_err()
    }

    pub fn has_leftovers(&self) -> bool {
        !self.leftovers.is_empty()
    }
}

/// Processes items until the queue is drained.
pub fn run_worker(
    worker_id: usize,
    receiver: &Mutex<Receiver<CardWorkItem>>,
    recognizer: &mut dyn TextRecognizer,
    context: &WorkerContext,
) -> Vec<CardOutcome> {
    debug!("Worker {} started", worker_id);
    let mut outcomes = Vec::new();

    loop {
        // Hold the lock only while waiting for the next item
        let next = receiver.lock().unwrap_or_else(PoisonError::into_inner).recv();
        match next {
            Ok(item) => outcomes.push(process_card(recognizer, item, context)),
            Err(_) => break,
        }
    }

    debug!("Worker {} finished after {} cards", worker_id, outcomes.len());
    outcomes
}

/// Parses one card. Errors and panics end up in the outcome, never in the caller.
pub fn process_card(recognizer: &mut dyn TextRecognizer, item: CardWorkItem, context: &WorkerContext) -> CardOutcome {
    let id = item.card.id;
    info!("Parsing card {}", id);

    match panic::catch_unwind(AssertUnwindSafe(|| parse_card(recognizer, item, context))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = format!("panicked: {}", panic_message(payload.as_ref()));
            error!("Card {} {}", id, message);
            CardOutcome {
                id,
                result: Err(message),
                leftovers: Vec::new(),
            }
        }
    }
}

fn parse_card(recognizer: &mut dyn TextRecognizer, item: CardWorkItem, context: &WorkerContext) -> CardOutcome {
    let CardWorkItem { card, mut corrections } = item;

    let parsed: Result<ParsedCard> = read_card(
        recognizer,
        &card,
        &context.image_dir,
        context.language,
        context.debug_dir.as_deref(),
    )
    .and_then(|ocr| Ok(reconstruct(&card, &ocr, context.rules, &mut corrections)?));

    let result = parsed.map_err(|e| {
        error!("Failed to parse card {}: {:#}", card.id, e);
        format!("{e:#}")
    });
    let leftovers = corrections.consumed().leftovers();
    if result.is_ok() && !leftovers.is_empty() {
        warn!("Card {} has corrections that were never applied: {:?}", card.id, leftovers);
    }

    CardOutcome {
        id: card.id,
        result,
        leftovers,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::queue::create_work_queue;
    use crate::card::{CardMetadata, CardType};
    use crate::correction::{CardCorrections, CorrectionTable};
    use crate::ocr::testing::FakeRecognizer;
    use image::GrayImage;
    use tempfile::tempdir;

    struct PanickingRecognizer;

    impl TextRecognizer for PanickingRecognizer {
        fn recognize(&mut self, _image: &GrayImage, _numeric_only: bool) -> Result<String> {
            panic!("engine crashed");
        }
    }

    fn rules() -> CorrectionRuleSet {
        CorrectionRuleSet::for_language(Language::English).unwrap()
    }

    fn card(id: u32) -> CardMetadata {
        CardMetadata {
            id,
            card_type: Some(CardType::Action),
            name: Some("Be Prepared".to_string()),
            enchanted: Some(false),
            identifier: Some(format!("{id}/204 • EN • 1")),
            ..CardMetadata::default()
        }
    }

    fn write_card_image(dir: &std::path::Path, id: u32) {
        let image = image::RgbaImage::from_pixel(1468, 2048, image::Rgba([230, 230, 230, 255]));
        image.save(dir.join(format!("{id}.png"))).unwrap();
    }

    #[test]
    fn test_missing_image_fails_only_that_card() {
        let rules = rules();
        let dir = tempdir().unwrap();
        let context = WorkerContext {
            rules: &rules,
            image_dir: dir.path().to_path_buf(),
            language: Language::English,
            debug_dir: None,
        };
        let mut recognizer = FakeRecognizer::default();

        let outcome = process_card(&mut recognizer, CardWorkItem::new(card(3), CardCorrections::default()), &context);
        assert_eq!(outcome.id, 3);
        assert!(outcome.is_failed());
        assert!(outcome.result.unwrap_err().contains("3.png"));
    }

    #[test]
    fn test_panic_is_caught() {
        let rules = rules();
        let dir = tempdir().unwrap();
        write_card_image(dir.path(), 5);
        let context = WorkerContext {
            rules: &rules,
            image_dir: dir.path().to_path_buf(),
            language: Language::English,
            debug_dir: None,
        };

        let outcome = process_card(&mut PanickingRecognizer, CardWorkItem::new(card(5), CardCorrections::default()), &context);
        assert_eq!(outcome.result.unwrap_err(), "panicked: engine crashed");
    }

    #[test]
    fn test_worker_drains_queue_and_reports_leftovers() {
        let rules = rules();
        let dir = tempdir().unwrap();
        write_card_image(dir.path(), 1);
        write_card_image(dir.path(), 2);
        let context = WorkerContext {
            rules: &rules,
            image_dir: dir.path().to_path_buf(),
            language: Language::English,
            debug_dir: None,
        };
        let mut table = CorrectionTable::from_json(r#"{"2": {"_effectAtIndexIsFlavorText": 4}}"#).unwrap();

        let (sender, receiver) = create_work_queue();
        for id in [1, 2] {
            sender.send(CardWorkItem::new(card(id), table.take(id))).unwrap();
        }
        drop(sender);

        let mut recognizer = FakeRecognizer::default();
        let outcomes = run_worker(0, &Mutex::new(receiver), &mut recognizer, &context);

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|outcome| !outcome.is_failed()));
        assert!(!outcomes[0].has_leftovers());
        assert_eq!(outcomes[1].leftovers, vec!["_effectAtIndexIsFlavorText"]);
    }
}
