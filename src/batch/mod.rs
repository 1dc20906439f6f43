//! Batch parsing: a pool of workers, each with its own recognizer, fed from
//! one queue. Results are collected and sorted once everything is done.

pub mod queue;
pub mod worker;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;

use anyhow::{Context, Result, bail};
use tracing::{error, info, warn};

use crate::card::{CardMetadata, ParsedCard};
use crate::correction::{CorrectionRuleSet, CorrectionTable};
use crate::language::Language;
use crate::ocr::TextRecognizer;
pub use queue::{CardWorkItem, create_work_queue};
pub use worker::{CardOutcome, WorkerContext, run_worker};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Worker count; 0 means one per CPU.
    pub threads: usize,
    pub image_dir: PathBuf,
    pub language: Language,
    /// Region bitmaps are written under this directory when set.
    pub debug_dir: Option<PathBuf>,
}

/// Counts shown to the user at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    /// Successfully parsed cards with at least one unused correction.
    pub with_leftover_corrections: usize,
    pub failed: usize,
    /// Cards in the correction table that weren't part of the batch.
    pub unknown_correction_ids: Vec<u32>,
}

impl BatchReport {
    fn from_outcomes(outcomes: &[CardOutcome], unknown_correction_ids: Vec<u32>) -> Self {
        Self {
            processed: outcomes.len(),
            with_leftover_corrections: outcomes
                .iter()
                .filter(|outcome| !outcome.is_failed() && outcome.has_leftovers())
                .count(),
            failed: outcomes.iter().filter(|outcome| outcome.is_failed()).count(),
            unknown_correction_ids,
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} cards: {} with leftover corrections, {} failed",
            self.processed, self.with_leftover_corrections, self.failed
        )?;
        if !self.unknown_correction_ids.is_empty() {
            write!(f, "; corrections for cards not in this batch: {:?}", self.unknown_correction_ids)?;
        }
        Ok(())
    }
}

pub struct BatchOutput {
    /// Sorted by card id.
    pub outcomes: Vec<CardOutcome>,
    pub report: BatchReport,
}

impl BatchOutput {
    pub fn parsed_cards(&self) -> impl Iterator<Item = &ParsedCard> {
        self.outcomes.iter().filter_map(|outcome| outcome.result.as_ref().ok())
    }
}

fn worker_count(requested: usize, cards: usize) -> usize {
    let threads = if requested == 0 { num_cpus::get() } else { requested };
    threads.clamp(1, cards.max(1))
}

/// Parses every card in `cards`.
///
/// `engine_factory` runs once per worker, on that worker's thread. A worker
/// whose engine can't be created logs the error and exits; if none start,
/// the batch fails.
pub fn run_batch<F>(
    cards: Vec<CardMetadata>,
    table: &mut CorrectionTable,
    rules: &CorrectionRuleSet,
    options: &BatchOptions,
    engine_factory: F,
) -> Result<BatchOutput>
where
    F: Fn(usize) -> Result<Box<dyn TextRecognizer>> + Sync,
{
    let workers = worker_count(options.threads, cards.len());
    info!("Parsing {} cards with {} workers", cards.len(), workers);

    let (sender, receiver) = create_work_queue();
    for card in cards {
        let corrections = table.take(card.id);
        sender
            .send(CardWorkItem::new(card, corrections))
            .context("Work queue closed before all cards were queued")?;
    }
    drop(sender);
    let unknown_correction_ids = table.remaining_ids();
    if !unknown_correction_ids.is_empty() {
        warn!(
            "Corrections exist for cards that aren't in this batch: {:?}",
            unknown_correction_ids
        );
    }

    let receiver = Mutex::new(receiver);
    let context = WorkerContext {
        rules,
        image_dir: options.image_dir.clone(),
        language: options.language,
        debug_dir: options.debug_dir.clone(),
    };

    let results: Vec<Option<Vec<CardOutcome>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let receiver = &receiver;
                let context = &context;
                let engine_factory = &engine_factory;
                scope.spawn(move || match engine_factory(worker_id) {
                    Ok(mut recognizer) => Some(run_worker(worker_id, receiver, recognizer.as_mut(), context)),
                    Err(e) => {
                        error!("Worker {} could not start its OCR engine: {:#}", worker_id, e);
                        None
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(worker_id, handle)| {
                handle.join().unwrap_or_else(|_| {
                    error!("Worker {} panicked outside of card processing", worker_id);
                    None
                })
            })
            .collect()
    });

    if results.iter().all(Option::is_none) {
        bail!("No OCR worker could be started");
    }

    let mut outcomes: Vec<CardOutcome> = results.into_iter().flatten().flatten().collect();
    outcomes.sort_by_key(|outcome| outcome.id);
    let report = BatchReport::from_outcomes(&outcomes, unknown_correction_ids);
    info!("{}", report);

    Ok(BatchOutput { outcomes, report })
}

/// Writes the parsed cards as a pretty JSON array.
pub fn write_parsed_cards(path: &Path, output: &BatchOutput) -> Result<()> {
    let cards: Vec<&ParsedCard> = output.parsed_cards().collect();
    let json = serde_json::to_string_pretty(&cards)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} parsed cards to {}", cards.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardType;
    use crate::ocr::testing::FakeRecognizer;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{TempDir, tempdir};

    fn card(id: u32) -> CardMetadata {
        CardMetadata {
            id,
            card_type: Some(CardType::Item),
            name: Some("Dinglehopper".to_string()),
            enchanted: Some(false),
            identifier: Some(format!("{id}/204 • EN • 1")),
            ..CardMetadata::default()
        }
    }

    fn image_dir(ids: &[u32]) -> TempDir {
        let dir = tempdir().unwrap();
        let image = image::RgbaImage::from_pixel(1468, 2048, image::Rgba([230, 230, 230, 255]));
        for id in ids {
            image.save(dir.path().join(format!("{id}.png"))).unwrap();
        }
        dir
    }

    fn options(dir: &TempDir, threads: usize) -> BatchOptions {
        BatchOptions {
            threads,
            image_dir: dir.path().to_path_buf(),
            language: Language::English,
            debug_dir: None,
        }
    }

    fn fake_engine(_worker: usize) -> Result<Box<dyn TextRecognizer>> {
        Ok(Box::new(FakeRecognizer::default()))
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(4, 2), 2);
        assert_eq!(worker_count(2, 10), 2);
        assert_eq!(worker_count(3, 0), 1);
        assert!(worker_count(0, 1000) >= 1);
    }

    #[test]
    fn test_batch_sorts_and_reports() {
        let dir = image_dir(&[3, 1, 2]);
        let rules = CorrectionRuleSet::for_language(Language::English).unwrap();
        let mut table = CorrectionTable::from_json(
            r#"{"2": {"_effectAtIndexIsFlavorText": 1}, "99": {"name": ["a", "b"]}}"#,
        )
        .unwrap();
        let cards = vec![card(3), card(1), card(2), card(4)];

        let output = run_batch(cards, &mut table, &rules, &options(&dir, 2), fake_engine).unwrap();

        let ids: Vec<u32> = output.outcomes.iter().map(|outcome| outcome.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(
            output.report,
            BatchReport {
                processed: 4,
                with_leftover_corrections: 1,
                failed: 1,
                unknown_correction_ids: vec![99],
            }
        );
        assert_eq!(output.parsed_cards().count(), 3);
        assert!(output.outcomes[3].is_failed());
    }

    #[test]
    fn test_engine_factory_runs_once_per_worker() {
        let dir = image_dir(&[1, 2, 3, 4]);
        let rules = CorrectionRuleSet::for_language(Language::English).unwrap();
        let created = AtomicUsize::new(0);
        let factory = |_worker: usize| -> Result<Box<dyn TextRecognizer>> {
            created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeRecognizer::default()))
        };

        let cards = (1..=4).map(card).collect();
        let output = run_batch(cards, &mut CorrectionTable::default(), &rules, &options(&dir, 2), factory).unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(output.report.processed, 4);
        assert_eq!(output.report.failed, 0);
    }

    #[test]
    fn test_no_worker_started_is_an_error() {
        let dir = image_dir(&[]);
        let rules = CorrectionRuleSet::for_language(Language::English).unwrap();
        let factory = |_worker: usize| -> Result<Box<dyn TextRecognizer>> { Err(anyhow!("tesseract not found")) };

        let result = run_batch(vec![card(1)], &mut CorrectionTable::default(), &rules, &options(&dir, 1), factory);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_parsed_cards() {
        let dir = image_dir(&[1]);
        let rules = CorrectionRuleSet::for_language(Language::English).unwrap();
        let output =
            run_batch(vec![card(1)], &mut CorrectionTable::default(), &rules, &options(&dir, 1), fake_engine).unwrap();

        let path = dir.path().join("out").join("cards.json");
        write_parsed_cards(&path, &output).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["id"], 1);
        assert_eq!(written[0]["type"], "item");
        assert_eq!(written[0]["name"], "Dinglehopper");
    }

    #[test]
    fn test_report_display() {
        let report = BatchReport {
            processed: 10,
            with_leftover_corrections: 2,
            failed: 1,
            unknown_correction_ids: vec![],
        };
        assert_eq!(report.to_string(), "Processed 10 cards: 2 with leftover corrections, 1 failed");
    }
}
