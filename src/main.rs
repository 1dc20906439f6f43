//! Card OCR
//!
//! Reads trading card scans with Tesseract and rebuilds the structured card:
//! name, stats, subtypes, abilities and full text. Known misreads are fixed
//! by generic rules plus a per-card correction table.

mod batch;
mod card;
mod config;
mod correction;
mod identifier;
mod language;
mod layout;
mod locator;
mod logging;
mod ocr;
mod paths;
mod reconstruct;
mod symbols;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use batch::{BatchOptions, BatchOutput};
use correction::{CorrectionRuleSet, CorrectionTable};
use language::Language;
use ocr::{TesseractEngine, TextRecognizer};

#[derive(Parser, Debug)]
#[command(version, about = "Parse trading card images into structured card data")]
struct Args {
    /// JSON list of card metadata records to parse
    #[arg(long)]
    manifest: PathBuf,
    /// Directory holding the card images
    #[arg(long)]
    images: Option<PathBuf>,
    /// Card-specific correction table (JSON keyed by card id)
    #[arg(long)]
    corrections: Option<PathBuf>,
    /// Card language: en, fr, de or it
    #[arg(long)]
    language: Option<Language>,
    /// Worker threads, 0 for one per CPU
    #[arg(long)]
    threads: Option<usize>,
    /// Write the parsed cards to this JSON file
    #[arg(long)]
    output: Option<PathBuf>,
    /// Only parse these card ids
    #[arg(long, value_delimiter = ',')]
    only: Vec<u32>,
    /// Debug logging
    #[arg(long, short)]
    verbose: bool,
    /// Print how often each correction rule fired
    #[arg(long)]
    rule_stats: bool,
    /// Save every cropped region image under debug/<card id>/
    #[arg(long)]
    save_regions: bool,
    /// Config file, defaults to config.json next to the executable
    #[arg(long)]
    config: Option<PathBuf>,
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join(logging::LOG_FILE_NAME);
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            use std::io::Write;
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));
}

fn main() -> ExitCode {
    let args = Args::parse();
    install_panic_hook();

    let config_path = args.config.clone().unwrap_or_else(paths::get_config_path);
    let config = config::init_config(&config_path);
    let save_regions = args.save_regions || config.save_region_images;

    if let Err(e) = paths::ensure_directories(save_regions) {
        eprintln!("Failed to create output directories: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = logging::init(logging::level_for(args.verbose, &config.log_level)) {
        eprintln!("Failed to set up logging: {:#}", e);
        return ExitCode::FAILURE;
    }
    config::log_load_result();

    match run(&args, config, save_regions) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &config::AppConfig, save_regions: bool) -> Result<()> {
    let language = args.language.unwrap_or(config.language);

    let mut cards = card::load_manifest(&args.manifest)?;
    if !args.only.is_empty() {
        cards.retain(|card| args.only.contains(&card.id));
        info!("Limited to {} cards from --only", cards.len());
    }

    let rules = CorrectionRuleSet::for_language(language).context("Failed to build correction rules")?;
    let mut table = match args.corrections.as_ref().or(config.correction_table.as_ref()) {
        Some(path) => CorrectionTable::load(path, language)?,
        None => {
            info!("No correction table given");
            CorrectionTable::default()
        }
    };

    let tesseract = ocr::locate_tesseract(config.tesseract_path.as_deref(), config.tessdata_dir.as_deref())?;
    ocr::ensure_language(&tesseract, language)?;

    let options = BatchOptions {
        threads: args.threads.unwrap_or(config.threads),
        image_dir: args.images.clone().unwrap_or_else(|| config.image_dir.clone()),
        language,
        debug_dir: save_regions.then(paths::get_debug_dir),
    };
    let output = batch::run_batch(cards, &mut table, &rules, &options, |_worker| {
        Ok(Box::new(TesseractEngine::new(tesseract.clone(), language)) as Box<dyn TextRecognizer>)
    })?;

    print_summary(&output);
    if let Some(path) = &args.output {
        batch::write_parsed_cards(path, &output)?;
    }
    if args.rule_stats {
        print_rule_stats(&rules);
    }
    Ok(())
}

fn print_summary(output: &BatchOutput) {
    println!("{}", output.report);
    for outcome in &output.outcomes {
        match &outcome.result {
            Err(message) => println!("  card {} failed: {}", outcome.id, message),
            Ok(_) if outcome.has_leftovers() => {
                println!("  card {} unused corrections: {}", outcome.id, outcome.leftovers.join(", "))
            }
            Ok(_) => {}
        }
    }
}

fn print_rule_stats(rules: &CorrectionRuleSet) {
    let counts = rules.hit_counts();
    println!("Correction rule hits:");
    for (name, hits) in counts.iter().filter(|(_, hits)| *hits > 0) {
        println!("  {:>6}  {}", hits, name);
    }
    let unused: Vec<&str> = counts.iter().filter(|(_, hits)| *hits == 0).map(|(name, _)| *name).collect();
    if !unused.is_empty() {
        println!("Rules that never fired: {}", unused.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::parse_from([
            "card-ocr",
            "--manifest",
            "cards.json",
            "--language",
            "de",
            "--only",
            "3,5,8",
            "--rule-stats",
        ]);
        assert_eq!(args.manifest, PathBuf::from("cards.json"));
        assert_eq!(args.language, Some(Language::German));
        assert_eq!(args.only, vec![3, 5, 8]);
        assert!(args.rule_stats);
        assert!(!args.verbose);
        assert_eq!(args.threads, None);
    }

    #[test]
    fn test_manifest_is_required() {
        assert!(Args::try_parse_from(["card-ocr"]).is_err());
    }
}
