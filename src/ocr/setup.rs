use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::language::Language;

#[cfg(windows)]
const TESSERACT_EXE: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_EXE: &str = "tesseract";

#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract use its compiled-in default.
    pub tessdata: Option<PathBuf>,
}

/// Per-user install location: `<data_local_dir>/card-ocr/tesseract`.
pub fn get_user_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("card-ocr")
        .join("tesseract")
}

/// Finds the Tesseract executable and tessdata directory.
///
/// Search order: explicit path from the config, `<exe_dir>/tesseract/`,
/// the per-user data dir, then `PATH`.
pub fn locate_tesseract(configured: Option<&Path>, configured_tessdata: Option<&Path>) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(configured)?;
    let tessdata = match configured_tessdata {
        Some(dir) if dir.is_dir() => Some(dir.to_path_buf()),
        Some(dir) => return Err(anyhow!("Configured tessdata dir {} does not exist", dir.display())),
        None => find_tessdata_dir(&executable),
    };

    info!(
        "Using Tesseract at {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    );

    Ok(TesseractPaths { executable, tessdata })
}

fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!("Configured Tesseract executable {} does not exist", path.display()));
    }

    for dir in [crate::paths::get_tesseract_dir(), get_user_tesseract_dir()] {
        let local_exe = dir.join(TESSERACT_EXE);
        if local_exe.exists() {
            return Ok(local_exe);
        }
    }

    // Check PATH
    if let Ok(output) = Command::new(TESSERACT_EXE).arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from(TESSERACT_EXE));
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR, put it in {}, or set tesseract_path in config.json",
        crate::paths::get_tesseract_dir().display()
    ))
}

/// A tessdata dir next to a local executable, or from `TESSDATA_PREFIX`.
fn find_tessdata_dir(executable: &Path) -> Option<PathBuf> {
    if let Some(local) = executable.parent().map(|p| p.join("tessdata")) {
        if local.is_dir() {
            return Some(local);
        }
    }

    let prefix = PathBuf::from(std::env::var("TESSDATA_PREFIX").ok()?);
    [prefix.clone(), prefix.join("tessdata")]
        .into_iter()
        .find(|p| p.is_dir())
}

pub(super) fn tesseract_command(paths: &TesseractPaths) -> Command {
    let mut command = Command::new(&paths.executable);
    if let Some(tessdata) = &paths.tessdata {
        command.arg("--tessdata-dir").arg(tessdata);
    }
    command
}

/// Languages the installed Tesseract has trained data for.
pub fn list_languages(paths: &TesseractPaths) -> Result<Vec<String>> {
    let output = tesseract_command(paths)
        .arg("--list-langs")
        .output()
        .with_context(|| format!("failed to run {} --list-langs", paths.executable.display()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
    }
    Ok(parse_language_list(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
    // First line is a header like: List of available languages in "/usr/share/tessdata/" (3):
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fails early when the trained data for `language` is missing, instead of on every card.
pub fn ensure_language(paths: &TesseractPaths, language: Language) -> Result<()> {
    let available = list_languages(paths)?;
    debug!("Tesseract languages: {}", available.join(", "));
    let wanted = language.three_letter_code();
    if available.iter().any(|lang| lang == wanted) {
        Ok(())
    } else {
        Err(anyhow!(
            "Tesseract has no trained data for '{}' (available: {})",
            wanted,
            available.join(", ")
        ))
    }
}
