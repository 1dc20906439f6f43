use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the region dump directory: `<exe_dir>/debug/`
pub fn get_debug_dir() -> PathBuf {
    get_exe_dir().join("debug")
}

/// Returns the bundled tesseract directory: `<exe_dir>/tesseract/`
pub fn get_tesseract_dir() -> PathBuf {
    get_exe_dir().join("tesseract")
}

/// Returns the default config file: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories(with_debug: bool) -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    if with_debug {
        std::fs::create_dir_all(get_debug_dir())?;
    }
    Ok(())
}
