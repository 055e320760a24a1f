//! # Input & Output Files
//!
//! Loading institution configuration, score sheets and canonical exports
//! from disk. Configuration may be TOML or JSON (chosen by extension);
//! score sheets are always JSON.

use chrono::{DateTime, Utc};
use siee_core::{InstitutionConfig, ScoreSheet, SieeError};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for institution configuration (10 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum file size for score sheets (200 MB).
///
/// A large school's full year of activity scores stays well below this.
const MAX_SCORES_FILE_SIZE: u64 = 200 * 1024 * 1024;

/// Maximum file size for canonical exports (500 MB).
const MAX_EXPORT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SieeError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SieeError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SieeError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and require it to be a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, SieeError> {
    let canonical = path.canonicalize().map_err(|e| {
        SieeError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SieeError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its (existing) parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, SieeError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SieeError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SieeError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SieeError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn read_text(path: &Path, max_size: u64) -> Result<String, SieeError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read_to_string(&validated)
        .map_err(|e| SieeError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// On-disk format of an institution configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from the file extension; anything but `.json` is TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Load an institution configuration.
pub fn load_config(path: &Path) -> Result<InstitutionConfig, SieeError> {
    let content = read_text(path, MAX_CONFIG_FILE_SIZE)?;
    match ConfigFormat::from_path(path) {
        ConfigFormat::Toml => toml::from_str(&content)
            .map_err(|e| SieeError::SerializationError(format!("Config: {}", e))),
        ConfigFormat::Json => serde_json::from_str(&content)
            .map_err(|e| SieeError::SerializationError(format!("Config: {}", e))),
    }
}

/// Write an institution configuration back in the format of its path.
pub fn save_config(path: &Path, config: &InstitutionConfig) -> Result<(), SieeError> {
    let content = match ConfigFormat::from_path(path) {
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| SieeError::SerializationError(format!("Config: {}", e)))?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| SieeError::SerializationError(format!("Config: {}", e)))?,
    };
    write_output(path, content.as_bytes()).map(|_| ())
}

// =============================================================================
// SCORES & EXPORTS
// =============================================================================

/// Load a JSON score sheet.
pub fn load_scores(path: &Path) -> Result<ScoreSheet, SieeError> {
    let content = read_text(path, MAX_SCORES_FILE_SIZE)?;
    serde_json::from_str(&content)
        .map_err(|e| SieeError::SerializationError(format!("Scores: {}", e)))
}

/// Read a canonical export file.
pub fn read_export(path: &Path) -> Result<Vec<u8>, SieeError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_EXPORT_FILE_SIZE)?;
    std::fs::read(&validated)
        .map_err(|e| SieeError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

/// Write bytes to an output file, returning the resolved path.
pub fn write_output(path: &Path, data: &[u8]) -> Result<PathBuf, SieeError> {
    let validated = validate_output_path(path)?;
    std::fs::write(&validated, data)
        .map_err(|e| SieeError::IoError(format!("Cannot write '{}': {}", path.display(), e)))?;
    Ok(validated)
}

// =============================================================================
// CLOCK
// =============================================================================

/// Parse an RFC 3339 instant, or read the system clock when absent.
pub fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>, SieeError> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                SieeError::SerializationError(format!("Invalid timestamp '{}': {}", raw, e))
            }),
        None => Ok(Utc::now()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
