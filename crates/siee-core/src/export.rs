//! # Canonical Export Module
//!
//! Bit-exact `postcard` encoding of a [`CohortReport`].
//!
//! The orchestrator persists results through an external store and may retry
//! a failed save. Comparing canonical exports (or their checksums) tells it
//! whether the retried run produced exactly the same decisions.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [CanonicalHeader (postcard)] [CohortReport (postcard)]
//! ```

use crate::pipeline::CohortReport;
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES};
use crate::types::SieeError;
use serde::{Deserialize, Serialize};

/// Maximum student count accepted on import.
///
/// Checked against the header before the body is decoded.
pub const MAX_IMPORT_STUDENT_COUNT: u64 = 1_000_000;

// =============================================================================
// HEADER
// =============================================================================

/// Header for canonical export files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalHeader {
    pub magic: [u8; 4],
    pub version: u8,
    /// Number of evaluated students.
    pub student_count: u64,
    /// Number of rejected students.
    pub rejected_count: u64,
    /// Checksum of the data section.
    pub checksum: u64,
}

impl CanonicalHeader {
    /// Create a header for the given counts.
    #[must_use]
    pub fn new(student_count: u64, rejected_count: u64, checksum: u64) -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            student_count,
            rejected_count,
            checksum,
        }
    }

    /// Validate magic bytes and version.
    pub fn validate(&self) -> Result<(), SieeError> {
        if &self.magic != MAGIC_BYTES {
            return Err(SieeError::SerializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(SieeError::SerializationError(
                "Unsupported file version".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// CHECKSUM
// =============================================================================

/// Deterministic checksum of a byte stream.
///
/// Rotate-and-XOR over every byte and its position. Detects accidental
/// corruption and unequal exports; it is **not** collision resistant. Enable
/// the `crypto-hash` feature for a BLAKE3 fingerprint.
#[must_use]
pub fn checksum(data: &[u8]) -> u64 {
    data.iter()
        .enumerate()
        .fold(0u64, |hash, (position, byte)| {
            hash.rotate_left(5) ^ u64::from(*byte) ^ (position as u64).rotate_left(29)
        })
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

fn canonical(report: &CohortReport) -> CohortReport {
    let mut canonical = report.clone();
    canonical.students.sort_by_key(|s| s.student);
    canonical.rejected.sort_by_key(|r| r.student);
    canonical
}

fn encode_body(report: &CohortReport) -> Result<Vec<u8>, SieeError> {
    postcard::to_allocvec(&canonical(report))
        .map_err(|e| SieeError::SerializationError(format!("Data: {}", e)))
}

/// Export a cohort report to canonical postcard format.
///
/// # Errors
///
/// Returns `SieeError::SerializationError` if serialization fails.
pub fn export_canonical(report: &CohortReport) -> Result<Vec<u8>, SieeError> {
    let data_bytes = encode_body(report)?;
    let header = CanonicalHeader::new(
        report.students.len() as u64,
        report.rejected.len() as u64,
        checksum(&data_bytes),
    );

    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| SieeError::SerializationError(format!("Header: {}", e)))?;

    let mut result = Vec::with_capacity(4 + header_bytes.len() + data_bytes.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&data_bytes);

    Ok(result)
}

/// Import a cohort report from canonical postcard format.
///
/// # Errors
///
/// Returns `SieeError::SerializationError` if the data is truncated,
/// corrupted, from another format version, or over the size limit.
pub fn import_canonical(data: &[u8]) -> Result<CohortReport, SieeError> {
    let Some((len_bytes, rest)) = data.split_first_chunk::<4>() else {
        return Err(SieeError::SerializationError("Data too short".to_string()));
    };
    let header_len = u32::from_le_bytes(*len_bytes) as usize;

    let Some((header_bytes, data_bytes)) = rest.split_at_checked(header_len) else {
        return Err(SieeError::SerializationError(
            "Data too short for header".to_string(),
        ));
    };

    let header: CanonicalHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| SieeError::SerializationError(format!("Header: {}", e)))?;
    header.validate()?;

    if header.student_count > MAX_IMPORT_STUDENT_COUNT {
        return Err(SieeError::SerializationError(format!(
            "Student count {} exceeds maximum allowed {}",
            header.student_count, MAX_IMPORT_STUDENT_COUNT
        )));
    }

    let computed = checksum(data_bytes);
    if computed != header.checksum {
        return Err(SieeError::SerializationError(format!(
            "Checksum mismatch: expected {}, got {}",
            header.checksum, computed
        )));
    }

    let report: CohortReport = postcard::from_bytes(data_bytes)
        .map_err(|e| SieeError::SerializationError(format!("Data: {}", e)))?;

    if report.students.len() as u64 != header.student_count {
        return Err(SieeError::SerializationError(
            "Student count mismatch".to_string(),
        ));
    }
    if report.rejected.len() as u64 != header.rejected_count {
        return Err(SieeError::SerializationError(
            "Rejected count mismatch".to_string(),
        ));
    }

    Ok(report)
}

/// Check whether a report matches a canonical export.
pub fn verify_canonical(report: &CohortReport, canonical_data: &[u8]) -> Result<bool, SieeError> {
    let imported = import_canonical(canonical_data)?;
    Ok(canonical(report) == imported)
}

/// Checksum of a report's canonical data section.
pub fn canonical_checksum(report: &CohortReport) -> Result<u64, SieeError> {
    encode_body(report).map(|bytes| checksum(&bytes))
}

// =============================================================================
// CRYPTOGRAPHIC FINGERPRINT
// =============================================================================

/// BLAKE3 hash of the canonical export, as 64 hex characters.
///
/// Only available with the `crypto-hash` feature.
#[cfg(feature = "crypto-hash")]
pub fn canonical_crypto_hash(report: &CohortReport) -> Result<String, SieeError> {
    export_canonical(report).map(|data| compute_blake3_hash(&data))
}

/// BLAKE3 hash of raw bytes, as 64 hex characters.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn compute_blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
