//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command loads its inputs fresh; nothing is cached between runs.

use crate::input::{load_config, load_scores, read_export, resolve_now, save_config, write_output};
use siee_core::{
    CohortReport, GradeId, InstitutionConfig, SieeError, StudentId, StudentReport, TermId,
    TransitionCheck, YearState, entry, evaluate_cohort,
    export::{canonical_checksum, canonical_crypto_hash, export_canonical, verify_canonical},
    lifecycle, validate_institution, window,
};
use std::path::Path;
use std::time::Instant;

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Log rejected students and per-student diagnostics.
fn log_findings(report: &CohortReport) {
    for rejected in &report.rejected {
        tracing::warn!(
            student = %rejected.student,
            "Student not evaluated: {}",
            rejected.reason
        );
    }
    for student in &report.students {
        for diagnostic in &student.diagnostics {
            tracing::warn!(student = %student.student, "{}", diagnostic);
        }
    }
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Validate the institution configuration.
pub fn cmd_validate(config_path: &Path, json_mode: bool) -> Result<(), SieeError> {
    let config = load_config(config_path)?;
    let report = validate_institution(&config);
    let blocking = report.blocking().count();

    if json_mode {
        let output = serde_json::json!({
            "config": config_path.to_string_lossy(),
            "valid": report.is_valid(),
            "issues": report.issues,
            "messages": report.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        print_json(&output);
    } else {
        println!("Configuration: {}", config.name);
        println!("Academic year: {} ({})", config.year.name, config.year.state);
        println!();
        if report.issues.is_empty() {
            println!("No issues found");
        }
        for issue in &report.issues {
            println!("  {}", issue);
        }
    }

    for warning in report.warnings() {
        tracing::warn!("{}", warning);
    }

    if blocking > 0 {
        return Err(SieeError::InvalidConfiguration(blocking));
    }
    tracing::info!("Configuration is valid");
    Ok(())
}

// =============================================================================
// EVALUATE COMMAND
// =============================================================================

fn evaluate(config: &InstitutionConfig, scores_path: &Path) -> Result<CohortReport, SieeError> {
    let sheet = load_scores(scores_path)?;
    tracing::info!(
        "Evaluating {} students ({} grade records) for year {}",
        sheet.students.len(),
        sheet.grades.len(),
        config.year.name
    );
    let started = Instant::now();
    let report = evaluate_cohort(config, &sheet);
    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Cohort evaluated"
    );
    log_findings(&report);
    Ok(report)
}

/// Evaluate a cohort and optionally write its canonical export.
pub fn cmd_evaluate(
    config_path: &Path,
    scores_path: &Path,
    output: Option<&Path>,
    student: Option<u64>,
    json_mode: bool,
) -> Result<(), SieeError> {
    let config = load_config(config_path)?;
    let report = evaluate(&config, scores_path)?;

    if let Some(path) = output {
        let data = export_canonical(&report)?;
        let written = write_output(path, &data)?;
        tracing::info!("Exported {} bytes to {:?}", data.len(), written);
    }

    if let Some(id) = student {
        let id = StudentId(id);
        if let Some(rejected) = report.rejected.iter().find(|r| r.student == id) {
            println!("Student {} was not evaluated: {}", id, rejected.reason);
            return Ok(());
        }
        let found = report.student(id).ok_or(SieeError::StudentNotFound(id))?;
        if json_mode {
            let output = serde_json::to_value(found)
                .map_err(|e| SieeError::SerializationError(e.to_string()))?;
            print_json(&output);
        } else {
            print_student(found);
        }
        return Ok(());
    }

    let summary = report.summary();
    tracing::info!(
        evaluated = summary.evaluated,
        promoted = summary.promoted,
        pending_recovery = summary.pending_recovery,
        "Evaluation complete"
    );

    if json_mode {
        let students: Vec<serde_json::Value> = report
            .students
            .iter()
            .map(|s| {
                serde_json::json!({
                    "student": s.student,
                    "grade": s.grade,
                    "status": s.promotion.status,
                    "diagnostics": s.diagnostics.len(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "year": report.year,
            "summary": summary,
            "students": students,
            "rejected": report.rejected,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Cohort Evaluation: {}", report.year);
    println!("==================");
    println!("Evaluated:              {}", summary.evaluated);
    println!("Rejected:               {}", summary.rejected);
    println!();
    println!("Promoted:               {}", summary.promoted);
    println!("Promoted provisionally: {}", summary.promoted_provisionally);
    println!("Pending recovery:       {}", summary.pending_recovery);
    println!("Not promoted:           {}", summary.not_promoted);
    println!("Blocked:                {}", summary.blocked);
    println!();
    println!("Diagnostics:            {}", summary.diagnostics);

    Ok(())
}

fn print_student(report: &StudentReport) {
    println!(
        "Student {} (grade {}, level {})",
        report.student, report.grade, report.level
    );
    println!();
    println!("Subjects:");
    for subject in &report.subjects {
        println!(
            "  {:>6}  area {:>4}  final {:.2}  {}",
            subject.subject,
            subject.area,
            subject.final_grade.grade,
            subject.performance.code().unwrap_or("-")
        );
    }
    println!();
    println!("Areas:");
    for area in &report.areas {
        match area.outcome() {
            Some(outcome) => println!(
                "  {:>6}  average {}  {}  recovery {:?}",
                area.area,
                outcome
                    .average
                    .map_or_else(|| "-".to_string(), |a| format!("{:.2}", a)),
                if outcome.is_approved { "approved" } else { "failed" },
                area.recovery
            ),
            None => println!("  {:>6}  blocked", area.area),
        }
    }
    println!();
    println!("Promotion: {:?}", report.promotion.status);
    if !report.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for diagnostic in &report.diagnostics {
            println!("  {}", diagnostic);
        }
    }
}

// =============================================================================
// WINDOW & ADMIT COMMANDS
// =============================================================================

/// Show the grading window status of every term.
pub fn cmd_window(
    config_path: &Path,
    now: Option<&str>,
    json_mode: bool,
) -> Result<(), SieeError> {
    let config = load_config(config_path)?;
    let now = resolve_now(now)?;
    let statuses = window::year_status(&config.year, now);

    if json_mode {
        let terms: Vec<serde_json::Value> = statuses
            .iter()
            .map(|(term, status)| serde_json::json!({ "term": term, "status": status }))
            .collect();
        print_json(&serde_json::json!({ "now": now.to_rfc3339(), "terms": terms }));
        return Ok(());
    }

    println!("Grading windows at {}", now.to_rfc3339());
    for (id, status) in statuses {
        let Some(term) = config.year.term(id) else {
            continue;
        };
        println!(
            "  {:>4}  {:<12} {:<9} {} .. {}",
            id,
            term.name,
            status,
            term.open_at.to_rfc3339(),
            term.close_at.to_rfc3339()
        );
    }
    Ok(())
}

/// Check whether a score may be entered for a term right now.
pub fn cmd_admit(
    config_path: &Path,
    term: u64,
    grade: u64,
    score: Option<f64>,
    now: Option<&str>,
    json_mode: bool,
) -> Result<(), SieeError> {
    let config = load_config(config_path)?;
    let level = config.level_of(GradeId(grade))?;
    let now = resolve_now(now)?;

    let admitted = entry::admit(&config.year, TermId(term), level, score, now)?;
    if admitted.clamped {
        tracing::warn!(
            "Score {:?} clamped into [{}, {}]",
            score,
            level.min_grade,
            level.max_grade
        );
    }

    if json_mode {
        print_json(&serde_json::json!({
            "term": term,
            "score": admitted.score,
            "clamped": admitted.clamped,
        }));
        return Ok(());
    }

    match admitted.score {
        Some(value) => println!("Accepted score {} for term {}", value, term),
        None => println!("Accepted as ungraded for term {}", term),
    }
    Ok(())
}

// =============================================================================
// LIFECYCLE COMMANDS
// =============================================================================

fn print_check(label: &str, check: &TransitionCheck, json_mode: bool) {
    if json_mode {
        print_json(&serde_json::json!({
            "transition": label,
            "valid": check.valid,
            "errors": check.errors,
        }));
        return;
    }
    if check.valid {
        println!("{}: allowed", label);
    } else {
        println!("{}: rejected", label);
        for error in &check.errors {
            println!("  {}", error);
        }
    }
}

/// Check the draft → active transition; with `apply`, persist it.
pub fn cmd_activate(config_path: &Path, apply: bool, json_mode: bool) -> Result<(), SieeError> {
    let mut config = load_config(config_path)?;
    let check = lifecycle::can_activate(&config.year);
    print_check("activate", &check, json_mode);

    if !check.valid {
        return Err(SieeError::TransitionRejected {
            to: YearState::Active,
            errors: check.errors,
        });
    }

    if apply {
        lifecycle::activate(&mut config.year)?;
        save_config(config_path, &config)?;
        tracing::info!("Academic year {} is now {}", config.year.name, config.year.state);
    }
    Ok(())
}

/// Check the active → closed transition; with `apply`, persist it.
pub fn cmd_close(
    config_path: &Path,
    scores_path: &Path,
    apply: bool,
    json_mode: bool,
) -> Result<(), SieeError> {
    let mut config = load_config(config_path)?;
    let report = evaluate(&config, scores_path)?;
    let check = lifecycle::can_close(&config.year, &report);
    print_check("close", &check, json_mode);

    if !check.valid {
        return Err(SieeError::TransitionRejected {
            to: YearState::Closed,
            errors: check.errors,
        });
    }

    if apply {
        lifecycle::close(&mut config.year, &report)?;
        save_config(config_path, &config)?;
        tracing::info!("Academic year {} is now {}", config.year.name, config.year.state);
    }
    Ok(())
}

// =============================================================================
// VERIFY & HASH COMMANDS
// =============================================================================

/// Compare a canonical export with a fresh evaluation of the same inputs.
pub fn cmd_verify(
    config_path: &Path,
    scores_path: &Path,
    input: &Path,
    json_mode: bool,
) -> Result<(), SieeError> {
    let data = read_export(input)?;
    let config = load_config(config_path)?;
    let report = evaluate(&config, scores_path)?;
    let matches = verify_canonical(&report, &data)?;

    if json_mode {
        print_json(&serde_json::json!({ "input": input.to_string_lossy(), "matches": matches }));
    } else if matches {
        println!("Export matches the current evaluation");
    } else {
        println!("Export differs from the current evaluation");
    }

    if !matches {
        return Err(SieeError::SerializationError(
            "Canonical export does not match the current evaluation".to_string(),
        ));
    }
    Ok(())
}

/// Compute BLAKE3 fingerprint and checksum of a cohort evaluation.
pub fn cmd_hash(config_path: &Path, scores_path: &Path, json_mode: bool) -> Result<(), SieeError> {
    let config = load_config(config_path)?;
    let report = evaluate(&config, scores_path)?;
    let hash = canonical_crypto_hash(&report)?;
    let checksum = canonical_checksum(&report)?;

    if json_mode {
        print_json(&serde_json::json!({
            "blake3": hash,
            "checksum": checksum,
            "students": report.students.len(),
        }));
        return Ok(());
    }

    println!("BLAKE3:   {}", hash);
    println!("Checksum: {}", checksum);
    println!("Students: {}", report.students.len());
    Ok(())
}
