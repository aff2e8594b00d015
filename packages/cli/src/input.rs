//! Reading incidents and reports from JSON files.

use std::path::Path;

use danger_map_incident_models::{Incident, IncidentError, ReportRecord};

use crate::CliError;

/// Which JSON shape the input file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// An array of [`Incident`]s.
    Incidents,
    /// An array of [`ReportRecord`]s, converted on load.
    Reports,
}

/// Keeps a record if it converted and validated, otherwise warns and drops
/// it, or fails when `strict`.
fn admit(
    record: Result<Incident, IncidentError>,
    strict: bool,
    kept: &mut Vec<Incident>,
) -> Result<(), CliError> {
    match record.and_then(|incident| incident.validate().map(|()| incident)) {
        Ok(incident) => kept.push(incident),
        Err(e) if strict => return Err(e.into()),
        Err(e) => log::warn!("Skipping record: {e}"),
    }
    Ok(())
}

/// Parses a JSON array of incidents and validates each one.
///
/// # Errors
///
/// * If the text is not a JSON array of incidents
/// * If `strict` and any incident has an invalid position
pub fn parse_incidents(text: &str, strict: bool) -> Result<Vec<Incident>, CliError> {
    let records: Vec<Incident> = serde_json::from_str(text)?;
    let total = records.len();

    let mut kept = Vec::with_capacity(total);
    for incident in records {
        admit(Ok(incident), strict, &mut kept)?;
    }

    log::info!("Loaded {} of {total} incidents", kept.len());
    Ok(kept)
}

/// Parses a JSON array of reports, converting and validating each one.
///
/// # Errors
///
/// * If the text is not a JSON array of reports
/// * If `strict` and any report has an invalid position or timestamp
pub fn parse_reports(text: &str, strict: bool) -> Result<Vec<Incident>, CliError> {
    let records: Vec<ReportRecord> = serde_json::from_str(text)?;
    let total = records.len();

    let mut kept = Vec::with_capacity(total);
    for report in records {
        admit(Incident::try_from(report), strict, &mut kept)?;
    }

    log::info!("Converted {} of {total} reports", kept.len());
    Ok(kept)
}

/// Reads and parses an input file.
///
/// # Errors
///
/// * If the file cannot be read
/// * Any error of [`parse_incidents`] or [`parse_reports`]
pub fn load(path: &Path, kind: InputKind, strict: bool) -> Result<Vec<Incident>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Read {} bytes from {}", text.len(), path.display());

    match kind {
        InputKind::Incidents => parse_incidents(&text, strict),
        InputKind::Reports => parse_reports(&text, strict),
    }
}
