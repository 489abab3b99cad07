//! CSV ingestion for the processed cohort table.
//!
//! Expected shape: one row per (subject, visit) with `subjid` and `age_months`
//! columns plus one column per milestone (headers starting with `ddi`),
//! coded -1 = untested, 0 = not achieved, 1 = achieved.

use std::path::Path;

use tracing::info;

use stride_core::{Cohort, MilestoneId, Observation, Outcome, MILESTONE_PREFIX};

/// Errors raised while ingesting a cohort table.
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A cell could not be parsed
    #[error("row {row}: invalid value {value:?} in column {column}")]
    InvalidValue {
        /// 1-based data row number
        row: usize,
        /// Column name
        column: String,
        /// Offending cell content
        value: String,
    },
}

const SUBJECT_COLUMN: &str = "subjid";
const AGE_COLUMN: &str = "age_months";

/// Load a cohort from a processed milestones CSV file.
pub fn load_cohort(path: impl AsRef<Path>) -> Result<Cohort, CohortError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let subject_idx = column_index(&headers, SUBJECT_COLUMN)?;
    let age_idx = column_index(&headers, AGE_COLUMN)?;

    // Milestone columns follow the naming convention; everything else
    // (sex, agedays, ...) is carried by the table but not consumed here.
    let milestone_columns: Vec<(usize, MilestoneId)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with(MILESTONE_PREFIX))
        .map(|(idx, name)| (idx, MilestoneId::from(name)))
        .collect();

    let milestones: Vec<MilestoneId> = milestone_columns
        .iter()
        .map(|(_, id)| id.clone())
        .collect();
    let mut cohort = Cohort::new(milestones);

    for (row_number, record) in reader.records().enumerate() {
        let record = record?;
        let row = row_number + 1;

        let subject = field(&record, subject_idx, SUBJECT_COLUMN, row)?.to_string();
        let age_field = field(&record, age_idx, AGE_COLUMN, row)?;
        let age_months: f64 = age_field.parse().map_err(|_| CohortError::InvalidValue {
            row,
            column: AGE_COLUMN.to_string(),
            value: age_field.to_string(),
        })?;

        let mut observation = Observation::new(age_months);
        for (idx, milestone) in &milestone_columns {
            let cell = field(&record, *idx, milestone.as_str(), row)?;
            // Empty cells mean the milestone was not part of this visit.
            if cell.is_empty() {
                continue;
            }
            let code: i64 = cell.parse().map_err(|_| CohortError::InvalidValue {
                row,
                column: milestone.to_string(),
                value: cell.to_string(),
            })?;
            let outcome = Outcome::from_code(code).ok_or_else(|| CohortError::InvalidValue {
                row,
                column: milestone.to_string(),
                value: cell.to_string(),
            })?;
            observation = observation.record(milestone.clone(), outcome);
        }
        cohort.push(subject, observation);
    }

    info!(
        rows = cohort.row_count(),
        subjects = cohort.subject_count(),
        milestones = cohort.milestones().len(),
        path = %path.display(),
        "loaded cohort"
    );
    Ok(cohort)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, CohortError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CohortError::MissingColumn(name.to_string()))
}

fn field<'a>(
    record: &'a csv::StringRecord,
    idx: usize,
    column: &str,
    row: usize,
) -> Result<&'a str, CohortError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| CohortError::InvalidValue {
            row,
            column: column.to_string(),
            value: String::new(),
        })
}
