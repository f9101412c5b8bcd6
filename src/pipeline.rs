//! The read -> normalize -> emit -> write pipeline.
//!
//! The whole input is read before anything is written, so a failure while
//! reading leaves any previous output file untouched.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::RunConfig;
use crate::error::ImportError;
use crate::normalize::{Normalizer, Resolution, ResolvedEmployee, SkipReason};
use crate::reader::read_employees;
use crate::record::EmployeeRecord;
use crate::sql::{SqlEmitter, SqlScript};
use crate::writer::{write_script, RunSummary};

/// A record left out of the output, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub employee_no: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of normalizing a batch of records
#[derive(Debug, Clone, Default)]
pub struct ResolvedBatch {
    pub employees: Vec<ResolvedEmployee>,
    pub skipped: Vec<SkippedRecord>,
    /// Employee numbers that appear more than once among resolved records
    pub duplicates: Vec<String>,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub skipped: Vec<SkippedRecord>,
    pub duplicates: Vec<String>,
}

impl RunReport {
    pub fn has_skips(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Normalize every record; a skipped record never stops the batch.
pub fn resolve_records(records: &[EmployeeRecord], normalizer: &Normalizer<'_>) -> ResolvedBatch {
    let mut batch = ResolvedBatch::default();
    let mut seen = HashSet::new();

    for record in records {
        match normalizer.normalize(record) {
            Resolution::Resolved(employee) => {
                if !seen.insert(employee.employee_no.clone()) {
                    tracing::warn!(
                        employee_no = %employee.employee_no,
                        "duplicate employee number in input, later row will be skipped by the database"
                    );
                    batch.duplicates.push(employee.employee_no.clone());
                }
                batch.employees.push(employee);
            }
            Resolution::Skipped(reason) => {
                batch.skipped.push(SkippedRecord {
                    employee_no: record.employee_no.clone(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        resolved = batch.employees.len(),
        skipped = batch.skipped.len(),
        "normalized employee records"
    );

    batch
}

fn summarize(config: &RunConfig, read: usize, batch: &ResolvedBatch) -> RunSummary {
    RunSummary {
        employees_read: read,
        employees_resolved: batch.employees.len(),
        employees_skipped: batch.skipped.len(),
        companies: config.mappings.companies.len(),
        departments: config.mappings.unique_departments().len(),
        jobs: config.mappings.jobs.len(),
    }
}

fn build(config: &RunConfig) -> Result<(RunReport, SqlScript), ImportError> {
    let records = read_employees(&config.input)?;
    let normalizer = Normalizer::new(&config.mappings);
    let batch = resolve_records(&records, &normalizer);

    let script = SqlEmitter::new(&config.mappings, config.database).emit(&batch.employees);

    let report = RunReport {
        summary: summarize(config, records.len(), &batch),
        skipped: batch.skipped,
        duplicates: batch.duplicates,
    };

    Ok((report, script))
}

/// Read, normalize and render without writing anything
pub fn validate(config: &RunConfig) -> Result<RunReport, ImportError> {
    build(config).map(|(report, _)| report)
}

/// Run the full pipeline and write the script to `config.output`
pub fn generate(config: &RunConfig) -> Result<RunReport, ImportError> {
    let (report, script) = build(config)?;
    write_script(&config.output, &script)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::Mappings;

    fn record(no: &str, company: &str, job: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_no: no.to_string(),
            name_ar: "اسم".to_string(),
            name_en: "Name".to_string(),
            department_ar: String::new(),
            job_ar: job.to_string(),
            company_ar: company.to_string(),
            nationality_ar: "إيران".to_string(),
            passport_no: String::new(),
            card_no: String::new(),
            card_expiry: None,
        }
    }

    #[test]
    fn test_unknown_company_does_not_stop_later_rows() {
        let records = vec![
            record("1", "ركس دبي (ش.ذ.م.م)", "محاسب"),
            record("2", "Unknown Co", "محاسب"),
            record("3", "اس كيو اف تي للمخازن العامة", "مراسل"),
        ];
        let batch = resolve_records(&records, &Normalizer::new(Mappings::builtin()));

        let numbers: Vec<&str> = batch.employees.iter().map(|e| e.employee_no.as_str()).collect();
        assert_eq!(numbers, vec!["1", "3"]);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].employee_no, "2");
        assert_eq!(
            batch.skipped[0].reason,
            SkipReason::UnknownCompany("Unknown Co".to_string())
        );
    }

    #[test]
    fn test_duplicates_are_reported_but_kept() {
        let records = vec![
            record("7", "ركس دبي (ش.ذ.م.م)", "محاسب"),
            record("7", "ركس دبي (ش.ذ.م.م)", "مراسل"),
        ];
        let batch = resolve_records(&records, &Normalizer::new(Mappings::builtin()));
        assert_eq!(batch.employees.len(), 2);
        assert_eq!(batch.duplicates, vec!["7".to_string()]);
    }

    #[test]
    fn test_skipped_record_serializes_flat() {
        let skipped = SkippedRecord {
            employee_no: "9".to_string(),
            reason: SkipReason::UnknownJob("طباخ".to_string()),
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["employee_no"], "9");
        assert_eq!(json["reason"], "unknown_job");
        assert_eq!(json["label"], "طباخ");
    }
}
