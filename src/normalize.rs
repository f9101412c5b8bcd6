//! Normalization of raw employee records against the lookup tables.
//!
//! Company and job resolution is strict: an unknown label drops the record.
//! Nationality resolution is permissive: an unknown label is kept verbatim.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::ImportError;
use crate::lookup::{LookupEntry, Mappings};
use crate::record::EmployeeRecord;

/// Smallest day count read as a spreadsheet serial date (1927-05-18).
/// Shorter all-digit values are more likely years or partial input.
const MIN_SERIAL_DAY: u64 = 10_000;

/// Serial day of 9999-12-31
const MAX_SERIAL_DAY: u64 = 2_958_465;

/// Normalize an employee number as exported by a spreadsheet.
///
/// Values in exponential notation (`1.23457E+11`) are expanded with exact
/// decimal arithmetic and truncated to an integer. Anything else has its
/// period separators removed. Already-normalized values are returned as is.
pub fn normalize_employee_number(raw: &str) -> Result<String, ImportError> {
    let value = raw.trim();

    if value.contains("E+") || value.contains("e+") {
        return expand_scientific(value);
    }

    Ok(value.replace('.', "").trim().to_string())
}

fn expand_scientific(value: &str) -> Result<String, ImportError> {
    let numeric_error = || ImportError::NumericFormat {
        value: value.to_string(),
    };

    let (mantissa, exponent) = value
        .split_once(|c: char| c == 'e' || c == 'E')
        .ok_or_else(numeric_error)?;

    let exponent: i64 = exponent
        .strip_prefix('+')
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(numeric_error)?;

    let mantissa = mantissa.strip_suffix('.').unwrap_or(mantissa);
    if !is_plain_decimal(mantissa) {
        return Err(numeric_error());
    }

    let (digits, scale) = BigDecimal::from_str(mantissa)
        .map_err(|_| numeric_error())?
        .into_bigint_and_exponent();

    // Shift the decimal point right, then drop whatever fraction remains
    let expanded = BigDecimal::new(digits, scale - exponent).with_scale(0);
    let (integer, _) = expanded.into_bigint_and_exponent();

    Ok(integer.to_string())
}

/// Optional sign, at least one integer digit, optional fraction digits
fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    !integer.is_empty()
        && integer.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// Normalize a card expiry cell to `YYYY-MM-DD`.
///
/// Accepts ISO dates, `DD/MM/YYYY` and spreadsheet serial day numbers.
/// Empty input yields `None`; unrecognised text is returned unchanged.
pub fn normalize_card_expiry(raw: Option<&str>) -> Option<String> {
    let value = raw.map(str::trim).filter(|v| !v.is_empty())?;

    if let Some(date) = parse_expiry_date(value) {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    tracing::warn!(value, "unrecognised card expiry format, passing through");
    Some(value.to_string())
}

fn parse_expiry_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return Some(date);
    }

    // Spreadsheet serial dates count days from 1899-12-30
    if value.chars().all(|c| c.is_ascii_digit()) {
        let days: u64 = value.parse().ok()?;
        if (MIN_SERIAL_DAY..=MAX_SERIAL_DAY).contains(&days) {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            return epoch.checked_add_days(Days::new(days));
        }
    }

    None
}

/// Why a record was left out of the generated SQL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "label", rename_all = "snake_case")]
pub enum SkipReason {
    UnknownCompany(String),
    UnknownJob(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownCompany(label) => write!(f, "Unknown company: {}", label),
            SkipReason::UnknownJob(label) => write!(f, "Unknown job: {}", label),
        }
    }
}

/// An employee whose company and job resolved to known codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEmployee {
    pub employee_no: String,
    pub name_en: String,
    pub name_ar: String,
    pub nationality: String,
    pub company_code: String,
    pub department_code: String,
    pub job_code: String,
    pub passport_no: String,
    pub card_no: String,
    pub card_expiry: Option<String>,
}

/// Outcome of normalizing one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedEmployee),
    Skipped(SkipReason),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Applies a set of [`Mappings`] to employee records
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    mappings: &'a Mappings,
}

impl<'a> Normalizer<'a> {
    pub fn new(mappings: &'a Mappings) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &'a Mappings {
        self.mappings
    }

    /// Exact-match company lookup
    pub fn resolve_company(&self, label: &str) -> Option<&'a LookupEntry> {
        self.mappings.companies.get(label)
    }

    /// Exact-match job lookup
    pub fn resolve_job(&self, label: &str) -> Option<&'a LookupEntry> {
        self.mappings.jobs.get(label)
    }

    /// Department code for a job code, falling back to the default department
    pub fn infer_department(&self, job_code: &str) -> &'a str {
        self.mappings
            .departments
            .get(job_code)
            .map(|d| d.code.as_str())
            .unwrap_or(self.mappings.default_department.as_str())
    }

    /// English nationality name, or the label itself when unknown
    pub fn resolve_nationality(&self, label: &str) -> String {
        self.mappings
            .nationalities
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    /// Resolve one record. Unknown companies are reported before unknown jobs.
    pub fn normalize(&self, record: &EmployeeRecord) -> Resolution {
        let Some(company) = self.resolve_company(&record.company_ar) else {
            tracing::warn!(
                employee_no = %record.employee_no,
                company = %record.company_ar,
                "unknown company, skipping record"
            );
            return Resolution::Skipped(SkipReason::UnknownCompany(record.company_ar.clone()));
        };

        let Some(job) = self.resolve_job(&record.job_ar) else {
            tracing::warn!(
                employee_no = %record.employee_no,
                job = %record.job_ar,
                "unknown job, skipping record"
            );
            return Resolution::Skipped(SkipReason::UnknownJob(record.job_ar.clone()));
        };

        Resolution::Resolved(ResolvedEmployee {
            employee_no: record.employee_no.clone(),
            name_en: record.name_en.clone(),
            name_ar: record.name_ar.clone(),
            nationality: self.resolve_nationality(&record.nationality_ar),
            company_code: company.code.clone(),
            department_code: self.infer_department(&job.code).to_string(),
            job_code: job.code.clone(),
            passport_no: record.passport_no.clone(),
            card_no: record.card_no.clone(),
            card_expiry: normalize_card_expiry(record.card_expiry.as_deref()),
        })
    }
}
